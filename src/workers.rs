// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A small parallel-for over independent units of work.
//!
//! Each worker pulls the next item out of a shared iterator until it
//! runs dry, so a slow row near the set's boundary does not hold up
//! the other threads.  Items are handed out by value: when they are
//! mutable row slices, every worker owns the rows it is given and the
//! rows are never shared.

use std::panic;
use std::sync::Mutex;

use tracing::trace;

/// Resolves a requested thread count: zero means "one per CPU".
pub fn thread_count(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get()
    } else {
        requested
    }
}

/// Calls `work` on every item, spread over `threads` scoped threads.
/// With a single thread the items are processed in order on the
/// calling thread and nothing is spawned.
///
/// A panic in any worker is re-raised on the calling thread once the
/// other workers have finished.
pub fn for_each<I, F>(items: I, threads: usize, work: F)
where
    I: IntoIterator,
    I::IntoIter: Send,
    I::Item: Send,
    F: Fn(I::Item) + Sync,
{
    if threads <= 1 {
        items.into_iter().for_each(work);
        return;
    }

    let queue = Mutex::new(items.into_iter());
    let queue = &queue;
    let work = &work;
    let outcome = crossbeam::scope(|spawner| {
        for worker in 0..threads {
            spawner.spawn(move |_| {
                let mut done = 0usize;
                loop {
                    // `work` runs outside the lock, so a panicking worker
                    // leaves the queue intact: the others drain it and
                    // the scope re-raises the panic once they are joined.
                    // Poison could only come from `next` itself.
                    let item = match queue.lock() {
                        Ok(mut items) => items.next(),
                        Err(_) => None,
                    };
                    match item {
                        Some(item) => {
                            work(item);
                            done += 1;
                        }
                        None => {
                            break;
                        }
                    }
                }
                trace!(worker, done, "worker finished");
            });
        }
    });
    if let Err(payload) = outcome {
        panic::resume_unwind(payload);
    }
}
