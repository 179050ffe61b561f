// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Histogram equalization.
//!
//! Points are not colored by their raw escape count but by the
//! fraction of escaped points that escaped no later than they did.
//! That fraction comes from the cumulative sum of a histogram of
//! escape counts.  Points that never escaped are left out of both the
//! histogram and the total; they are painted separately.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::workers;

/// A histogram that many row workers can bump at once.  Each bucket is
/// its own atomic counter; there is no lock anywhere.
pub struct AtomicHistogram {
    buckets: Vec<AtomicUsize>,
}

impl AtomicHistogram {
    /// One bucket per escape count in `0..limit`.
    pub fn new(limit: u32) -> Self {
        AtomicHistogram {
            buckets: (0..limit).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    /// Counts every escaped point of a row.  Counts equal to the
    /// budget are set members and are skipped.
    pub fn record_row(&self, row: &[u32]) {
        for &count in row {
            if let Some(bucket) = self.buckets.get(count as usize) {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Once every worker has been joined the counts are stable and the
    /// atomics are no longer needed.
    pub fn into_histogram(self) -> Histogram {
        Histogram {
            buckets: self.buckets.into_iter().map(AtomicUsize::into_inner).collect(),
        }
    }
}

/// A finished, read-only histogram of escape counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    buckets: Vec<usize>,
}

impl Histogram {
    /// Builds a histogram straight from its bucket counts.
    pub fn from_buckets(buckets: Vec<usize>) -> Self {
        Histogram { buckets }
    }

    /// The number of points that escaped after exactly `count` steps.
    pub fn bucket(&self, count: usize) -> usize {
        self.buckets.get(count).cloned().unwrap_or(0)
    }

    /// The bucket counts, indexed by escape count.
    pub fn buckets(&self) -> &[usize] {
        &self.buckets
    }

    /// The number of buckets, which is the iteration budget.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// A zero budget has no buckets at all.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The number of escaped points.  Buckets are split into one chunk
    /// per thread, each chunk is summed on its own thread, and the
    /// partial sums are added into a shared atomic.  Integer addition
    /// is exact, so the order the partial sums arrive in is irrelevant.
    pub fn total(&self, threads: usize) -> usize {
        if threads <= 1 || self.buckets.len() < threads {
            return self.buckets.iter().sum();
        }
        let total = AtomicUsize::new(0);
        let chunk = (self.buckets.len() + threads - 1) / threads;
        workers::for_each(self.buckets.chunks(chunk), threads, |part| {
            total.fetch_add(part.iter().sum(), Ordering::Relaxed);
        });
        total.into_inner()
    }
}

/// The cumulative hue table: `hue(k)` is the number of escaped points
/// whose escape count is `k` or lower.
#[derive(Debug, Clone, PartialEq)]
pub struct Hues {
    cumulative: Vec<usize>,
    total: usize,
}

impl Hues {
    /// Runs the prefix sum.  This is the one phase that is inherently
    /// sequential; the total is reduced separately across `threads` and
    /// has to agree with the last entry of the prefix sum.
    pub fn new(histogram: &Histogram, threads: usize) -> Self {
        let mut running = 0;
        let cumulative: Vec<usize> = histogram
            .buckets()
            .iter()
            .map(|count| {
                running += *count;
                running
            })
            .collect();
        let total = histogram.total(threads);
        assert_eq!(
            cumulative.last().cloned().unwrap_or(0),
            total,
            "cumulative hues disagree with the histogram total"
        );
        Hues { cumulative, total }
    }

    /// The number of escaped points.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The cumulative count for escape count `count`, or `None` for a
    /// count at or past the budget.
    pub fn hue(&self, count: usize) -> Option<usize> {
        self.cumulative.get(count).cloned()
    }

    /// The whole table.
    pub fn cumulative(&self) -> &[usize] {
        &self.cumulative
    }

    /// The normalized hue of a point with the given escape count, or
    /// `None` if that point is drawn with the sentinel color instead:
    /// either it never escaped, or nothing escaped at all and there is
    /// nothing to normalize against.
    pub fn normalized(&self, count: u32) -> Option<f32> {
        if self.total == 0 {
            return None;
        }
        self.cumulative
            .get(count as usize)
            .map(|&hue| hue as f32 / self.total as f32)
    }
}
