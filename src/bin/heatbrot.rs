// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use heatbrot::{FrameBuffer, HeatmapRenderer, Strategy};
use image::RgbImage;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    match parse_pair::<u32>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Ok((w, h)),
        Some(_) => Err("Image width and height must be at least 1".to_string()),
        None => Err("Could not parse output image size, expected WIDTHxHEIGHT".to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<T, String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(i)
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const STRATEGY: &str = "strategy";
const PADDING: &str = "stride-padding";

fn args() -> ArgMatches {
    let max_threads = num_cpus::get() * 4;

    Command::new("heatbrot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Renders the Mandelbrot set as a histogram-equalized heat map")
        .arg(
            Arg::new(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short('o')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Output file; the format follows the extension (png, ppm)"),
        )
        .arg(
            Arg::new(SIZE)
                .long(SIZE)
                .short('s')
                .default_value("800x600")
                .value_parser(parse_size)
                .help("Size of output image"),
        )
        .arg(
            Arg::new(ITERATIONS)
                .long(ITERATIONS)
                .short('i')
                .default_value("1000")
                .value_parser(|s: &str| {
                    validate_range(
                        s,
                        1u32,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Iterations per point before it is counted as inside the set"),
        )
        .arg(
            Arg::new(THREADS)
                .long(THREADS)
                .short('t')
                .value_parser(move |s: &str| {
                    validate_range(
                        s,
                        1usize,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the parallel strategies [default: number of CPUs]"),
        )
        .arg(
            Arg::new(STRATEGY)
                .long(STRATEGY)
                .short('m')
                .default_value("simd")
                .value_parser(|s: &str| s.parse::<Strategy>())
                .help("Execution strategy: sequential, parallel or simd"),
        )
        .arg(
            Arg::new(PADDING)
                .long(PADDING)
                .default_value("0")
                .value_parser(value_parser!(usize))
                .help("Extra bytes at the end of every framebuffer row"),
        )
        .get_matches()
}

fn arg<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .with_context(|| format!("missing --{}", id))
}

/// Copies the pixels out of a padded framebuffer into a tightly packed
/// image.
fn write_image(outfile: &Path, buffer: &[u8], bounds: (u32, u32), stride: usize) -> Result<()> {
    let row_bytes = bounds.0 as usize * 3;
    let pixels: Vec<u8> = buffer
        .chunks(stride)
        .take(bounds.1 as usize)
        .flat_map(|row| row[..row_bytes].iter().cloned())
        .collect();
    let image = RgbImage::from_raw(bounds.0, bounds.1, pixels)
        .context("framebuffer is smaller than the image")?;
    image
        .save(outfile)
        .with_context(|| format!("could not write {}", outfile.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("heatbrot=info")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = args();
    let output: PathBuf = arg(&matches, OUTPUT)?;
    let (width, height): (u32, u32) = arg(&matches, SIZE)?;
    let iterations: u32 = arg(&matches, ITERATIONS)?;
    let threads = matches
        .get_one::<usize>(THREADS)
        .cloned()
        .unwrap_or_else(num_cpus::get);
    let strategy = arg::<Strategy>(&matches, STRATEGY)?.with_threads(threads);
    let padding: usize = arg(&matches, PADDING)?;

    let (width, height) = (width as usize, height as usize);
    let stride = width
        .checked_mul(3)
        .and_then(|row| row.checked_add(padding))
        .context("--stride-padding is too large")?;
    let len = stride
        .checked_mul(height)
        .context("framebuffer does not fit in memory")?;
    let mut buffer = vec![0u8; len];

    let renderer = HeatmapRenderer::new(width, height, iterations)?;
    let started = Instant::now();
    {
        let mut framebuffer = FrameBuffer::new(&mut buffer, width, height, stride)?;
        renderer.render_with(&mut framebuffer, strategy)?;
    }
    info!(
        %strategy,
        threads = strategy.threads(),
        width,
        height,
        iterations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered"
    );

    write_image(&output, &buffer, (width as u32, height as u32), stride)?;
    info!(output = %output.display(), "image written");
    Ok(())
}
