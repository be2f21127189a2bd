// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Headless host for the zoom: drives the workers for a number of
//! frames and "presents" each finished frame by writing it out as a
//! binary PPM.

use clap::{App, Arg, ArgMatches};
use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use log::{info, warn};
use mandelzoom::{FrameDriver, FrameStatus, InteriorTest, RenderConfig, SystemClock};
use num::Complex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

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

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const OFFSET: &str = "offset";
const SCALE: &str = "scale";
const BANDS: &str = "bands";
const ITERATIONS: &str = "iterations";
const COLORS: &str = "colors";
const FRAMES: &str = "frames";
const SPEED: &str = "speed";
const INTERIOR: &str = "interior";

fn args<'a>() -> ArgMatches<'a> {
    let max_bands = num_cpus::get().max(mandelzoom::config::BANDS);

    App::new("zoom")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Banded Mandelbrot zoom renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file, or output directory when rendering several frames"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("256x256")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(OFFSET)
                .required(false)
                .long(OFFSET)
                .short("c")
                .takes_value(true)
                .default_value("0.001643721971153,0.822467633298876")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse zoom target"))
                .help("Point of the complex plane to zoom into"),
        )
        .arg(
            Arg::with_name(SCALE)
                .required(false)
                .long(SCALE)
                .short("z")
                .takes_value(true)
                .default_value("2.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        1e-11,
                        1e6,
                        "Could not parse scale",
                        "Scale must be between 1e-11 and 1e6",
                    )
                })
                .help("Starting half-width of the view"),
        )
        .arg(
            Arg::with_name(BANDS)
                .required(false)
                .long(BANDS)
                .short("b")
                .takes_value(true)
                .default_value("2")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_bands,
                        "Could not parse band count",
                        &format!("Band count must be between 1 and {}", max_bands),
                    )
                })
                .help("Number of bands, one worker thread each"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(move |s| {
                    validate_range(
                        &s,
                        2,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 2 and 200000",
                    )
                })
                .help("Iterations per pixel before a point counts as inside"),
        )
        .arg(
            Arg::with_name(COLORS)
                .required(false)
                .long(COLORS)
                .short("m")
                .takes_value(true)
                .default_value("50")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse color count",
                        "Color count must be between 1 and 10000",
                    )
                })
                .help("Colors in each half of the ramp"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .required(false)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse frame count",
                        "Frame count must be between 1 and 100000",
                    )
                })
                .help("Number of frames to write"),
        )
        .arg(
            Arg::with_name(SPEED)
                .required(false)
                .long(SPEED)
                .takes_value(true)
                .default_value("0.005")
                .validator(|s| {
                    validate_range(
                        &s,
                        0.0,
                        1000.0,
                        "Could not parse zoom speed",
                        "Zoom speed must be between 0 and 1000",
                    )
                })
                .help("Zoom speed coefficient"),
        )
        .arg(
            Arg::with_name(INTERIOR)
                .required(false)
                .long(INTERIOR)
                .takes_value(true)
                .possible_values(&["literal", "cardioid"])
                .default_value("literal")
                .help("Early-exit test run before iterating"),
        )
        .get_matches()
}

fn write_image(outfile: &Path, pixels: &[u8], bounds: (usize, usize)) -> Result<(), std::io::Error> {
    let output = File::create(outfile)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
    encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::RGB(8))?;
    Ok(())
}

fn config(matches: &ArgMatches) -> Option<RenderConfig> {
    let size = parse_pair::<usize>(matches.value_of(SIZE)?, 'x')?;
    Some(RenderConfig {
        width: size.0,
        height: size.1,
        offset: parse_complex(matches.value_of(OFFSET)?)?,
        scale: f64::from_str(matches.value_of(SCALE)?).ok()?,
        bands: usize::from_str(matches.value_of(BANDS)?).ok()?,
        max_iterations: usize::from_str(matches.value_of(ITERATIONS)?).ok()?,
        max_colors: usize::from_str(matches.value_of(COLORS)?).ok()?,
        zoom_speed: f64::from_str(matches.value_of(SPEED)?).ok()?,
        interior: match matches.value_of(INTERIOR)? {
            "cardioid" => InteriorTest::CardioidBulb,
            _ => InteriorTest::Literal,
        },
        ..RenderConfig::default()
    })
}

fn frame_path(output: &Path, frames: usize, frame: usize) -> PathBuf {
    if frames == 1 {
        output.to_path_buf()
    } else {
        output.join(format!("frame-{:05}.ppm", frame))
    }
}

fn run(config: RenderConfig, output: &Path, frames: usize) -> mandelzoom::Result<()> {
    if frames > 1 {
        fs::create_dir_all(output)?;
    }
    let mut driver = FrameDriver::new(config, SystemClock::new())?;
    let bounds = (config.width, config.height);
    let mut written = 0;
    while written < frames {
        let path = frame_path(output, frames, written);
        match driver.tick(|buffer| Ok(write_image(&path, &buffer.to_vec(), bounds)?)) {
            Ok(FrameStatus::Presented { frame, viewport }) => {
                info!("wrote frame {} at scale {:e} to {}", frame, viewport.scale, path.display());
                written += 1;
            }
            Ok(FrameStatus::Pending) => thread::sleep(Duration::from_millis(1)),
            Err(e) => {
                if let Err(shutdown) = driver.shutdown() {
                    warn!("shutdown after a failed frame: {}", shutdown);
                }
                return Err(e);
            }
        }
    }
    driver.shutdown()
}

fn main() {
    env_logger::init();
    let matches = args();
    let config = match config(&matches) {
        Some(config) => config,
        None => {
            eprintln!("Could not parse arguments");
            std::process::exit(1);
        }
    };
    let frames = usize::from_str(matches.value_of(FRAMES).unwrap_or("1")).unwrap_or(1);
    let output = Path::new(matches.value_of(OUTPUT).unwrap_or_default());

    if let Err(e) = run(config, output, frames) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
