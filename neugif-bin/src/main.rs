// main.rs      neugif command
//
// Copyright (c) 2019-2026  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use neugif::block::DisposalMethod;
use neugif::enhance::ColorEnhancement;
use neugif::{Dither, Encoder, RgbFrame, StepEnc};
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Number of frames in demo animations
const DEMO_FRAMES: u32 = 10;

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    match create_app().get_matches().subcommand() {
        ("demo", Some(matches)) => demo(&mut out, matches)?,
        ("wrap", Some(matches)) => wrap(&mut out, matches)?,
        _ => unreachable!(),
    }
    out.reset()?;
    Ok(())
}

/// Create arguments shared by all subcommands
fn encode_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .help("output file"),
        Arg::with_name("delay")
            .long("delay")
            .takes_value(true)
            .default_value("100")
            .help("frame delay (ms)"),
        Arg::with_name("repeat")
            .long("repeat")
            .takes_value(true)
            .allow_hyphen_values(true)
            .default_value("0")
            .help("repeat count (0: forever, -1: once)"),
        Arg::with_name("quality")
            .long("quality")
            .takes_value(true)
            .default_value("10")
            .help("quantization quality (1: best, 30: fastest)"),
        Arg::with_name("dither")
            .long("dither")
            .takes_value(true)
            .default_value("none")
            .help("dither method (FloydSteinberg, Stucki, ...)"),
        Arg::with_name("transparent")
            .long("transparent")
            .takes_value(true)
            .help("transparent color (RRGGBB)"),
        Arg::with_name("dispose")
            .long("dispose")
            .takes_value(true)
            .help("disposal method (0-7)"),
        Arg::with_name("contrast")
            .long("contrast")
            .takes_value(true)
            .default_value("1.0")
            .help("contrast boost (1.0 - 2.0)"),
        Arg::with_name("saturation")
            .long("saturation")
            .takes_value(true)
            .default_value("1.0")
            .help("saturation boost (1.0 - 2.0)"),
    ]
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("neugif")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Animated GIF encoder")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("demo")
                .about("Encode a built-in animation")
                .arg(
                    Arg::with_name("kind")
                        .required(true)
                        .possible_values(&["circle", "gradient"])
                        .help("animation kind"),
                )
                .args(&encode_args()),
        )
        .subcommand(
            SubCommand::with_name("wrap")
                .about("Wrap PPM frames into a GIF")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input PPM file(s)"),
                )
                .args(&encode_args()),
        )
}

/// Get a parsed argument value
fn value<T>(matches: &ArgMatches, name: &str) -> Result<T, Box<dyn Error>>
where
    T: std::str::FromStr,
    T::Err: Error + 'static,
{
    let v = matches
        .value_of(name)
        .ok_or_else(|| format!("missing {}", name))?;
    Ok(v.parse()?)
}

/// Parse an RRGGBB color
fn parse_rgb(hex: &str) -> Result<[u8; 3], Box<dyn Error>> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("invalid color: {}", hex).into());
    }
    let rgb = u32::from_str_radix(hex, 16)?;
    Ok([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
}

/// Create a step encoder from arguments
fn step_enc<W: Write>(
    writer: W,
    width: u16,
    height: u16,
    matches: &ArgMatches,
) -> Result<StepEnc<W>, Box<dyn Error>> {
    let repeat: i32 = value(matches, "repeat")?;
    let enhancement = ColorEnhancement::new(
        value(matches, "saturation")?,
        value(matches, "contrast")?,
    );
    let mut enc = Encoder::new(writer)
        .into_step_enc(width, height)
        .with_delay_ms(value(matches, "delay")?)
        .with_quality(value(matches, "quality")?)
        .with_dither(Dither::from(matches.value_of("dither").unwrap_or("")))
        .with_enhancement(enhancement);
    if repeat >= 0 {
        enc = enc.with_loop_count(repeat as u16);
    }
    if let Some(hex) = matches.value_of("transparent") {
        enc = enc.with_transparent_color(Some(parse_rgb(hex)?));
    }
    if matches.is_present("dispose") {
        let dispose: u8 = value(matches, "dispose")?;
        enc = enc.with_disposal_method(DisposalMethod::from(dispose));
    }
    Ok(enc)
}

/// Encode frames to a file
fn encode_file(
    out: &mut StandardStream,
    matches: &ArgMatches,
    path: &str,
    frames: &[RgbFrame],
) -> Result<(), Box<dyn Error>> {
    use neugif::PixelSource;
    let first = frames.first().ok_or(neugif::Error::NoFrames)?;
    let width = u16::try_from(first.width())?;
    let height = u16::try_from(first.height())?;
    let writer = BufWriter::new(File::create(path)?);
    let mut enc = step_enc(writer, width, height, matches)?;
    for frame in frames {
        enc.encode_frame(frame)?;
    }
    enc.finish()?;
    drop(enc);
    let bytes = std::fs::metadata(path)?.len();
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    out.set_color(&magenta)?;
    write!(out, "{}", path)?;
    out.set_color(&bold)?;
    writeln!(
        out,
        " {}x{}, frames: {}, bytes: {}",
        width,
        height,
        frames.len(),
        bytes
    )?;
    Ok(())
}

/// Handle demo subcommand
fn demo(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let kind = matches.value_of("kind").unwrap_or("circle");
    let frames: Vec<RgbFrame> = (0..DEMO_FRAMES)
        .map(|i| match kind {
            "gradient" => render_gradient(i),
            _ => render_circle(i),
        })
        .collect();
    let default_path = format!("{}.gif", kind);
    let path = matches.value_of("output").unwrap_or(&default_path);
    encode_file(out, matches, path, &frames)
}

/// Render a frame of a red circle moving across a white background
fn render_circle(i: u32) -> RgbFrame {
    let (width, height) = (200, 200);
    let mut frame = RgbFrame::with_color(width, height, [255, 255, 255]);
    let r = 30.0;
    let cx = 40.0 + i as f32 * 12.0;
    let cy = 100.0;
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d < r {
                // shade toward the edge
                let v = (255.0 * d / r) as u8;
                frame.set_rgb(x, y, [255, v / 2, v / 2]);
            }
        }
    }
    frame
}

/// Render a frame of a shifting RGB gradient
fn render_gradient(i: u32) -> RgbFrame {
    let (width, height) = (100, 100);
    let mut frame = RgbFrame::with_color(width, height, [0, 0, 0]);
    let shift = i * 256 / DEMO_FRAMES;
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 256 / width + shift) % 256) as u8;
            let g = (y * 255 / height) as u8;
            let b = ((shift + 128) % 256) as u8;
            frame.set_rgb(x, y, [r, g, b]);
        }
    }
    frame
}

/// Handle wrap subcommand
fn wrap(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let path = matches
        .value_of("output")
        .ok_or("output file required (-o)")?;
    let mut frames = vec![];
    for file in matches.values_of_os("files").into_iter().flatten() {
        frames.push(read_ppm(file)?);
    }
    encode_file(out, matches, path, &frames)
}

/// Read a binary PPM (P6) file
fn read_ppm(path: &OsStr) -> Result<RgbFrame, Box<dyn Error>> {
    let mut buf = vec![];
    BufReader::new(File::open(path)?).read_to_end(&mut buf)?;
    let mut pos = 0;
    let mut fields = [0u32; 3];
    if !buf.starts_with(b"P6") {
        return Err(format!("{:?}: not a binary PPM", path).into());
    }
    pos += 2;
    for field in fields.iter_mut() {
        // skip whitespace and comments
        loop {
            match buf.get(pos) {
                Some(b'#') => {
                    while buf.get(pos).is_some_and(|b| *b != b'\n') {
                        pos += 1;
                    }
                }
                Some(b) if b.is_ascii_whitespace() => pos += 1,
                _ => break,
            }
        }
        let start = pos;
        while buf.get(pos).is_some_and(|b| b.is_ascii_digit()) {
            pos += 1;
        }
        *field = std::str::from_utf8(&buf[start..pos])?.parse()?;
    }
    let [width, height, maxval] = fields;
    if maxval != 255 {
        return Err(format!("{:?}: maxval {} unsupported", path, maxval).into());
    }
    // single whitespace before raster
    pos += 1;
    let pixels = buf.get(pos..).unwrap_or_default().to_vec();
    Ok(RgbFrame::new(width, height, pixels))
}
