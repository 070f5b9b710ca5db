use std::f64::consts::PI;
use std::fs::File;
use std::io::BufWriter;
use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error};
use fractal::encode::{write_gif, write_png_direct, write_png_indexed};
use fractal::{
    render_image, AnimationConfig, AnimationRenderer, ColorPalette, JuliaSetFn, PaletteKind,
    PlaneWindow, Raster, RasterDimensions, TileRenderer,
};
use image::Rgba;
use log::info;
use num::Complex;

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
const MODE: &str = "mode";
const SIZE: &str = "size";
const PLOT: &str = "plot";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const FRAMES: &str = "frames";
const DELAY: &str = "delay";
const ITERATIONS: &str = "iterations";
const PALETTE: &str = "palette";
const CONTRAST: &str = "contrast";
const EXP: &str = "exp";
const ESCAPE_RADIUS: &str = "escape-radius";
const INIT: &str = "init";
const ORBIT: &str = "orbit";
const JOBS: &str = "jobs";
const SEQUENTIAL: &str = "sequential";
const DIRECT: &str = "direct";
const PROGRESS: &str = "progress";

fn args<'a>() -> ArgMatches<'a> {
    let max_jobs = 4 * num_cpus::get();

    App::new("fractal")
        .version("0.1.0")
        .about("Escape-time fractal image and animation renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file"),
        )
        .arg(
            Arg::with_name(MODE)
                .long(MODE)
                .short("m")
                .takes_value(true)
                .possible_values(&["img", "gif"])
                .default_value("img")
                .help("Render a single PNG image or a GIF animation"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(PLOT)
                .long(PLOT)
                .short("p")
                .takes_value(true)
                .default_value("4x2")
                .validator(|s| validate_pair::<f64>(&s, 'x', "Could not parse plot size"))
                .help("Width and height of the region of the complex plane"),
        )
        .arg(
            Arg::with_name(CENTER)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse plot center"))
                .help("Point of the complex plane at the middle of the image"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("0.9")
                .validator(|s| {
                    validate_range(
                        &s,
                        1e-6,
                        1e6,
                        "Could not parse zoom factor",
                        "Zoom factor must be positive",
                    )
                })
                .help("Factor the plot shrinks by every frame"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse frame count",
                        "Frame count must be between 1 and 100000",
                    )
                })
                .help("Number of frames in the animation"),
        )
        .arg(
            Arg::with_name(DELAY)
                .long(DELAY)
                .short("d")
                .takes_value(true)
                .default_value("8")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        6_000,
                        "Could not parse frame delay",
                        "Frame delay must be between 0 and 6000",
                    )
                })
                .help("Delay between frames, in hundredths of a second"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Iterations before a point counts as inside the set"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .long(PALETTE)
                .takes_value(true)
                .default_value("uf")
                .validator(|s| PaletteKind::from_str(&s).map(|_| ()))
                .help("Color palette: 'bw', 'bw-inv', 'uf' or 'gb'"),
        )
        .arg(
            Arg::with_name(CONTRAST)
                .long(CONTRAST)
                .takes_value(true)
                .default_value("15")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        255,
                        "Could not parse contrast",
                        "Contrast must be between 0 and 255",
                    )
                })
                .help("Gray step of the bw palettes"),
        )
        .arg(
            Arg::with_name(EXP)
                .long(EXP)
                .short("e")
                .takes_value(true)
                .default_value("2")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        64,
                        "Could not parse exponent",
                        "Exponent must be between 1 and 64",
                    )
                })
                .help("Exponent of the map f(z) = z^exp + c"),
        )
        .arg(
            Arg::with_name(ESCAPE_RADIUS)
                .long(ESCAPE_RADIUS)
                .short("r")
                .takes_value(true)
                .default_value("2")
                .validator(|s| {
                    validate_range(
                        &s,
                        1e-9,
                        1e12,
                        "Could not parse escape radius",
                        "Escape radius must be positive",
                    )
                })
                .help("Iterates beyond this distance have escaped"),
        )
        .arg(
            Arg::with_name(INIT)
                .long(INIT)
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse initial iterate"))
                .help("First iterate of the map"),
        )
        .arg(
            Arg::with_name(ORBIT)
                .long(ORBIT)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        0.0,
                        1e6,
                        "Could not parse orbit radius",
                        "Orbit radius must not be negative",
                    )
                })
                .help("Animate the Julia set whose parameter circles the origin at this radius"),
        )
        .arg(
            Arg::with_name(JOBS)
                .long(JOBS)
                .short("j")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_jobs,
                        "Could not parse job count",
                        &format!("Job count must be between 1 and {}", max_jobs),
                    )
                })
                .help("Frames rendered at once (defaults to the number of CPUs)"),
        )
        .arg(
            Arg::with_name(SEQUENTIAL)
                .long(SEQUENTIAL)
                .conflicts_with(JOBS)
                .help("Render animation frames one at a time"),
        )
        .arg(
            Arg::with_name(DIRECT)
                .long(DIRECT)
                .help("Color images directly instead of through palette indices"),
        )
        .arg(
            Arg::with_name(PROGRESS)
                .long(PROGRESS)
                .help("Report each finished frame"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches<'_>, name: &str) -> Result<T, Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format_err!("missing or malformed --{}", name))
}

fn pair<T: FromStr>(
    matches: &ArgMatches<'_>,
    name: &str,
    separator: char,
) -> Result<(T, T), Error> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, separator))
        .ok_or_else(|| format_err!("missing or malformed --{}", name))
}

fn complex(matches: &ArgMatches<'_>, name: &str) -> Result<Complex<f64>, Error> {
    matches
        .value_of(name)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("missing or malformed --{}", name))
}

fn animate<G, F>(
    config: AnimationConfig,
    color_fn_gen: G,
    delay: u32,
    jobs: Option<usize>,
    output: &str,
    palette: &[Rgba<u8>],
) -> Result<(), Error>
where
    G: Fn(usize) -> F + Sync,
    F: Fn(Complex<f64>) -> u8 + Sync,
{
    let renderer = AnimationRenderer::new(config, color_fn_gen, move |_: usize| delay)?;
    let buffer = match jobs {
        Some(jobs) => renderer.render_parallel(jobs)?,
        None => renderer.render()?,
    };
    write_gif(BufWriter::new(File::create(output)?), &buffer, palette)?;
    Ok(())
}

fn run(matches: &ArgMatches<'_>) -> Result<(), Error> {
    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| format_err!("output filename not specified"))?;
    let (width, height): (usize, usize) = pair(matches, SIZE, 'x')?;
    let (plot_width, plot_height): (f64, f64) = pair(matches, PLOT, 'x')?;
    let dimensions = RasterDimensions::new(width, height)?;
    let window = PlaneWindow::new(complex(matches, CENTER)?, plot_width, plot_height)?;

    let iterations: usize = value(matches, ITERATIONS)?;
    let palette_kind: PaletteKind = value(matches, PALETTE)?;
    let palette = palette_kind.build(iterations, value(matches, CONTRAST)?);
    let julia = JuliaSetFn {
        exp: value(matches, EXP)?,
        max_iters: iterations,
        escape_radius: value(matches, ESCAPE_RADIUS)?,
        init_iterate: complex(matches, INIT)?,
    };

    if matches.value_of(MODE) == Some("img") {
        let slice_width = TileRenderer::default_slice_width(width);
        if matches.is_present(DIRECT) {
            let renderer = TileRenderer::new(dimensions, window, slice_width)?;
            let mut raster = Raster::filled(dimensions, Rgba([0, 0, 0, 0xff]))?;
            let color = |c: Complex<f64>| palette.color(julia.escape_iter(c));
            renderer.render_into(&mut raster, &color)?;
            write_png_direct(output, &raster)?;
        } else {
            let raster = render_image(dimensions, window, slice_width, &|c: Complex<f64>| {
                palette.color_index(julia.escape_iter(c))
            })?;
            write_png_indexed(output, &raster, palette.palette())?;
        }
        info!("wrote {}x{} image to {}", width, height, output);
        return Ok(());
    }

    let frames: usize = value(matches, FRAMES)?;
    let config = AnimationConfig {
        frames,
        dimensions,
        window,
        zoom_factor: value(matches, ZOOM)?,
        slice_width: None,
        progress: matches.is_present(PROGRESS),
    };
    let delay: u32 = value(matches, DELAY)?;
    let jobs = if matches.is_present(SEQUENTIAL) {
        None
    } else if matches.is_present(JOBS) {
        Some(value(matches, JOBS)?)
    } else {
        Some(num_cpus::get())
    };

    let palette = &palette;
    let julia = &julia;
    if matches.is_present(ORBIT) {
        let radius: f64 = value(matches, ORBIT)?;
        let step = 2.0 * PI / frames as f64;
        let orbiting = |id: usize| {
            let c = Complex::from_polar(radius, id as f64 * step);
            move |z: Complex<f64>| palette.color_index(julia.escape_iter_from(z, c))
        };
        animate(config, orbiting, delay, jobs, output, palette.palette())?;
    } else {
        let fixed = |_: usize| move |c: Complex<f64>| palette.color_index(julia.escape_iter(c));
        animate(config, fixed, delay, jobs, output, palette.palette())?;
    }
    info!("wrote {} frame animation to {}", frames, output);
    Ok(())
}

fn main() {
    let matches = args();
    let level = if matches.is_present(PROGRESS) { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
