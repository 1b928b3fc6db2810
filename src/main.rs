//! Stabilize CLI - motion detection for video stabilization
//!
//! Reads a Y4M or raw video, measures the motion between consecutive frames
//! and writes the transform stream.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use stabilize_lib::filter::stabilize::{Algorithm, StabilizeFilter, StabilizeOptions};
use stabilize_lib::format::{open_input, parse_size, FrameReader, InputFormat, Y4mWriter};
use stabilize_lib::{init, Config, Error};

#[derive(Parser)]
#[command(name = "stabilize")]
#[command(about = "Motion detection for video stabilization", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Number of threads to use
    #[arg(short = 't', long)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect inter-frame motion and write the transform stream
    Detect {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        options: OptionArgs,

        /// Write the frames, with the debug overlay, to this Y4M file
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Show the geometry and the derived detection parameters
    Probe {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input file path
    #[arg(short, long)]
    input: PathBuf,

    /// Input format: y4m, rgb24, yuv420p, yuv422p (default: by extension)
    #[arg(short, long)]
    format: Option<String>,

    /// Frame size of raw input (e.g., 640x480)
    #[arg(short, long)]
    size: Option<String>,
}

#[derive(Args)]
struct OptionArgs {
    /// Transform stream output (default: <input>.trf, .json for JSON)
    #[arg(short, long)]
    result: Option<PathBuf>,

    /// Option string, e.g. "shakiness=5:accuracy=9"
    #[arg(short, long)]
    options: Option<String>,

    /// JSON file with options
    #[arg(long)]
    config: Option<PathBuf>,

    /// How shaky the video is (1-10)
    #[arg(long)]
    shakiness: Option<u32>,

    /// How many fields vote (1-15)
    #[arg(long)]
    accuracy: Option<u32>,

    /// Initial search step
    #[arg(long)]
    stepsize: Option<u32>,

    /// 0 = whole-frame search, 1 = field search
    #[arg(long)]
    algo: Option<u8>,

    /// Contrast below which a field is ignored (0-1)
    #[arg(long)]
    mincontrast: Option<f64>,

    /// Debug overlay level (0-2)
    #[arg(long)]
    show: Option<u32>,

    /// Keep matches on the search boundary
    #[arg(long)]
    allowmax: bool,

    /// Match fields in parallel
    #[arg(long)]
    parallel: bool,
}

impl OptionArgs {
    /// Config file first, then the option string, then individual flags
    fn resolve(&self) -> anyhow::Result<StabilizeOptions> {
        let mut options = match &self.config {
            Some(path) => StabilizeOptions::from_json_file(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => StabilizeOptions::default(),
        };
        if let Some(s) = &self.options {
            options.apply(s)?;
        }

        if let Some(v) = self.shakiness {
            options.shakiness = v;
        }
        if let Some(v) = self.accuracy {
            options.accuracy = v;
        }
        if let Some(v) = self.stepsize {
            options.stepsize = v;
        }
        if let Some(v) = self.algo {
            options.algo = Algorithm::try_from(v)?;
        }
        if let Some(v) = self.mincontrast {
            options.mincontrast = v;
        }
        if let Some(v) = self.show {
            options.show = v;
        }
        if let Some(path) = &self.result {
            options.result = Some(path.clone());
        }
        options.allowmax |= self.allowmax;
        options.parallel |= self.parallel;
        Ok(options)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config {
        max_threads: cli.threads,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    init(config)?;

    info!("stabilize v{}", stabilize_lib::VERSION);

    match cli.command {
        Commands::Detect {
            input,
            options,
            preview,
        } => {
            info!("Detecting motion in {}", input.input.display());
            cmd_detect(&input, &options, preview.as_deref())?;
        }
        Commands::Probe { input, options } => {
            cmd_probe(&input, &options)?;
        }
    }

    Ok(())
}

fn open_reader(args: &InputArgs) -> anyhow::Result<Box<dyn FrameReader>> {
    let format = args.format.as_deref().map(InputFormat::from_name).transpose()?;
    let size = args.size.as_deref().map(parse_size).transpose()?;
    let reader = open_input(&args.input, format, size)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    Ok(reader)
}

fn cmd_detect(input: &InputArgs, option_args: &OptionArgs, preview: Option<&Path>) -> anyhow::Result<()> {
    let mut reader = open_reader(input)?;
    let (width, height, format) = reader.geometry();

    let mut detector = StabilizeFilter::new(option_args.resolve()?);
    detector.configure_file(width, height, format, Some(&input.input))?;

    let mut writer = match preview {
        Some(path) => Some(
            Y4mWriter::create(path, width, height, format, reader.framerate())
                .with_context(|| format!("Failed to create preview {}", path.display()))?,
        ),
        None => None,
    };

    loop {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(Error::EndOfStream) => break,
            Err(e) => return Err(e.into()),
        };
        let frame = detector.process(frame)?;
        if let Some(writer) = writer.as_mut() {
            writer.write_frame(&frame)?;
        }
    }
    detector.stop()?;

    let result = detector.options().result_path(Some(&input.input));
    println!(
        "Detected {} frames ({}x{} {}), transforms written to {}",
        detector.frame_count(),
        width,
        height,
        format,
        result.display()
    );
    Ok(())
}

fn cmd_probe(input: &InputArgs, option_args: &OptionArgs) -> anyhow::Result<()> {
    let reader = open_reader(input)?;
    let (width, height, format) = reader.geometry();

    let options = option_args.resolve()?;
    let mut detector = StabilizeFilter::new(options);
    detector.configure(
        width,
        height,
        format,
        Box::new(stabilize_lib::filter::stabilize::MemorySink::new()),
    )?;

    println!("File: {}", input.input.display());
    println!("  Resolution: {}x{}", width, height);
    println!("  Pixel Format: {}", format);

    let options = detector.options();
    println!("  Shakiness: {}", options.shakiness);
    println!("  Accuracy: {}", options.accuracy);
    println!("  Step Size: {}", options.stepsize);
    println!("  Algorithm: {}", options.algo.id());
    println!("  Min Contrast: {:.3}", options.mincontrast);

    if let Some(params) = detector.params() {
        println!("  Field Size: {}", params.field_size);
        println!("  Max Shift: {}", params.max_shift);
    }
    if let Some(grid) = detector.grid() {
        println!("  Field Grid: {} rows x {} cols", grid.rows(), grid.cols());
        println!("  Fields Used: {} of {}", detector.max_fields(), grid.len());
    }
    Ok(())
}
