//! vidweb CLI Tool
//!
//! Command-line interface for converting videos into animated WebP or GIF
//! images that fit a file size window, and for inspecting the results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use vidweb_core::{SizeTargetRange, Timing};
use vidweb_decoder::ImageInfo;
use vidweb_encoder::{ConversionReport, ConvertOptions, Converter, FrameSize, OutputFormat};

#[derive(Parser)]
#[command(name = "vidweb")]
#[command(about = "Convert videos to animated WebP or GIF images under a size cap")]
#[command(version)]
struct Cli {
    /// Log every encode trial
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a video file to an animated image
    Convert(ConvertArgs),

    /// Show information about an animated WebP or GIF file
    Info {
        /// Image file path
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input video file path
    input: PathBuf,

    /// Output image file path
    #[arg(short, long)]
    output: PathBuf,

    /// Output width in pixels (keeps aspect ratio when height is omitted)
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (keeps aspect ratio when width is omitted)
    #[arg(long)]
    height: Option<u32>,

    /// Highest encoding quality tried (1-100)
    #[arg(long, default_value = "80")]
    quality: u8,

    /// Maximum number of frames in the output [default: 30, or 180 with --no-size-limit]
    #[arg(long)]
    max_frames: Option<u32>,

    /// Output size cap in KiB
    #[arg(long, default_value = "490")]
    size_cap_kb: u64,

    /// Width of the accepted size window below the cap, in KiB
    #[arg(long, default_value = "100")]
    window_kb: u64,

    /// Encode once at the given quality without enforcing the size cap
    #[arg(long)]
    no_size_limit: bool,

    /// Output frame rate used with --no-preserve-timing
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// Play frames at --fps instead of spreading them over the source duration
    #[arg(long)]
    no_preserve_timing: bool,

    /// Output format (defaults to the output file extension)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,
}

impl ConvertArgs {
    fn options(&self) -> Result<ConvertOptions> {
        let mut options = if self.no_size_limit {
            ConvertOptions::unbounded()
        } else {
            ConvertOptions::default()
        };

        options.format = match self.format {
            Some(format) => format.into(),
            None => OutputFormat::from_path(&self.output).unwrap_or(OutputFormat::Webp),
        };
        options.frame_size = FrameSize::new(self.width, self.height);
        options.search.quality_ceiling = self.quality;
        if let Some(max_frames) = self.max_frames {
            options.search.max_frame_cap = max_frames;
        }
        if self.no_preserve_timing {
            options.search.timing = Timing::Fixed(self.fps);
        }

        let size_target = SizeTargetRange::from_cap_kib(self.size_cap_kb, self.window_kb);
        if size_target.is_valid() {
            options.search.size_target = size_target;
        } else if !self.no_size_limit {
            bail!(
                "size cap of {} KiB leaves an empty size window",
                self.size_cap_kb
            );
        }

        Ok(options)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Webp,
    Gif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Webp => OutputFormat::Webp,
            FormatArg::Gif => OutputFormat::Gif,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Convert(args) => {
            let options = args.options()?;
            convert_video(&args.input, &args.output, options, args.json)?
        }

        Commands::Info { file, json } => show_info(&file, json)?,
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().filter_or("RUST_LOG", default_filter);
    env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn convert_video(input: &Path, output: &Path, options: ConvertOptions, json: bool) -> Result<()> {
    info!("Converting {} to {}", input.display(), output.display());

    let converter = Converter::new(options);
    let report = converter
        .convert(input, output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
        return Ok(());
    }

    print_report(&report);

    // Read the file back so the summary reflects what was written
    let written = vidweb_decoder::inspect_file(output)
        .with_context(|| format!("Failed to inspect {}", output.display()))?;
    print_info(&written);

    Ok(())
}

fn show_info(file: &Path, json: bool) -> Result<()> {
    let info = vidweb_decoder::inspect_file(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialise image info")?
        );
    } else {
        println!("File: {}", file.display());
        print_info(&info);
    }

    Ok(())
}

fn print_report(report: &ConversionReport) {
    println!("\n=== Conversion ===");
    println!(
        "Source: {} frames over {:.2}s",
        report.source_frames, report.source_duration
    );
    println!(
        "Output: {} frames, quality {}, {:.2} fps",
        report.frame_count, report.quality, report.fps
    );
    println!("Size: {:.2} KiB", report.size as f64 / 1024.0);
    match &report.search {
        Some(search) => println!(
            "Search: stage {} ({:?}) after {} encodes",
            search.stage,
            search.fit,
            search.trials.len()
        ),
        None => println!("Search: disabled"),
    }
    println!("Time: {:.2}s", report.elapsed_secs);
}

fn print_info(info: &ImageInfo) {
    println!("\n=== Image Info ===");
    println!("Format: {:?}", info.format);
    println!("Canvas: {}x{}", info.width, info.height);
    println!("Frames: {}", info.frame_count);
    println!("Duration: {} ms", info.duration_ms);
    if let Some(fps) = info.fps() {
        println!("Frame rate: {:.2} fps", fps);
    }
    if let Some(loops) = info.loop_count {
        if loops == 0 {
            println!("Loops: forever");
        } else {
            println!("Loops: {}", loops);
        }
    }
    println!("File size: {} bytes", info.size_bytes);
}
