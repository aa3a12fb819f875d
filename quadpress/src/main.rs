use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use quadpress_core::logging::{init_logging, LogConfig};
use quadpress_core::{
    AppError, CompressionReport, CompressionSession, FileSize, MetricKind, Stage,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "quadpress")]
#[command(version, about = "Quadtree-based lossy image compressor", long_about = None)]
struct Cli {
    /// Input image (.png .jpg .jpeg .bmp .hdr .tga)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image; extension must match the input format
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Error metric deciding when a block is uniform enough
    #[arg(short, long, value_enum, default_value = "var")]
    metric: MetricArg,

    /// Explicit error threshold (in the selected metric's range)
    #[arg(short, long, conflicts_with = "target", required_unless_present = "target")]
    threshold: Option<f64>,

    /// Target size reduction as a fraction of the original, in [0, 1].
    /// A threshold achieving it is found by binary search.
    #[arg(long)]
    target: Option<f64>,

    /// Minimum leaf block area in pixels
    #[arg(long, default_value_t = 16)]
    min_block_size: u32,

    /// Also write the refinement animation to this .gif path
    #[arg(long, value_name = "GIF")]
    gif: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "human")]
    report: ReportFormat,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    /// Color variance, range [0, 16256.25]
    Var,
    /// Mean absolute deviation, range [0, 127.5]
    Mad,
    /// Maximum pixel difference, range [0, 255]
    Mpd,
    /// Shannon entropy of the luminance histogram, range [0, 8]
    Ent,
    /// Structural similarity, range [0, 1] (higher = stricter)
    Sim,
}

impl From<MetricArg> for MetricKind {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Var => MetricKind::Variance,
            MetricArg::Mad => MetricKind::MeanAbsoluteDeviation,
            MetricArg::Mpd => MetricKind::MaximumPixelDifference,
            MetricArg::Ent => MetricKind::Entropy,
            MetricArg::Sim => MetricKind::StructuralSimilarity,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Human-readable summary
    Human,
    /// JSON (for scripting)
    Json,
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏✓"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn configure(cli: &Cli) -> Result<CompressionSession, AppError> {
    let mut session = CompressionSession::new();
    session.set_input_path(&cli.input)?;
    session.set_metric(cli.metric.into());
    session.set_min_block_size(cli.min_block_size)?;
    match (cli.threshold, cli.target) {
        (Some(t), _) => session.set_threshold(t)?,
        (None, Some(fraction)) => session.set_target_compression(fraction)?,
        (None, None) => unreachable!("clap requires one of --threshold/--target"),
    }
    session.set_output_path(&cli.output)?;
    session.set_gif_output_path(cli.gif.as_deref())?;
    Ok(session)
}

fn print_human_report(report: &CompressionReport) {
    let original = FileSize::new(report.original_size);
    let compressed = FileSize::new(report.compressed_size);
    let delta = if report.compression_percentage >= 0.0 {
        style(format!("-{:.1}%", report.compression_percentage)).green()
    } else {
        style(format!("+{:.1}%", -report.compression_percentage)).red()
    };

    println!();
    println!("  {}", style("Compression complete").bold());
    println!("  {} → {} ({})", original, compressed, delta);
    println!(
        "  Metric {} at threshold {:.6}{}",
        style(&report.metric).cyan(),
        report.threshold,
        report
            .tuner_iterations
            .map(|n| format!(" (found in {} iterations)", n))
            .unwrap_or_default()
    );
    println!(
        "  Quadtree: depth {}, {} nodes",
        report.quadtree_depth, report.quadtree_node_count
    );
    println!("  Saved: {}", report.output_path.display());
    if let Some(gif) = &report.gif_output_path {
        println!("  Animation: {}", gif.display());
    }
    println!("  Elapsed: {:.2}s", report.elapsed_secs);
}

fn run(cli: &Cli) -> Result<CompressionReport, AppError> {
    let session = configure(cli)?;

    let spinner = create_spinner();
    let report = session.run(|stage| {
        tracing::info!(stage = %stage, "Stage started");
        if stage == Stage::Finished {
            spinner.finish_and_clear();
        } else {
            spinner.set_message(format!("{}...", stage));
        }
    });
    if report.is_err() {
        spinner.finish_and_clear();
    }
    report
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    if let Err(e) = init_logging("quadpress", LogConfig::new().with_level(level)) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted, exiting");
        std::process::exit(130);
    })
    .expect("Failed to install Ctrl-C handler");

    match run(&cli) {
        Ok(report) => match cli.report {
            ReportFormat::Human => print_human_report(&report),
            ReportFormat::Json => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("❌ Failed to serialize report: {}", e);
                    std::process::exit(1);
                }
            },
        },
        Err(e) => {
            tracing::error!(error = %e, "Compression failed");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
