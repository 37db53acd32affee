//! pdfsqueeze CLI - shrink PDFs to a target size

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsqueeze::{
    default_output_name, CompressOptions, CompressionOutcome, Compressor, PdftoppmRasterizer,
};

#[derive(Parser)]
#[command(name = "pdfsqueeze")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Shrink PDFs to a target size by re-rendering their pages", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (defaults to <name>_compressed.pdf)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Target size in KB
    #[arg(long, env = "PDFSQUEEZE_TARGET_KB", default_value = "100")]
    target_kb: u32,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a PDF to a target size
    #[command(alias = "c")]
    Compress {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to <name>_compressed.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,

        /// Print the compression report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show page classification and the planned strategy
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target size in KB
        #[arg(long, env = "PDFSQUEEZE_TARGET_KB", default_value = "100")]
        target_kb: u32,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct Tuning {
    /// Target size in KB
    #[arg(long, env = "PDFSQUEEZE_TARGET_KB", default_value = "100")]
    target_kb: u32,

    /// Transcode pages on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Worker thread count
    #[arg(long, conflicts_with = "sequential")]
    threads: Option<usize>,

    /// Path to the pdftoppm binary
    #[arg(long, value_name = "PATH")]
    pdftoppm: Option<PathBuf>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            target_kb: 100,
            sequential: false,
            threads: None,
            pdftoppm: None,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Some(Commands::Compress {
            input,
            output,
            tuning,
            json,
        }) => cmd_compress(&input, output.as_deref(), &tuning, json),
        Some(Commands::Info { input, target_kb }) => cmd_info(&input, target_kb),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: compress if input is provided
            if let Some(input) = cli.input {
                let tuning = Tuning {
                    target_kb: cli.target_kb,
                    ..Tuning::default()
                };
                cmd_compress(&input, cli.output.as_deref(), &tuning, false)
            } else {
                println!("{}", "Usage: pdfsqueeze <FILE> [OUTPUT] [--target-kb N]".yellow());
                println!("       pdfsqueeze --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_compressor(tuning: &Tuning) -> pdfsqueeze::Result<Compressor> {
    let mut options = CompressOptions::new().with_parallel(!tuning.sequential);
    if let Some(threads) = tuning.threads {
        options = options.with_threads(threads);
    }

    let rasterizer = match &tuning.pdftoppm {
        Some(program) => PdftoppmRasterizer::with_program(program),
        None => PdftoppmRasterizer::new(),
    };
    if !rasterizer.is_available() {
        log::warn!(
            "{} was not found; rendering will fail",
            rasterizer.program().display()
        );
    }

    Ok(Compressor::new(options)?.with_rasterizer(std::sync::Arc::new(rasterizer)))
}

fn cmd_compress(
    input: &Path,
    output: Option<&Path>,
    tuning: &Tuning,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output_name(input));

    let data = fs::read(input)?;
    let compressor = build_compressor(tuning)?;

    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Compressing {}...", input.display()));

    let outcome = compressor.compress(&data, tuning.target_kb);
    pb.finish_and_clear();
    let outcome = outcome?;

    fs::write(&output, outcome.bytes())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(input, &output, &outcome);
    }

    Ok(())
}

fn print_summary(input: &Path, output: &Path, outcome: &CompressionOutcome) {
    println!("{}", "Compression Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Input".bold(), input.display());
    println!("{}: {}", "Original".bold(), format_size(outcome.original_size));
    println!("{}: {}", "Target".bold(), outcome.target);
    println!(
        "{}: {} ({:.1}%)",
        "Result".bold(),
        format_size(outcome.output_size),
        outcome.ratio() * 100.0
    );
    println!("{}: {}", "Mode".bold(), outcome.strategy);

    match (&outcome.tier, &outcome.reason) {
        (Some(tier), Some(reason)) => println!("{}: {} ({})", "Tier".bold(), tier, reason),
        _ if outcome.kept_original => println!(
            "{}: {}",
            "Tier".bold(),
            "none smaller than the original".yellow()
        ),
        _ => println!("{}: {}", "Tier".bold(), "unchanged".dimmed()),
    }

    if !outcome.trials.is_empty() {
        println!();
        println!("{}", "Trials".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        let last = outcome.trials.len() - 1;
        for (i, trial) in outcome.trials.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            match (trial.size, &trial.error) {
                (Some(size), _) => {
                    println!("  {} [{}] {}", branch.dimmed(), trial.tier, format_size(size))
                }
                (None, Some(error)) => {
                    println!("  {} [{}] {}", branch.dimmed(), trial.tier, error.red())
                }
                (None, None) => println!("  {} [{}]", branch.dimmed(), trial.tier),
            }
        }
    }

    println!();
    if outcome.met_target() {
        println!("{} {}", "Saved to".green(), output.display());
    } else {
        println!(
            "{} {} {}",
            "Saved to".yellow(),
            output.display(),
            "(target not reached)".yellow()
        );
    }
}

fn cmd_info(input: &Path, target_kb: u32) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let compressor = Compressor::new(CompressOptions::new().sequential())?;
    let plan = compressor.plan(&data, target_kb)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), plan.version);
    println!("{}: {}", "Size".bold(), format_size(plan.original_size));
    println!("{}: {}", "Pages".bold(), plan.page_count);
    println!(
        "{}: {} image-heavy, {} text-like",
        "Classification".bold(),
        plan.image_heavy_pages(),
        plan.page_count - plan.image_heavy_pages()
    );

    println!();
    println!("{}", "Plan".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Target".bold(), plan.target);
    println!("{}: {}", "Mode".bold(), plan.strategy);

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (i, class) in plan.classifications.iter().enumerate() {
        println!("  {:>4}  {}", i + 1, class);
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn cmd_version() {
    println!("{} {}", "pdfsqueeze".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Size-targeted PDF compression tool");
    println!();
    println!("Renderer: {}", "pdftoppm (poppler-utils)".dimmed());
    println!("License: MIT");
}
