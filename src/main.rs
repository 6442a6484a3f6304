// src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use rtpack_converter::{
    config::{Config, Verbosity},
    convert::{collect_inputs, convert_all, summary_line},
};

// Logging
use clap::Parser;
use log::{error, info, warn};

/// Convert RTPACK / RTTXTR / RTFONT game assets to PNG.
///
/// Paths may be files or directories. Directories are scanned (not
/// recursively) for .rttex and .rtfont files.
#[derive(Debug, Parser)]
#[command(name = "rtpack-converter", version)]
struct Cli {
    /// Files or directories to convert.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Write outputs here instead of next to each input.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of files to convert in parallel.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Log header fields and decoding steps, even in batch runs.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Also write `<name>.json` with font metrics and tables.
    #[arg(long)]
    metadata: bool,

    /// Also write the inflated payload of compressed packs.
    #[arg(long)]
    dump_decompressed: bool,

    /// Do not write per-glyph images for fonts.
    #[arg(long)]
    no_glyphs: bool,

    /// JSON config file. Command-line flags take precedence.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Layers command-line flags on top of `config`.
    fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if let Some(jobs) = self.jobs {
            config.batch.jobs = jobs.max(1);
        }
        if self.verbose {
            config.logging.verbosity = Some(Verbosity::Verbose);
        } else if self.quiet {
            config.logging.verbosity = Some(Verbosity::Quiet);
        }
        config.output.write_metadata |= self.metadata;
        config.output.dump_decompressed |= self.dump_decompressed;
        if self.no_glyphs {
            config.output.extract_glyphs = false;
        }
    }
}

/// Main entry point for the `rtpack-converter` application.
fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // --- Configuration ---
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply_to(&mut config);

    let inputs = collect_inputs(&cli.paths, &config.batch.extensions);

    // Initialize the logger. RUST_LOG, if set, wins over the configured verbosity.
    let verbosity = config.logging.effective_verbosity(inputs.len());
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.default_filter()),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    info!("================ RTPack Converter =================");
    if inputs.is_empty() {
        warn!("No .rttex or .rtfont files found in the given paths.");
        return Ok(ExitCode::from(2));
    }

    let total = inputs.len();
    let summary = convert_all(inputs, &config);
    if !summary.failed.is_empty() {
        error!(
            "{} of {} file(s) could not be converted.",
            summary.failed.len(),
            total
        );
    }
    info!("{}", summary_line(&summary));

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
