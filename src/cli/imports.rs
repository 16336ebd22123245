use crate::config::resolve::{resolve_config, CliOverrides};
use crate::errors::{GardenerError, Result};
use crate::output::OutputFormat;
use crate::scan::{scan_repository, CancelToken};
use crate::walk::Language;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportsArgs {
    /// Repository to scan
    pub path: PathBuf,

    /// Language to scan (repeatable; default: auto-detect)
    #[arg(long, value_parser = super::parse_language)]
    pub lang: Vec<Language>,

    /// Include glob patterns
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude glob patterns
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Include test files (Go: *_test.go)
    #[arg(long)]
    pub include_tests: bool,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Output format
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}

pub fn run(args: &ImportsArgs) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .map_err(|_| GardenerError::NoFiles {
            path: args.path.clone(),
        })?;

    let overrides = CliOverrides {
        languages: args.lang.clone(),
        format: args.format,
        quiet: args.quiet,
        include: args.include.clone(),
        exclude: args.exclude.clone(),
        include_tests: args.include_tests,
        workers: args.workers,
        max_file_size: args.max_file_size,
        max_length: None,
    };
    let config = resolve_config(&root, &overrides)?;

    let report = scan_repository(&root, &config.scan_options(), &CancelToken::new(), None)?;

    let mut stdout = std::io::stdout();
    match config.format {
        OutputFormat::Json => crate::output::json::write_scan_json(&mut stdout, &report)?,
        OutputFormat::Text => crate::output::text::write_scan_text(&mut stdout, &report)?,
    }

    if !config.quiet {
        eprintln!(
            "Scanned {} files ({} skipped) in {:.2}s",
            report.files_parsed,
            report.files_skipped,
            report.elapsed_ms as f64 / 1000.0
        );
    }

    Ok(())
}
