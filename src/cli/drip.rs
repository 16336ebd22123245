use crate::config::resolve::{resolve_config, CliOverrides};
use crate::drip::{self, DependencyItem};
use crate::errors::{GardenerError, Result};
use crate::output::OutputFormat;
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct DripListArgs {
    /// JSON array of scored dependencies, or `-` for stdin
    pub items: PathBuf,

    /// Maximum number of entries (1-200)
    #[arg(long)]
    pub max_length: Option<usize>,

    /// URL of the analyzed repository; matching dependencies are dropped
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Output format
    #[arg(long)]
    pub format: Option<OutputFormat>,
}

fn read_items(path: &Path) -> Result<Vec<DependencyItem>> {
    let mut raw = String::new();
    if path == Path::new("-") {
        std::io::stdin().read_to_string(&mut raw)?;
    } else {
        raw = std::fs::read_to_string(path)?;
    }
    Ok(serde_json::from_str(&raw)?)
}

pub fn run(args: &DripListArgs) -> Result<()> {
    let working_dir = std::env::current_dir().map_err(GardenerError::Io)?;
    let overrides = CliOverrides {
        format: args.format,
        max_length: args.max_length,
        ..Default::default()
    };
    let config = resolve_config(&working_dir, &overrides)?;

    let items = read_items(&args.items)?;
    tracing::debug!("Read {} dependency items", items.len());
    let entries = drip::build(&items, config.max_length, args.repo_url.as_deref());

    let mut stdout = std::io::stdout();
    match config.format {
        OutputFormat::Json => {
            crate::output::json::write_drip_json(&mut stdout, &entries, config.max_length)?
        }
        OutputFormat::Text => {
            crate::output::text::write_drip_text(&mut stdout, &entries, config.max_length)?
        }
    }
    Ok(())
}
