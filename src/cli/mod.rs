pub mod canonicalize;
pub mod config;
pub mod drip;
pub mod imports;

use crate::errors::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "gardener",
    version,
    about = "Polyglot import extraction and exact-percentage drip lists"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract and classify the imports of every source file in a repository
    Imports(imports::ImportsArgs),
    /// Turn scored dependencies into a drip list that sums to 100%
    DripList(drip::DripListArgs),
    /// Print the canonical host/owner/repo form of a repository URL
    Canonicalize(canonicalize::CanonicalizeArgs),
    /// Inspect resolved configuration
    Config(config::ConfigArgs),
}

/// Dispatch to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Imports(args) => imports::run(&args),
        Commands::DripList(args) => drip::run(&args),
        Commands::Canonicalize(args) => canonicalize::run(&args),
        Commands::Config(args) => config::run(&args),
    }
}

pub(crate) fn parse_language(s: &str) -> std::result::Result<crate::walk::Language, String> {
    s.parse()
}
