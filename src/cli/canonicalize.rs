use crate::drip::canonicalize;
use crate::errors::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct CanonicalizeArgs {
    /// Repository URL in any common spelling
    pub url: String,
}

pub fn run(args: &CanonicalizeArgs) -> Result<()> {
    println!("{}", canonicalize(&args.url)?);
    Ok(())
}
