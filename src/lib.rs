pub mod cli;
pub mod config;
pub mod drip;
pub mod errors;
pub mod output;
pub mod parse;
pub mod resolve;
pub mod scan;
pub mod walk;
