use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum GardenerError {
    #[error("Could not determine host from URL: {url}")]
    #[diagnostic(code(gardener::invalid_url))]
    InvalidUrl { url: String },

    #[error("No source files found in {path}")]
    #[diagnostic(code(gardener::no_files))]
    NoFiles { path: PathBuf },

    #[error("Parse error in {file}: {message}")]
    #[diagnostic(code(gardener::parse))]
    Parse { file: PathBuf, message: String },

    #[error("Could not load the {language} grammar: {message}")]
    #[diagnostic(code(gardener::grammar))]
    Grammar { language: String, message: String },

    #[error("Scan was cancelled; partial results were discarded")]
    #[diagnostic(code(gardener::cancelled))]
    Cancelled,

    #[error("Configuration error: {0}")]
    #[diagnostic(code(gardener::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(gardener::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(gardener::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(gardener::toml))]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(gardener::glob))]
    Glob(#[from] globset::Error),
}

pub type Result<T> = std::result::Result<T, GardenerError>;
