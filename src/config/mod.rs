pub mod provenance;
pub mod resolve;
pub mod schema;
pub mod show;

use crate::drip::MAX_DRIP_LIST_LENGTH;
use crate::output::OutputFormat;
use crate::parse::ExtractLimits;
use crate::resolve::IndexSettings;
use crate::scan::{ScanOptions, DEFAULT_MAX_FILE_SIZE};
use crate::walk::Language;
use provenance::ProvenanceMap;
use std::path::PathBuf;

/// Default number of drip list entries.
pub const DEFAULT_MAX_LENGTH: usize = MAX_DRIP_LIST_LENGTH;

/// Fully resolved configuration: every layer applied, nothing optional.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    // Scan
    pub languages: Vec<Language>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_tests: bool,
    pub workers: usize,
    pub max_file_size: u64,

    // Output
    pub format: OutputFormat,
    pub quiet: bool,

    pub limits: ExtractLimits,
    pub max_length: usize,
    pub resolver: IndexSettings,

    pub provenance: ProvenanceMap,
    pub loaded_files: Vec<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            include_tests: false,
            workers: 0,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            format: OutputFormat::default(),
            quiet: false,
            limits: ExtractLimits::default(),
            max_length: DEFAULT_MAX_LENGTH,
            resolver: IndexSettings::default(),
            provenance: ProvenanceMap::new(),
            loaded_files: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            languages: self.languages.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            include_tests: self.include_tests,
            workers: self.workers,
            max_file_size: self.max_file_size,
            limits: self.limits,
            index_settings: self.resolver.clone(),
            show_progress: !self.quiet,
        }
    }
}
