use serde::Deserialize;
use std::collections::BTreeMap;

/// TOML-deserializable config file. All fields are Option for layered merging.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub scan: ScanFileConfig,
    #[serde(default)]
    pub output: OutputFileConfig,
    #[serde(default)]
    pub limits: LimitsFileConfig,
    #[serde(default)]
    pub drip_list: DripListFileConfig,
    #[serde(default)]
    pub resolver: ResolverFileConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScanFileConfig {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub include_tests: Option<bool>,
    pub workers: Option<usize>,
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputFileConfig {
    pub format: Option<String>,
    pub quiet: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LimitsFileConfig {
    pub max_tree_depth: Option<usize>,
    pub max_imports_per_file: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DripListFileConfig {
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResolverFileConfig {
    /// `"@/*" = ["src/*"]`
    #[serde(default)]
    pub js_aliases: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub solidity_remappings: BTreeMap<String, String>,
    pub solidity_src_path: Option<String>,
    pub go_module_path: Option<String>,
}

impl FileConfig {
    /// Load from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
