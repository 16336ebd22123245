use std::collections::BTreeMap;
use std::path::PathBuf;

/// Layer a configuration value was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Default,
    UserConfig(PathBuf),
    ProjectConfig(PathBuf),
    EnvVar(String),
    CliFlag(String),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Default => write!(f, "default"),
            Source::UserConfig(path) => write!(f, "user config ({})", path.display()),
            Source::ProjectConfig(path) => write!(f, "project config ({})", path.display()),
            Source::EnvVar(name) => write!(f, "env var ({name})"),
            Source::CliFlag(name) => write!(f, "CLI flag ({name})"),
        }
    }
}

/// Source of each resolved setting, by dotted key (`scan.workers`).
#[derive(Debug, Clone, Default)]
pub struct ProvenanceMap {
    entries: BTreeMap<String, Source>,
}

impl ProvenanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, source: Source) {
        self.entries.insert(key.into(), source);
    }

    pub fn get(&self, key: &str) -> Option<&Source> {
        self.entries.get(key)
    }

    pub fn sorted_entries(&self) -> Vec<(&str, &Source)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    /// Entries of one `[section]`.
    pub fn section(&self, section: &str) -> Vec<(&str, &Source)> {
        let prefix = format!("{section}.");
        self.entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_replace_earlier_ones() {
        let mut map = ProvenanceMap::new();
        map.set("drip_list.max_length", Source::Default);
        map.set(
            "drip_list.max_length",
            Source::ProjectConfig(PathBuf::from("/repo/.gardener.toml")),
        );
        assert_eq!(
            map.get("drip_list.max_length"),
            Some(&Source::ProjectConfig(PathBuf::from("/repo/.gardener.toml")))
        );
        assert_eq!(map.get("nonexistent"), None);
    }

    #[test]
    fn sections_match_whole_names() {
        let mut map = ProvenanceMap::new();
        map.set("scan.workers", Source::Default);
        map.set("scan.include", Source::Default);
        map.set("scan_extra.flag", Source::Default);
        map.set("limits.max_tree_depth", Source::Default);

        let keys: Vec<&str> = map.section("scan").into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["scan.include", "scan.workers"]);
    }

    #[test]
    fn display_sources() {
        assert_eq!(Source::Default.to_string(), "default");
        assert_eq!(
            Source::EnvVar("GARDENER_WORKERS".to_string()).to_string(),
            "env var (GARDENER_WORKERS)"
        );
        assert_eq!(
            Source::CliFlag("--max-length".to_string()).to_string(),
            "CLI flag (--max-length)"
        );
    }
}
