use crate::config::provenance::{ProvenanceMap, Source};
use crate::config::schema::FileConfig;
use crate::config::ResolvedConfig;
use crate::drip::MAX_DRIP_LIST_LENGTH;
use crate::errors::{GardenerError, Result};
use crate::output::OutputFormat;
use crate::walk::Language;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_FILE: &str = ".gardener.toml";

/// CLI overrides extracted from command arguments.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub languages: Vec<Language>,
    pub format: Option<OutputFormat>,
    pub quiet: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_tests: bool,
    pub workers: Option<usize>,
    pub max_file_size: Option<u64>,
    pub max_length: Option<usize>,
}

/// Resolve configuration by applying layers bottom-up:
/// 1. Built-in defaults
/// 2. User config (~/.config/gardener/config.toml)
/// 3. Project config (nearest .gardener.toml walking up from working_dir)
/// 4. Environment variables
/// 5. CLI overrides
pub fn resolve_config(working_dir: &Path, cli: &CliOverrides) -> Result<ResolvedConfig> {
    resolve_layers(working_dir, find_user_config().as_deref(), cli, |key| {
        std::env::var(key).ok()
    })
}

/// [`resolve_config`] with the user config path and environment supplied.
pub fn resolve_layers(
    working_dir: &Path,
    user_config: Option<&Path>,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::default();
    let mut prov = ProvenanceMap::new();
    set_all_default_provenance(&mut prov);

    if let Some(path) = user_config.filter(|p| p.exists()) {
        let file = load_file(path, "user")?;
        apply_file_config(&mut config, &file, Source::UserConfig(path.to_path_buf()), &mut prov)?;
        config.loaded_files.push(path.to_path_buf());
    }

    if let Some(path) = find_project_config(working_dir) {
        let file = load_file(&path, "project")?;
        apply_file_config(&mut config, &file, Source::ProjectConfig(path.clone()), &mut prov)?;
        config.loaded_files.push(path);
    }

    apply_env_vars(&mut config, &env, &mut prov);
    apply_cli_overrides(&mut config, cli, &mut prov);
    validate(&mut config)?;

    config.provenance = prov;
    Ok(config)
}

fn find_user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gardener").join("config.toml"))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

fn load_file(path: &Path, kind: &str) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        GardenerError::Config(format!("Could not read {kind} config: {}", path.display()))
    })?;
    FileConfig::from_toml(&content).map_err(|e| {
        GardenerError::Config(format!("Invalid {kind} config {}: {e}", path.display()))
    })
}

fn set_all_default_provenance(prov: &mut ProvenanceMap) {
    let defaults = [
        "scan.languages",
        "scan.include",
        "scan.exclude",
        "scan.include_tests",
        "scan.workers",
        "scan.max_file_size",
        "output.format",
        "output.quiet",
        "limits.max_tree_depth",
        "limits.max_imports_per_file",
        "drip_list.max_length",
        "resolver.js_aliases",
        "resolver.solidity_remappings",
        "resolver.solidity_src_path",
        "resolver.go_module_path",
    ];
    for key in defaults {
        prov.set(key, Source::Default);
    }
}

fn parse_languages(values: &[String]) -> std::result::Result<Vec<Language>, String> {
    values.iter().map(|v| v.trim().parse::<Language>()).collect()
}

fn apply_file_config(
    config: &mut ResolvedConfig,
    file: &FileConfig,
    source: Source,
    prov: &mut ProvenanceMap,
) -> Result<()> {
    // Scan
    if !file.scan.languages.is_empty() {
        config.languages = parse_languages(&file.scan.languages)
            .map_err(|e| GardenerError::Config(format!("{e} (in {source})")))?;
        prov.set("scan.languages", source.clone());
    }
    if !file.scan.include.is_empty() {
        config.include = file.scan.include.clone();
        prov.set("scan.include", source.clone());
    }
    if !file.scan.exclude.is_empty() {
        config.exclude = file.scan.exclude.clone();
        prov.set("scan.exclude", source.clone());
    }
    if let Some(include_tests) = file.scan.include_tests {
        config.include_tests = include_tests;
        prov.set("scan.include_tests", source.clone());
    }
    if let Some(workers) = file.scan.workers {
        config.workers = workers;
        prov.set("scan.workers", source.clone());
    }
    if let Some(max_file_size) = file.scan.max_file_size {
        config.max_file_size = max_file_size;
        prov.set("scan.max_file_size", source.clone());
    }

    // Output
    if let Some(ref format) = file.output.format {
        config.format = format
            .parse()
            .map_err(|e| GardenerError::Config(format!("{e} (in {source})")))?;
        prov.set("output.format", source.clone());
    }
    if let Some(quiet) = file.output.quiet {
        config.quiet = quiet;
        prov.set("output.quiet", source.clone());
    }

    // Limits
    if let Some(depth) = file.limits.max_tree_depth {
        config.limits.max_tree_depth = depth;
        prov.set("limits.max_tree_depth", source.clone());
    }
    if let Some(max_imports) = file.limits.max_imports_per_file {
        config.limits.max_imports_per_file = max_imports;
        prov.set("limits.max_imports_per_file", source.clone());
    }

    // Drip list
    if let Some(max_length) = file.drip_list.max_length {
        config.max_length = max_length;
        prov.set("drip_list.max_length", source.clone());
    }

    // Resolver: maps merge key by key, later layers win
    if !file.resolver.js_aliases.is_empty() {
        config
            .resolver
            .js_aliases
            .extend(file.resolver.js_aliases.clone());
        prov.set("resolver.js_aliases", source.clone());
    }
    if !file.resolver.solidity_remappings.is_empty() {
        config
            .resolver
            .solidity_remappings
            .extend(file.resolver.solidity_remappings.clone());
        prov.set("resolver.solidity_remappings", source.clone());
    }
    if let Some(ref src) = file.resolver.solidity_src_path {
        config.resolver.solidity_src_path = Some(src.trim_matches('/').to_string());
        prov.set("resolver.solidity_src_path", source.clone());
    }
    if let Some(ref module) = file.resolver.go_module_path {
        config.resolver.go_module_path = Some(module.clone());
        prov.set("resolver.go_module_path", source);
    }

    Ok(())
}

fn apply_env_vars(
    config: &mut ResolvedConfig,
    env: &impl Fn(&str) -> Option<String>,
    prov: &mut ProvenanceMap,
) {
    if let Some(val) = env("GARDENER_LANG") {
        let values: Vec<String> = val.split(',').map(str::to_string).collect();
        match parse_languages(&values) {
            Ok(languages) => {
                config.languages = languages;
                prov.set("scan.languages", Source::EnvVar("GARDENER_LANG".into()));
            }
            Err(e) => tracing::warn!("Ignoring GARDENER_LANG: {e}"),
        }
    }
    if let Some(val) = env("GARDENER_WORKERS") {
        match val.trim().parse::<usize>() {
            Ok(n) => {
                config.workers = n;
                prov.set("scan.workers", Source::EnvVar("GARDENER_WORKERS".into()));
            }
            Err(e) => tracing::warn!("Ignoring GARDENER_WORKERS={val}: {e}"),
        }
    }
    if let Some(val) = env("GARDENER_MAX_LENGTH") {
        match val.trim().parse::<usize>() {
            Ok(n) => {
                config.max_length = n;
                prov.set(
                    "drip_list.max_length",
                    Source::EnvVar("GARDENER_MAX_LENGTH".into()),
                );
            }
            Err(e) => tracing::warn!("Ignoring GARDENER_MAX_LENGTH={val}: {e}"),
        }
    }
    if let Some(val) = env("GARDENER_MAX_FILE_SIZE") {
        match val.trim().parse::<u64>() {
            Ok(n) => {
                config.max_file_size = n;
                prov.set(
                    "scan.max_file_size",
                    Source::EnvVar("GARDENER_MAX_FILE_SIZE".into()),
                );
            }
            Err(e) => tracing::warn!("Ignoring GARDENER_MAX_FILE_SIZE={val}: {e}"),
        }
    }
}

fn apply_cli_overrides(config: &mut ResolvedConfig, cli: &CliOverrides, prov: &mut ProvenanceMap) {
    if !cli.languages.is_empty() {
        config.languages = cli.languages.clone();
        prov.set("scan.languages", Source::CliFlag("--lang".into()));
    }
    if let Some(format) = cli.format {
        config.format = format;
        prov.set("output.format", Source::CliFlag("--format".into()));
    }
    if cli.quiet {
        config.quiet = true;
        prov.set("output.quiet", Source::CliFlag("--quiet".into()));
    }
    if !cli.include.is_empty() {
        config.include = cli.include.clone();
        prov.set("scan.include", Source::CliFlag("--include".into()));
    }
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
        prov.set("scan.exclude", Source::CliFlag("--exclude".into()));
    }
    if cli.include_tests {
        config.include_tests = true;
        prov.set("scan.include_tests", Source::CliFlag("--include-tests".into()));
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
        prov.set("scan.workers", Source::CliFlag("--workers".into()));
    }
    if let Some(max_file_size) = cli.max_file_size {
        config.max_file_size = max_file_size;
        prov.set("scan.max_file_size", Source::CliFlag("--max-file-size".into()));
    }
    if let Some(max_length) = cli.max_length {
        config.max_length = max_length;
        prov.set("drip_list.max_length", Source::CliFlag("--max-length".into()));
    }
}

fn validate(config: &mut ResolvedConfig) -> Result<()> {
    if config.max_length == 0 {
        return Err(GardenerError::Config(
            "drip_list.max_length must be at least 1".to_string(),
        ));
    }
    if config.max_length > MAX_DRIP_LIST_LENGTH {
        tracing::warn!(
            "drip_list.max_length {} exceeds {MAX_DRIP_LIST_LENGTH}; clamping",
            config.max_length
        );
        config.max_length = MAX_DRIP_LIST_LENGTH;
    }
    if config.limits.max_tree_depth == 0 || config.limits.max_imports_per_file == 0 {
        return Err(GardenerError::Config(
            "limits must be at least 1".to_string(),
        ));
    }
    Ok(())
}
