//! Read-only repository index used to resolve imports to local files.
//!
//! The index is built once, sequentially, before extraction starts. After
//! that it is shared immutably by every worker through [`LanguageResolver`]
//! views, one per language.

use super::paths::{ascend, join_segments, normalize_lexically, parent_dir};
use super::ImportResolver;
use crate::errors::Result;
use crate::walk::Language;
use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const JS_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "svelte", "vue", "json",
];

/// Resolution settings gathered from configuration and project metadata.
#[derive(Debug, Clone, Default)]
pub struct IndexSettings {
    /// tsconfig-style path aliases, e.g. `"@/*" -> ["src/*"]`.
    pub js_aliases: BTreeMap<String, Vec<String>>,
    /// Solidity import remappings, prefix to repo-relative target.
    pub solidity_remappings: BTreeMap<String, String>,
    /// Foundry source directory.
    pub solidity_src_path: Option<String>,
    /// Module path declared in `go.mod`.
    pub go_module_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FoundryToml {
    #[serde(default)]
    profile: BTreeMap<String, FoundryProfile>,
}

#[derive(Debug, Deserialize)]
struct FoundryProfile {
    src: Option<String>,
}

impl IndexSettings {
    /// Fill unset fields from project metadata under `root`.
    ///
    /// Reads `go.mod`, `remappings.txt` and `foundry.toml` when present.
    /// Values already set (from configuration) win over discovered ones.
    pub fn discover(mut self, root: &Path) -> Self {
        if self.go_module_path.is_none() {
            if let Ok(go_mod) = std::fs::read_to_string(root.join("go.mod")) {
                self.go_module_path = parse_go_module_path(&go_mod);
            }
        }

        if let Ok(remappings) = std::fs::read_to_string(root.join("remappings.txt")) {
            for (prefix, target) in parse_remappings(&remappings) {
                self.solidity_remappings.entry(prefix).or_insert(target);
            }
        }

        if self.solidity_src_path.is_none() {
            if let Ok(text) = std::fs::read_to_string(root.join("foundry.toml")) {
                match toml::from_str::<FoundryToml>(&text) {
                    Ok(foundry) => {
                        self.solidity_src_path = foundry
                            .profile
                            .get("default")
                            .and_then(|p| p.src.clone())
                            .map(|s| s.trim_matches('/').to_string());
                    }
                    Err(e) => tracing::debug!("Ignoring unreadable foundry.toml: {e}"),
                }
            }
        }

        self
    }
}

fn parse_go_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

fn parse_remappings(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (prefix, target) = line.split_once('=')?;
            // Drop an optional `context:` qualifier
            let prefix = prefix.rsplit(':').next().unwrap_or(prefix);
            Some((prefix.trim().to_string(), target.trim().to_string()))
        })
        .collect()
}

/// Immutable set of repo-relative file paths plus resolution settings.
#[derive(Debug, Clone, Default)]
pub struct RepoIndex {
    files: BTreeSet<PathBuf>,
    settings: IndexSettings,
}

impl RepoIndex {
    /// Index every non-ignored file under `root`.
    pub fn build(root: &Path, settings: IndexSettings) -> Result<Self> {
        let settings = settings.discover(root);
        let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();

        let mut files = BTreeSet::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry while indexing: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.insert(relative.to_path_buf());
            }
        }

        tracing::debug!("Indexed {} files under {}", files.len(), root.display());
        Ok(Self { files, settings })
    }

    /// Index an explicit set of repo-relative paths. No filesystem access.
    pub fn from_paths<I, P>(paths: I, settings: IndexSettings) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: paths.into_iter().map(Into::into).collect(),
            settings,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Hash of the file set and settings; changes whenever a lookup could.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for file in &self.files {
            hasher.update(file.to_string_lossy().as_bytes());
            hasher.update(&[0]);
        }
        // BTreeMap fields keep the debug form stable
        hasher.update(format!("{:?}", self.settings).as_bytes());
        hasher.finalize()
    }

    /// Resolver view applying `language`'s package conventions.
    pub fn for_language(&self, language: Language) -> LanguageResolver<'_> {
        LanguageResolver {
            index: self,
            language,
        }
    }

    fn first_existing(&self, candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
        candidates
            .into_iter()
            .filter_map(|c| normalize_lexically(&c))
            .find(|c| self.files.contains(c))
    }

    /// Base directory for a path-style relative specifier: `level == 1` is
    /// the importing file's directory, each extra level climbs one parent.
    fn relative_base(importing_file: &Path, level: usize) -> Option<PathBuf> {
        ascend(&parent_dir(importing_file), level.saturating_sub(1))
    }

    // --- Python ---

    fn resolve_python(&self, importing_file: &Path, module: &str, level: usize) -> Option<PathBuf> {
        let segments: Vec<&str> = module.split('.').filter(|s| !s.is_empty()).collect();
        let base = if level == 0 {
            if segments.is_empty() {
                return None;
            }
            PathBuf::new()
        } else {
            Self::relative_base(importing_file, level)?
        };

        if segments.is_empty() {
            return self.first_existing([base.join("__init__.py")]);
        }

        let target = join_segments(&base, segments);
        self.first_existing([target.with_extension("py"), target.join("__init__.py")])
    }

    // --- JavaScript / TypeScript ---

    fn resolve_js(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf> {
        if level == 0 {
            return self.resolve_js_alias(specifier);
        }
        let base = Self::relative_base(importing_file, level)?;
        let target = normalize_lexically(&base.join(specifier))?;
        self.resolve_js_target(&target)
    }

    fn resolve_js_target(&self, target: &Path) -> Option<PathBuf> {
        if self.files.contains(target) {
            return Some(target.to_path_buf());
        }

        let target_str = target.to_string_lossy();
        let with_ext = JS_EXTENSIONS
            .iter()
            .map(|ext| PathBuf::from(format!("{target_str}.{ext}")));
        if let Some(hit) = self.first_existing(with_ext) {
            return Some(hit);
        }

        let has_known_ext = target
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| JS_EXTENSIONS.contains(&e));
        if has_known_ext {
            return None;
        }
        self.first_existing(
            JS_EXTENSIONS
                .iter()
                .map(|ext| target.join(format!("index.{ext}"))),
        )
    }

    fn resolve_js_alias(&self, specifier: &str) -> Option<PathBuf> {
        for (pattern, targets) in &self.settings.js_aliases {
            let Some(captured) = match_alias(pattern, specifier) else {
                continue;
            };
            for template in targets {
                let resolved = match template.strip_suffix("/*") {
                    Some(base) if captured.is_empty() => base.to_string(),
                    Some(base) => format!("{base}/{captured}"),
                    None => match template.strip_suffix('*') {
                        Some(base) => format!("{base}{captured}"),
                        None => template.clone(),
                    },
                };
                let Some(target) = normalize_lexically(Path::new(resolved.trim_start_matches("./")))
                else {
                    continue;
                };
                if let Some(hit) = self.resolve_js_target(&target) {
                    return Some(hit);
                }
            }
        }
        None
    }

    // --- Go ---

    fn resolve_go(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf> {
        let package_dir = if level == 0 {
            let module_path = self.settings.go_module_path.as_deref()?;
            let rest = specifier.strip_prefix(module_path)?;
            if !(rest.is_empty() || rest.starts_with('/')) {
                return None;
            }
            normalize_lexically(Path::new(rest.trim_start_matches('/')))?
        } else {
            let base = Self::relative_base(importing_file, level)?;
            normalize_lexically(&base.join(specifier))?
        };

        let package_name = package_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut candidates = Vec::new();
        if !package_name.is_empty() {
            candidates.push(package_dir.with_extension("go"));
            candidates.push(package_dir.join(format!("{package_name}.go")));
        }
        if let Some(hit) = self.first_existing(candidates) {
            return Some(hit);
        }

        let in_dir: Vec<&PathBuf> = self
            .files
            .iter()
            .filter(|f| {
                parent_dir(f) == package_dir
                    && f.extension().is_some_and(|e| e == "go")
                    && !f.to_string_lossy().ends_with("_test.go")
            })
            .collect();
        match in_dir.as_slice() {
            [single] => Some((*single).clone()),
            [] => None,
            many => {
                tracing::debug!(
                    "Go import '{}' from {} is ambiguous: {} files in {}",
                    specifier,
                    importing_file.display(),
                    many.len(),
                    package_dir.display()
                );
                None
            }
        }
    }

    // --- Rust ---

    /// Directory holding the child modules of the module defined by `file`.
    fn rust_module_dir(file: &Path) -> PathBuf {
        let dir = parent_dir(file);
        match file.file_name().and_then(|n| n.to_str()) {
            Some("mod.rs" | "lib.rs" | "main.rs") => dir,
            _ => match file.file_stem() {
                Some(stem) => dir.join(stem),
                None => dir,
            },
        }
    }

    fn rust_crate_root(&self, importing_file: &Path) -> PathBuf {
        let mut dir = parent_dir(importing_file);
        loop {
            if self.files.contains(&dir.join("lib.rs")) || self.files.contains(&dir.join("main.rs"))
            {
                return dir;
            }
            if dir.as_os_str().is_empty() {
                return PathBuf::from("src");
            }
            dir = parent_dir(&dir);
        }
    }

    /// File defining the module whose children live in `dir`.
    fn rust_module_file(&self, dir: &Path) -> Option<PathBuf> {
        let mut candidates = vec![dir.join("lib.rs"), dir.join("main.rs"), dir.join("mod.rs")];
        if !dir.as_os_str().is_empty() {
            candidates.push(dir.with_extension("rs"));
        }
        self.first_existing(candidates)
    }

    fn rust_module_candidates(&self, base: &Path, segments: &[&str]) -> Option<PathBuf> {
        for len in (1..=segments.len()).rev() {
            let module = join_segments(base, segments[..len].iter().copied());
            if let Some(hit) = self.first_existing([module.with_extension("rs"), module.join("mod.rs")])
            {
                return Some(hit);
            }
        }
        None
    }

    fn resolve_rust(&self, importing_file: &Path, path: &str, level: usize) -> Option<PathBuf> {
        let segments: Vec<&str> = path
            .split("::")
            .filter(|s| !s.is_empty() && *s != "*")
            .collect();

        match level {
            0 => match segments.split_first() {
                Some((&"crate", rest)) => {
                    let root = self.rust_crate_root(importing_file);
                    if rest.is_empty() {
                        return self.rust_module_file(&root);
                    }
                    self.rust_module_candidates(&root, rest)
                }
                Some(_) => {
                    let module_dir = Self::rust_module_dir(importing_file);
                    self.rust_module_candidates(&module_dir, &segments).or_else(|| {
                        let dir = parent_dir(importing_file);
                        (dir != module_dir)
                            .then(|| self.rust_module_candidates(&dir, &segments))
                            .flatten()
                    })
                }
                None => None,
            },
            1 if segments.is_empty() => Some(importing_file.to_path_buf()),
            _ => {
                let base = ascend(&Self::rust_module_dir(importing_file), level - 1)?;
                if segments.is_empty() {
                    return self.rust_module_file(&base);
                }
                self.rust_module_candidates(&base, &segments)
            }
        }
    }

    // --- Solidity ---

    fn resolve_solidity(
        &self,
        importing_file: &Path,
        specifier: &str,
        level: usize,
    ) -> Option<PathBuf> {
        if level == 0 {
            let mut remappings: Vec<(&String, &String)> =
                self.settings.solidity_remappings.iter().collect();
            remappings.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
            for (prefix, target) in remappings {
                if let Some(rest) = specifier.strip_prefix(prefix.as_str()) {
                    let remapped = Path::new(target.trim_start_matches("./")).join(rest);
                    if let Some(hit) = self.first_existing([remapped]) {
                        return Some(hit);
                    }
                }
            }
            let mut candidates = vec![PathBuf::from(specifier)];
            if let Some(src) = &self.settings.solidity_src_path {
                candidates.push(Path::new(src).join(specifier));
            }
            return self.first_existing(candidates);
        }

        if !specifier.ends_with(".sol") {
            return None;
        }
        let base = Self::relative_base(importing_file, level)?;
        if let Some(hit) = self.first_existing([base.join(specifier)]) {
            return Some(hit);
        }

        // Foundry layouts sometimes import `../X.sol` from a file directly under src
        let src = self.settings.solidity_src_path.as_deref()?;
        if level == 2 && importing_file.starts_with(src) {
            return self.first_existing([Path::new(src).join(specifier)]);
        }
        None
    }
}

/// Match a tsconfig-style alias pattern; returns the text captured by `*`.
fn match_alias<'s>(pattern: &str, specifier: &'s str) -> Option<&'s str> {
    if let Some(prefix) = pattern.strip_suffix("/*") {
        if specifier == prefix {
            return Some("");
        }
        return specifier.strip_prefix(prefix)?.strip_prefix('/');
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return specifier.strip_prefix(prefix);
    }
    (pattern == specifier).then_some("")
}

/// [`RepoIndex`] view bound to one language's conventions.
#[derive(Debug, Clone, Copy)]
pub struct LanguageResolver<'a> {
    index: &'a RepoIndex,
    language: Language,
}

impl LanguageResolver<'_> {
    pub fn language(&self) -> Language {
        self.language
    }
}

impl ImportResolver for LanguageResolver<'_> {
    fn resolve(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf> {
        let index = self.index;
        let resolved = match self.language {
            Language::Python => index.resolve_python(importing_file, specifier, level),
            Language::JavaScript | Language::TypeScript => {
                index.resolve_js(importing_file, specifier, level)
            }
            Language::Go => index.resolve_go(importing_file, specifier, level),
            Language::Rust => index.resolve_rust(importing_file, specifier, level),
            Language::Solidity => index.resolve_solidity(importing_file, specifier, level),
        };
        if resolved.is_none() && level > 0 {
            tracing::debug!(
                "No local target for '{}' (level {}) from {}",
                specifier,
                level,
                importing_file.display()
            );
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(index: &RepoIndex, lang: Language, from: &str, specifier: &str, level: usize) -> Option<String> {
        index
            .for_language(lang)
            .resolve(Path::new(from), specifier, level)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
    }

    #[test]
    fn python_modules_packages_and_levels() {
        let index = RepoIndex::from_paths(
            [
                "main.py",
                "utils.py",
                "models/__init__.py",
                "models/user.py",
                "services/api.py",
            ],
            IndexSettings::default(),
        );
        let py = Language::Python;
        assert_eq!(resolve(&index, py, "main.py", "utils", 0).as_deref(), Some("utils.py"));
        assert_eq!(
            resolve(&index, py, "main.py", "models", 0).as_deref(),
            Some("models/__init__.py")
        );
        assert_eq!(
            resolve(&index, py, "services/api.py", "models.user", 2).as_deref(),
            Some("models/user.py")
        );
        assert_eq!(
            resolve(&index, py, "models/user.py", "", 1).as_deref(),
            Some("models/__init__.py")
        );
        assert_eq!(resolve(&index, py, "main.py", "requests", 0), None);
        assert_eq!(resolve(&index, py, "main.py", "x", 3), None);
    }

    #[test]
    fn js_extensions_index_files_and_aliases() {
        let mut settings = IndexSettings::default();
        settings
            .js_aliases
            .insert("@/*".to_string(), vec!["src/*".to_string()]);
        let index = RepoIndex::from_paths(
            [
                "src/app.ts",
                "src/utils/index.ts",
                "src/components/Button.tsx",
                "src/data.json",
            ],
            settings,
        );
        let ts = Language::TypeScript;
        assert_eq!(
            resolve(&index, ts, "src/app.ts", "utils", 1).as_deref(),
            Some("src/utils/index.ts")
        );
        assert_eq!(
            resolve(&index, ts, "src/utils/index.ts", "components/Button", 2).as_deref(),
            Some("src/components/Button.tsx")
        );
        assert_eq!(
            resolve(&index, ts, "src/app.ts", "data.json", 1).as_deref(),
            Some("src/data.json")
        );
        assert_eq!(
            resolve(&index, ts, "src/app.ts", "@/components/Button", 0).as_deref(),
            Some("src/components/Button.tsx")
        );
        assert_eq!(resolve(&index, ts, "src/app.ts", "react", 0), None);
        assert_eq!(resolve(&index, ts, "src/app.ts", "x", 4), None);
    }

    #[test]
    fn go_module_prefix_and_single_file_dirs() {
        let settings = IndexSettings {
            go_module_path: Some("example.com/app".to_string()),
            ..Default::default()
        };
        let index = RepoIndex::from_paths(
            [
                "main.go",
                "config/settings.go",
                "api/client.go",
                "api/api.go",
                "multi/a.go",
                "multi/b.go",
            ],
            settings,
        );
        let go = Language::Go;
        assert_eq!(
            resolve(&index, go, "main.go", "example.com/app/config", 0).as_deref(),
            Some("config/settings.go")
        );
        assert_eq!(
            resolve(&index, go, "main.go", "example.com/app/api", 0).as_deref(),
            Some("api/api.go")
        );
        assert_eq!(resolve(&index, go, "main.go", "example.com/app/multi", 0), None);
        assert_eq!(resolve(&index, go, "main.go", "example.com/application", 0), None);
        assert_eq!(resolve(&index, go, "main.go", "github.com/x/y", 0), None);
        assert_eq!(
            resolve(&index, go, "main.go", "config", 1).as_deref(),
            Some("config/settings.go")
        );
    }

    #[test]
    fn rust_crate_self_super_and_mod_declarations() {
        let index = RepoIndex::from_paths(
            [
                "src/main.rs",
                "src/config.rs",
                "src/models/mod.rs",
                "src/models/user.rs",
                "src/api/mod.rs",
                "src/api/client.rs",
            ],
            IndexSettings::default(),
        );
        let rs = Language::Rust;
        assert_eq!(
            resolve(&index, rs, "src/api/client.rs", "crate::models::user::User", 0).as_deref(),
            Some("src/models/user.rs")
        );
        assert_eq!(
            resolve(&index, rs, "src/api/client.rs", "crate", 0).as_deref(),
            Some("src/main.rs")
        );
        assert_eq!(
            resolve(&index, rs, "src/api/mod.rs", "client", 1).as_deref(),
            Some("src/api/client.rs")
        );
        assert_eq!(
            resolve(&index, rs, "src/api/client.rs", "config::Settings", 3).as_deref(),
            Some("src/config.rs")
        );
        assert_eq!(
            resolve(&index, rs, "src/models/user.rs", "", 2).as_deref(),
            Some("src/models/mod.rs")
        );
        assert_eq!(
            resolve(&index, rs, "src/main.rs", "models", 1).as_deref(),
            Some("src/models/mod.rs")
        );
        assert_eq!(resolve(&index, rs, "src/main.rs", "serde::Serialize", 0), None);
    }

    #[test]
    fn solidity_remappings_and_relative_paths() {
        let mut settings = IndexSettings::default();
        settings.solidity_remappings.insert(
            "@openzeppelin/".to_string(),
            "lib/openzeppelin-contracts/".to_string(),
        );
        let index = RepoIndex::from_paths(
            [
                "src/Token.sol",
                "src/interfaces/IToken.sol",
                "lib/openzeppelin-contracts/token/ERC20/ERC20.sol",
            ],
            settings,
        );
        let sol = Language::Solidity;
        assert_eq!(
            resolve(&index, sol, "src/Token.sol", "@openzeppelin/token/ERC20/ERC20.sol", 0)
                .as_deref(),
            Some("lib/openzeppelin-contracts/token/ERC20/ERC20.sol")
        );
        assert_eq!(
            resolve(&index, sol, "src/Token.sol", "interfaces/IToken.sol", 1).as_deref(),
            Some("src/interfaces/IToken.sol")
        );
        assert_eq!(resolve(&index, sol, "src/Token.sol", "interfaces/IToken", 1), None);
        assert_eq!(
            resolve(&index, sol, "src/Token.sol", "@chainlink/contracts/x.sol", 0),
            None
        );
    }

    #[test]
    fn metadata_discovery_reads_project_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module github.com/acme/svc\n\ngo 1.22\n")
            .unwrap();
        std::fs::write(
            dir.path().join("remappings.txt"),
            "# comment\nforge-std/=lib/forge-std/src/\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("foundry.toml"),
            "[profile.default]\nsrc = \"contracts\"\n",
        )
        .unwrap();

        let settings = IndexSettings::default().discover(dir.path());
        assert_eq!(settings.go_module_path.as_deref(), Some("github.com/acme/svc"));
        assert_eq!(
            settings.solidity_remappings.get("forge-std/").map(String::as_str),
            Some("lib/forge-std/src/")
        );
        assert_eq!(settings.solidity_src_path.as_deref(), Some("contracts"));
    }

    #[test]
    fn build_indexes_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/mod.py"), "").unwrap();
        let index = RepoIndex::build(dir.path(), IndexSettings::default()).unwrap();
        assert!(index.contains(Path::new("pkg/mod.py")));
    }
}
