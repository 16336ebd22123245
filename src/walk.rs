use crate::errors::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Supported language for file discovery and import extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Solidity,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Go,
        Language::Rust,
        Language::Solidity,
    ];

    /// File extensions for this language.
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Python => &["py"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Solidity => &["sol"],
        }
    }

    /// Default exclude patterns for this language.
    pub fn default_excludes(&self) -> Vec<String> {
        match self {
            Language::Go => vec!["*_test.go".to_string()],
            Language::JavaScript | Language::TypeScript => {
                vec!["**/node_modules/**".to_string()]
            }
            Language::Python | Language::Rust | Language::Solidity => vec![],
        }
    }

    /// Language owning the extension of `path`, if any.
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        Language::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext))
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "solidity" | "sol" => Ok(Language::Solidity),
            _ => Err(format!("unsupported language: {s}")),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::JavaScript => write!(f, "javascript"),
            Language::TypeScript => write!(f, "typescript"),
            Language::Go => write!(f, "go"),
            Language::Rust => write!(f, "rust"),
            Language::Solidity => write!(f, "solidity"),
        }
    }
}

fn build_globset(patterns: impl IntoIterator<Item = String>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(&pattern)?);
    }
    Ok(builder.build()?)
}

/// Discover source files under `root` for the given language.
///
/// - Respects `.gitignore`
/// - Applies include/exclude glob patterns
/// - Excludes test files by default for Go
/// - Returns sorted paths for deterministic output
pub fn discover_files(
    root: &Path,
    lang: Language,
    include_patterns: &[String],
    exclude_patterns: &[String],
    include_tests: bool,
) -> Result<Vec<PathBuf>> {
    let extensions = lang.extensions();

    let mut excludes: Vec<String> = exclude_patterns.to_vec();
    if !include_tests {
        excludes.extend(lang.default_excludes());
    }
    let exclude_set = build_globset(excludes)?;

    let include_set = if include_patterns.is_empty() {
        None
    } else {
        Some(build_globset(include_patterns.iter().cloned())?)
    };

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext_match = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.contains(&ext));

        if !ext_match {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);

        if exclude_set.is_match(relative) || exclude_set.is_match(path) {
            continue;
        }
        // Patterns like *_test.go are matched against the bare file name
        if let Some(fname) = path.file_name() {
            if exclude_set.is_match(Path::new(fname)) {
                continue;
            }
        }

        if let Some(ref include) = include_set {
            if !include.is_match(relative) && !include.is_match(path) {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();

    Ok(files)
}

/// Count source files per supported language under `root`.
pub fn count_languages(root: &Path) -> BTreeMap<Language, usize> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .build();

    let mut counts = BTreeMap::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(lang) = Language::from_path(path) {
            *counts.entry(lang).or_insert(0usize) += 1;
        }
    }
    counts
}

/// Auto-detect every language present under `root`, most common first.
pub fn detect_languages(root: &Path) -> Vec<Language> {
    let mut counted: Vec<(Language, usize)> = count_languages(root).into_iter().collect();
    // Stable sort keeps enum order for equal counts
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted.into_iter().map(|(lang, _)| lang).collect()
}
