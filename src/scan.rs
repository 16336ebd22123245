//! Repository scan: discover files, build the resolver index once, then
//! extract imports on a bounded worker pool.

use crate::errors::{GardenerError, Result};
use crate::parse::{ExtractLimits, ImportRecord, LanguageHandler};
use crate::resolve::{IndexSettings, RepoIndex};
use crate::walk::{self, Language};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Files larger than this are skipped by default.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Languages to scan; empty means detect from the tree.
    pub languages: Vec<Language>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_tests: bool,
    /// Worker threads; 0 uses the available parallelism.
    pub workers: usize,
    pub max_file_size: u64,
    pub limits: ExtractLimits,
    pub index_settings: IndexSettings,
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            include_tests: false,
            workers: 0,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            limits: ExtractLimits::default(),
            index_settings: IndexSettings::default(),
            show_progress: false,
        }
    }
}

/// Cooperative cancellation, checked before each file is started.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    content: blake3::Hash,
    language: Language,
    path: PathBuf,
    index: blake3::Hash,
    limits: ExtractLimits,
}

/// Memoized extraction results shared across scans.
///
/// Keyed by content hash, language and repo-relative path, plus the
/// [`RepoIndex::fingerprint`] and extraction limits: local resolution depends
/// on where the importing file sits and on which files exist around it.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    entries: DashMap<CacheKey, ImportRecord>,
    hits: AtomicUsize,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &CacheKey) -> Option<ImportRecord> {
        let found = self.entries.get(key).map(|r| r.value().clone());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn insert(&self, key: CacheKey, record: ImportRecord) {
        self.entries.insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

/// Imports of one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileImports {
    pub path: PathBuf,
    pub language: Language,
    #[serde(flatten)]
    pub record: ImportRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub languages: Vec<Language>,
    pub files: Vec<FileImports>,
    pub files_parsed: usize,
    pub files_skipped: usize,
    /// External package name to the number of files importing it.
    pub external_usage: BTreeMap<String, usize>,
    pub local_imports: usize,
    pub dropped_relative: usize,
    pub elapsed_ms: u64,
}

/// Scan every source file under `root` and extract its imports.
///
/// A cancelled scan returns [`GardenerError::Cancelled`] and no partial data.
pub fn scan_repository(
    root: &Path,
    options: &ScanOptions,
    cancel: &CancelToken,
    cache: Option<&ExtractionCache>,
) -> Result<ScanReport> {
    let start = Instant::now();
    let root = root.canonicalize().map_err(|_| GardenerError::NoFiles {
        path: root.to_path_buf(),
    })?;

    let languages = if options.languages.is_empty() {
        walk::detect_languages(&root)
    } else {
        options.languages.clone()
    };

    let mut tasks: Vec<(Language, PathBuf)> = Vec::new();
    for &language in &languages {
        let files = walk::discover_files(
            &root,
            language,
            &options.include,
            &options.exclude,
            options.include_tests,
        )?;
        tracing::debug!("Discovered {} {language} files", files.len());
        tasks.extend(files.into_iter().map(|f| (language, f)));
    }
    if tasks.is_empty() {
        return Err(GardenerError::NoFiles { path: root });
    }

    // Single writer; read-only from here on
    let index = RepoIndex::build(&root, options.index_settings.clone())?;
    let index_fingerprint = index.fingerprint();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|e| GardenerError::Config(format!("cannot start worker pool: {e}")))?;

    let progress = options.show_progress.then(|| {
        let pb = indicatif::ProgressBar::new(tasks.len() as u64);
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    });

    let files_skipped = AtomicUsize::new(0);
    let mut files: Vec<FileImports> = pool.install(|| {
        tasks
            .par_iter()
            .filter_map(|(language, path)| {
                if cancel.is_cancelled() {
                    return None;
                }
                let result = extract_file(
                    &root,
                    *language,
                    path,
                    options,
                    &index,
                    index_fingerprint,
                    cache,
                );
                if result.is_none() {
                    files_skipped.fetch_add(1, Ordering::Relaxed);
                }
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if cancel.is_cancelled() {
        tracing::debug!("Scan of {} cancelled; discarding results", root.display());
        return Err(GardenerError::Cancelled);
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut external_usage: BTreeMap<String, usize> = BTreeMap::new();
    let mut local_imports = 0;
    let mut dropped_relative = 0;
    for file in &files {
        for name in &file.record.external_imports {
            *external_usage.entry(name.clone()).or_insert(0) += 1;
        }
        local_imports += file.record.local_imports.len();
        dropped_relative += file.record.dropped_relative;
    }

    Ok(ScanReport {
        root,
        languages,
        files_parsed: files.len(),
        files_skipped: files_skipped.load(Ordering::Relaxed),
        files,
        external_usage,
        local_imports,
        dropped_relative,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}

fn extract_file(
    root: &Path,
    language: Language,
    path: &Path,
    options: &ScanOptions,
    index: &RepoIndex,
    index_fingerprint: blake3::Hash,
    cache: Option<&ExtractionCache>,
) -> Option<FileImports> {
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > options.max_file_size => {
            tracing::warn!(
                "Skipping {}: {} bytes exceeds the {} byte limit",
                relative.display(),
                meta.len(),
                options.max_file_size
            );
            return None;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("Skipping {}: {}", relative.display(), e);
            return None;
        }
    }

    let source = match std::fs::read(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", relative.display(), e);
            return None;
        }
    };

    let key = cache.map(|_| CacheKey {
        content: blake3::hash(&source),
        language,
        path: relative.clone(),
        index: index_fingerprint,
        limits: options.limits,
    });
    if let (Some(cache), Some(key)) = (cache, &key) {
        if let Some(record) = cache.get(key) {
            return Some(FileImports {
                path: relative,
                language,
                record,
            });
        }
    }

    let handler = LanguageHandler::with_limits(language, options.limits);
    let resolver = index.for_language(language);
    let record = match handler.extract_source(&source, &relative, &resolver) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", relative.display(), e);
            return None;
        }
    };

    if let (Some(cache), Some(key)) = (cache, key) {
        cache.insert(key, record.clone());
    }

    Some(FileImports {
        path: relative,
        language,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn python_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app/models")).unwrap();
        fs::write(root.join("app/__init__.py"), "").unwrap();
        fs::write(root.join("app/models/__init__.py"), "").unwrap();
        fs::write(root.join("app/models/user.py"), "import requests\n").unwrap();
        fs::write(
            root.join("app/views.py"),
            "import os\nfrom .models import user\nfrom .missing import thing\n\nclass V:\n    def get(self):\n        import numpy as np\n",
        )
        .unwrap();
        dir
    }

    fn python_only() -> ScanOptions {
        ScanOptions {
            languages: vec![Language::Python],
            workers: 2,
            ..ScanOptions::default()
        }
    }

    #[test]
    fn scans_and_merges_in_path_order() {
        let repo = python_repo();
        let report =
            scan_repository(repo.path(), &python_only(), &CancelToken::new(), None).unwrap();

        let paths: Vec<&Path> = report.files.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("app/__init__.py"),
                Path::new("app/models/__init__.py"),
                Path::new("app/models/user.py"),
                Path::new("app/views.py"),
            ]
        );
        assert_eq!(report.files_parsed, 4);
        assert_eq!(report.files_skipped, 0);

        let views = &report.files[3].record;
        assert!(views.local_imports.contains(Path::new("app/models/user.py")));
        assert!(views.external_imports.contains("numpy"));
        assert!(!views.external_imports.contains("missing"));
        assert_eq!(views.dropped_relative, 1);
        assert_eq!(report.dropped_relative, 1);

        assert_eq!(report.external_usage.get("requests"), Some(&1));
        assert_eq!(report.external_usage.get("os"), Some(&1));
    }

    #[test]
    fn detects_languages_when_none_given() {
        let repo = python_repo();
        fs::write(
            repo.path().join("main.go"),
            "package main\nimport \"fmt\"\nfunc main() { fmt.Println() }\n",
        )
        .unwrap();
        let report = scan_repository(
            repo.path(),
            &ScanOptions::default(),
            &CancelToken::new(),
            None,
        )
        .unwrap();
        assert_eq!(report.languages, vec![Language::Python, Language::Go]);
        assert_eq!(report.external_usage.get("fmt"), Some(&1));
    }

    #[test]
    fn oversized_files_are_skipped_and_counted() {
        let repo = python_repo();
        let options = ScanOptions {
            max_file_size: 20,
            ..python_only()
        };
        let report = scan_repository(repo.path(), &options, &CancelToken::new(), None).unwrap();
        // only the two empty __init__.py files and user.py fit
        assert_eq!(report.files_parsed, 3);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn cancelled_scan_discards_everything() {
        let repo = python_repo();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = scan_repository(repo.path(), &python_only(), &cancel, None).unwrap_err();
        assert!(matches!(err, GardenerError::Cancelled));
    }

    #[test]
    fn empty_tree_has_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_repository(dir.path(), &python_only(), &CancelToken::new(), None)
            .unwrap_err();
        assert!(matches!(err, GardenerError::NoFiles { .. }));
    }

    #[test]
    fn cache_is_reused_until_content_changes() {
        let repo = python_repo();
        let cache = ExtractionCache::new();
        let cancel = CancelToken::new();

        let first = scan_repository(repo.path(), &python_only(), &cancel, Some(&cache)).unwrap();
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.hits(), 0);

        let second = scan_repository(repo.path(), &python_only(), &cancel, Some(&cache)).unwrap();
        assert_eq!(cache.hits(), 4);
        assert_eq!(first.external_usage, second.external_usage);

        fs::write(repo.path().join("app/models/user.py"), "import httpx\n").unwrap();
        let third = scan_repository(repo.path(), &python_only(), &cancel, Some(&cache)).unwrap();
        assert_eq!(cache.hits(), 7);
        assert_eq!(cache.len(), 5);
        assert!(third.external_usage.contains_key("httpx"));
        assert!(!third.external_usage.contains_key("requests"));
    }

    #[test]
    fn cache_misses_once_the_file_set_changes() {
        let repo = python_repo();
        let cache = ExtractionCache::new();
        let cancel = CancelToken::new();

        let before = scan_repository(repo.path(), &python_only(), &cancel, Some(&cache)).unwrap();
        assert_eq!(before.dropped_relative, 1);

        // `from .missing import thing` in views.py now has a target
        fs::write(repo.path().join("app/missing.py"), "thing = 1\n").unwrap();
        let after = scan_repository(repo.path(), &python_only(), &cancel, Some(&cache)).unwrap();
        assert_eq!(cache.hits(), 0);
        assert_eq!(after.dropped_relative, 0);

        let views = after
            .files
            .iter()
            .find(|f| f.path == Path::new("app/views.py"))
            .unwrap();
        assert!(views.record.local_imports.contains(Path::new("app/missing.py")));

        let uncached = scan_repository(repo.path(), &python_only(), &cancel, None).unwrap();
        assert_eq!(views.record, uncached.files[4].record);
    }
}
