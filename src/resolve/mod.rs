pub mod index;
pub mod paths;

pub use index::{IndexSettings, LanguageResolver, RepoIndex};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps a module specifier to a file inside the analyzed repository.
///
/// Implementations must be pure for a fixed repository snapshot so that
/// per-file extraction stays deterministic and can run on any worker.
pub trait ImportResolver: Send + Sync {
    /// `specifier` has its relative indicators already stripped; `level`
    /// counts them (0 = absolute).
    fn resolve(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf>;
}

/// Resolver that never finds anything local.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl ImportResolver for NullResolver {
    fn resolve(&self, _importing_file: &Path, _specifier: &str, _level: usize) -> Option<PathBuf> {
        None
    }
}

/// In-memory resolution table.
///
/// Entries keyed only by `(specifier, level)` apply to every importing file;
/// entries added with [`MapResolver::with_for_file`] take precedence for that file.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    global: HashMap<(String, usize), PathBuf>,
    per_file: HashMap<(PathBuf, String, usize), PathBuf>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, specifier: &str, level: usize, target: impl Into<PathBuf>) -> Self {
        self.insert(specifier, level, target);
        self
    }

    pub fn with_for_file(
        mut self,
        importing_file: impl Into<PathBuf>,
        specifier: &str,
        level: usize,
        target: impl Into<PathBuf>,
    ) -> Self {
        self.per_file.insert(
            (importing_file.into(), specifier.to_string(), level),
            target.into(),
        );
        self
    }

    pub fn insert(&mut self, specifier: &str, level: usize, target: impl Into<PathBuf>) {
        self.global
            .insert((specifier.to_string(), level), target.into());
    }
}

impl ImportResolver for MapResolver {
    fn resolve(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf> {
        self.per_file
            .get(&(importing_file.to_path_buf(), specifier.to_string(), level))
            .or_else(|| self.global.get(&(specifier.to_string(), level)))
            .cloned()
    }
}

impl<R: ImportResolver + ?Sized> ImportResolver for &R {
    fn resolve(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf> {
        (**self).resolve(importing_file, specifier, level)
    }
}

/// Test double that records every lookup and delegates to a [`MapResolver`].
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingResolver {
    pub inner: MapResolver,
    pub calls: std::sync::Mutex<Vec<(String, usize)>>,
}

#[cfg(test)]
impl RecordingResolver {
    pub fn new(inner: MapResolver) -> Self {
        Self {
            inner,
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ImportResolver for RecordingResolver {
    fn resolve(&self, importing_file: &Path, specifier: &str, level: usize) -> Option<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push((specifier.to_string(), level));
        self.inner.resolve(importing_file, specifier, level)
    }
}
