use crate::resolve::ImportResolver;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Parsed, pre-resolution import target.
///
/// `level == 0` means absolute; `level >= 1` counts the leading relative
/// indicators that were stripped from `module`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleReference {
    pub module: String,
    pub level: usize,
}

impl ModuleReference {
    pub fn absolute(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            level: 0,
        }
    }

    pub fn relative(module: impl Into<String>, level: usize) -> Self {
        Self {
            module: module.into(),
            level,
        }
    }

    /// Split a dotted specifier such as `..models.user` (Python style).
    pub fn from_dotted(text: &str) -> Self {
        let level = text.chars().take_while(|&c| c == '.').count();
        Self::relative(&text[level..], level)
    }

    /// Split a path specifier such as `../../lib/util` (JS, Go, Solidity style).
    ///
    /// `./` counts as one level and every `../` adds one more.
    pub fn from_path_specifier(text: &str) -> Self {
        let mut rest = text;
        let mut level = 0;
        loop {
            if let Some(r) = rest.strip_prefix("./") {
                level = level.max(1);
                rest = r;
            } else if let Some(r) = rest.strip_prefix("../") {
                level = if level == 0 { 2 } else { level + 1 };
                rest = r;
            } else if rest == "." {
                level = level.max(1);
                rest = "";
            } else if rest == ".." {
                level = if level == 0 { 2 } else { level + 1 };
                rest = "";
            } else {
                break;
            }
        }
        Self::relative(rest, level)
    }

    pub fn is_relative(&self) -> bool {
        self.level > 0
    }

    /// First segment of a dotted module name (`os.path` -> `os`).
    pub fn root_namespace(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

/// Outcome of classifying one module reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolved to a file inside the repository.
    Local(PathBuf),
    /// Not resolvable locally; carries the normalized package name.
    External(String),
    /// Relative miss or a specifier that never names a package.
    Dropped,
}

impl ModuleReference {
    /// Classify against `resolver`. A relative miss is dropped; an absolute
    /// miss is named by `package_name`, which may also decline.
    pub fn classify(
        &self,
        file_path: &Path,
        resolver: &dyn ImportResolver,
        package_name: impl FnOnce(&str) -> Option<String>,
    ) -> Resolution {
        if let Some(path) = resolver.resolve(file_path, &self.module, self.level) {
            return Resolution::Local(path);
        }
        if self.is_relative() {
            tracing::debug!(
                "Dropping unresolved relative import '{}' (level {}) in {}",
                self.module,
                self.level,
                file_path.display()
            );
            return Resolution::Dropped;
        }
        match package_name(&self.module) {
            Some(name) if !name.is_empty() => Resolution::External(name),
            _ => Resolution::Dropped,
        }
    }
}

/// A symbol imported from a module, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Component {
    pub module: String,
    pub symbol: String,
}

/// Import record for one file and one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportRecord {
    pub external_imports: BTreeSet<String>,
    pub local_imports: BTreeSet<PathBuf>,
    pub components: Vec<Component>,
    /// Relative specifiers the resolver could not place.
    pub dropped_relative: usize,
}

impl ImportRecord {
    pub fn is_empty(&self) -> bool {
        self.external_imports.is_empty() && self.local_imports.is_empty() && self.components.is_empty()
    }

    pub fn has_component(&self, module: &str, symbol: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.module == module && c.symbol == symbol)
    }
}

/// Per-file accumulator used by the language handlers.
pub struct ImportCollector<'a> {
    file_path: &'a Path,
    record: ImportRecord,
    seen_components: HashSet<Component>,
    max_imports: usize,
    limit_logged: bool,
}

impl<'a> ImportCollector<'a> {
    pub fn new(file_path: &'a Path, max_imports: usize) -> Self {
        Self {
            file_path,
            record: ImportRecord::default(),
            seen_components: HashSet::new(),
            max_imports,
            limit_logged: false,
        }
    }

    pub fn file_path(&self) -> &'a Path {
        self.file_path
    }

    fn at_limit(&mut self) -> bool {
        let total = self.record.external_imports.len() + self.record.local_imports.len();
        if total >= self.max_imports {
            if !self.limit_logged {
                tracing::warn!(
                    "Import limit ({}) reached for {}, ignoring further imports",
                    self.max_imports,
                    self.file_path.display()
                );
                self.limit_logged = true;
            }
            return true;
        }
        false
    }

    pub fn add_external(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name.is_empty() || self.record.external_imports.contains(&name) || self.at_limit() {
            return;
        }
        self.record.external_imports.insert(name);
    }

    pub fn add_local(&mut self, path: PathBuf) {
        if self.record.local_imports.contains(&path) || self.at_limit() {
            return;
        }
        self.record.local_imports.insert(path);
    }

    pub fn add_component(&mut self, module: impl Into<String>, symbol: impl Into<String>) {
        let component = Component {
            module: module.into(),
            symbol: symbol.into(),
        };
        if component.module.is_empty() || component.symbol.is_empty() {
            return;
        }
        if self.seen_components.insert(component.clone()) {
            self.record.components.push(component);
        }
    }

    pub fn note_dropped_relative(&mut self) {
        self.record.dropped_relative += 1;
    }

    /// Record a classification outcome. Returns the key that components for
    /// this import should use (package name or local path), if any.
    pub fn apply(&mut self, reference: &ModuleReference, resolution: Resolution) -> Option<String> {
        match resolution {
            Resolution::Local(path) => {
                let key = path.to_string_lossy().into_owned();
                self.add_local(path);
                Some(key)
            }
            Resolution::External(name) => {
                self.add_external(name.clone());
                Some(name)
            }
            Resolution::Dropped => {
                if reference.is_relative() {
                    self.note_dropped_relative();
                }
                None
            }
        }
    }

    pub fn finish(self) -> ImportRecord {
        self.record
    }
}

/// Text of `node`, or an empty string when the span is not valid UTF-8.
pub fn node_text<'s>(node: tree_sitter::Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

/// Strip one layer of matching quotes or backticks from a string literal.
pub fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}
