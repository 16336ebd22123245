pub mod common;
pub mod ecmascript;
pub mod go;
pub mod python;
pub mod rust;
pub mod solidity;
pub mod visitor;

pub use common::{Component, ImportRecord, ModuleReference, Resolution};

use crate::errors::{GardenerError, Result};
use crate::resolve::ImportResolver;
use crate::walk::Language;
use ecmascript::EcmaScriptHandler;
use go::GoHandler;
use python::PythonHandler;
use rust::RustHandler;
use solidity::SolidityHandler;
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Per-file traversal bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractLimits {
    pub max_tree_depth: usize,
    pub max_imports_per_file: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_tree_depth: 50_000,
            max_imports_per_file: 1_000_000,
        }
    }
}

/// Import extraction contract shared by every language.
pub trait ImportExtractor {
    /// Walk the whole tree under `root` and classify every import found.
    ///
    /// `file_path` is the importing file relative to the repository root and
    /// is only handed to `resolver`; nothing is read from disk.
    fn extract_imports(
        &self,
        root: Node<'_>,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> ImportRecord;
}

/// Closed set of language handlers.
#[derive(Debug, Clone)]
pub enum LanguageHandler {
    Python(PythonHandler),
    JavaScript(EcmaScriptHandler),
    TypeScript(EcmaScriptHandler),
    Go(GoHandler),
    Rust(RustHandler),
    Solidity(SolidityHandler),
}

impl LanguageHandler {
    pub fn for_language(language: Language) -> Self {
        Self::with_limits(language, ExtractLimits::default())
    }

    pub fn with_limits(language: Language, limits: ExtractLimits) -> Self {
        match language {
            Language::Python => Self::Python(PythonHandler::with_limits(limits)),
            Language::JavaScript => Self::JavaScript(EcmaScriptHandler::with_limits(limits)),
            Language::TypeScript => Self::TypeScript(EcmaScriptHandler::with_limits(limits)),
            Language::Go => Self::Go(GoHandler::with_limits(limits)),
            Language::Rust => Self::Rust(RustHandler::with_limits(limits)),
            Language::Solidity => Self::Solidity(SolidityHandler::with_limits(limits)),
        }
    }

    pub fn language(&self) -> Language {
        match self {
            Self::Python(_) => Language::Python,
            Self::JavaScript(_) => Language::JavaScript,
            Self::TypeScript(_) => Language::TypeScript,
            Self::Go(_) => Language::Go,
            Self::Rust(_) => Language::Rust,
            Self::Solidity(_) => Language::Solidity,
        }
    }

    /// Parse `source` and extract its imports in one step.
    pub fn extract_source(
        &self,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> Result<ImportRecord> {
        let tree = parse_source(self.language(), file_path, source)?;
        Ok(self.extract_imports(tree.root_node(), source, file_path, resolver))
    }
}

impl ImportExtractor for LanguageHandler {
    fn extract_imports(
        &self,
        root: Node<'_>,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> ImportRecord {
        let record = match self {
            Self::Python(h) => h.extract_imports(root, source, file_path, resolver),
            Self::JavaScript(h) | Self::TypeScript(h) => {
                h.extract_imports(root, source, file_path, resolver)
            }
            Self::Go(h) => h.extract_imports(root, source, file_path, resolver),
            Self::Rust(h) => h.extract_imports(root, source, file_path, resolver),
            Self::Solidity(h) => h.extract_imports(root, source, file_path, resolver),
        };
        tracing::debug!(
            "{}: {} external, {} local, {} components",
            file_path.display(),
            record.external_imports.len(),
            record.local_imports.len(),
            record.components.len()
        );
        record
    }
}

/// Grammar for `language`; `.tsx` files get the TSX dialect.
pub fn grammar(language: Language, file_path: &Path) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => {
            if file_path.extension().is_some_and(|e| e == "tsx") {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            } else {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }
        }
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Solidity => tree_sitter_solidity::LANGUAGE.into(),
    }
}

pub fn parse_source(language: Language, file_path: &Path, source: &[u8]) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar(language, file_path))
        .map_err(|e| GardenerError::Grammar {
            language: language.to_string(),
            message: e.to_string(),
        })?;
    parser.parse(source, None).ok_or_else(|| GardenerError::Parse {
        file: file_path.to_path_buf(),
        message: "parser produced no tree".to_string(),
    })
}
