use crate::parse::common::{
    node_text, unquote, ImportCollector, ImportRecord, ModuleReference, Resolution,
};
use crate::parse::visitor::{TreeWalker, Visit};
use crate::parse::{ExtractLimits, ImportExtractor};
use crate::resolve::ImportResolver;
use std::path::Path;
use tree_sitter::Node;

const SKIP_KINDS: &[&str] = &["string", "comment"];

#[derive(Debug, Clone, Default)]
pub struct SolidityHandler {
    limits: ExtractLimits,
}

/// Package owning a non-relative import path.
///
/// `@openzeppelin/contracts/...` -> `@openzeppelin/contracts`,
/// `lib/solmate/src/...` -> `solmate`, `forge-std/Test.sol` -> `forge-std`.
pub fn normalize_package_name(import_path: &str) -> Option<String> {
    if import_path.is_empty() || import_path.starts_with('.') {
        return None;
    }
    let parts: Vec<&str> = import_path.split('/').collect();
    match parts.as_slice() {
        [scope, name, ..] if scope.starts_with('@') => Some(format!("{scope}/{name}")),
        ["lib", name, ..] if !name.is_empty() => Some((*name).to_string()),
        [first, ..] => Some((*first).to_string()),
        [] => None,
    }
}

/// Path of a whole-file import relative to its package, without `.sol`.
fn component_path(import_path: &str, package: Option<&str>) -> String {
    let mut path = import_path;
    if let Some(package) = package {
        if let Some(rest) = path
            .strip_prefix(package)
            .and_then(|r| r.strip_prefix('/'))
        {
            path = rest;
        }
        let prefixes = [
            format!("lib/{package}/"),
            format!("src/{package}/"),
            "src/".to_string(),
            "lib/".to_string(),
        ];
        if let Some(rest) = prefixes.iter().find_map(|p| path.strip_prefix(p.as_str())) {
            path = rest;
        }
    }
    path.strip_suffix(".sol").unwrap_or(path).to_string()
}

impl SolidityHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    fn symbols(node: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut cursor = node.walk();
        let mut symbols: Vec<String> = node
            .children_by_field_name("import_name", &mut cursor)
            .map(|n| node_text(n, source).to_string())
            .collect();
        let mut cursor = node.walk();
        if node.children(&mut cursor).any(|c| c.kind() == "*") {
            symbols.push("*".to_string());
        }
        symbols
    }

    fn visit_import(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let Some(import_path) = node
            .child_by_field_name("source")
            .map(|n| unquote(node_text(n, source)))
            .filter(|p| !p.is_empty())
        else {
            return;
        };

        let reference = ModuleReference::from_path_specifier(import_path);
        let package = normalize_package_name(import_path);
        let key = match reference.classify(out.file_path(), resolver, normalize_package_name) {
            // Remapped library import: the file is local, the package still counts
            Resolution::Local(path) if !reference.is_relative() && package.is_some() => {
                out.add_local(path);
                if let Some(name) = &package {
                    out.add_external(name.as_str());
                }
                package.clone()
            }
            resolution => out.apply(&reference, resolution),
        };
        let Some(key) = key else {
            return;
        };

        let symbols = Self::symbols(node, source);
        if symbols.is_empty() {
            let package = (!reference.is_relative()).then_some(package.as_deref()).flatten();
            out.add_component(key, component_path(import_path, package));
        } else {
            for symbol in symbols {
                out.add_component(key.as_str(), symbol);
            }
        }
    }
}

impl ImportExtractor for SolidityHandler {
    fn extract_imports(
        &self,
        root: Node<'_>,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> ImportRecord {
        let mut out = ImportCollector::new(file_path, self.limits.max_imports_per_file);
        TreeWalker::new(SKIP_KINDS, self.limits.max_tree_depth).walk(root, file_path, |node| {
            if node.kind() == "import_directive" {
                self.visit_import(node, source, resolver, &mut out);
                return Visit::Skip;
            }
            Visit::Descend
        });
        out.finish()
    }
}
