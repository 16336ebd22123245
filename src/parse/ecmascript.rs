//! JavaScript and TypeScript share one dispatch table; only the grammar
//! differs (TypeScript, or TSX for `.tsx` files).

use crate::parse::common::{node_text, unquote, ImportCollector, ImportRecord, ModuleReference};
use crate::parse::visitor::{TreeWalker, Visit};
use crate::parse::{ExtractLimits, ImportExtractor};
use crate::resolve::ImportResolver;
use std::path::Path;
use tree_sitter::Node;

const SKIP_KINDS: &[&str] = &["string", "template_string", "comment", "regex"];

/// Framework aliases that never name an installable package.
const FRAMEWORK_ALIASES: &[&str] = &["$lib", "$app", "$env"];

#[derive(Debug, Clone, Default)]
pub struct EcmaScriptHandler {
    limits: ExtractLimits,
}

/// Package name for a bare specifier, or `None` when it names no package.
///
/// `@scope/pkg/sub` -> `@scope/pkg`, `lodash/fp` -> `lodash`,
/// `node:fs` is kept as written.
pub fn normalize_package_name(specifier: &str) -> Option<String> {
    let specifier = specifier.trim();
    if specifier.is_empty() || specifier.starts_with('.') || specifier.starts_with('/') {
        return None;
    }
    if specifier.contains("://") || specifier.starts_with("data:") {
        return None;
    }
    let first = specifier.split('/').next().unwrap_or(specifier);
    if FRAMEWORK_ALIASES.contains(&first) {
        return None;
    }
    if specifier.starts_with("node:") {
        return Some(specifier.to_string());
    }
    if specifier.starts_with('@') {
        let mut parts = specifier.splitn(3, '/');
        return match (parts.next(), parts.next()) {
            (Some(scope), Some(name)) if !name.is_empty() => Some(format!("{scope}/{name}")),
            _ => Some(specifier.to_string()),
        };
    }
    Some(first.to_string())
}

impl EcmaScriptHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    /// Classify `specifier` and return the component key on success.
    fn record(
        &self,
        specifier: &str,
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) -> Option<String> {
        if specifier.is_empty() {
            return None;
        }
        let reference = ModuleReference::from_path_specifier(specifier);
        let resolution = reference.classify(out.file_path(), resolver, normalize_package_name);
        out.apply(&reference, resolution)
    }

    fn string_value<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
        (node.kind() == "string").then(|| unquote(node_text(node, source)))
    }

    fn visit_import(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let mut cursor = node.walk();
        let source_node = node.child_by_field_name("source").or_else(|| {
            node.children(&mut cursor)
                .find(|c| c.kind() == "import_require_clause")
                .and_then(|clause| {
                    let mut inner = clause.walk();
                    clause
                        .child_by_field_name("source")
                        .or_else(|| clause.children(&mut inner).find(|c| c.kind() == "string"))
                })
        });
        let Some(specifier) = source_node.and_then(|n| Self::string_value(n, source)) else {
            return;
        };
        let Some(key) = self.record(specifier, resolver, out) else {
            return;
        };

        let mut cursor = node.walk();
        let Some(clause) = node
            .children(&mut cursor)
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };
        let mut cursor = clause.walk();
        for child in clause.children(&mut cursor) {
            match child.kind() {
                "identifier" => out.add_component(key.as_str(), node_text(child, source)),
                "named_imports" => {
                    let mut inner = child.walk();
                    for spec in child.children(&mut inner) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        if let Some(name) = spec.child_by_field_name("name") {
                            out.add_component(key.as_str(), node_text(name, source));
                        }
                    }
                }
                "namespace_import" => out.add_component(key.as_str(), "*"),
                _ => {}
            }
        }
    }

    /// Re-exports with a `from` clause. Returns false for plain exports.
    fn visit_export(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) -> bool {
        let Some(specifier) = node
            .child_by_field_name("source")
            .and_then(|n| Self::string_value(n, source))
        else {
            return false;
        };
        self.record(specifier, resolver, out);
        true
    }

    fn visit_call(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let is_require = function.kind() == "identifier" && node_text(function, source) == "require";
        let is_dynamic_import = function.kind() == "import";
        if !is_require && !is_dynamic_import {
            return;
        }

        let Some(first_arg) = node
            .child_by_field_name("arguments")
            .and_then(|args| args.named_child(0))
        else {
            return;
        };
        let Some(specifier) = Self::string_value(first_arg, source) else {
            return;
        };
        let Some(key) = self.record(specifier, resolver, out) else {
            return;
        };

        if is_require {
            Self::destructured_names(node, source, |name| out.add_component(key.as_str(), name));
        }
    }

    /// `const { a, b: c } = require("x")` yields `a` and `b`.
    fn destructured_names<'s>(call: Node<'_>, source: &'s [u8], mut emit: impl FnMut(&'s str)) {
        let Some(declarator) = call.parent().filter(|p| p.kind() == "variable_declarator") else {
            return;
        };
        let Some(pattern) = declarator
            .child_by_field_name("name")
            .filter(|n| n.kind() == "object_pattern")
        else {
            return;
        };
        let mut cursor = pattern.walk();
        for child in pattern.children(&mut cursor) {
            match child.kind() {
                "shorthand_property_identifier_pattern" => emit(node_text(child, source)),
                "pair_pattern" => {
                    if let Some(key) = child
                        .child_by_field_name("key")
                        .filter(|k| k.kind() == "property_identifier")
                    {
                        emit(node_text(key, source));
                    }
                }
                _ => {}
            }
        }
    }
}

impl ImportExtractor for EcmaScriptHandler {
    fn extract_imports(
        &self,
        root: Node<'_>,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> ImportRecord {
        let mut out = ImportCollector::new(file_path, self.limits.max_imports_per_file);
        TreeWalker::new(SKIP_KINDS, self.limits.max_tree_depth).walk(root, file_path, |node| {
            match node.kind() {
                "import_statement" => {
                    self.visit_import(node, source, resolver, &mut out);
                    Visit::Skip
                }
                "export_statement" if self.visit_export(node, source, resolver, &mut out) => {
                    Visit::Skip
                }
                "call_expression" => {
                    // Arguments may hold further requires
                    self.visit_call(node, source, resolver, &mut out);
                    Visit::Descend
                }
                _ => Visit::Descend,
            }
        });
        out.finish()
    }
}
