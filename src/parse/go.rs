use crate::parse::common::{node_text, unquote, ImportCollector, ImportRecord, ModuleReference};
use crate::parse::visitor::{TreeWalker, Visit};
use crate::parse::{ExtractLimits, ImportExtractor};
use crate::resolve::ImportResolver;
use std::path::Path;
use tree_sitter::Node;

const SKIP_KINDS: &[&str] = &[
    "interpreted_string_literal",
    "raw_string_literal",
    "rune_literal",
    "comment",
];

/// The cgo pseudo-package.
const CGO: &str = "C";

#[derive(Debug, Clone, Default)]
pub struct GoHandler {
    limits: ExtractLimits,
}

impl GoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    fn import_specs<'t>(declaration: Node<'t>) -> Vec<Node<'t>> {
        let mut specs = Vec::new();
        let mut cursor = declaration.walk();
        for child in declaration.children(&mut cursor) {
            match child.kind() {
                "import_spec" => specs.push(child),
                "import_spec_list" => {
                    let mut inner = child.walk();
                    specs.extend(
                        child
                            .children(&mut inner)
                            .filter(|c| c.kind() == "import_spec"),
                    );
                }
                _ => {}
            }
        }
        specs
    }

    fn import_path<'s>(spec: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
        let path_node = spec.child_by_field_name("path").or_else(|| {
            let mut cursor = spec.walk();
            let found = spec.children(&mut cursor).find(|c| {
                matches!(c.kind(), "interpreted_string_literal" | "raw_string_literal")
            });
            found
        })?;
        let path = unquote(node_text(path_node, source));
        (!path.is_empty()).then_some(path)
    }

    fn visit_declaration(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        for spec in Self::import_specs(node) {
            let Some(path) = Self::import_path(spec, source) else {
                continue;
            };
            if path == CGO {
                out.add_external(CGO);
                continue;
            }

            let reference = ModuleReference::from_path_specifier(path);
            let resolution =
                reference.classify(out.file_path(), resolver, |p| Some(p.to_string()));
            let Some(key) = out.apply(&reference, resolution) else {
                continue;
            };
            if !reference.is_relative() {
                let name = path.rsplit('/').next().unwrap_or(path);
                out.add_component(key, name);
            }
        }
    }
}

impl ImportExtractor for GoHandler {
    fn extract_imports(
        &self,
        root: Node<'_>,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> ImportRecord {
        let mut out = ImportCollector::new(file_path, self.limits.max_imports_per_file);
        TreeWalker::new(SKIP_KINDS, self.limits.max_tree_depth).walk(root, file_path, |node| {
            if node.kind() == "import_declaration" {
                self.visit_declaration(node, source, resolver, &mut out);
                return Visit::Skip;
            }
            Visit::Descend
        });
        out.finish()
    }
}
