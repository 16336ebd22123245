use crate::parse::common::{node_text, ImportCollector, ImportRecord, ModuleReference};
use crate::parse::visitor::{TreeWalker, Visit};
use crate::parse::{ExtractLimits, ImportExtractor};
use crate::resolve::ImportResolver;
use std::collections::HashSet;
use std::path::Path;
use tree_sitter::Node;

const SKIP_KINDS: &[&str] = &[
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "line_comment",
    "block_comment",
];

/// Crates shipped with the compiler.
const STD_CRATES: &[&str] = &["std", "core", "alloc"];

/// Tool attribute namespaces (`#[rustfmt::skip]`, `#[clippy::msrv]`).
const TOOL_NAMESPACES: &[&str] = &["rustfmt", "clippy", "diagnostic", "rustdoc"];

#[derive(Debug, Clone, Default)]
pub struct RustHandler {
    limits: ExtractLimits,
}

/// Names of `mod name { ... }` items at the top of the file.
fn inline_modules<'s>(root: Node<'_>, source: &'s [u8]) -> HashSet<&'s str> {
    let mut cursor = root.walk();
    root.children(&mut cursor)
        .filter(|c| c.kind() == "mod_item" && c.child_by_field_name("body").is_some())
        .filter_map(|c| c.child_by_field_name("name"))
        .map(|n| node_text(n, source))
        .collect()
}

/// Inline `mod` blocks enclosing `node`.
fn inline_depth(node: Node<'_>) -> usize {
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.kind() == "mod_item" {
            depth += 1;
        }
        current = parent.parent();
    }
    depth
}

/// Segments of a simple path such as `a::b::c`.
fn path_segments(node: Node<'_>, source: &[u8]) -> Vec<String> {
    match node.kind() {
        "scoped_identifier" => {
            let mut segments = node
                .child_by_field_name("path")
                .map(|p| path_segments(p, source))
                .unwrap_or_default();
            if let Some(name) = node.child_by_field_name("name") {
                segments.push(node_text(name, source).to_string());
            }
            segments
        }
        _ => node_text(node, source)
            .split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Expand a use tree into full paths; wildcards end in `*`.
fn collect_use_paths(node: Node<'_>, source: &[u8], prefix: &[String], paths: &mut Vec<Vec<String>>) {
    let joined = |tail: Vec<String>| -> Vec<String> {
        let mut full = prefix.to_vec();
        full.extend(tail);
        full
    };
    match node.kind() {
        // `use foo::{self, Bar}` names `foo` itself
        "self" if !prefix.is_empty() => paths.push(prefix.to_vec()),
        "scoped_use_list" => {
            let base = node
                .child_by_field_name("path")
                .map(|p| joined(path_segments(p, source)))
                .unwrap_or_else(|| prefix.to_vec());
            if let Some(list) = node.child_by_field_name("list") {
                collect_use_paths(list, source, &base, paths);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for item in node.named_children(&mut cursor) {
                collect_use_paths(item, source, prefix, paths);
            }
        }
        "use_as_clause" => {
            if let Some(path) = node.child_by_field_name("path") {
                collect_use_paths(path, source, prefix, paths);
            }
        }
        "use_wildcard" => {
            let mut full = match node.named_child(0) {
                Some(base) => joined(path_segments(base, source)),
                None => prefix.to_vec(),
            };
            full.push("*".to_string());
            paths.push(full);
        }
        "identifier" | "scoped_identifier" | "crate" | "self" | "super" => {
            paths.push(joined(path_segments(node, source)));
        }
        _ => {}
    }
}

impl RustHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    fn visit_use(
        &self,
        node: Node<'_>,
        source: &[u8],
        inline: &HashSet<&str>,
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let Some(argument) = node.child_by_field_name("argument") else {
            return;
        };
        let mut paths = Vec::new();
        collect_use_paths(argument, source, &[], &mut paths);
        let depth = inline_depth(node);
        for path in paths {
            self.record_path(&path, depth, inline, resolver, out);
        }
    }

    fn record_path(
        &self,
        path: &[String],
        inline_depth: usize,
        inline: &HashSet<&str>,
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let Some(first) = path.first().map(String::as_str) else {
            return;
        };
        if first == "*" {
            return;
        }
        let wildcard = path.last().is_some_and(|s| s == "*");
        let full = path.join("::");
        let component = (!wildcard && path.len() > 1).then(|| (first.to_string(), full.clone()));
        let segments: Vec<&str> = path
            .iter()
            .map(String::as_str)
            .filter(|s| *s != "*")
            .collect();

        if STD_CRATES.contains(&first) {
            out.add_external(first);
            if let Some((root, full)) = component {
                out.add_component(root, full);
            }
            return;
        }

        let reference = match first {
            "self" => {
                // Items of an enclosing inline module live in this file
                if inline_depth > 0 {
                    return;
                }
                ModuleReference::relative(segments[1..].join("::"), 1)
            }
            "super" => {
                let supers = segments.iter().take_while(|s| **s == "super").count();
                if supers <= inline_depth {
                    return;
                }
                ModuleReference::relative(segments[supers..].join("::"), supers - inline_depth + 1)
            }
            _ => ModuleReference::absolute(segments.join("::")),
        };
        let crate_local = first == "crate" || inline.contains(first);

        let resolution = reference.classify(out.file_path(), resolver, |_| {
            (!crate_local).then(|| first.to_string())
        });
        if out.apply(&reference, resolution).is_some() || crate_local || reference.is_relative() {
            if let Some((root, full)) = component {
                out.add_component(root, full);
            }
        }
    }

    fn visit_mod(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) -> Visit {
        if node.child_by_field_name("body").is_some() {
            return Visit::Descend;
        }
        if let Some(name) = node.child_by_field_name("name") {
            let reference = ModuleReference::relative(node_text(name, source), 1);
            let resolution = reference.classify(out.file_path(), resolver, |_| None);
            out.apply(&reference, resolution);
        }
        Visit::Skip
    }

    fn visit_extern_crate(&self, node: Node<'_>, source: &[u8], out: &mut ImportCollector<'_>) {
        if let Some(name) = node.child_by_field_name("name") {
            let name = node_text(name, source);
            if name != "self" {
                out.add_external(name);
            }
        }
    }

    fn visit_attribute(
        &self,
        node: Node<'_>,
        source: &[u8],
        inline: &HashSet<&str>,
        out: &mut ImportCollector<'_>,
    ) {
        let mut cursor = node.walk();
        let Some(attribute) = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "attribute")
        else {
            return;
        };
        let Some(path) = attribute.named_child(0) else {
            return;
        };
        if path.kind() != "scoped_identifier" {
            return;
        }
        let segments = path_segments(path, source);
        let Some(first) = segments.first().map(String::as_str) else {
            return;
        };
        let local = matches!(first, "crate" | "self" | "super") || inline.contains(first);
        if local || STD_CRATES.contains(&first) || TOOL_NAMESPACES.contains(&first) {
            return;
        }
        out.add_external(first);
        out.add_component(first, segments.join("::"));
    }
}

impl ImportExtractor for RustHandler {
    fn extract_imports(
        &self,
        root: Node<'_>,
        source: &[u8],
        file_path: &Path,
        resolver: &dyn ImportResolver,
    ) -> ImportRecord {
        let inline = inline_modules(root, source);
        let mut out = ImportCollector::new(file_path, self.limits.max_imports_per_file);
        TreeWalker::new(SKIP_KINDS, self.limits.max_tree_depth).walk(root, file_path, |node| {
            match node.kind() {
                "use_declaration" => self.visit_use(node, source, &inline, resolver, &mut out),
                "mod_item" => return self.visit_mod(node, source, resolver, &mut out),
                "extern_crate_declaration" => self.visit_extern_crate(node, source, &mut out),
                "attribute_item" => self.visit_attribute(node, source, &inline, &mut out),
                _ => return Visit::Descend,
            }
            Visit::Skip
        });
        out.finish()
    }
}
