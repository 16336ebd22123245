use crate::parse::common::{node_text, ImportCollector, ImportRecord, ModuleReference, Resolution};
use crate::parse::visitor::{TreeWalker, Visit};
use crate::parse::{ExtractLimits, ImportExtractor};
use crate::resolve::ImportResolver;
use std::path::Path;
use tree_sitter::Node;

const SKIP_KINDS: &[&str] = &["string", "comment"];

const FUTURE: &str = "__future__";

#[derive(Debug, Clone, Default)]
pub struct PythonHandler {
    limits: ExtractLimits,
}

impl PythonHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ExtractLimits) -> Self {
        Self { limits }
    }

    /// Original name of an imported item: `a.b` for `a.b as c`.
    fn imported_name<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
        match node.kind() {
            "aliased_import" => node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or_default(),
            _ => node_text(node, source),
        }
    }

    /// Items of a from-import in source order; `*` for a wildcard.
    fn imported_items(node: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut cursor = node.walk();
        let mut items: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| Self::imported_name(n, source).to_string())
            .filter(|n| !n.is_empty())
            .collect();

        let mut cursor = node.walk();
        if node
            .children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import")
        {
            items.push("*".to_string());
        }
        items
    }

    /// Module and relative level from the `module_name` field.
    fn from_header(node: Node<'_>, source: &[u8]) -> Option<ModuleReference> {
        let module_node = node.child_by_field_name("module_name")?;
        // `from .. models import x` is legal; drop the inner whitespace
        let written: String = node_text(module_node, source).split_whitespace().collect();
        Some(ModuleReference::from_dotted(&written))
    }

    fn visit_import(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let module = Self::imported_name(name, source);
            if module.is_empty() {
                continue;
            }
            let reference = ModuleReference::absolute(module);
            let resolution = reference.classify(out.file_path(), resolver, |_| {
                Some(reference.root_namespace().to_string())
            });
            let external = matches!(resolution, Resolution::External(_));
            if let Some(root) = out.apply(&reference, resolution) {
                if external && module.contains('.') {
                    out.add_component(root, module);
                }
            }
        }
    }

    fn visit_future(&self, node: Node<'_>, source: &[u8], out: &mut ImportCollector<'_>) {
        out.add_external(FUTURE);
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            out.add_component(FUTURE, Self::imported_name(name, source));
        }
    }

    fn visit_from_import(
        &self,
        node: Node<'_>,
        source: &[u8],
        resolver: &dyn ImportResolver,
        out: &mut ImportCollector<'_>,
    ) {
        let Some(reference) = Self::from_header(node, source) else {
            return;
        };
        if reference.level == 0 && reference.module == FUTURE {
            self.visit_future(node, source, out);
            return;
        }

        let items = Self::imported_items(node, source);
        let written = format!("{}{}", ".".repeat(reference.level), reference.module);
        for item in &items {
            out.add_component(written.as_str(), item.as_str());
        }

        let file = out.file_path();
        let explicit: Vec<&str> = items
            .iter()
            .map(String::as_str)
            .filter(|i| *i != "*")
            .collect();

        // `from . import a, b`: the items are the modules
        if reference.module.is_empty() {
            let mut any_local = false;
            for item in &explicit {
                if let Some(path) = resolver.resolve(file, item, reference.level) {
                    out.add_local(path);
                    any_local = true;
                }
            }
            if !any_local {
                let resolution = reference.classify(file, resolver, |_| None);
                out.apply(&reference, resolution);
            }
            return;
        }

        match reference.classify(file, resolver, |_| Some(reference.root_namespace().to_string())) {
            Resolution::Local(path) if path.ends_with("__init__.py") && !explicit.is_empty() => {
                let submodules: Vec<_> = explicit
                    .iter()
                    .filter_map(|item| {
                        resolver.resolve(
                            file,
                            &format!("{}.{}", reference.module, item),
                            reference.level,
                        )
                    })
                    .collect();
                if submodules.is_empty() {
                    out.add_local(path);
                } else {
                    for submodule in submodules {
                        out.add_local(submodule);
                    }
                }
            }
            resolution => {
                out.apply(&reference, resolution);
            }
        }
    }
}

impl ImportExtractor for PythonHandler {
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
                "import_statement" => self.visit_import(node, source, resolver, &mut out),
                "import_from_statement" => self.visit_from_import(node, source, resolver, &mut out),
                "future_import_statement" => self.visit_future(node, source, &mut out),
                _ => return Visit::Descend,
            }
            Visit::Skip
        });
        out.finish()
    }
}
