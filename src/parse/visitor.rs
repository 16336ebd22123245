//! Whole-tree traversal shared by every language handler.
//!
//! The walk is iterative so deeply nested sources cannot exhaust the stack.
//! Node kinds listed as leaves (string literals, comments) are never entered:
//! import-looking text inside them is invisible to the handlers.

use std::path::Path;
use tree_sitter::Node;

/// What the walker should do after a node has been offered to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Continue into the node's children.
    Descend,
    /// The handler consumed this node; do not enter its children.
    Skip,
}

pub struct TreeWalker<'k> {
    leaf_kinds: &'k [&'k str],
    max_depth: usize,
}

impl<'k> TreeWalker<'k> {
    pub fn new(leaf_kinds: &'k [&'k str], max_depth: usize) -> Self {
        Self {
            leaf_kinds,
            max_depth,
        }
    }

    /// Visit every node of `root` in source order (pre-order).
    pub fn walk<'t>(
        &self,
        root: Node<'t>,
        file_path: &Path,
        mut visit: impl FnMut(Node<'t>) -> Visit,
    ) {
        let mut stack: Vec<(Node<'t>, usize)> = vec![(root, 0)];
        let mut depth_logged = false;
        let mut children = Vec::new();

        while let Some((node, depth)) = stack.pop() {
            if self.leaf_kinds.contains(&node.kind()) {
                continue;
            }
            if depth >= self.max_depth {
                if !depth_logged {
                    tracing::warn!(
                        "Tree depth limit ({}) reached in {}, skipping deeper nodes",
                        self.max_depth,
                        file_path.display()
                    );
                    depth_logged = true;
                }
                continue;
            }
            if visit(node) == Visit::Skip {
                continue;
            }

            let mut cursor = node.walk();
            children.clear();
            children.extend(node.children(&mut cursor));
            // Reverse so the leftmost child is popped first
            for child in children.drain(..).rev() {
                stack.push((child, depth + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_python(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn visits_in_source_order() {
        let tree = parse_python("import a\nimport b\nimport c\n");
        let source = b"import a\nimport b\nimport c\n";
        let mut seen = Vec::new();
        TreeWalker::new(&[], usize::MAX).walk(tree.root_node(), Path::new("t.py"), |node| {
            if node.kind() == "dotted_name" {
                seen.push(node.utf8_text(source).unwrap().to_string());
            }
            Visit::Descend
        });
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn leaf_kinds_are_not_entered() {
        let source = "x = \"\"\"\nimport hidden\n\"\"\"\n";
        let tree = parse_python(source);
        let mut kinds = Vec::new();
        TreeWalker::new(&["string"], usize::MAX).walk(
            tree.root_node(),
            Path::new("t.py"),
            |node| {
                kinds.push(node.kind());
                Visit::Descend
            },
        );
        assert!(!kinds.contains(&"string"));
        assert!(!kinds.contains(&"string_content"));
    }

    #[test]
    fn depth_limit_stops_descent() {
        let tree = parse_python("def f():\n    import deep\n");
        let mut found = false;
        TreeWalker::new(&[], 2).walk(tree.root_node(), Path::new("t.py"), |node| {
            if node.kind() == "import_statement" {
                found = true;
            }
            Visit::Descend
        });
        assert!(!found);
    }
}
