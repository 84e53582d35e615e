//! ERROR / MISSING node accounting for tree-sitter trees.

use tree_sitter::Node;

/// Count ERROR and MISSING nodes and report the 1-based line of the first one.
pub fn count_errors(root: Node) -> (u32, Option<u32>) {
    let mut count = 0u32;
    let mut first_line = None;
    collect_errors(root, &mut count, &mut first_line);
    (count, first_line)
}

fn collect_errors(node: Node, count: &mut u32, first_line: &mut Option<u32>) {
    if node.is_error() || node.is_missing() {
        *count += 1;
        let line = node.start_position().row as u32 + 1;
        if first_line.map_or(true, |l| line < l) {
            *first_line = Some(line);
        }
    }
    // Subtrees without errors are skipped.
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, count, first_line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_python(src: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn test_clean_tree_has_no_errors() {
        let tree = parse_python("def f(x):\n    return x\n");
        assert_eq!(count_errors(tree.root_node()), (0, None));
    }

    #[test]
    fn test_first_error_line_is_reported() {
        let tree = parse_python("def ok():\n    pass\n\ndef broken(:\n    pass\n");
        let (count, line) = count_errors(tree.root_node());
        assert!(count > 0);
        assert_eq!(line, Some(4));
    }
}
