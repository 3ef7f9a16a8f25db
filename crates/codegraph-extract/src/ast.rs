//! Tree-sitter node traversal helpers, adapted from the teacher's
//! `shared/utils/tree_sitter.rs` (find-by-kind + span/text extraction).

use tree_sitter::Node;

pub fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).find(|child| child.kind() == kind);
    result
}

pub fn find_children_by_kind<'a>(node: &Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

pub fn find_descendant_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            return Some(current);
        }
        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    None
}

pub fn find_descendants_by_kind<'a>(node: &Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut result = Vec::new();
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            result.push(current);
        }
        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    result
}

#[inline]
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// 1-indexed (start_line, end_line), matching the teacher's `Span`
/// convention.
pub fn line_range(node: &Node) -> (u32, u32) {
    (
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

/// Walk up `node`'s ancestor chain and return the nearest ancestor whose
/// kind is in `kinds`.
pub fn nearest_ancestor_of_kind<'a>(node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_python(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn finds_child_by_kind() {
        let tree = parse_python("def f():\n    pass\n");
        let root = tree.root_node();
        let func = find_child_by_kind(&root, "function_definition").unwrap();
        assert_eq!(func.kind(), "function_definition");
    }

    #[test]
    fn finds_nested_descendants() {
        let tree = parse_python("def outer():\n    def inner():\n        pass\n");
        let root = tree.root_node();
        let funcs = find_descendants_by_kind(&root, "function_definition");
        assert_eq!(funcs.len(), 2);
    }

    #[test]
    fn nearest_ancestor_finds_enclosing_class() {
        let tree = parse_python("class C:\n    def m(self):\n        pass\n");
        let root = tree.root_node();
        let method = find_descendant_by_kind(&root, "function_definition").unwrap();
        let class = nearest_ancestor_of_kind(&method, &["class_definition"]);
        assert!(class.is_some());
    }
}
