//! Tree-sitter parser integration for Python snippets.

use crate::core::{Error, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parsed snippet together with the text it was parsed from.
pub struct PythonAst {
    pub tree: Tree,
    pub source: String,
}

impl PythonAst {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(&node, &self.source)
    }
}

/// Parse Python source into a tree-sitter tree.
///
/// Tree-sitter recovers from bad input by inserting ERROR and MISSING
/// nodes, so a tree is produced for almost any text. A tree containing
/// either kind is rejected here with the location of the first one. The
/// grammar also accepts some Python 2 forms and argument orders that a
/// Python 3 compiler refuses; those are rejected the same way.
pub fn parse_source(content: &str) -> Result<PythonAst> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| Error::parse(0, 0, format!("Failed to set tree-sitter language: {e}")))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| Error::parse(0, 0, "Parser returned no tree"))?;

    if has_parse_errors(&tree) {
        let (line, column, message) = first_error(tree.root_node())
            .map(|node| {
                let message = if node.is_missing() {
                    format!("missing '{}'", node.kind())
                } else {
                    "invalid syntax".to_string()
                };
                (node_line(&node), node_column(&node), message)
            })
            .unwrap_or((1, 1, "invalid syntax".to_string()));
        return Err(Error::parse(line, column, message));
    }

    if let Some((node, message)) = first_rejected_construct(tree.root_node()) {
        return Err(Error::parse(node_line(&node), node_column(&node), message));
    }

    Ok(PythonAst {
        tree,
        source: content.to_string(),
    })
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    let found = descendants(root, &mut cursor).find(|node| node.is_error() || node.is_missing());
    found
}

fn first_rejected_construct(root: Node<'_>) -> Option<(Node<'_>, &'static str)> {
    let mut cursor = root.walk();
    let found = descendants(root, &mut cursor)
        .find_map(|node| rejection_reason(node).map(|message| (node, message)));
    found
}

/// Why Python 3 refuses `node`, for forms the grammar still parses.
fn rejection_reason(node: Node<'_>) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("Missing parentheses in call to 'print'"),
        "exec_statement" => Some("Missing parentheses in call to 'exec'"),
        "<>" => Some("invalid syntax"),
        "argument_list" => argument_order_error(node),
        _ => None,
    }
}

fn argument_order_error(arguments: Node<'_>) -> Option<&'static str> {
    let mut seen_keyword = false;
    let mut seen_mapping = false;
    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        match argument.kind() {
            "comment" => {}
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_mapping = true,
            "list_splat" if seen_mapping => {
                return Some("iterable argument unpacking follows keyword argument unpacking")
            }
            "list_splat" => {}
            _ if seen_mapping => {
                return Some("positional argument follows keyword argument unpacking")
            }
            _ if seen_keyword => return Some("positional argument follows keyword argument"),
            _ => {}
        }
    }
    None
}

/// Pre-order iterator over `root` and every node below it, named or not.
pub fn descendants<'tree, 'c>(
    root: Node<'tree>,
    cursor: &'c mut tree_sitter::TreeCursor<'tree>,
) -> impl Iterator<Item = Node<'tree>> + 'c {
    cursor.reset(root);
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let node = cursor.node();
        if cursor.goto_first_child() {
            return Some(node);
        }
        loop {
            if cursor.node() == root {
                done = true;
                return Some(node);
            }
            if cursor.goto_next_sibling() {
                return Some(node);
            }
            if !cursor.goto_parent() {
                done = true;
                return Some(node);
            }
        }
    })
}

/// Named nodes only, in pre-order.
pub fn named_descendants<'tree, 'c>(
    root: Node<'tree>,
    cursor: &'c mut tree_sitter::TreeCursor<'tree>,
) -> impl Iterator<Item = Node<'tree>> + 'c {
    descendants(root, cursor).filter(|node| node.is_named())
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the column number for a tree-sitter node (1-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_module() {
        let ast = parse_source("x = 1\nprint(x)\n").unwrap();
        assert_eq!(ast.root().kind(), "module");
        assert!(!has_parse_errors(&ast.tree));
    }

    #[test]
    fn test_parse_empty_source() {
        let ast = parse_source("").unwrap();
        assert_eq!(ast.root().kind(), "module");
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = parse_source("x = 1\ndef broken(:\n    pass\n").err().unwrap();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_python2_statements_are_rejected() {
        match parse_source("print 'hello'\n").err() {
            Some(Error::Parse { message, .. }) => {
                assert_eq!(message, "Missing parentheses in call to 'print'")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        for code in ["x = 1\nexec 'x = 2'\n", "if a <> b:\n    pass\n", "print >>f, x\n"] {
            assert!(parse_source(code).is_err(), "{code}");
        }
    }

    #[test]
    fn test_argument_order_is_checked() {
        for code in ["f(**a, *b)\n", "f(a=1, b)\n", "f(**a, b)\n"] {
            assert!(parse_source(code).is_err(), "{code}");
        }
        for code in [
            "f(a, *b, c=1, **d)\n",
            "f(*a, k=1, *b)\n",
            "f(**a, k=1)\n",
            "print('hi', end='')\n",
            "total = sum(x for x in data)\n",
        ] {
            assert!(parse_source(code).is_ok(), "{code}");
        }
    }

    #[test]
    fn test_rejected_construct_location() {
        match parse_source("x = 1\nprint x\n").err() {
            Some(Error::Parse { line, column, .. }) => assert_eq!((line, column), (2, 1)),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_descendants_visits_every_node_once() {
        let ast = parse_source("for i in range(3):\n    print(i)\n").unwrap();
        let mut cursor = ast.root().walk();
        let kinds: Vec<&str> = named_descendants(ast.root(), &mut cursor)
            .map(|n| n.kind())
            .collect();
        assert_eq!(kinds[0], "module");
        assert_eq!(kinds.iter().filter(|k| **k == "for_statement").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "call").count(), 2);
    }

    #[test]
    fn test_descendants_of_subtree_stay_inside_it() {
        let ast = parse_source("for i in a:\n    pass\nwhile x:\n    pass\n").unwrap();
        let for_node = ast.root().named_child(0).unwrap();
        assert_eq!(for_node.kind(), "for_statement");

        let mut cursor = for_node.walk();
        let kinds: Vec<&str> = named_descendants(for_node, &mut cursor)
            .map(|n| n.kind())
            .collect();
        assert!(!kinds.contains(&"while_statement"));
    }

    #[test]
    fn test_node_text() {
        let ast = parse_source("total = sum(values)\n").unwrap();
        let mut cursor = ast.root().walk();
        let call = named_descendants(ast.root(), &mut cursor)
            .find(|n| n.kind() == "call")
            .unwrap();
        assert_eq!(ast.text(call), "sum(values)");
        assert_eq!(node_line(&call), 1);
        assert_eq!(node_column(&call), 9);
    }
}
