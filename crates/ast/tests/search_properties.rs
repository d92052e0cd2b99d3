//! Property tests for the token locator over generated trees.

use ast::{find_all_tokens, find_token, AstArena, AstNode, GrammarKind, Located, NodeBuilder};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Shape {
    Leaf(&'static str),
    Node(Vec<Shape>),
}

const SPELLINGS: [&str; 7] = [
    "nvarchar2",
    "NVARCHAR2",
    "NVarChar2",
    "varchar2",
    "nvarchar",
    "number",
    "p1",
];

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = prop::sample::select(SPELLINGS.to_vec()).prop_map(Shape::Leaf);
    leaf.prop_recursive(6, 64, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(Shape::Node)
    })
}

fn build<'a>(b: &NodeBuilder<'a>, shape: &Shape) -> AstNode<'a> {
    match shape {
        Shape::Leaf(value) => b.token(GrammarKind::Identifier, value),
        Shape::Node(children) => {
            let children = children.iter().map(|child| build(b, child)).collect();
            b.node(GrammarKind::Datatype, children)
        }
    }
}

fn count_matches(shape: &Shape) -> usize {
    match shape {
        Shape::Leaf(value) => usize::from(value.eq_ignore_ascii_case("nvarchar2")),
        Shape::Node(children) => children.iter().map(count_matches).sum(),
    }
}

proptest! {
    #[test]
    fn first_match_is_leftmost(shape in shape_strategy()) {
        let arena = AstArena::new();
        let b = NodeBuilder::new(&arena);
        let root = build(&b, &shape);

        let all = find_all_tokens(&root, "nvarchar2");
        prop_assert_eq!(all.len(), count_matches(&shape));

        match find_token(&root, "nvarchar2") {
            Some(first) => {
                prop_assert!(std::ptr::eq(first, all[0]));
                for other in &all {
                    prop_assert!(first.start() <= other.start());
                }
            }
            None => prop_assert!(all.is_empty()),
        }
    }

    #[test]
    fn target_case_does_not_matter(shape in shape_strategy()) {
        let arena = AstArena::new();
        let b = NodeBuilder::new(&arena);
        let root = build(&b, &shape);

        let lower = find_token(&root, "nvarchar2").map(|node| node.range());
        let upper = find_token(&root, "NVARCHAR2").map(|node| node.range());
        prop_assert_eq!(lower, upper);

        for found in find_all_tokens(&root, "Nvarchar2") {
            let token = found.token.unwrap_or_default();
            prop_assert!(token.eq_ignore_ascii_case("nvarchar2"));
        }
    }
}
