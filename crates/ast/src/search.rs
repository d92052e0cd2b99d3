//! Token search over arbitrary subtrees.

use crate::nodes::AstNode;

/// First node, in pre-order, whose token value equals `target` ignoring case.
///
/// A matching node is returned without descending into it, and an earlier
/// child's match always wins over a later child's. Composite nodes carry no
/// token and never match themselves. An empty `target` matches nothing.
pub fn find_token<'a, 'arena>(
    root: &'a AstNode<'arena>,
    target: &str,
) -> Option<&'a AstNode<'arena>> {
    if target.is_empty() {
        return None;
    }

    // Explicit stack so deeply nested datatypes cannot overflow the call stack.
    // Children are pushed in reverse to pop them left to right.
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if token_matches(node, target) {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

/// Every match of `target` in pre-order, without descending into matches.
/// The first element, if any, is what [`find_token`] returns.
pub fn find_all_tokens<'a, 'arena>(
    root: &'a AstNode<'arena>,
    target: &str,
) -> Vec<&'a AstNode<'arena>> {
    let mut matches = Vec::new();
    if target.is_empty() {
        return matches;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if token_matches(node, target) {
            matches.push(node);
            continue;
        }
        stack.extend(node.children.iter().rev());
    }
    matches
}

fn token_matches(node: &AstNode<'_>, target: &str) -> bool {
    node.token
        .is_some_and(|value| value.eq_ignore_ascii_case(target))
}
