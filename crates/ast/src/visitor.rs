use crate::nodes::AstNode;

/// Callbacks invoked by [`walk`] for every node of a tree
pub trait AstVisitor {
    /// Called before any child of `node` is visited
    fn visit_node(&mut self, node: &AstNode<'_>);

    /// Called after every child of `node` has been visited
    fn leave_node(&mut self, _node: &AstNode<'_>) {}
}

/// Top-down traversal in document order.
///
/// Each node is entered exactly once, parents before children and earlier
/// siblings (with their subtrees) before later ones.
pub fn walk<V: AstVisitor + ?Sized>(root: &AstNode<'_>, visitor: &mut V) {
    enum Step<'a, 'arena> {
        Enter(&'a AstNode<'arena>),
        Leave(&'a AstNode<'arena>),
    }

    let mut stack = vec![Step::Enter(root)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                log::trace!("enter {} at {:?}", node.kind, node.range.start());
                visitor.visit_node(node);
                stack.push(Step::Leave(node));
                stack.extend(node.children.iter().rev().map(Step::Enter));
            }
            Step::Leave(node) => visitor.leave_node(node),
        }
    }
}
