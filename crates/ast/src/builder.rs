use std::cell::{Cell, RefCell};

use crate::arena::AstArena;
use crate::location::{Position, SourceRange};
use crate::nodes::{AstNode, GrammarKind, Keyword};

/// Builds trees in source order, laying tokens out on a virtual source text.
///
/// Tokens receive consecutive ranges separated by a single space, so nodes
/// created earlier always start earlier. Composite ranges cover their children.
///
/// ```
/// use ast::{AstArena, GrammarKind, Keyword, NodeBuilder};
///
/// let arena = AstArena::new();
/// let b = NodeBuilder::new(&arena);
/// let param = b.node(
///     GrammarKind::ParameterDeclaration,
///     vec![
///         b.identifier("p1"),
///         b.keyword(Keyword::In),
///         b.node(GrammarKind::Datatype, vec![b.keyword(Keyword::Nvarchar2)]),
///     ],
/// );
/// assert_eq!(b.text(), "p1 IN NVARCHAR2");
/// assert_eq!(param.children.len(), 3);
/// ```
pub struct NodeBuilder<'arena> {
    arena: &'arena AstArena,
    cursor: Cell<Position>,
    text: RefCell<String>,
}

impl<'arena> NodeBuilder<'arena> {
    pub fn new(arena: &'arena AstArena) -> Self {
        Self {
            arena,
            cursor: Cell::new(Position::start()),
            text: RefCell::new(String::new()),
        }
    }

    /// Leaf node of any kind with an explicit spelling
    pub fn token(&self, kind: GrammarKind, value: &str) -> AstNode<'arena> {
        let mut text = self.text.borrow_mut();
        let mut start = self.cursor.get();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push(' ');
            start = start.advance(' ');
        }
        text.push_str(value);
        let end = start.advance_str(value);

        self.cursor.set(end);
        AstNode::token(self.arena, kind, value, SourceRange::new(start, end))
    }

    /// Keyword leaf spelled in canonical upper case
    pub fn keyword(&self, keyword: Keyword) -> AstNode<'arena> {
        self.token(GrammarKind::Keyword(keyword), keyword.as_str())
    }

    pub fn identifier(&self, name: &str) -> AstNode<'arena> {
        self.token(GrammarKind::Identifier, name)
    }

    pub fn literal(&self, value: &str) -> AstNode<'arena> {
        self.token(GrammarKind::Literal, value)
    }

    pub fn punctuator(&self, value: &str) -> AstNode<'arena> {
        self.token(GrammarKind::Punctuator, value)
    }

    /// Start the next token on a new line
    pub fn newline(&self) {
        self.text.borrow_mut().push('\n');
        self.cursor.set(self.cursor.get().advance('\n'));
    }

    /// Composite node over already built children
    pub fn node(&self, kind: GrammarKind, children: Vec<AstNode<'arena>>) -> AstNode<'arena> {
        let mut node = AstNode::composite(self.arena, kind, SourceRange::single(self.cursor.get()));
        for child in children {
            node.push_child(child);
        }
        node
    }

    /// The virtual source text laid out so far
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }
}
