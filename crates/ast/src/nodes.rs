use bumpalo::collections::Vec as BumpVec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arena::AstArena;
use crate::location::{Located, SourceRange};

/// Reserved and non-reserved PL/SQL words the grammar tags as keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Create,
    Or,
    Replace,
    Package,
    Body,
    Procedure,
    Function,
    Return,
    Is,
    As,
    Begin,
    End,
    Null,
    In,
    Out,
    Nocopy,
    Default,
    Type,
    Table,
    Of,
    Index,
    By,
    Varray,
    Record,
    Not,
    Rowtype,
    Char,
    Nchar,
    Varchar,
    Varchar2,
    Nvarchar2,
    Clob,
    Nclob,
    Number,
    Integer,
    PlsInteger,
    Date,
    Timestamp,
    Boolean,
}

impl Keyword {
    /// Canonical (upper case) spelling of the keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Or => "OR",
            Keyword::Replace => "REPLACE",
            Keyword::Package => "PACKAGE",
            Keyword::Body => "BODY",
            Keyword::Procedure => "PROCEDURE",
            Keyword::Function => "FUNCTION",
            Keyword::Return => "RETURN",
            Keyword::Is => "IS",
            Keyword::As => "AS",
            Keyword::Begin => "BEGIN",
            Keyword::End => "END",
            Keyword::Null => "NULL",
            Keyword::In => "IN",
            Keyword::Out => "OUT",
            Keyword::Nocopy => "NOCOPY",
            Keyword::Default => "DEFAULT",
            Keyword::Type => "TYPE",
            Keyword::Table => "TABLE",
            Keyword::Of => "OF",
            Keyword::Index => "INDEX",
            Keyword::By => "BY",
            Keyword::Varray => "VARRAY",
            Keyword::Record => "RECORD",
            Keyword::Not => "NOT",
            Keyword::Rowtype => "ROWTYPE",
            Keyword::Char => "CHAR",
            Keyword::Nchar => "NCHAR",
            Keyword::Varchar => "VARCHAR",
            Keyword::Varchar2 => "VARCHAR2",
            Keyword::Nvarchar2 => "NVARCHAR2",
            Keyword::Clob => "CLOB",
            Keyword::Nclob => "NCLOB",
            Keyword::Number => "NUMBER",
            Keyword::Integer => "INTEGER",
            Keyword::PlsInteger => "PLS_INTEGER",
            Keyword::Date => "DATE",
            Keyword::Timestamp => "TIMESTAMP",
            Keyword::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of grammar kinds a node can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrammarKind {
    /// Root of one source file
    CompilationUnit,
    CreatePackage,
    CreateProcedure,
    CreateFunction,
    ProcedureDeclaration,
    FunctionDeclaration,
    /// One formal parameter of a routine signature
    ParameterDeclaration,
    /// Datatype of a parameter, variable, field or return clause
    Datatype,
    CharacterDatatype,
    NumericDatatype,
    DateDatatype,
    LobDatatype,
    BooleanDatatype,
    /// Reference to a user-defined type, `%TYPE` or `%ROWTYPE`
    CustomDatatype,
    TypeDeclaration,
    TableOfDeclaration,
    VarrayDeclaration,
    RecordDeclaration,
    RecordFieldDeclaration,
    DefaultValue,
    ReturnClause,
    Identifier,
    Literal,
    Punctuator,
    Keyword(Keyword),
}

impl fmt::Display for GrammarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarKind::Keyword(keyword) => write!(f, "{}", keyword),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A syntax tree node.
///
/// Every grammar kind shares this shape: leaves (keywords, identifiers,
/// literals, punctuators) carry a token value, composites carry children
/// in source order.
///
/// Queries and traversals over a node are iterative, but dropping one is
/// not: `BumpVec` drops children recursively, so a tree nested tens of
/// thousands of levels deep can overflow the stack when it goes out of scope.
#[derive(Debug, Clone)]
pub struct AstNode<'arena> {
    pub kind: GrammarKind,
    pub token: Option<&'arena str>,
    pub children: BumpVec<'arena, AstNode<'arena>>,
    pub range: SourceRange,
}

impl<'arena> AstNode<'arena> {
    /// Create a leaf node holding a token value
    pub fn token(
        arena: &'arena AstArena,
        kind: GrammarKind,
        value: &str,
        range: SourceRange,
    ) -> Self {
        Self {
            kind,
            token: Some(arena.alloc_str(value)),
            children: BumpVec::new_in(&arena.bump),
            range,
        }
    }

    /// Create an empty composite node; children are appended with [`AstNode::push_child`]
    pub fn composite(arena: &'arena AstArena, kind: GrammarKind, range: SourceRange) -> Self {
        Self {
            kind,
            token: None,
            children: BumpVec::new_in(&arena.bump),
            range,
        }
    }

    /// Append a child, widening this node's range to cover it
    pub fn push_child(&mut self, child: AstNode<'arena>) {
        self.range = if self.children.is_empty() && self.token.is_none() {
            child.range
        } else {
            self.range.cover(&child.range)
        };
        self.children.push(child);
    }

    pub fn is(&self, kind: GrammarKind) -> bool {
        self.kind == kind
    }

    /// Whether any direct child has the given kind. Descendants are not inspected.
    pub fn has_direct_child(&self, kind: GrammarKind) -> bool {
        self.children.iter().any(|child| child.kind == kind)
    }

    /// First direct child of the given kind
    pub fn first_child(&self, kind: GrammarKind) -> Option<&AstNode<'arena>> {
        self.children.iter().find(|child| child.kind == kind)
    }

    /// All direct children of the given kind, in source order
    pub fn children_of(&self, kind: GrammarKind) -> impl Iterator<Item = &AstNode<'arena>> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl<'arena> Located for AstNode<'arena> {
    fn range(&self) -> SourceRange {
        self.range
    }
}

/// One parsed source file
#[derive(Debug, Clone)]
pub struct SourceFile<'arena> {
    pub path: &'arena str,
    /// Whether the file belongs to the test source set
    pub is_test: bool,
    pub root: AstNode<'arena>,
}

impl<'arena> SourceFile<'arena> {
    pub fn new(arena: &'arena AstArena, path: &str, root: AstNode<'arena>) -> Self {
        Self {
            path: arena.alloc_str(path),
            is_test: false,
            root,
        }
    }

    pub fn with_test(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self
    }
}

impl<'arena> Located for SourceFile<'arena> {
    fn range(&self) -> SourceRange {
        self.root.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Position;

    fn range(start: usize, end: usize) -> SourceRange {
        SourceRange::new(Position::new(1, start + 1, start), Position::new(1, end + 1, end))
    }

    #[test]
    fn test_keyword_spelling() {
        assert_eq!(Keyword::Nvarchar2.as_str(), "NVARCHAR2");
        assert_eq!(Keyword::PlsInteger.to_string(), "PLS_INTEGER");
        assert_eq!(GrammarKind::Keyword(Keyword::Out).to_string(), "OUT");
        assert_eq!(GrammarKind::Datatype.to_string(), "Datatype");
    }

    #[test]
    fn test_direct_child_queries_do_not_recurse() {
        let arena = AstArena::new();
        let mut datatype = AstNode::composite(&arena, GrammarKind::Datatype, range(0, 0));
        datatype.push_child(AstNode::token(
            &arena,
            GrammarKind::Keyword(Keyword::Out),
            "OUT",
            range(5, 8),
        ));

        let mut param =
            AstNode::composite(&arena, GrammarKind::ParameterDeclaration, range(0, 0));
        param.push_child(AstNode::token(&arena, GrammarKind::Identifier, "p1", range(0, 2)));
        param.push_child(datatype);

        assert!(param.has_direct_child(GrammarKind::Datatype));
        assert!(!param.has_direct_child(GrammarKind::Keyword(Keyword::Out)));
        assert!(param.first_child(GrammarKind::Keyword(Keyword::In)).is_none());
        assert_eq!(param.subtree_size(), 4);
    }

    #[test]
    fn test_push_child_widens_range() {
        let arena = AstArena::new();
        let mut param =
            AstNode::composite(&arena, GrammarKind::ParameterDeclaration, range(0, 0));
        param.push_child(AstNode::token(&arena, GrammarKind::Identifier, "p1", range(0, 2)));
        param.push_child(AstNode::token(
            &arena,
            GrammarKind::Keyword(Keyword::In),
            "IN",
            range(3, 5),
        ));

        assert_eq!(param.start().offset(), 0);
        assert_eq!(param.end().offset(), 5);
        assert_eq!(param.children_of(GrammarKind::Identifier).count(), 1);
    }
}
