//! Arena-allocated PL/SQL syntax tree shared by every check.

pub mod arena;
pub mod builder;
pub mod location;
pub mod nodes;
pub mod search;
pub mod visitor;

pub use arena::AstArena;
pub use builder::NodeBuilder;
pub use location::{Located, Position, SourceLocation, SourceRange};
pub use nodes::{AstNode, GrammarKind, Keyword, SourceFile};
pub use search::{find_all_tokens, find_token};
pub use visitor::{walk, AstVisitor};
