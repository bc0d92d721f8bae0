//! Template markup: lexer, grammar and tree types

mod grammar;
pub mod lexer;
pub mod tree;

pub use grammar::parse_fragment;
pub use lexer::Token;
pub use tree::*;
