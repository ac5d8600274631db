pub mod ast;
pub mod backend;
pub mod compile;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod pass;
pub mod token;

pub use compile::{CompileError, compile};
