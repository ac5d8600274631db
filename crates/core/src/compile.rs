//! Stage entry points and the composed source -> assembly pipeline
//!
//! Every stage is a pure function of its input, running inside a `tracing`
//! span named after the stage. `compile` stops at the first failing stage.

use crate::ast::Program;
use crate::backend::{self, EmitError};
use crate::ir::Instruction;
use crate::lexer::{self, Lexer};
use crate::lower::{Lower, Lowerror};
use crate::parser::{Parser, ParserError};
use crate::pass::Acceptor;
use crate::token::Token;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
  #[error("parse errors:\n  {}", join_errors(.0))]
  Syntax(Vec<ParserError>),

  #[error("lowering error - {0}")]
  Lowering(#[from] Lowerror),

  #[error("emit error - {0}")]
  Emit(#[from] EmitError),
}

impl CompileError {
  /// Name of the stage that failed
  pub fn stage(&self) -> &'static str {
    match self {
      Self::Syntax(_) => "parse",
      Self::Lowering(_) => "lower",
      Self::Emit(_) => "emit",
    }
  }
}

impl From<Vec<ParserError>> for CompileError {
  fn from(errors: Vec<ParserError>) -> Self {
    Self::Syntax(errors)
  }
}

fn join_errors(errors: &[ParserError]) -> String {
  let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
  msgs.join("\n  ")
}

/// Lexes `source`, the last token is always `Eof`
pub fn tokenize(source: &str) -> Vec<Token> {
  let _span = tracing::debug_span!("lex").entered();
  let tokens = lexer::tokenize(source);
  tracing::debug!(tokens = tokens.len(), "lexed source");
  tokens
}

/// Parses a token stream, such as the output of [`tokenize`], into a program
pub fn parse_tokens<T>(tokens: T) -> Result<Program, Vec<ParserError>>
where
  T: IntoIterator<Item = Token>,
{
  let _span = tracing::debug_span!("parse").entered();
  Parser::new(tokens.into_iter()).parse()
}

/// Parses `source` into a program, lexing it lazily
pub fn parse(source: &str) -> Result<Program, Vec<ParserError>> {
  parse_tokens(Lexer::new(source))
}

/// Lowers a program into flat accumulator IR
pub fn lower(program: &Program) -> Result<Vec<Instruction>, Lowerror> {
  let _span = tracing::debug_span!("lower").entered();
  program.accept(Lower::new())
}

/// Renders flat IR as assembly text
pub fn emit(instructions: &[Instruction]) -> Result<String, EmitError> {
  let _span = tracing::debug_span!("emit").entered();
  backend::emit(instructions)
}

/// Source text -> assembly text
pub fn compile(source: &str) -> Result<String, CompileError> {
  let program = parse(source)?;
  let instructions = lower(&program)?;
  Ok(emit(&instructions)?)
}
