use std::fmt;

use crate::ir::{Instruction, ListingError, parse_listing};
use crate::pass::Acceptor;

pub mod x86;

pub use x86::X86Emitter;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
  #[error("ir listing - {0}")]
  Listing(#[from] ListingError),

  #[error("formatting assembly failed")]
  Format(#[from] fmt::Error),
}

/// Renders a flat IR sequence as x86 assembly text
pub fn emit(instructions: &[Instruction]) -> Result<String, EmitError> {
  instructions.accept(X86Emitter::new())
}

/// Reads an IR listing and renders it, opcodes outside the closed set are rejected
pub fn emit_listing(text: &str) -> Result<String, EmitError> {
  let instructions = parse_listing(text)?;
  tracing::debug!(instructions = instructions.len(), "read ir listing");
  emit(&instructions)
}
