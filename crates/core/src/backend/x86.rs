use std::fmt::Write;

use crate::backend::EmitError;
use crate::ir::{Instruction, Opcode};
use crate::pass::Pass;

const HEADER: &str = "section .text";

/// the single accumulator every instruction reads and writes
pub const ACCUMULATOR: &str = "eax";

/// Flat IR -> x86 (intel syntax) text emitter
///
/// one accumulator, no labels, no prologue... instructions are written in
/// exactly the order they arrive
#[derive(Debug, Default)]
pub struct X86Emitter {
  out: String,
}

impl X86Emitter {
  pub fn new() -> Self {
    Self { out: String::new() }
  }

  fn emit_instruction(&mut self, instruction: &Instruction) -> Result<(), EmitError> {
    let acc = ACCUMULATOR;
    match instruction.opcode {
      Opcode::Add => writeln!(self.out, "add {acc}, {}", instruction.operand1)?,
      Opcode::Subtract => writeln!(self.out, "sub {acc}, {}", instruction.operand2)?,
      Opcode::Multiply => writeln!(self.out, "imul {acc}, {}", instruction.operand1)?,
      Opcode::Divide => {
        // sign extend eax into edx:eax before the signed divide
        writeln!(self.out, "cdq")?;
        writeln!(self.out, "idiv {}", instruction.operand2)?;
      }
    }
    Ok(())
  }
}

impl Pass<[Instruction]> for X86Emitter {
  type Output = String;
  type Error = EmitError;

  fn run(mut self, instructions: &[Instruction]) -> Result<String, EmitError> {
    writeln!(self.out, "{HEADER}")?;
    writeln!(self.out)?;
    for instruction in instructions {
      tracing::trace!(%instruction, "emit");
      self.emit_instruction(instruction)?;
    }
    writeln!(self.out)?;
    tracing::debug!(
      instructions = instructions.len(),
      bytes = self.out.len(),
      "emitted assembly"
    );
    Ok(self.out)
  }
}
