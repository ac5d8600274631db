use std::fmt;
use std::str::FromStr;

// tree form

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
  Add,
  Subtract,
  Multiply,
  Divide,
}

impl BinaryOperator {
  /// The flat opcode computing this operator against the accumulator
  pub fn opcode(self) -> Opcode {
    match self {
      Self::Add => Opcode::Add,
      Self::Subtract => Opcode::Subtract,
      Self::Multiply => Opcode::Multiply,
      Self::Divide => Opcode::Divide,
    }
  }
}

impl fmt::Display for BinaryOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Add => write!(f, "+"),
      Self::Subtract => write!(f, "-"),
      Self::Multiply => write!(f, "*"),
      Self::Divide => write!(f, "/"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
  Negate,
  Not,
}

impl fmt::Display for UnaryOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Negate => write!(f, "-"),
      Self::Not => write!(f, "!"),
    }
  }
}

/// node in the tree-shaped arithmetic IR, one per lowered statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  /// `target = value`
  Assign { target: String, value: Box<Node> },

  /// `left op right`
  BinaryOp {
    left: Box<Node>,
    op: BinaryOperator,
    right: Box<Node>,
  },

  /// integer constant
  Constant(i64),

  /// `op operand`
  UnaryOp { op: UnaryOperator, operand: Box<Node> },
}

impl Node {
  pub fn binary(left: Node, op: BinaryOperator, right: Node) -> Self {
    Self::BinaryOp {
      left: Box::new(left),
      op,
      right: Box::new(right),
    }
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Node::Assign { target, value } => write!(f, "{target} = {value}"),
      Node::BinaryOp { left, op, right } => write!(f, "({left} {op} {right})"),
      Node::Constant(v) => write!(f, "{v}"),
      Node::UnaryOp { op, operand } => write!(f, "({op}{operand})"),
    }
  }
}

// flat form

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown opcode '{0}'")]
pub struct UnknownOpcode(pub String);

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
  Add = 1,
  Subtract,
  Multiply,
  Divide,
}

impl Opcode {
  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Subtract => "sub",
      Self::Multiply => "mul",
      Self::Divide => "div",
    }
  }
}

impl TryFrom<u8> for Opcode {
  type Error = UnknownOpcode;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      1 => Ok(Self::Add),
      2 => Ok(Self::Subtract),
      3 => Ok(Self::Multiply),
      4 => Ok(Self::Divide),
      other => Err(UnknownOpcode(other.to_string())),
    }
  }
}

impl FromStr for Opcode {
  type Err = UnknownOpcode;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "add" => Ok(Self::Add),
      "sub" => Ok(Self::Subtract),
      "mul" => Ok(Self::Multiply),
      "div" => Ok(Self::Divide),
      // numeric opcodes are accepted too, mostly for hand-written listings
      other => match other.parse::<u8>() {
        Ok(code) => Self::try_from(code),
        Err(_) => Err(UnknownOpcode(other.to_string())),
      },
    }
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.mnemonic())
  }
}

/// One arithmetic step against the implicit accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
  pub opcode: Opcode,
  pub operand1: i64,
  pub operand2: i64,
}

impl Instruction {
  pub fn new(opcode: Opcode, operand1: i64, operand2: i64) -> Self {
    Self {
      opcode,
      operand1,
      operand2,
    }
  }
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}, {}", self.opcode, self.operand1, self.operand2)
  }
}

// listings

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
  #[error("line {line} - {source}")]
  UnknownOpcode { line: usize, source: UnknownOpcode },

  #[error("line {line} - {reason}")]
  Malformed { line: usize, reason: String },
}

/// Renders instructions one per line as `<mnemonic> <operand1>, <operand2>`
pub fn listing(instructions: &[Instruction]) -> String {
  let mut out = String::new();
  for instruction in instructions {
    out.push_str(&instruction.to_string());
    out.push('\n');
  }
  out
}

/// Reads back a listing written by [`listing`], blank lines and `;` comments are skipped
pub fn parse_listing(text: &str) -> Result<Vec<Instruction>, ListingError> {
  let mut instructions = Vec::new();
  for (idx, raw) in text.lines().enumerate() {
    let line = idx + 1;
    let content = raw.split(';').next().unwrap_or_default().trim();
    if content.is_empty() {
      continue;
    }

    let (mnemonic, rest) = content
      .split_once(char::is_whitespace)
      .ok_or_else(|| ListingError::Malformed {
        line,
        reason: format!("missing operands after '{content}'"),
      })?;
    let opcode = mnemonic
      .parse::<Opcode>()
      .map_err(|source| ListingError::UnknownOpcode { line, source })?;

    let operands: Vec<&str> = rest.split(',').map(str::trim).collect();
    let [first, second] = operands.as_slice() else {
      return Err(ListingError::Malformed {
        line,
        reason: format!("expected 2 operands, got {}", operands.len()),
      });
    };
    let operand = |s: &str| {
      // operands are 32-bit, the width of the accumulator
      s.parse::<i32>().map(i64::from).map_err(|_| ListingError::Malformed {
        line,
        reason: format!("invalid operand '{s}'"),
      })
    };
    instructions.push(Instruction::new(opcode, operand(*first)?, operand(*second)?));
  }
  Ok(instructions)
}
