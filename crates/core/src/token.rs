use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
  Illegal = 0,
  Eof,

  // Identifiers + literals
  Ident,
  Int,

  // Operators
  Assign,   // =
  Plus,     // +
  Minus,    // -
  Bang,     // !
  Asterisk, // *
  Slash,    // /
  Lt,       // <
  Gt,       // >
  Eq,       // ==
  NotEq,    // !=

  // Delimiters
  Comma,     // ,
  Semicolon, // ;
  LParen,    // (
  RParen,    // )
  LBrace,    // {
  RBrace,    // }

  // Keywords
  Function, // fn
  Let,      // let
  True,     // true
  False,    // false
  If,       // if
  Else,     // else
  Return,   // return
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Illegal => "<illegal>",
      Self::Eof => "<eof>",

      Self::Ident => "<ident>",
      Self::Int => "<int>",

      Self::Assign => "=",
      Self::Plus => "+",
      Self::Minus => "-",
      Self::Bang => "!",
      Self::Asterisk => "*",
      Self::Slash => "/",
      Self::Lt => "<",
      Self::Gt => ">",
      Self::Eq => "==",
      Self::NotEq => "!=",

      Self::Comma => ",",
      Self::Semicolon => ";",
      Self::LParen => "(",
      Self::RParen => ")",
      Self::LBrace => "{",
      Self::RBrace => "}",

      Self::Function => "fn",
      Self::Let => "let",
      Self::True => "true",
      Self::False => "false",
      Self::If => "if",
      Self::Else => "else",
      Self::Return => "return",
    };
    write!(f, "{s}")
  }
}

static KEYWORDS: OnceLock<HashMap<&'static str, Kind>> = OnceLock::new();

fn init_keywords() -> HashMap<&'static str, Kind> {
  let mut m = HashMap::new();
  m.insert("fn", Kind::Function);
  m.insert("let", Kind::Let);
  m.insert("true", Kind::True);
  m.insert("false", Kind::False);
  m.insert("if", Kind::If);
  m.insert("else", Kind::Else);
  m.insert("return", Kind::Return);
  m
}

pub fn lookup_identifier(s: &str) -> Kind {
  let map = KEYWORDS.get_or_init(init_keywords);
  *map.get(s).unwrap_or(&Kind::Ident)
}

/// 1-based line/column of the first character of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
  pub line: usize,
  pub column: usize,
}

impl Default for Position {
  fn default() -> Self {
    Self { line: 1, column: 1 }
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
  pub kind: Kind,
  pub literal: String,
  pub pos: Position,
}

impl Token {
  pub fn new(kind: Kind, literal: impl Into<String>) -> Self {
    Self {
      kind,
      literal: literal.into(),
      pos: Position::default(),
    }
  }

  #[must_use]
  pub fn at(mut self, pos: Position) -> Self {
    self.pos = pos;
    self
  }

  pub fn is_eof(&self) -> bool {
    self.kind == Kind::Eof
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      Kind::Ident | Kind::Int | Kind::Illegal => {
        write!(f, "{} {:?} at {}", self.kind, self.literal, self.pos)
      }
      _ => write!(f, "'{}' at {}", self.kind, self.pos),
    }
  }
}
