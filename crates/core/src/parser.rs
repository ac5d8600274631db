use std::iter::Peekable;
use std::mem;

use crate::ast::{
  BlockStatement, Expression, ExpressionStatement, Identifier, InfixOperator, LetStatement,
  PrefixOperator, Program, ReturnStatement, Statement,
};
use crate::token::{Kind as TokenKind, Position, Token};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
  #[error("ran out of input while parsing")]
  UnexpectedEof,

  #[error("expected '{expected}', got {actual}")]
  Expected { expected: TokenKind, actual: Token },

  #[error("no expression starts with {0}")]
  NoPrefixRule(Token),

  #[error("invalid integer literal {0}")]
  InvalidInteger(Token),

  #[error("block opened at {opened} is never closed")]
  UnterminatedBlock { opened: Position },

  #[error("nesting too deep at {at}")]
  TooDeep { at: Position },
}

impl ParserError {
  /// Source position the error points at, if any
  pub fn position(&self) -> Option<Position> {
    match self {
      Self::UnexpectedEof => None,
      Self::Expected { actual, .. } => Some(actual.pos),
      Self::NoPrefixRule(token) | Self::InvalidInteger(token) => Some(token.pos),
      Self::UnterminatedBlock { opened } => Some(*opened),
      Self::TooDeep { at } => Some(*at),
    }
  }
}

/// Most expressions and blocks a statement may nest before parsing gives up
pub const MAX_DEPTH: usize = 256;

/// Binding power of operators, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
  Lowest,
  Equality,   // == !=
  Comparison, // < >
  Sum,        // + -
  Product,    // * /
  Prefix,     // -x !x
  Call,       // f(x)
}

impl Precedence {
  /// Binding power of a token in infix position
  pub fn of(kind: TokenKind) -> Self {
    match kind {
      TokenKind::Eq | TokenKind::NotEq => Self::Equality,
      TokenKind::Lt | TokenKind::Gt => Self::Comparison,
      TokenKind::Plus | TokenKind::Minus => Self::Sum,
      TokenKind::Asterisk | TokenKind::Slash => Self::Product,
      TokenKind::LParen => Self::Call,
      _ => Self::Lowest,
    }
  }
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
  match kind {
    TokenKind::Plus => Some(InfixOperator::Plus),
    TokenKind::Minus => Some(InfixOperator::Minus),
    TokenKind::Asterisk => Some(InfixOperator::Asterisk),
    TokenKind::Slash => Some(InfixOperator::Slash),
    TokenKind::Lt => Some(InfixOperator::Lt),
    TokenKind::Gt => Some(InfixOperator::Gt),
    TokenKind::Eq => Some(InfixOperator::Eq),
    TokenKind::NotEq => Some(InfixOperator::NotEq),
    _ => None,
  }
}

#[derive(Debug, Clone)]
pub struct Parser<I>
where
  I: Iterator<Item = Token>,
{
  tokens: Peekable<I>,
  errors: Vec<ParserError>,
  last: Option<TokenKind>,
  depth: usize,
}

impl<I> Parser<I>
where
  I: Iterator<Item = Token>,
{
  pub fn new(tokens: I) -> Self {
    Self {
      tokens: tokens.peekable(),
      errors: Vec::new(),
      last: None,
      depth: 0,
    }
  }

  /// Parses a stream of tokens into a `Program` AST node
  ///
  /// Statements are recovered at the next `;` after an error so every
  /// malformed statement is reported, in source order
  pub fn parse(mut self) -> Result<Program, Vec<ParserError>> {
    match self.parse_program() {
      Some(program) => Ok(program),
      None => Err(mem::take(&mut self.errors)),
    }
  }

  fn next(&mut self) -> Option<Token> {
    let token = self.tokens.next();
    self.last = token.as_ref().map(|t| t.kind);
    token
  }

  fn next_eof(&mut self) -> Result<Token, ParserError> {
    self.next().ok_or(ParserError::UnexpectedEof)
  }

  fn peek(&mut self) -> Option<&Token> {
    self.tokens.peek()
  }

  fn peek_eof(&mut self) -> Result<&Token, ParserError> {
    self.peek().ok_or(ParserError::UnexpectedEof)
  }

  fn peek_is(&mut self, kind: TokenKind) -> bool {
    matches!(self.peek(), Some(t) if t.kind == kind)
  }

  fn peek_precedence(&mut self) -> Precedence {
    self
      .peek()
      .map_or(Precedence::Lowest, |t| Precedence::of(t.kind))
  }

  fn eat(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
    let token = self.next_eof()?;
    if token.kind == expected {
      Ok(token)
    } else {
      Err(ParserError::Expected {
        expected,
        actual: token,
      })
    }
  }

  fn record<T>(&mut self, result: Result<T, ParserError>) -> Option<T> {
    match result {
      Ok(t) => Some(t),
      Err(e) => {
        self.errors.push(e);
        None
      }
    }
  }

  // past MAX_DEPTH nested levels parsing fails with TooDeep
  fn descend<T>(
    &mut self,
    parse: impl FnOnce(&mut Self) -> Result<T, ParserError>,
  ) -> Result<T, ParserError> {
    if self.depth >= MAX_DEPTH {
      let at = self.peek().map(|t| t.pos).unwrap_or_default();
      return Err(ParserError::TooDeep { at });
    }
    self.depth += 1;
    let result = parse(self);
    self.depth -= 1;
    result
  }

  // a failure on `;` already ended its statement
  fn synchronize(&mut self) {
    if self.last == Some(TokenKind::Semicolon) {
      return;
    }
    while let Some(token) = self.peek() {
      if token.kind == TokenKind::Semicolon {
        self.next();
        return;
      }
      self.next();
    }
  }

  fn parse_comma_separated<T>(
    &mut self,
    terminator: TokenKind,
    mut parse_element: impl FnMut(&mut Self) -> Result<T, ParserError>,
  ) -> Result<Vec<T>, ParserError> {
    let mut elements = Vec::new();
    if self.peek_is(terminator) {
      return Ok(elements);
    }
    loop {
      elements.push(parse_element(self)?);
      if self.peek_is(TokenKind::Comma) {
        let _ = self.eat(TokenKind::Comma)?;
      } else {
        break;
      }
    }
    Ok(elements)
  }

  fn parse_program(&mut self) -> Option<Program> {
    let mut statements = Vec::new();

    while self.peek().is_some() && !self.peek_is(TokenKind::Eof) {
      let statement = self.parse_statement();
      match self.record(statement) {
        Some(s) => statements.push(s),
        None => self.synchronize(),
      }
    }

    if self.errors.is_empty() {
      tracing::debug!(statements = statements.len(), "parsed program");
      Some(Program { statements })
    } else {
      tracing::debug!(errors = self.errors.len(), "parse failed");
      None
    }
  }

  fn parse_statement(&mut self) -> Result<Statement, ParserError> {
    match self.peek_eof()?.kind {
      TokenKind::Let => self.parse_let().map(Into::into),
      TokenKind::Return => self.parse_return().map(Into::into),
      TokenKind::LBrace => self.parse_block().map(Into::into),
      _ => self.parse_expression_statement().map(Into::into),
    }
  }

  fn parse_let(&mut self) -> Result<LetStatement, ParserError> {
    let _ = self.eat(TokenKind::Let)?;
    let name_token = self.eat(TokenKind::Ident)?;
    let _ = self.eat(TokenKind::Assign)?;
    let value = self.parse_expression(Precedence::Lowest)?;
    let _ = self.eat(TokenKind::Semicolon)?;
    Ok(LetStatement {
      name: Identifier::new(name_token.literal),
      value,
    })
  }

  fn parse_return(&mut self) -> Result<ReturnStatement, ParserError> {
    let _ = self.eat(TokenKind::Return)?;
    let value = self.parse_expression(Precedence::Lowest)?;
    let _ = self.eat(TokenKind::Semicolon)?;
    Ok(ReturnStatement { value })
  }

  fn parse_expression_statement(&mut self) -> Result<ExpressionStatement, ParserError> {
    let value = self.parse_expression(Precedence::Lowest)?;
    if self.peek_is(TokenKind::Semicolon) {
      self.next();
    }
    Ok(ExpressionStatement { value })
  }

  fn parse_block(&mut self) -> Result<BlockStatement, ParserError> {
    self.descend(|parser| {
      let open = parser.eat(TokenKind::LBrace)?;
      let mut statements = Vec::new();
      loop {
        match parser.peek().map(|t| t.kind) {
          None | Some(TokenKind::Eof) => {
            return Err(ParserError::UnterminatedBlock { opened: open.pos });
          }
          Some(TokenKind::RBrace) => {
            parser.next();
            break;
          }
          Some(_) => statements.push(parser.parse_statement()?),
        }
      }
      Ok(BlockStatement { statements })
    })
  }

  // pratt loop, only operators binding tighter than `precedence` extend `left`
  fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression, ParserError> {
    self.descend(|parser| {
      let token = parser.next_eof()?;
      let mut left = parser.parse_prefix(token)?;

      while !parser.peek_is(TokenKind::Semicolon) && precedence < parser.peek_precedence() {
        let operator = parser.next_eof()?;
        left = parser.parse_infix(operator, left)?;
      }

      Ok(left)
    })
  }

  fn parse_prefix(&mut self, token: Token) -> Result<Expression, ParserError> {
    match token.kind {
      TokenKind::Ident => Ok(Expression::ident(token.literal)),
      TokenKind::Int => token
        .literal
        .parse::<i64>()
        .map(Expression::IntegerLiteral)
        .map_err(|_| ParserError::InvalidInteger(token)),
      TokenKind::True => Ok(Expression::BooleanLiteral(true)),
      TokenKind::False => Ok(Expression::BooleanLiteral(false)),
      TokenKind::Minus => {
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::prefix(PrefixOperator::Minus, operand))
      }
      TokenKind::Bang => {
        let operand = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::prefix(PrefixOperator::Bang, operand))
      }
      TokenKind::LParen => {
        let inner = self.parse_expression(Precedence::Lowest)?;
        let _ = self.eat(TokenKind::RParen)?;
        Ok(inner)
      }
      TokenKind::If => self.parse_if(),
      TokenKind::Function => self.parse_function(),
      _ => Err(ParserError::NoPrefixRule(token)),
    }
  }

  fn parse_infix(&mut self, token: Token, left: Expression) -> Result<Expression, ParserError> {
    if token.kind == TokenKind::LParen {
      let arguments = self.parse_comma_separated(TokenKind::RParen, |parser| {
        parser.parse_expression(Precedence::Lowest)
      })?;
      let _ = self.eat(TokenKind::RParen)?;
      return Ok(Expression::Call {
        function: Box::new(left),
        arguments,
      });
    }

    // only reachable for kinds with a precedence above Lowest
    let precedence = Precedence::of(token.kind);
    let Some(operator) = infix_operator(token.kind) else {
      return Err(ParserError::NoPrefixRule(token));
    };
    let right = self.parse_expression(precedence)?;
    Ok(Expression::infix(left, operator, right))
  }

  fn parse_if(&mut self) -> Result<Expression, ParserError> {
    let condition = self.parse_expression(Precedence::Lowest)?;
    let consequence = self.parse_block()?;
    let alternative = if self.peek_is(TokenKind::Else) {
      self.next();
      Some(self.parse_block()?)
    } else {
      None
    };
    Ok(Expression::If {
      condition: Box::new(condition),
      consequence,
      alternative,
    })
  }

  fn parse_function(&mut self) -> Result<Expression, ParserError> {
    let _ = self.eat(TokenKind::LParen)?;
    let parameters = self.parse_comma_separated(TokenKind::RParen, |parser| {
      parser
        .eat(TokenKind::Ident)
        .map(|token| Identifier::new(token.literal))
    })?;
    let _ = self.eat(TokenKind::RParen)?;
    let body = self.parse_block()?;
    Ok(Expression::Function { parameters, body })
  }
}
