use std::iter::Peekable;
use std::str::Chars;

use crate::token::{Kind as TokenKind, Position, Token, lookup_identifier};

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
  peekable: Peekable<Chars<'src>>,
  pos: Position,
  // set once the first Eof has been handed out through Iterator
  finished: bool,
}

impl<'src> Lexer<'src> {
  #[must_use]
  pub fn new(source: &'src str) -> Self {
    Self {
      peekable: source.chars().peekable(),
      pos: Position::default(),
      finished: false,
    }
  }

  /// Produces the next token, returning `Eof` forever once the input is exhausted
  pub fn next_token(&mut self) -> Token {
    self.skip_whitespace_and_comments();
    let start = self.pos;
    let token = match self.peek_char() {
      None => Token::new(TokenKind::Eof, ""),
      Some(ch) => match ch {
        '=' => self.eat_either('=', TokenKind::Eq, TokenKind::Assign),
        '!' => self.eat_either('=', TokenKind::NotEq, TokenKind::Bang),
        '+' => self.eat(TokenKind::Plus),
        '-' => self.eat(TokenKind::Minus),
        '*' => self.eat(TokenKind::Asterisk),
        '/' => self.eat(TokenKind::Slash),
        '<' => self.eat(TokenKind::Lt),
        '>' => self.eat(TokenKind::Gt),
        ',' => self.eat(TokenKind::Comma),
        ';' => self.eat(TokenKind::Semicolon),
        '(' => self.eat(TokenKind::LParen),
        ')' => self.eat(TokenKind::RParen),
        '{' => self.eat(TokenKind::LBrace),
        '}' => self.eat(TokenKind::RBrace),
        '0'..='9' => self.eat_number(),
        c if c.is_alphabetic() || c == '_' => self.eat_word(),
        _ => self.eat(TokenKind::Illegal),
      },
    };
    tracing::trace!(kind = %token.kind, literal = %token.literal, at = %start, "token");
    token.at(start)
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peekable.next()?;
    if c == '\n' {
      self.pos.line += 1;
      self.pos.column = 1;
    } else {
      self.pos.column += 1;
    }
    Some(c)
  }

  fn eat(&mut self, kind: TokenKind) -> Token {
    let mut literal = String::new();
    if let Some(c) = self.bump() {
      literal.push(c);
    }
    Token::new(kind, literal)
  }

  // one-or-two character operators, the second char only joins when directly adjacent
  fn eat_either(&mut self, second: char, pair: TokenKind, single: TokenKind) -> Token {
    if self.peek_second() == Some(second) {
      let mut literal = String::with_capacity(2);
      literal.extend(self.bump());
      literal.extend(self.bump());
      Token::new(pair, literal)
    } else {
      self.eat(single)
    }
  }

  fn eat_number(&mut self) -> Token {
    let mut buffer = String::new();
    while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
      buffer.extend(self.bump());
    }
    Token::new(TokenKind::Int, buffer)
  }

  fn eat_word(&mut self) -> Token {
    let mut buffer = String::new();
    while self
      .peek_char()
      .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
      buffer.extend(self.bump());
    }
    let kind = lookup_identifier(buffer.as_str());
    Token::new(kind, buffer)
  }

  fn peek_char(&mut self) -> Option<char> {
    self.peekable.peek().copied()
  }

  fn peek_second(&self) -> Option<char> {
    let mut clone = self.peekable.clone();
    clone.next();
    clone.next()
  }

  fn skip_whitespace_and_comments(&mut self) {
    loop {
      // skip whitespace
      while self.peek_char().is_some_and(char::is_whitespace) {
        self.bump();
      }
      // skip // line comments
      if self.peek_char() == Some('/') && self.peek_second() == Some('/') {
        while self.peek_char().is_some_and(|c| c != '\n') {
          self.bump();
        }
        continue;
      }
      break;
    }
  }
}

/// Yields every token up to and including the first `Eof`
impl Iterator for Lexer<'_> {
  type Item = Token;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }
    let token = self.next_token();
    self.finished = token.is_eof();
    Some(token)
  }
}

/// Lexes a whole source string, the last token is always `Eof`
pub fn tokenize(source: &str) -> Vec<Token> {
  Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::*;

  mod lexer {
    use super::*;

    mod fixtures {
      use super::*;

      #[fixture]
      pub fn let_stmt() -> (&'static str, Vec<Token>) {
        (
          "let x = 5;",
          vec![
            Token::new(TokenKind::Let, "let"),
            Token::new(TokenKind::Ident, "x"),
            Token::new(TokenKind::Assign, "="),
            Token::new(TokenKind::Int, "5"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Eof, ""),
          ],
        )
      }

      #[fixture]
      pub fn operators() -> (&'static str, Vec<Token>) {
        (
          "!-/*5; 5 < 10 > 5;",
          vec![
            Token::new(TokenKind::Bang, "!"),
            Token::new(TokenKind::Minus, "-"),
            Token::new(TokenKind::Slash, "/"),
            Token::new(TokenKind::Asterisk, "*"),
            Token::new(TokenKind::Int, "5"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Int, "5"),
            Token::new(TokenKind::Lt, "<"),
            Token::new(TokenKind::Int, "10"),
            Token::new(TokenKind::Gt, ">"),
            Token::new(TokenKind::Int, "5"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Eof, ""),
          ],
        )
      }

      #[fixture]
      pub fn two_char_operators() -> (&'static str, Vec<Token>) {
        (
          "10 == 10; 10 != 9; a = !b",
          vec![
            Token::new(TokenKind::Int, "10"),
            Token::new(TokenKind::Eq, "=="),
            Token::new(TokenKind::Int, "10"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Int, "10"),
            Token::new(TokenKind::NotEq, "!="),
            Token::new(TokenKind::Int, "9"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Ident, "a"),
            Token::new(TokenKind::Assign, "="),
            Token::new(TokenKind::Bang, "!"),
            Token::new(TokenKind::Ident, "b"),
            Token::new(TokenKind::Eof, ""),
          ],
        )
      }

      #[fixture]
      pub fn if_else() -> (&'static str, Vec<Token>) {
        (
          "if (5 < 10) { return true; } else { return false; }",
          vec![
            Token::new(TokenKind::If, "if"),
            Token::new(TokenKind::LParen, "("),
            Token::new(TokenKind::Int, "5"),
            Token::new(TokenKind::Lt, "<"),
            Token::new(TokenKind::Int, "10"),
            Token::new(TokenKind::RParen, ")"),
            Token::new(TokenKind::LBrace, "{"),
            Token::new(TokenKind::Return, "return"),
            Token::new(TokenKind::True, "true"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::RBrace, "}"),
            Token::new(TokenKind::Else, "else"),
            Token::new(TokenKind::LBrace, "{"),
            Token::new(TokenKind::Return, "return"),
            Token::new(TokenKind::False, "false"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::RBrace, "}"),
            Token::new(TokenKind::Eof, ""),
          ],
        )
      }

      #[fixture]
      pub fn function_literal() -> (&'static str, Vec<Token>) {
        (
          "let add = fn(x_1, y) { x_1 + y; };",
          vec![
            Token::new(TokenKind::Let, "let"),
            Token::new(TokenKind::Ident, "add"),
            Token::new(TokenKind::Assign, "="),
            Token::new(TokenKind::Function, "fn"),
            Token::new(TokenKind::LParen, "("),
            Token::new(TokenKind::Ident, "x_1"),
            Token::new(TokenKind::Comma, ","),
            Token::new(TokenKind::Ident, "y"),
            Token::new(TokenKind::RParen, ")"),
            Token::new(TokenKind::LBrace, "{"),
            Token::new(TokenKind::Ident, "x_1"),
            Token::new(TokenKind::Plus, "+"),
            Token::new(TokenKind::Ident, "y"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::RBrace, "}"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Eof, ""),
          ],
        )
      }

      #[fixture]
      pub fn comments() -> (&'static str, Vec<Token>) {
        (
          "// leading comment\n6 / 2; // trailing",
          vec![
            Token::new(TokenKind::Int, "6"),
            Token::new(TokenKind::Slash, "/"),
            Token::new(TokenKind::Int, "2"),
            Token::new(TokenKind::Semicolon, ";"),
            Token::new(TokenKind::Eof, ""),
          ],
        )
      }
    }

    #[rstest]
    #[case::let_stmt(fixtures::let_stmt())]
    #[case::operators(fixtures::operators())]
    #[case::two_char_operators(fixtures::two_char_operators())]
    #[case::if_else(fixtures::if_else())]
    #[case::function_literal(fixtures::function_literal())]
    #[case::comments(fixtures::comments())]
    fn next_token(#[case] input: (&'static str, Vec<Token>)) {
      let (input, expected_tokens) = input;
      let mut lexer = Lexer::new(input);

      for expected in expected_tokens {
        let actual = lexer.next_token();
        assert_eq!(actual.kind, expected.kind, "TokenKind mismatch");
        assert_eq!(actual.literal, expected.literal, "Token literal mismatch");
      }
    }

    #[test]
    fn eof_is_idempotent() {
      let mut lexer = Lexer::new("x");
      assert_eq!(lexer.next_token().kind, TokenKind::Ident);
      for _ in 0..3 {
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
      }
    }

    #[test]
    fn spaced_equals_are_two_assignments() {
      let kinds: Vec<TokenKind> = tokenize("= =").into_iter().map(|t| t.kind).collect();
      assert_eq!(kinds, vec![TokenKind::Assign, TokenKind::Assign, TokenKind::Eof]);
    }

    #[test]
    fn double_equals_is_one_token() {
      let tokens = tokenize("==");
      assert_eq!(tokens.len(), 2);
      assert_eq!(tokens[0].kind, TokenKind::Eq);
      assert_eq!(tokens[0].literal, "==");
    }

    #[test]
    fn illegal_character_does_not_stop_lexing() {
      let tokens = tokenize("1 @ 2");
      let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
      assert_eq!(
        kinds,
        vec![TokenKind::Int, TokenKind::Illegal, TokenKind::Int, TokenKind::Eof]
      );
      assert_eq!(tokens[1].literal, "@");
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t ")]
    #[case("// only a comment")]
    fn empty_input_yields_single_eof(#[case] input: &str) {
      let tokens = tokenize(input);
      assert_eq!(tokens.len(), 1);
      assert!(tokens[0].is_eof());
    }

    #[test]
    fn tracks_line_and_column() {
      let tokens = tokenize("let x\n  = 5;");
      let positions: Vec<(usize, usize)> =
        tokens.iter().map(|t| (t.pos.line, t.pos.column)).collect();
      assert_eq!(positions, vec![(1, 1), (1, 5), (2, 3), (2, 5), (2, 6), (2, 7)]);
    }
  }
}
