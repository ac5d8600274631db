use std::fmt;

/// Visitor trait for folding the AST
///
/// Implementors decide what each node category folds into
pub trait Visitor<T> {
  type Error;

  /// Visit the root of a parsed program
  ///
  /// # Errors
  ///
  /// Returns an error if any statement fails to process
  fn visit_program(&mut self, program: &Program) -> Result<T, Self::Error>;

  /// Visit a single statement
  ///
  /// # Errors
  ///
  /// Returns an error if the statement has no meaning for this visitor
  fn visit_statement(&mut self, statement: &Statement) -> Result<T, Self::Error>;

  /// Visit an expression tree
  ///
  /// # Errors
  ///
  /// Returns an error if the expression has no meaning for this visitor
  fn visit_expression(&mut self, expression: &Expression) -> Result<T, Self::Error>;
}

pub trait Visitable<T> {
  /// Fold this node with a visitor, delegating to the matching visitor method
  ///
  /// # Errors
  ///
  /// Returns an error if the visitor encounters a problem processing this node
  fn fold<V: Visitor<T>>(&self, visitor: &mut V) -> Result<T, V::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
  pub statements: Vec<Statement>,
}

impl<T> Visitable<T> for Program {
  fn fold<V: Visitor<T>>(&self, visitor: &mut V) -> Result<T, V::Error> {
    visitor.visit_program(self)
  }
}

impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for statement in &self.statements {
      writeln!(f, "{statement}")?;
    }
    Ok(())
  }
}

// statements

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
  Let(LetStatement),
  Return(ReturnStatement),
  Expression(ExpressionStatement),
  Block(BlockStatement),
}

impl<T> Visitable<T> for Statement {
  fn fold<V: Visitor<T>>(&self, visitor: &mut V) -> Result<T, V::Error> {
    visitor.visit_statement(self)
  }
}

impl From<LetStatement> for Statement {
  fn from(stmt: LetStatement) -> Self {
    Self::Let(stmt)
  }
}

impl From<ReturnStatement> for Statement {
  fn from(stmt: ReturnStatement) -> Self {
    Self::Return(stmt)
  }
}

impl From<ExpressionStatement> for Statement {
  fn from(stmt: ExpressionStatement) -> Self {
    Self::Expression(stmt)
  }
}

impl From<BlockStatement> for Statement {
  fn from(block: BlockStatement) -> Self {
    Self::Block(block)
  }
}

impl fmt::Display for Statement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Let(stmt) => write!(f, "{stmt}"),
      Self::Return(stmt) => write!(f, "{stmt}"),
      Self::Expression(stmt) => write!(f, "{stmt}"),
      Self::Block(block) => write!(f, "{block}"),
    }
  }
}

/// `let <name> = <value>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetStatement {
  pub name: Identifier,
  pub value: Expression,
}

impl fmt::Display for LetStatement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "let {} = {};", self.name, self.value)
  }
}

/// `return <value>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStatement {
  pub value: Expression,
}

impl fmt::Display for ReturnStatement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "return {};", self.value)
  }
}

/// `<value>` with an optional trailing `;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionStatement {
  pub value: Expression,
}

impl fmt::Display for ExpressionStatement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{};", self.value)
  }
}

/// `{ <statement>* }`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockStatement {
  pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{{")?;
    for statement in &self.statements {
      write!(f, " {statement}")?;
    }
    write!(f, " }}")
  }
}

// expressions

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
  pub name: String,
}

impl Identifier {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
  Minus,
  Bang,
}

impl fmt::Display for PrefixOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Minus => write!(f, "-"),
      Self::Bang => write!(f, "!"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOperator {
  Plus,
  Minus,
  Asterisk,
  Slash,
  Lt,
  Gt,
  Eq,
  NotEq,
}

impl fmt::Display for InfixOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Plus => "+",
      Self::Minus => "-",
      Self::Asterisk => "*",
      Self::Slash => "/",
      Self::Lt => "<",
      Self::Gt => ">",
      Self::Eq => "==",
      Self::NotEq => "!=",
    };
    write!(f, "{s}")
  }
}

/// An expression, the closed set of value-producing nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
  Identifier(Identifier),
  IntegerLiteral(i64),
  BooleanLiteral(bool),
  Prefix {
    operator: PrefixOperator,
    operand: Box<Expression>,
  },
  Infix {
    left: Box<Expression>,
    operator: InfixOperator,
    right: Box<Expression>,
  },
  If {
    condition: Box<Expression>,
    consequence: BlockStatement,
    alternative: Option<BlockStatement>,
  },
  /// `fn(<params>) { <body> }`
  Function {
    parameters: Vec<Identifier>,
    body: BlockStatement,
  },
  /// `<function>(<args>)`
  Call {
    function: Box<Expression>,
    arguments: Vec<Expression>,
  },
}

impl Expression {
  pub fn prefix(operator: PrefixOperator, operand: Expression) -> Self {
    Self::Prefix {
      operator,
      operand: Box::new(operand),
    }
  }

  pub fn infix(left: Expression, operator: InfixOperator, right: Expression) -> Self {
    Self::Infix {
      left: Box::new(left),
      operator,
      right: Box::new(right),
    }
  }

  pub fn ident(name: impl Into<String>) -> Self {
    Self::Identifier(Identifier::new(name))
  }

  /// Short human name of the node kind, used in diagnostics
  pub fn kind_name(&self) -> &'static str {
    match self {
      Self::Identifier(_) => "identifier",
      Self::IntegerLiteral(_) => "integer literal",
      Self::BooleanLiteral(_) => "boolean literal",
      Self::Prefix { .. } => "prefix expression",
      Self::Infix { .. } => "infix expression",
      Self::If { .. } => "if expression",
      Self::Function { .. } => "function literal",
      Self::Call { .. } => "call expression",
    }
  }
}

impl<T> Visitable<T> for Expression {
  fn fold<V: Visitor<T>>(&self, visitor: &mut V) -> Result<T, V::Error> {
    visitor.visit_expression(self)
  }
}

impl From<Identifier> for Expression {
  fn from(ident: Identifier) -> Self {
    Self::Identifier(ident)
  }
}

impl fmt::Display for Expression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Identifier(ident) => write!(f, "{ident}"),
      Self::IntegerLiteral(value) => write!(f, "{value}"),
      Self::BooleanLiteral(value) => write!(f, "{value}"),
      Self::Prefix { operator, operand } => write!(f, "({operator}{operand})"),
      Self::Infix {
        left,
        operator,
        right,
      } => write!(f, "({left} {operator} {right})"),
      Self::If {
        condition,
        consequence,
        alternative,
      } => {
        write!(f, "if {condition} {consequence}")?;
        if let Some(alternative) = alternative {
          write!(f, " else {alternative}")?;
        }
        Ok(())
      }
      Self::Function { parameters, body } => {
        let params: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "fn({}) {body}", params.join(", "))
      }
      Self::Call {
        function,
        arguments,
      } => {
        let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
        write!(f, "{function}({})", args.join(", "))
      }
    }
  }
}
