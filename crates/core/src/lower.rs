use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement, Visitable, Visitor};
use crate::ir::{BinaryOperator, Instruction, Node, UnaryOperator};
use crate::pass::Pass;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Lowerror {
  #[error("no lowering rule for {construct}")]
  Unsupported { construct: &'static str },

  #[error("no lowering rule for operator '{0}'")]
  UnsupportedOperator(InfixOperator),

  #[error("{0} - operands must be integer literals, nested expressions are not lowered")]
  NestedExpression(String),

  #[error("no storage for variable '{name}'")]
  NoStorage { name: String },

  #[error("operand {0} does not fit the 32-bit accumulator")]
  OperandOutOfRange(i64),
}

/// AST -> IR lowering visitor
///
/// visit_* fold the AST into the tree IR (one node per statement, blocks
/// flattened in order), `flatten` then turns every tree into accumulator steps...
#[derive(Debug, Default)]
pub struct Lower;

impl Lower {
  pub fn new() -> Self {
    Self
  }

  /// Folds a program into tree IR without flattening it
  pub fn build(&mut self, program: &Program) -> Result<Vec<Node>, Lowerror> {
    program.fold(self)
  }

  fn lower_expr(&self, expr: &Expression) -> Result<Node, Lowerror> {
    match expr {
      Expression::IntegerLiteral(value) => Ok(Node::Constant(*value)),

      Expression::Infix {
        left,
        operator,
        right,
      } => {
        let op = binary_operator(*operator)?;
        Ok(Node::binary(self.lower_expr(left)?, op, self.lower_expr(right)?))
      }

      Expression::Prefix { operator, operand } => {
        let op = match operator {
          PrefixOperator::Minus => UnaryOperator::Negate,
          PrefixOperator::Bang => UnaryOperator::Not,
        };
        Ok(Node::UnaryOp {
          op,
          operand: Box::new(self.lower_expr(operand)?),
        })
      }

      Expression::Identifier(_)
      | Expression::BooleanLiteral(_)
      | Expression::If { .. }
      | Expression::Function { .. }
      | Expression::Call { .. } => Err(Lowerror::Unsupported {
        construct: expr.kind_name(),
      }),
    }
  }
}

impl Pass<Program> for Lower {
  type Output = Vec<Instruction>;
  type Error = Lowerror;

  fn run(mut self, program: &Program) -> Result<Vec<Instruction>, Lowerror> {
    let tree = self.build(program)?;
    let instructions = flatten(&tree)?;
    tracing::debug!(
      nodes = tree.len(),
      instructions = instructions.len(),
      "lowered program"
    );
    Ok(instructions)
  }
}

impl Visitor<Vec<Node>> for Lower {
  type Error = Lowerror;

  fn visit_program(&mut self, program: &Program) -> Result<Vec<Node>, Lowerror> {
    let mut nodes = Vec::with_capacity(program.statements.len());
    for statement in &program.statements {
      nodes.extend(statement.fold(self)?);
    }
    Ok(nodes)
  }

  fn visit_statement(&mut self, statement: &Statement) -> Result<Vec<Node>, Lowerror> {
    match statement {
      Statement::Expression(stmt) => stmt.value.fold(self),
      Statement::Let(stmt) => Ok(vec![Node::Assign {
        target: stmt.name.name.clone(),
        value: Box::new(self.lower_expr(&stmt.value)?),
      }]),
      Statement::Block(block) => {
        let mut nodes = Vec::new();
        for inner in &block.statements {
          nodes.extend(inner.fold(self)?);
        }
        Ok(nodes)
      }
      Statement::Return(_) => Err(Lowerror::Unsupported {
        construct: "return statement",
      }),
    }
  }

  fn visit_expression(&mut self, expression: &Expression) -> Result<Vec<Node>, Lowerror> {
    self.lower_expr(expression).map(|node| vec![node])
  }
}

fn binary_operator(operator: InfixOperator) -> Result<BinaryOperator, Lowerror> {
  match operator {
    InfixOperator::Plus => Ok(BinaryOperator::Add),
    InfixOperator::Minus => Ok(BinaryOperator::Subtract),
    InfixOperator::Asterisk => Ok(BinaryOperator::Multiply),
    InfixOperator::Slash => Ok(BinaryOperator::Divide),
    InfixOperator::Lt | InfixOperator::Gt | InfixOperator::Eq | InfixOperator::NotEq => {
      Err(Lowerror::UnsupportedOperator(operator))
    }
  }
}

// a constant, or a negated one, is the only operand an instruction can carry
fn constant_operand(node: &Node) -> Option<i64> {
  match node {
    Node::Constant(value) => Some(*value),
    Node::UnaryOp {
      op: UnaryOperator::Negate,
      operand,
    } => match operand.as_ref() {
      Node::Constant(value) => value.checked_neg(),
      _ => None,
    },
    _ => None,
  }
}

fn accumulator_operand(value: i64) -> Result<i64, Lowerror> {
  i32::try_from(value)
    .map(i64::from)
    .map_err(|_| Lowerror::OperandOutOfRange(value))
}

/// Turns tree IR into accumulator steps, one instruction per binary node
///
/// Both operands of every binary node must already be constants (a negated
/// literal counts) that fit in 32 bits
pub fn flatten(nodes: &[Node]) -> Result<Vec<Instruction>, Lowerror> {
  let mut instructions = Vec::with_capacity(nodes.len());
  for node in nodes {
    let instruction = match node {
      Node::BinaryOp { left, op, right } => {
        match (constant_operand(left), constant_operand(right)) {
          (Some(a), Some(b)) => Instruction::new(
            op.opcode(),
            accumulator_operand(a)?,
            accumulator_operand(b)?,
          ),
          _ => return Err(Lowerror::NestedExpression(node.to_string())),
        }
      }
      Node::Assign { target, .. } => {
        return Err(Lowerror::NoStorage {
          name: target.clone(),
        });
      }
      Node::Constant(_) => {
        return Err(Lowerror::Unsupported {
          construct: "bare constant",
        });
      }
      Node::UnaryOp { .. } => {
        return Err(Lowerror::Unsupported {
          construct: "unary operation",
        });
      }
    };
    tracing::trace!(%instruction, "flattened");
    instructions.push(instruction);
  }
  Ok(instructions)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::Opcode;
  use crate::lexer::Lexer;
  use crate::parser::Parser;
  use crate::pass::Acceptor;
  use rstest::*;

  fn parse_src(input: &str) -> Program {
    let lexer = Lexer::new(input);
    let parser = Parser::new(lexer);
    parser.parse().expect("parse failed")
  }

  fn lower_src(input: &str) -> Result<Vec<Instruction>, Lowerror> {
    parse_src(input).accept(Lower::new())
  }

  mod lower {
    use super::*;

    #[rstest]
    #[case("3 + 4;", Opcode::Add)]
    #[case("9 - 2;", Opcode::Subtract)]
    #[case("6 * 7;", Opcode::Multiply)]
    #[case("8 / 2;", Opcode::Divide)]
    fn lowers_arithmetic(#[case] input: &str, #[case] opcode: Opcode) {
      let ir = lower_src(input).unwrap();
      assert_eq!(ir.len(), 1);
      assert_eq!(ir[0].opcode, opcode);
    }

    #[test]
    fn keeps_operands_in_order() {
      let ir = lower_src("10 - 3;").unwrap();
      assert_eq!(ir, vec![Instruction::new(Opcode::Subtract, 10, 3)]);
    }

    #[test]
    fn preserves_statement_order() {
      let ir = lower_src("1 + 2; 3 * 4; { 5 - 6; 7 / 8; }").unwrap();
      assert_eq!(
        ir,
        vec![
          Instruction::new(Opcode::Add, 1, 2),
          Instruction::new(Opcode::Multiply, 3, 4),
          Instruction::new(Opcode::Subtract, 5, 6),
          Instruction::new(Opcode::Divide, 7, 8),
        ]
      );
    }

    #[test]
    fn empty_program_lowers_to_nothing() {
      assert_eq!(lower_src("").unwrap(), vec![]);
    }

    #[test]
    fn nested_expression_is_rejected() {
      let err = lower_src("(1 + 2) + 3;").unwrap_err();
      assert_eq!(err, Lowerror::NestedExpression("((1 + 2) + 3)".into()));
    }

    #[rstest]
    #[case("-5 + 3;", Instruction::new(Opcode::Add, -5, 3))]
    #[case("7 * -2;", Instruction::new(Opcode::Multiply, 7, -2))]
    #[case("-8 / -4;", Instruction::new(Opcode::Divide, -8, -4))]
    fn negated_literals_are_operands(#[case] input: &str, #[case] expected: Instruction) {
      assert_eq!(lower_src(input).unwrap(), vec![expected]);
    }

    #[test]
    fn negated_expression_is_still_nested() {
      let err = lower_src("-(1 + 2) + 3;").unwrap_err();
      assert_eq!(err, Lowerror::NestedExpression("((-(1 + 2)) + 3)".into()));
    }

    #[rstest]
    #[case("5000000000 + 1;", 5_000_000_000)]
    #[case("1 - 2147483648;", 2_147_483_648)]
    #[case("-2147483649 * 2;", -2_147_483_649)]
    fn operands_must_fit_the_accumulator(#[case] input: &str, #[case] operand: i64) {
      assert_eq!(
        lower_src(input).unwrap_err(),
        Lowerror::OperandOutOfRange(operand)
      );
    }

    #[test]
    fn accumulator_bounds_are_accepted() {
      let ir = lower_src("-2147483648 + 2147483647;").unwrap();
      assert_eq!(
        ir,
        vec![Instruction::new(Opcode::Add, i64::from(i32::MIN), i64::from(i32::MAX))]
      );
    }

    #[test]
    fn let_has_no_storage() {
      let err = lower_src("let x = 1 + 2;").unwrap_err();
      assert_eq!(err, Lowerror::NoStorage { name: "x".into() });
    }

    #[rstest]
    #[case("x + 1;", "identifier")]
    #[case("true;", "boolean literal")]
    #[case("if (1) { 2 };", "if expression")]
    #[case("fn(a) { a };", "function literal")]
    #[case("f(1);", "call expression")]
    #[case("return 1 + 2;", "return statement")]
    #[case("5;", "bare constant")]
    #[case("-5;", "unary operation")]
    fn unsupported_constructs(#[case] input: &str, #[case] construct: &'static str) {
      assert_eq!(lower_src(input).unwrap_err(), Lowerror::Unsupported { construct });
    }

    #[rstest]
    #[case("1 < 2;", InfixOperator::Lt)]
    #[case("1 == 2;", InfixOperator::Eq)]
    fn comparison_operators_are_rejected(#[case] input: &str, #[case] operator: InfixOperator) {
      assert_eq!(
        lower_src(input).unwrap_err(),
        Lowerror::UnsupportedOperator(operator)
      );
    }

    mod visitor {
      use super::*;

      #[test]
      fn build_keeps_tree_shape() {
        let program = parse_src("let x = (1 + 2) * 3; -4;");
        let tree = Lower::new().build(&program).unwrap();
        let rendered: Vec<String> = tree.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["x = ((1 + 2) * 3)", "(-4)"]);
      }
    }
  }
}
