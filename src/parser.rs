use crate::complex::RationalComplex;
use crate::error::{Error, Result};
use crate::parser::Expr::{Chain, Imaginary, Negate, Real, Unit};
use crate::rational::parse_decimal;
use log::debug;
use num_rational::BigRational;
use std::fmt::{Display, Formatter};

/// Deepest parenthesis nesting [parse_expr] accepts.
pub const MAX_NESTING_DEPTH: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn is_additive(self) -> bool {
        matches!(self, Operator::Add | Operator::Subtract)
    }

    fn apply(self, x: RationalComplex, y: RationalComplex) -> Result<RationalComplex> {
        Ok(match self {
            Operator::Add => x + y,
            Operator::Subtract => x - y,
            Operator::Multiply => x * y,
            Operator::Divide => x.checked_div(&y)?,
        })
    }

    fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }
}

/// Parsed form of an arithmetic expression over rational complex literals.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Real(BigRational),
    Imaginary(BigRational),
    Unit,
    Negate(Box<Expr>),
    /// A left-associative run of operators of one precedence level, such as
    /// `a - b + c`: the first operand, then each operator and its right
    /// operand in order.
    Chain(Box<Expr>, Vec<(Operator, Expr)>),
}

impl Expr {
    /// `self op y`, appended to `self` when it is already a run at the same
    /// precedence level so that long runs stay flat.
    fn followed_by(self, op: Operator, y: Expr) -> Expr {
        match self {
            Chain(first, mut rest)
                if rest
                    .first()
                    .is_some_and(|(head, _)| head.is_additive() == op.is_additive()) =>
            {
                rest.push((op, y));
                Chain(first, rest)
            }
            x => Chain(x.into(), vec![(op, y)]),
        }
    }
}

peg::parser! {
  grammar expression_parser() for str {
    rule exponent() = ['e' | 'E'] ['+' | '-']? ['0'..='9']+

    rule decimal() -> BigRational
      = n:$(['0'..='9']+ ("." ['0'..='9']*)? exponent()? / "." ['0'..='9']+ exponent()?) {?
          parse_decimal(n).map_err(|_| "a numeric literal")
      }

    rule identifier() -> &'input str
      = $(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '_' | '0'..='9']*)

    rule atom() -> Expr
      = n:decimal() "i" { Imaginary(n) }
      / n:decimal() { Real(n) }
      / name:identifier() {?
          if name == "i" { Ok(Unit) } else { Err("the imaginary unit `i`") }
      }
      / "(" e:arithmetic() ")" { e }

    rule factor() -> Expr
      = "-" a:atom() { Negate(a.into()) }
      / "+" a:atom() { a }
      / atom()

    pub rule arithmetic() -> Expr = precedence!{
      x:(@) "+" y:@ { x.followed_by(Operator::Add, y) }
      x:(@) "-" y:@ { x.followed_by(Operator::Subtract, y) }
      --
      x:(@) "*" y:@ { x.followed_by(Operator::Multiply, y) }
      x:(@) "/" y:@ { x.followed_by(Operator::Divide, y) }
      --
      f:factor() { f }
    }
  }
}

impl Expr {
    pub fn evaluate(&self) -> Result<RationalComplex> {
        Ok(match self {
            Real(n) => RationalComplex::real(n.clone()),
            Imaginary(n) => RationalComplex::imaginary(n.clone()),
            Unit => RationalComplex::i(),
            Negate(x) => -x.evaluate()?,
            Chain(first, rest) => rest
                .iter()
                .try_fold(first.evaluate()?, |x, (op, y)| op.apply(x, y.evaluate()?))?,
        })
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Real(n) => n.fmt(f),
            Imaginary(n) => f.write_fmt(format_args!("({n})i")),
            Unit => f.write_str("i"),
            Negate(x) => f.write_fmt(format_args!("(-{x})")),
            Chain(first, rest) => {
                f.write_fmt(format_args!("({first}"))?;
                for (op, y) in rest {
                    f.write_fmt(format_args!("{}{y}", op.symbol()))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Rejects parentheses nested deeper than [MAX_NESTING_DEPTH]. Balance is left
/// to the grammar.
fn check_nesting(text: &str) -> Result<()> {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(Error::Parse(format!(
                        "parentheses nested more than {MAX_NESTING_DEPTH} deep"
                    )));
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Parses `text` into an expression tree. All whitespace is ignored.
pub fn parse_expr(text: &str) -> Result<Expr> {
    let compact: String = text.split_whitespace().collect();
    check_nesting(&compact)?;
    expression_parser::arithmetic(&compact).map_err(|e| Error::Parse(e.to_string()))
}

/// Parses and evaluates `text`.
pub fn parse(text: &str) -> Result<RationalComplex> {
    let expr = parse_expr(text)?;
    debug!("Parsed {text:?} as {expr}");
    expr.evaluate()
}
