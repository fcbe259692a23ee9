pub mod lexer;
pub mod parser;
mod problem;
mod writer;

pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{LpParseError, Parser};
pub use problem::{Bound, Constraint, ConstraintBlock, ConstraintOp, LinearExpr, LpProblem, Objective, Sense, Term};
pub use writer::{LpWriter, format_number};

/// Parse CPLEX LP text into an [`LpProblem`]
pub fn parse(source: &str) -> Result<LpProblem, LpParseError> {
    Parser::parse(source)
}
