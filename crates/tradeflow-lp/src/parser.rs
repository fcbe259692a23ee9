use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::problem::{Bound, ConstraintBlock, ConstraintOp, LinearExpr, LpProblem, Sense};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Missing objective section (Maximize or Minimize)")]
    MissingObjective,
}

/// Reads the CPLEX LP subset produced by [`crate::LpWriter`]: one objective,
/// `Subject To` rows with optional `name:` labels, `Bounds` of the form
/// `x >= 0` or `0 <= x <= 5`, and `End` (any case). Comments inside `Subject To`
/// open a new [`ConstraintBlock`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Rows without a label are named `R1`, `R2`, ...
    unnamed_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Constraints,
    Bounds,
    End,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            unnamed_rows: 0,
        }
    }

    pub fn parse(source: &str) -> Result<LpProblem, LpParseError> {
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_problem()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    /// Kind of the first non-newline token after the current one
    fn peek_kind_after(&self) -> TokenKind {
        self.tokens[self.pos.saturating_add(1).min(self.tokens.len())..]
            .iter()
            .map(|t| t.kind)
            .find(|k| *k != TokenKind::Newline)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn skip_newlines_and_comments(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> LpParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => LpParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            _ => LpParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, LpParseError> {
        self.skip_newlines();
        match self.current().cloned() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    /// Section header at the current position and the number of tokens it spans
    fn peek_section(&self) -> Option<(Section, usize)> {
        let token = self.current()?;
        if token.kind != TokenKind::Ident {
            return None;
        }
        match token.text.to_ascii_lowercase().as_str() {
            "subject" => self.tokens.get(self.pos + 1)?.is_keyword("to").then_some((Section::Constraints, 2)),
            "such" => self.tokens.get(self.pos + 1)?.is_keyword("that").then_some((Section::Constraints, 2)),
            "st" | "s.t." => Some((Section::Constraints, 1)),
            "bounds" | "bound" => Some((Section::Bounds, 1)),
            "end" => Some((Section::End, 1)),
            _ => None,
        }
    }

    fn section_header(&mut self) -> Option<Section> {
        let (section, len) = self.peek_section()?;
        self.pos += len;
        Some(section)
    }

    fn at_section_header(&self) -> bool {
        self.peek_section().is_some()
    }

    fn parse_problem(&mut self) -> Result<LpProblem, LpParseError> {
        self.skip_newlines_and_comments();

        let sense = match self.current() {
            Some(t) if ["maximize", "maximise", "maximum", "max"].iter().any(|k| t.is_keyword(k)) => Sense::Maximize,
            Some(t) if ["minimize", "minimise", "minimum", "min"].iter().any(|k| t.is_keyword(k)) => Sense::Minimize,
            _ => return Err(LpParseError::MissingObjective),
        };
        self.advance();

        let mut problem = LpProblem::new(sense);
        self.skip_newlines_and_comments();
        if let Some(name) = self.parse_label() {
            problem.objective.name = name;
        }
        problem.objective.expr = self.parse_expr()?;

        let mut section = self.next_section()?;
        while section != Section::End {
            section = match section {
                Section::Constraints => self.parse_constraints(&mut problem)?,
                Section::Bounds => self.parse_bounds(&mut problem)?,
                Section::End => Section::End,
            };
        }

        Ok(problem)
    }

    /// After a section body, the next token must be a header or end of input
    fn next_section(&mut self) -> Result<Section, LpParseError> {
        self.skip_newlines_and_comments();
        if self.peek_kind() == TokenKind::Eof {
            return Ok(Section::End);
        }
        self.section_header()
            .ok_or_else(|| self.unexpected("Subject To, Bounds or End"))
    }

    /// `name:` prefix, consumed only when the colon is present
    fn parse_label(&mut self) -> Option<String> {
        if self.peek_kind() == TokenKind::Ident && self.peek_kind_after() == TokenKind::Colon && !self.at_section_header() {
            let name = self.advance()?.text.clone();
            self.skip_newlines();
            self.advance(); // colon
            Some(name)
        } else {
            None
        }
    }

    fn parse_number(&mut self) -> Result<f64, LpParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| LpParseError::InvalidNumber(token.text.clone()))
    }

    /// Optional sign followed by a number
    fn parse_signed_number(&mut self) -> Result<f64, LpParseError> {
        self.skip_newlines();
        let mut sign = 1.0;
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            if self.peek_kind() == TokenKind::Minus {
                sign = -sign;
            }
            self.advance();
            self.skip_newlines();
        }
        Ok(sign * self.parse_number()?)
    }

    /// Sequence of `[+|-] [coef] name` terms, ending at a comparison,
    /// a section header or end of input
    fn parse_expr(&mut self) -> Result<LinearExpr, LpParseError> {
        let mut expr = LinearExpr::new();
        loop {
            self.skip_newlines();
            if self.at_section_header() {
                break;
            }
            match self.peek_kind() {
                TokenKind::Plus | TokenKind::Minus | TokenKind::Number | TokenKind::Ident => {}
                TokenKind::Comment => {
                    self.advance();
                    continue;
                }
                _ => break,
            }

            let mut sign = 1.0;
            while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
                if self.peek_kind() == TokenKind::Minus {
                    sign = -sign;
                }
                self.advance();
                self.skip_newlines();
            }
            let coefficient = if self.peek_kind() == TokenKind::Number {
                self.parse_number()?
            } else {
                1.0
            };
            let variable = self.expect(TokenKind::Ident)?;
            expr.add(sign * coefficient, variable.text);
        }
        Ok(expr)
    }

    fn parse_op(&mut self) -> Result<ConstraintOp, LpParseError> {
        self.skip_newlines();
        let op = match self.peek_kind() {
            TokenKind::Le => ConstraintOp::Le,
            TokenKind::Ge => ConstraintOp::Ge,
            TokenKind::Eq => ConstraintOp::Eq,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();
        Ok(op)
    }

    fn parse_constraints(&mut self, problem: &mut LpProblem) -> Result<Section, LpParseError> {
        loop {
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Eof => return Ok(Section::End),
                TokenKind::Comment => {
                    let comment = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                    problem.blocks.push(ConstraintBlock {
                        comment: Some(comment),
                        constraints: Vec::new(),
                    });
                    continue;
                }
                _ => {}
            }
            if let Some(section) = self.section_header() {
                return Ok(section);
            }

            let name = match self.parse_label() {
                Some(name) => name,
                None => {
                    self.unnamed_rows += 1;
                    format!("R{}", self.unnamed_rows)
                }
            };
            let expr = self.parse_expr()?;
            let op = self.parse_op()?;
            let rhs = self.parse_signed_number()?;
            problem.add_constraint(name, expr, op, rhs);
        }
    }

    fn parse_bounds(&mut self, problem: &mut LpProblem) -> Result<Section, LpParseError> {
        loop {
            self.skip_newlines_and_comments();
            if self.peek_kind() == TokenKind::Eof {
                return Ok(Section::End);
            }
            if let Some(section) = self.section_header() {
                return Ok(section);
            }

            if self.peek_kind() == TokenKind::Ident {
                // x >= 0
                let variable = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                let op = self.parse_op()?;
                let value = self.parse_signed_number()?;
                problem.add_bound(Bound { variable, op, value });
            } else {
                // 0 <= x [<= 5]
                let value = self.parse_signed_number()?;
                let op = self.parse_op()?;
                let variable = self.expect(TokenKind::Ident)?.text;
                problem.add_bound(Bound {
                    variable: variable.clone(),
                    op: flip(op),
                    value,
                });
                self.skip_newlines();
                if matches!(self.peek_kind(), TokenKind::Le | TokenKind::Ge | TokenKind::Eq) {
                    let op = self.parse_op()?;
                    let value = self.parse_signed_number()?;
                    problem.add_bound(Bound { variable, op, value });
                }
            }
        }
    }
}

/// `c <= x` is `x >= c`
fn flip(op: ConstraintOp) -> ConstraintOp {
    match op {
        ConstraintOp::Le => ConstraintOp::Ge,
        ConstraintOp::Ge => ConstraintOp::Le,
        ConstraintOp::Eq => ConstraintOp::Eq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::LpWriter;

    #[test]
    fn test_parse_small_document() {
        let source = r#"\ header
Maximize
 profit: - 150 G_5_1 + 150 G_1_5
    + 2.5 D_1_5
Subject To
\ flow capacity
 cap_1_5: + G_1_5 + G_5_1 <= 165
 bal: 3 x - y >= -2
\ second
 x + y = 1
Bounds
 G_1_5 >= 0
 0 <= x <= 4
End
"#;
        let lp = Parser::parse(source).unwrap();
        assert_eq!(lp.objective.sense, Sense::Maximize);
        assert_eq!(lp.objective.name, "profit");
        assert_eq!(lp.objective.expr.len(), 3);
        assert_eq!(lp.objective.expr.coefficient("G_5_1"), Some(-150.0));
        assert_eq!(lp.objective.expr.coefficient("D_1_5"), Some(2.5));

        assert_eq!(lp.blocks.len(), 2);
        assert_eq!(lp.blocks[0].comment.as_deref(), Some("flow capacity"));
        assert_eq!(lp.blocks[0].constraints.len(), 2);
        let bal = lp.constraint("bal").unwrap();
        assert_eq!(bal.op, ConstraintOp::Ge);
        assert_eq!(bal.rhs, -2.0);
        assert_eq!(bal.expr.coefficient("y"), Some(-1.0));
        assert_eq!(lp.blocks[1].constraints[0].name, "R1");

        assert_eq!(lp.bounds.len(), 3);
        assert_eq!(lp.bounds[1], Bound { variable: "x".into(), op: ConstraintOp::Ge, value: 0.0 });
        assert_eq!(lp.bounds[2], Bound { variable: "x".into(), op: ConstraintOp::Le, value: 4.0 });
    }

    #[test]
    fn test_reads_back_written_problem() {
        let mut lp = LpProblem::new(Sense::Minimize);
        lp.set_objective("cost", LinearExpr::new().with(0.5, "a").with(-3.0, "b"));
        lp.begin_block("rows");
        let mut wide = LinearExpr::new();
        for i in 0..30 {
            wide.add(i as f64 + 1.0, format!("v_{}", i));
        }
        lp.add_constraint("wide", wide, ConstraintOp::Eq, 0.0);
        lp.add_constraint("small", LinearExpr::new().with(1.0, "a"), ConstraintOp::Le, 7.25);
        lp.add_bound(Bound::nonnegative("a"));

        let text = LpWriter::new().with_header("round trip").render(&lp);
        let parsed = Parser::parse(&text).unwrap();
        assert_eq!(parsed, lp);
    }

    #[test]
    fn test_alternate_keywords() {
        let source = "minimize\n obj: x\nst\n c: x >= 1\nend\n";
        let lp = Parser::parse(source).unwrap();
        assert_eq!(lp.objective.sense, Sense::Minimize);
        assert_eq!(lp.num_constraints(), 1);
    }

    #[test]
    fn test_missing_objective() {
        assert_eq!(Parser::parse("Subject To\n x <= 1\n"), Err(LpParseError::MissingObjective));
    }

    #[test]
    fn test_missing_comparison() {
        let err = Parser::parse("Maximize\n obj: x\nSubject To\n c: x + y\nEnd\n").unwrap_err();
        assert!(matches!(err, LpParseError::UnexpectedToken { .. }), "{:?}", err);
    }
}
