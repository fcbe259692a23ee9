use std::fmt::{self, Write};

use crate::problem::{Bound, Constraint, LinearExpr, LpProblem, Sense};

/// Serializes an [`LpProblem`] into CPLEX LP text, the dialect read by
/// `glpsol --lp`.
pub struct LpWriter {
    /// Expressions are wrapped onto indented continuation lines past this width
    max_line_width: usize,
    /// Optional comment lines written above the objective
    header: Vec<String>,
}

impl Default for LpWriter {
    fn default() -> Self {
        Self {
            max_line_width: 80,
            header: Vec::new(),
        }
    }
}

impl LpWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_width(mut self, width: usize) -> Self {
        self.max_line_width = width.max(20);
        self
    }

    pub fn with_header(mut self, line: impl Into<String>) -> Self {
        self.header.push(line.into());
        self
    }

    pub fn render(&self, problem: &LpProblem) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write(problem, &mut out);
        out
    }

    pub fn write<W: Write>(&self, problem: &LpProblem, out: &mut W) -> fmt::Result {
        for line in &self.header {
            writeln!(out, "\\ {}", line)?;
        }

        match problem.objective.sense {
            Sense::Maximize => writeln!(out, "Maximize")?,
            Sense::Minimize => writeln!(out, "Minimize")?,
        }
        let label = format!(" {}:", problem.objective.name);
        self.write_expr(out, &label, &problem.objective.expr, None)?;
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for block in &problem.blocks {
            if let Some(comment) = &block.comment {
                writeln!(out, "\\ {}", comment)?;
            }
            for constraint in &block.constraints {
                self.write_constraint(out, constraint)?;
            }
        }
        writeln!(out)?;

        writeln!(out, "Bounds")?;
        for bound in &problem.bounds {
            write_bound(out, bound)?;
        }
        writeln!(out)?;

        writeln!(out, "END")
    }

    fn write_constraint<W: Write>(&self, out: &mut W, constraint: &Constraint) -> fmt::Result {
        let label = format!(" {}:", constraint.name);
        let tail = format!("{} {}", constraint.op.symbol(), format_number(constraint.rhs));
        self.write_expr(out, &label, &constraint.expr, Some(&tail))
    }

    /// Write `label term term ... [tail]`, breaking lines before a piece
    /// would overflow `max_line_width`.
    fn write_expr<W: Write>(&self, out: &mut W, label: &str, expr: &LinearExpr, tail: Option<&str>) -> fmt::Result {
        let mut line = String::from(label);
        let mut on_line = 0;
        let pieces = expr
            .terms
            .iter()
            .map(|t| format_term(t.coefficient, &t.variable))
            .chain(tail.map(str::to_string));

        for piece in pieces {
            if on_line > 0 && line.len() + 1 + piece.len() > self.max_line_width {
                writeln!(out, "{}", line)?;
                line = String::from("   ");
                on_line = 0;
            }
            line.push(' ');
            line.push_str(&piece);
            on_line += 1;
        }
        writeln!(out, "{}", line)
    }
}

fn write_bound<W: Write>(out: &mut W, bound: &Bound) -> fmt::Result {
    writeln!(
        out,
        " {} {} {}",
        bound.variable,
        bound.op.symbol(),
        format_number(bound.value)
    )
}

fn format_term(coefficient: f64, variable: &str) -> String {
    let sign = if coefficient < 0.0 { '-' } else { '+' };
    let magnitude = coefficient.abs();
    if magnitude == 1.0 {
        format!("{} {}", sign, variable)
    } else {
        format!("{} {} {}", sign, format_number(magnitude), variable)
    }
}

/// `150.0` is written as `150`, fractional values keep their shortest form
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

impl fmt::Display for LpProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        LpWriter::default().write(self, f)
    }
}
