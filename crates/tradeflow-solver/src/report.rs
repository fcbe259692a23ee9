use std::collections::BTreeMap;

use crate::error::SolveError;

/// Marker glpsol prints in the KKT section when the final point violates a row or bound
pub const INFEASIBLE_MARKER: &str = "PRIMAL SOLUTION IS INFEASIBLE";
/// Prefix of the line carrying the objective value
pub const OBJECTIVE_MARKER: &str = "Objective";

/// Solution statuses that carry no usable optimum
const FAILED_STATUSES: [&str; 3] = ["INFEASIBLE", "UNDEFINED", "UNBOUNDED"];

/// What the bridge extracts from a glpsol `-o` report
#[derive(Debug, Clone, PartialEq)]
pub struct SolverReport {
    /// Text after `Status:`, e.g. `OPTIMAL`
    pub status: Option<String>,
    pub objective: f64,
    /// Column activities by variable name
    pub columns: BTreeMap<String, f64>,
}

impl SolverReport {
    /// Parse a report, failing with [`SolveError::Unsolvable`] when it
    /// signals infeasibility or has no objective value
    pub fn parse(text: &str) -> Result<Self, SolveError> {
        let mut status = None;
        let mut objective = None;

        for line in text.lines() {
            if line.contains(INFEASIBLE_MARKER) {
                return Err(SolveError::Unsolvable(format!("solver reports {}", INFEASIBLE_MARKER)));
            }
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix("Status:") {
                status = Some(rest.trim().to_string());
            }
            if objective.is_none() && trimmed.starts_with(OBJECTIVE_MARKER) {
                objective = parse_objective_line(trimmed);
            }
        }

        if let Some(status) = &status {
            if FAILED_STATUSES.iter().any(|s| status.contains(s)) {
                return Err(SolveError::Unsolvable(format!("solver status {}", status)));
            }
        }

        let objective = objective
            .ok_or_else(|| SolveError::Unsolvable("no objective value in solver report".to_string()))?;

        Ok(Self {
            status,
            objective,
            columns: parse_columns(text),
        })
    }

    pub fn value(&self, variable: &str) -> Option<f64> {
        self.columns.get(variable).copied()
    }
}

/// First numeric token of an `Objective:` line, preferring the text after `=`
/// (`Objective:  profit = 1.2e+05 (MAXimum)`)
pub fn parse_objective_line(line: &str) -> Option<f64> {
    let rest = line.split_once('=').map(|(_, r)| r).unwrap_or(line);
    first_number(rest)
}

fn first_number(text: &str) -> Option<f64> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c| matches!(c, '(' | ')' | ',' | ':')))
        .filter_map(|t| t.parse::<f64>().ok())
        .find(|v| v.is_finite())
}

/// Activities from the column table. glpsol puts a name longer than its
/// column width on its own line and the values on the next.
fn parse_columns(text: &str) -> BTreeMap<String, f64> {
    let mut columns = BTreeMap::new();
    let mut lines = text.lines().skip_while(|l| !l.contains("Column name"));
    // header and dashes
    lines.next();
    lines.next();

    let mut pending: Option<String> = None;
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            break;
        }
        match pending.take() {
            // St Activity ...
            Some(name) => {
                if let Some(value) = tokens.get(1).and_then(|t| t.parse::<f64>().ok()) {
                    columns.insert(name, value);
                }
            }
            None if tokens.len() == 2 && tokens[0].parse::<usize>().is_ok() => {
                pending = Some(tokens[1].to_string());
            }
            // No. name St Activity ...
            None => {
                if let (Some(name), Some(value)) = (tokens.get(1), tokens.get(3).and_then(|t| t.parse::<f64>().ok())) {
                    columns.insert(name.to_string(), value);
                }
            }
        }
    }
    columns
}
