/// Direction of optimization
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

/// A single `coefficient * variable` product
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub coefficient: f64,
    pub variable: String,
}

/// Ordered list of terms. Adding a variable that is already present
/// accumulates into the existing term instead of appending a duplicate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<Term>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, coefficient: f64, variable: impl Into<String>) -> &mut Self {
        let variable = variable.into();
        match self.terms.iter_mut().find(|t| t.variable == variable) {
            Some(term) => term.coefficient += coefficient,
            None => self.terms.push(Term { coefficient, variable }),
        }
        self
    }

    /// Builder-style variant of [`LinearExpr::add`]
    pub fn with(mut self, coefficient: f64, variable: impl Into<String>) -> Self {
        self.add(coefficient, variable);
        self
    }

    /// Append every term of `other` scaled by `factor`
    pub fn add_scaled(&mut self, factor: f64, other: &LinearExpr) -> &mut Self {
        for term in &other.terms {
            self.add(factor * term.coefficient, term.variable.clone());
        }
        self
    }

    pub fn coefficient(&self, variable: &str) -> Option<f64> {
        self.terms
            .iter()
            .find(|t| t.variable == variable)
            .map(|t| t.coefficient)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.variable.as_str())
    }

    /// Evaluate against a variable assignment; missing variables count as zero
    pub fn evaluate<F>(&self, mut value_of: F) -> f64
    where
        F: FnMut(&str) -> Option<f64>,
    {
        self.terms
            .iter()
            .map(|t| t.coefficient * value_of(&t.variable).unwrap_or(0.0))
            .sum()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Row label written before the expression
    pub name: String,
    pub sense: Sense,
    pub expr: LinearExpr,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    pub expr: LinearExpr,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

/// A run of constraints sharing one explanatory comment line
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintBlock {
    pub comment: Option<String>,
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub variable: String,
    pub op: ConstraintOp,
    pub value: f64,
}

impl Bound {
    pub fn nonnegative(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            op: ConstraintOp::Ge,
            value: 0.0,
        }
    }
}

/// Represents a linear programming problem as written to / read from LP text
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    pub objective: Objective,
    pub blocks: Vec<ConstraintBlock>,
    pub bounds: Vec<Bound>,
}

impl LpProblem {
    pub fn new(sense: Sense) -> Self {
        Self {
            objective: Objective {
                name: "obj".to_string(),
                sense,
                expr: LinearExpr::new(),
            },
            blocks: Vec::new(),
            bounds: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, name: impl Into<String>, expr: LinearExpr) {
        self.objective.name = name.into();
        self.objective.expr = expr;
    }

    /// Start a new commented block; later constraints are appended to it
    pub fn begin_block(&mut self, comment: impl Into<String>) {
        self.blocks.push(ConstraintBlock {
            comment: Some(comment.into()),
            constraints: Vec::new(),
        });
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, expr: LinearExpr, op: ConstraintOp, rhs: f64) {
        let constraint = Constraint {
            name: name.into(),
            expr,
            op,
            rhs,
        };
        match self.blocks.last_mut() {
            Some(block) => block.constraints.push(constraint),
            None => self.blocks.push(ConstraintBlock {
                comment: None,
                constraints: vec![constraint],
            }),
        }
    }

    pub fn add_bound(&mut self, bound: Bound) {
        self.bounds.push(bound);
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.blocks.iter().flat_map(|b| b.constraints.iter())
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints().find(|c| c.name == name)
    }

    /// Find the block introduced by `comment`
    pub fn block(&self, comment: &str) -> Option<&ConstraintBlock> {
        self.blocks
            .iter()
            .find(|b| b.comment.as_deref() == Some(comment))
    }

    /// Distinct variable names in order of first appearance
    /// (objective, then constraints, then bounds)
    pub fn variables(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        let exprs = std::iter::once(&self.objective.expr).chain(self.constraints().map(|c| &c.expr));
        for name in exprs.flat_map(|e| e.variables()) {
            if seen.insert(name) {
                names.push(name.to_string());
            }
        }
        for bound in &self.bounds {
            if seen.insert(bound.variable.as_str()) {
                names.push(bound.variable.clone());
            }
        }
        names
    }

    pub fn num_variables(&self) -> usize {
        self.variables().len()
    }

    pub fn num_constraints(&self) -> usize {
        self.blocks.iter().map(|b| b.constraints.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_repeated_variable() {
        let mut expr = LinearExpr::new();
        expr.add(2.0, "x").add(3.0, "y").add(-0.5, "x");
        assert_eq!(expr.len(), 2);
        assert_eq!(expr.coefficient("x"), Some(1.5));
        assert_eq!(expr.coefficient("y"), Some(3.0));
        assert_eq!(expr.coefficient("z"), None);
    }

    #[test]
    fn test_add_scaled() {
        let net = LinearExpr::new().with(1.0, "a").with(-1.0, "b");
        let mut expr = LinearExpr::new().with(4.0, "c");
        expr.add_scaled(70.0, &net);
        assert_eq!(expr.coefficient("a"), Some(70.0));
        assert_eq!(expr.coefficient("b"), Some(-70.0));
        assert_eq!(expr.coefficient("c"), Some(4.0));
    }

    #[test]
    fn test_evaluate() {
        let expr = LinearExpr::new().with(2.0, "x").with(-1.0, "y").with(5.0, "z");
        let value = expr.evaluate(|name| match name {
            "x" => Some(3.0),
            "y" => Some(1.0),
            _ => None,
        });
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_blocks_and_variables() {
        let mut lp = LpProblem::new(Sense::Maximize);
        lp.set_objective("profit", LinearExpr::new().with(1.0, "x"));
        lp.add_constraint("loose", LinearExpr::new().with(1.0, "w"), ConstraintOp::Le, 1.0);
        lp.begin_block("caps");
        lp.add_constraint("c1", LinearExpr::new().with(1.0, "x").with(1.0, "y"), ConstraintOp::Le, 10.0);
        lp.add_constraint("c2", LinearExpr::new().with(1.0, "y"), ConstraintOp::Ge, 1.0);
        lp.add_bound(Bound::nonnegative("x"));
        lp.add_bound(Bound::nonnegative("v"));

        assert_eq!(lp.blocks.len(), 2);
        assert_eq!(lp.blocks[0].comment, None);
        assert_eq!(lp.block("caps").map(|b| b.constraints.len()), Some(2));
        assert_eq!(lp.num_constraints(), 3);
        assert_eq!(lp.constraint("c2").map(|c| c.op), Some(ConstraintOp::Ge));
        assert_eq!(lp.variables(), vec!["x", "w", "y", "v"]);
    }
}
