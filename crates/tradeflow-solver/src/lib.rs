//! Runs an external LP solver over a written document and reads back its report.
//!
//! The only backend is GLPK's `glpsol`; [`LpSolver`] is the seam for others.

mod bridge;
mod error;
mod report;

pub use bridge::{Glpsol, LpSolver, SolverConfig};
pub use error::SolveError;
pub use report::{INFEASIBLE_MARKER, OBJECTIVE_MARKER, SolverReport, parse_objective_line};

/// Optimal objective value of `problem` under `solver`
pub fn optimal_value<S: LpSolver + ?Sized>(solver: &S, problem: &tradeflow_lp::LpProblem) -> Result<f64, SolveError> {
    solver.optimal_value(problem)
}
