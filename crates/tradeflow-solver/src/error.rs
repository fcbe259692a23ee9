use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    /// The solver ran but produced no optimal value: infeasible, unbounded,
    /// or a report without an objective line. Rerunning the same document
    /// gives the same answer.
    #[error("LP is unsolvable: {0}")]
    Unsolvable(String),
    #[error("Cannot launch solver {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Solver {program} exited with {status}: {output}")]
    SolverFailed {
        program: String,
        status: String,
        output: String,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SolveError {
    pub fn is_unsolvable(&self) -> bool {
        matches!(self, SolveError::Unsolvable(_))
    }
}
