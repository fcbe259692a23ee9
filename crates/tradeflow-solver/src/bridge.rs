use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info, warn};
use serde::Deserialize;
use tradeflow_lp::{LpProblem, LpWriter};

use crate::error::SolveError;
use crate::report::SolverReport;

/// Anything that can turn an LP document into a solver report
pub trait LpSolver {
    fn solve(&self, problem: &LpProblem) -> Result<SolverReport, SolveError>;

    /// Only the optimal objective value
    fn optimal_value(&self, problem: &LpProblem) -> Result<f64, SolveError> {
        self.solve(problem).map(|report| report.objective)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Executable name or path
    pub program: PathBuf,
    /// Where the `.lp` and report files go; the system temp dir when unset
    pub work_dir: Option<PathBuf>,
    /// Leave the `.lp` and report files behind for inspection
    pub keep_files: bool,
    /// Extra arguments appended after `--lp <file> -o <report>`
    pub args: Vec<String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("glpsol"),
            work_dir: None,
            keep_files: false,
            args: Vec::new(),
        }
    }
}

static RUN_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Removes the run's files on drop unless they are to be kept
struct RunFiles {
    lp: PathBuf,
    report: PathBuf,
    keep: bool,
}

impl Drop for RunFiles {
    fn drop(&mut self) {
        if self.keep {
            info!("kept {} and {}", self.lp.display(), self.report.display());
            return;
        }
        for path in [&self.lp, &self.report] {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("cannot remove {}: {}", path.display(), err);
                }
            }
        }
    }
}

/// Runs GLPK's `glpsol --lp <file> -o <report>` and parses the report.
/// The call blocks until the solver exits; there is no timeout.
#[derive(Debug, Clone, Default)]
pub struct Glpsol {
    config: SolverConfig,
}

impl Glpsol {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Whether the configured program can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run_files(&self) -> RunFiles {
        let dir = self
            .config
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let stem = format!(
            "tradeflow-{}-{}",
            std::process::id(),
            RUN_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        RunFiles {
            lp: dir.join(format!("{}.lp", stem)),
            report: dir.join(format!("{}.txt", stem)),
            keep: self.config.keep_files,
        }
    }

    /// Solve an already-written LP file, reporting to `report_path`
    pub fn solve_file(&self, lp_path: &Path, report_path: &Path) -> Result<SolverReport, SolveError> {
        let program = self.config.program.display().to_string();
        debug!("running {} --lp {} -o {}", program, lp_path.display(), report_path.display());

        let output = Command::new(&self.config.program)
            .arg("--lp")
            .arg(lp_path)
            .arg("-o")
            .arg(report_path)
            .args(&self.config.args)
            .output()
            .map_err(|source| SolveError::Launch {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            let tail: Vec<&str> = text.lines().rev().take(5).collect();
            return Err(SolveError::SolverFailed {
                program,
                status: output.status.to_string(),
                output: tail.into_iter().rev().collect::<Vec<_>>().join(" | "),
            });
        }

        let report = fs::read_to_string(report_path).map_err(|source| SolveError::Io {
            path: report_path.display().to_string(),
            source,
        })?;
        let parsed = SolverReport::parse(&report)?;
        info!(
            "{} finished: status {}, objective {}",
            program,
            parsed.status.as_deref().unwrap_or("?"),
            parsed.objective
        );
        Ok(parsed)
    }
}

impl LpSolver for Glpsol {
    fn solve(&self, problem: &LpProblem) -> Result<SolverReport, SolveError> {
        let files = self.run_files();
        let document = LpWriter::new().with_header("written by tradeflow").render(problem);
        fs::write(&files.lp, document).map_err(|source| SolveError::Io {
            path: files.lp.display().to_string(),
            source,
        })?;
        self.solve_file(&files.lp, &files.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.program, PathBuf::from("glpsol"));
        assert!(!config.keep_files);
        assert!(config.work_dir.is_none());
    }

    #[test]
    fn test_run_files_are_unique() {
        let solver = Glpsol::new(SolverConfig {
            keep_files: true,
            ..SolverConfig::default()
        });
        let a = solver.run_files();
        let b = solver.run_files();
        assert_ne!(a.lp, b.lp);
        assert_eq!(a.lp.extension().and_then(|e| e.to_str()), Some("lp"));
        assert_eq!(a.lp.parent(), Some(std::env::temp_dir().as_path()));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let solver = Glpsol::new(SolverConfig {
            program: PathBuf::from("tradeflow-no-such-solver"),
            ..SolverConfig::default()
        });
        assert!(!solver.is_available());
        let err = solver.solve(&LpProblem::new(tradeflow_lp::Sense::Maximize)).unwrap_err();
        assert!(matches!(err, SolveError::Launch { .. }), "{:?}", err);
    }
}
