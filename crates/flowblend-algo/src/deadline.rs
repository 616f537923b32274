//! Wall-clock budgets for solver phases.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::{PlanError, SolvePhase, SolverStatus};

/// Run `job` on a worker thread and wait at most `budget` for its result.
///
/// On expiry the worker is abandoned and whatever it eventually produces is
/// dropped with the channel. A detached worker holds its thread until the job
/// returns, so iterative jobs are also handed the budget: the LP backends get
/// it as their own time limit and the L-BFGS rounds as an executor timeout.
/// The dense LU solve is a single factorization and has no limit of its own.
pub(crate) fn run_with_deadline<T, F>(phase: SolvePhase, budget: Duration, job: F) -> Result<T, PlanError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PlanError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("flowblend-{:?}", phase).to_lowercase())
        .spawn(move || {
            let _ = tx.send(job());
        })
        .map_err(|e| PlanError::Solver {
            phase,
            status: SolverStatus::Error,
            message: format!("failed to spawn solver thread: {e}"),
        })?;

    match rx.recv_timeout(budget) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!(%phase, ?budget, "solver exceeded its time budget");
            Err(PlanError::SolverTimeout { phase, budget })
        }
        Err(RecvTimeoutError::Disconnected) => Err(PlanError::Solver {
            phase,
            status: SolverStatus::Error,
            message: "solver thread terminated without a result".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_job_returns_its_result() {
        let value = run_with_deadline(SolvePhase::Flow, Duration::from_secs(5), || Ok(42)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn slow_job_times_out() {
        let result = run_with_deadline(SolvePhase::Quality, Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        });
        match result {
            Err(PlanError::SolverTimeout { phase, budget }) => {
                assert_eq!(phase, SolvePhase::Quality);
                assert_eq!(budget, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn panicking_job_is_a_solver_error() {
        let result: Result<(), _> = run_with_deadline(SolvePhase::Flow, Duration::from_secs(5), || {
            panic!("boom");
        });
        assert!(matches!(
            result,
            Err(PlanError::Solver {
                status: SolverStatus::Error,
                ..
            })
        ));
    }
}
