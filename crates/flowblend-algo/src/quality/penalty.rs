//! Exterior penalty method with L-BFGS for the composition balance.
//!
//! The balance residuals are driven to zero by minimizing
//!
//! ```text
//! P_μ(y) = Σ r_i(y)² + μ · Σ max(0, −y_j)²
//! ```
//!
//! where `y = c / s` is the composition scaled by the system magnitude `s`, and
//! `μ` grows by 10× per outer round until both the residual and the
//! non-negativity violation are within tolerance. The residual term is the
//! general path: it does not rely on the balance being linear, only on its
//! residual and gradient.

use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use std::time::Instant;
use tracing::debug;

use super::system::CompositionSystem;
use super::{QualityRun, QualitySolve};
use crate::config::QualitySolverConfig;
use crate::error::{PlanError, PlanResult, SolvePhase, SolverStatus};

const INITIAL_PENALTY: f64 = 1.0;
const PENALTY_INCREASE: f64 = 10.0;
const MAX_PENALTY_ROUNDS: usize = 5;
const LBFGS_MEMORY: usize = 7;
const GRADIENT_TOLERANCE_RATIO: f64 = 1e-3;

struct PenaltyProblem<'a> {
    system: &'a CompositionSystem,
    /// Right-hand side divided by the scale
    rhs: Vec<f64>,
    penalty: f64,
}

impl PenaltyProblem<'_> {
    fn residual(&self, y: &[f64]) -> Vec<f64> {
        let mut r = Vec::with_capacity(y.len());
        for (i, row) in self.system.matrix.outer_iterator().enumerate() {
            let ay: f64 = row.iter().map(|(j, a)| a * y[j]).sum();
            r.push(ay - self.rhs[i]);
        }
        r
    }
}

impl CostFunction for PenaltyProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, y: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let balance: f64 = self.residual(y).iter().map(|r| r * r).sum();
        let negativity: f64 = y.iter().map(|v| v.min(0.0).powi(2)).sum();
        Ok(balance + self.penalty * negativity)
    }
}

impl Gradient for PenaltyProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, y: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        let r = self.residual(y);
        let mut grad = self.system.transpose_apply(&r);
        for (g, v) in grad.iter_mut().zip(y) {
            *g = 2.0 * *g + 2.0 * self.penalty * v.min(0.0);
        }
        Ok(grad)
    }
}

pub(crate) struct PenaltyLbfgs;

impl QualitySolve for PenaltyLbfgs {
    fn solve(
        &self,
        system: &CompositionSystem,
        seed: &[f64],
        config: &QualitySolverConfig,
    ) -> PlanResult<QualityRun> {
        let scale = system.scale();
        let rhs: Vec<f64> = system.rhs.iter().map(|b| b / scale).collect();
        let target = system.tolerance(config.tolerance);
        // argmin's default gradient stop (√ε) sits above small scaled targets.
        let grad_tolerance = GRADIENT_TOLERANCE_RATIO * target / scale;

        let started = Instant::now();
        let budget = config.timeout();

        let mut y: Vec<f64> = seed.iter().map(|c| c / scale).collect();
        let mut penalty = INITIAL_PENALTY;
        let mut total_iterations = 0usize;
        let inner_max_iter = (config.max_iterations / MAX_PENALTY_ROUNDS).max(1) as u64;

        let mut residual = f64::INFINITY;
        let mut negativity = f64::INFINITY;

        for round in 0..MAX_PENALTY_ROUNDS {
            let remaining = budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(PlanError::SolverTimeout {
                    phase: SolvePhase::Quality,
                    budget,
                });
            }
            let problem = PenaltyProblem {
                system,
                rhs: rhs.clone(),
                penalty,
            };

            let linesearch = MoreThuenteLineSearch::new();
            let solver = LBFGS::new(linesearch, LBFGS_MEMORY)
                .with_tolerance_grad(grad_tolerance)
                .map_err(|err| PlanError::Solver {
                    phase: SolvePhase::Quality,
                    status: SolverStatus::Error,
                    message: err.to_string(),
                })?;
            let executor = Executor::new(problem, solver)
                .configure(|state| {
                    state
                        .param(y.clone())
                        .max_iters(inner_max_iter)
                        .target_cost(0.0)
                })
                .timeout(remaining);

            match executor.run() {
                Ok(res) => {
                    total_iterations += res.state().get_iter() as usize;
                    if let Some(best) = res.state().get_best_param() {
                        y = best.clone();
                    }
                }
                Err(err) => {
                    // Keep the current point; a larger penalty may still make progress.
                    debug!(round, %err, "L-BFGS round ended early");
                }
            }

            let x: Vec<f64> = y.iter().map(|v| v * scale).collect();
            residual = system.max_residual(&x);
            negativity = x.iter().fold(0.0_f64, |acc, v| acc.max(-v));
            debug!(round, penalty, residual, negativity, "penalty round finished");

            if residual <= target && negativity <= target {
                return Ok(QualityRun {
                    composition: x,
                    iterations: total_iterations,
                    residual,
                });
            }
            penalty *= PENALTY_INCREASE;
        }

        let status = if residual.is_finite() {
            SolverStatus::IterationLimit
        } else {
            SolverStatus::Error
        };
        Err(PlanError::SolverNonconvergence {
            phase: SolvePhase::Quality,
            status,
            residual: residual.max(negativity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    /// Pad feeding a disposal site: `c_pad = b`, `c_disposal = c_pad`.
    fn chain(b: f64) -> CompositionSystem {
        let mut triplets = TriMat::new((2, 2));
        triplets.add_triplet(0, 0, 1.0);
        triplets.add_triplet(1, 1, 1.0);
        triplets.add_triplet(1, 0, -1.0);
        CompositionSystem {
            matrix: triplets.to_csr(),
            rhs: vec![b, 0.0],
            throughput: vec![100.0, 100.0],
            locations: 2,
            periods: 1,
        }
    }

    #[test]
    fn converges_from_a_distant_seed() {
        let config = QualitySolverConfig::default();
        for b in [0.0, 1.0, 0.25, 120_000.0] {
            let system = chain(b);
            let seed = vec![config.composition_seed; 2];
            let run = PenaltyLbfgs
                .solve(&system, &seed, &config)
                .unwrap_or_else(|err| panic!("composition {b}: {err}"));
            let tol = 1e-5 * (1.0 + b);
            assert!((run.composition[0] - b).abs() < tol, "{:?}", run.composition);
            assert!((run.composition[1] - b).abs() < tol, "{:?}", run.composition);
        }
    }
}
