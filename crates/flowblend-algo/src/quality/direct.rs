//! Dense LU solve of the composition system.

use faer::prelude::SpSolver;
use faer::{FaerMat, Mat};

use super::system::CompositionSystem;
use super::{QualityRun, QualitySolve};
use crate::config::QualitySolverConfig;
use crate::error::{PlanError, PlanResult, SolvePhase, SolverStatus};

pub(crate) struct DirectLu;

impl QualitySolve for DirectLu {
    fn solve(
        &self,
        system: &CompositionSystem,
        _seed: &[f64],
        config: &QualitySolverConfig,
    ) -> PlanResult<QualityRun> {
        let n = system.len();

        let mut mat = Mat::zeros(n, n);
        for (i, row) in system.matrix.outer_iterator().enumerate() {
            for (j, a) in row.iter() {
                mat.write(i, j, *a);
            }
        }
        let mut rhs = Mat::zeros(n, 1);
        for (i, b) in system.rhs.iter().enumerate() {
            rhs.write(i, 0, *b);
        }

        let lu = mat.partial_piv_lu();
        let solution = lu.solve(&rhs);
        let x: Vec<f64> = (0..n).map(|i| solution.read(i, 0)).collect();

        // A singular system (water circulating with no outside source) shows
        // up as non-finite entries.
        if x.iter().any(|v| !v.is_finite()) {
            return Err(PlanError::SolverNonconvergence {
                phase: SolvePhase::Quality,
                status: SolverStatus::Singular,
                residual: f64::INFINITY,
            });
        }

        let residual = system.max_residual(&x);
        if residual > system.tolerance(config.tolerance) {
            return Err(PlanError::SolverNonconvergence {
                phase: SolvePhase::Quality,
                status: SolverStatus::Singular,
                residual,
            });
        }

        Ok(QualityRun {
            composition: x,
            iterations: 1,
            residual,
        })
    }
}
