//! Phase 2: blended composition at every location and period.
//!
//! Composition belongs to the location blend, not to arcs: every flow leaving a
//! location in a period carries that location's composition for the period.
//! Flows, production, demand and storage come from phase 1 and are held fixed,
//! which turns the bilinear balance into a linear one in composition.
//!
//! | Backend | Method | Notes |
//! |---------|--------|-------|
//! | [`QualityBackend::PenaltyLbfgs`] | squared residuals + exterior penalty, L-BFGS | default |
//! | [`QualityBackend::Direct`] | dense partial-pivot LU | exact up to round-off |

pub mod direct;
pub mod penalty;
pub mod system;

use serde::Serialize;
use std::time::Instant;
use tracing::info;

use flowblend_core::Network;

use crate::activation::{ConstraintActivation, ConstraintFamily};
use crate::config::{QualityBackend, QualitySolverConfig};
use crate::error::{PlanError, PlanResult, SolvePhase, SolverStatus};
use crate::flow::FlowSolution;
use crate::table::PeriodTable;
use crate::validation::composition_mass_residual;

pub use system::CompositionSystem;

/// Raw backend output, unknowns in `[location][period]` order.
pub(crate) struct QualityRun {
    pub composition: Vec<f64>,
    pub iterations: usize,
    pub residual: f64,
}

/// A composition backend.
pub(crate) trait QualitySolve {
    fn solve(
        &self,
        system: &CompositionSystem,
        seed: &[f64],
        config: &QualitySolverConfig,
    ) -> PlanResult<QualityRun>;
}

/// Composition per location and period.
#[derive(Debug, Clone, Serialize)]
pub struct QualitySolution {
    /// `[location][period]`
    pub composition: PeriodTable,
    pub backend: QualityBackend,
    pub status: SolverStatus,
    pub iterations: usize,
    /// Largest row-normalized balance residual
    pub residual: f64,
    /// Largest mass-balance residual in volume × composition units
    pub mass_residual: f64,
    pub solve_time_ms: u128,
}

/// Solve the composition balance with `flows` held fixed.
pub fn propagate_quality(
    network: &Network,
    flows: &FlowSolution,
    activation: &ConstraintActivation,
    config: &QualitySolverConfig,
) -> PlanResult<QualitySolution> {
    if !activation.is_active(ConstraintFamily::CompositionBalance) {
        return Err(PlanError::Solver {
            phase: SolvePhase::Quality,
            status: SolverStatus::Error,
            message: "composition balance is not active".to_string(),
        });
    }

    let start = Instant::now();
    let system = CompositionSystem::assemble(network, flows);
    info!(
        backend = %config.backend,
        unknowns = system.len(),
        nonzeros = system.matrix.nnz(),
        "solving quality propagation"
    );

    let run = if system.is_empty() {
        QualityRun {
            composition: Vec::new(),
            iterations: 0,
            residual: 0.0,
        }
    } else {
        let seed = vec![config.composition_seed; system.len()];
        let solver: &dyn QualitySolve = match config.backend {
            QualityBackend::PenaltyLbfgs => &penalty::PenaltyLbfgs,
            QualityBackend::Direct => &direct::DirectLu,
        };
        solver.solve(&system, &seed, config)?
    };

    let composition = PeriodTable::from_values(system.periods, run.composition);
    let mass_residual = composition_mass_residual(network, flows, &composition);
    let solve_time_ms = start.elapsed().as_millis();
    info!(
        iterations = run.iterations,
        residual = run.residual,
        mass_residual,
        solve_time_ms,
        "quality propagation converged"
    );

    Ok(QualitySolution {
        composition,
        backend: config.backend,
        status: SolverStatus::Converged,
        iterations: run.iterations,
        residual: run.residual,
        mass_residual,
        solve_time_ms,
    })
}
