//! Planning errors.
//!
//! Every failure carries the phase it came from and the last solver status.
//! Nothing here is recovered locally: an infeasible allocation stops the plan
//! before blending is attempted, and a blending failure withholds composition.

use flowblend_core::NetworkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The two phases of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvePhase {
    /// Phase 1: LP network flow
    Flow,
    /// Phase 2: composition balance with flows fixed
    Quality,
}

impl fmt::Display for SolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolvePhase::Flow => write!(f, "flow allocation"),
            SolvePhase::Quality => write!(f, "quality propagation"),
        }
    }
}

/// Status reported by a solver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Optimal,
    Converged,
    Infeasible,
    Unbounded,
    TimedOut,
    IterationLimit,
    Singular,
    Error,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Converged => "converged",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::TimedOut => "timed out",
            SolverStatus::IterationLimit => "iteration limit",
            SolverStatus::Singular => "singular system",
            SolverStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Errors produced while planning.
#[derive(Error, Debug, Clone)]
pub enum PlanError {
    /// Phase 1 has no feasible point. Phase 2 is never run.
    #[error("flow model is infeasible: {reason}")]
    InfeasibleFlowModel { reason: String },

    #[error("{phase} exceeded its time budget of {budget:?}")]
    SolverTimeout { phase: SolvePhase, budget: Duration },

    #[error("{phase} did not converge ({status}, residual {residual:.3e})")]
    SolverNonconvergence {
        phase: SolvePhase,
        status: SolverStatus,
        residual: f64,
    },

    #[error("{phase} solver failed ({status}): {message}")]
    Solver {
        phase: SolvePhase,
        status: SolverStatus,
        message: String,
    },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl PlanError {
    /// Phase the error originated from, if any.
    pub fn phase(&self) -> Option<SolvePhase> {
        match self {
            PlanError::InfeasibleFlowModel { .. } => Some(SolvePhase::Flow),
            PlanError::SolverTimeout { phase, .. }
            | PlanError::SolverNonconvergence { phase, .. }
            | PlanError::Solver { phase, .. } => Some(*phase),
            PlanError::Network(_) => None,
        }
    }

    /// Last solver status associated with the error.
    pub fn status(&self) -> Option<SolverStatus> {
        match self {
            PlanError::InfeasibleFlowModel { .. } => Some(SolverStatus::Infeasible),
            PlanError::SolverTimeout { .. } => Some(SolverStatus::TimedOut),
            PlanError::SolverNonconvergence { status, .. } | PlanError::Solver { status, .. } => {
                Some(*status)
            }
            PlanError::Network(_) => None,
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
