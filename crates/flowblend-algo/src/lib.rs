//! # flowblend-algo: Water Allocation and Blending
//!
//! Plans water movement across a [`flowblend_core::Network`] in two phases:
//!
//! | Phase | Problem | Solver | Module |
//! |-------|---------|--------|--------|
//! | 1. Flow allocation | capacitated multi-period network flow | LP (Clarabel, HiGHS) via `good_lp` | [`flow`] |
//! | 2. Quality propagation | composition balance with flows fixed | penalty L-BFGS (`argmin`) or dense LU (`faer`) | [`quality`] |
//!
//! Jointly the problem is bilinear (flow × composition), a pooling-problem
//! variant. Solving flows first and composition second keeps phase 1 convex and
//! phase 2 linear; there is no global-optimality claim for the blend.
//!
//! ## Example
//!
//! ```no_run
//! use flowblend_algo::{PlanConfig, Planner};
//! use flowblend_core::{LocationRole, NetworkBuilder};
//!
//! let mut b = NetworkBuilder::new();
//! b.periods(["T1"]).modes(["pipeline"]);
//! b.location("PP01", LocationRole::ProductionPad);
//! b.location("K01", LocationRole::DisposalSite);
//! b.connect("PP01", "pipeline", "K01");
//! b.transport_capacity("PP01", "pipeline", "K01", 100.0);
//! b.water_profile("PP01", "T1", 60.0);
//! b.production_composition("PP01", "T1", 120_000.0);
//! b.disposal_cost("K01", 1.0);
//! let network = b.build()?;
//!
//! let plan = Planner::new(PlanConfig::default()).plan(&network)?;
//! println!("cost: {:.2}", plan.objective());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod activation;
pub mod config;
mod deadline;
pub mod error;
pub mod flow;
pub mod planner;
pub mod quality;
pub mod report;
pub mod table;
pub mod validation;

pub use activation::{ConstraintActivation, ConstraintFamily};
pub use config::{
    ConfigError, FlowSolverConfig, LpBackend, PlanConfig, PlanOptions, QualityBackend,
    QualitySolverConfig,
};
pub use error::{PlanError, PlanResult, SolvePhase, SolverStatus};
pub use flow::{solve_flow, CostBreakdown, FlowSolution};
pub use planner::{FlowSolved, Plan, Planner, QualityPropagated, Scenario, ScenarioOutcome};
pub use quality::{propagate_quality, CompositionSystem, QualitySolution};
pub use report::{LocationRow, PlanReport, PlanSummary, TransferRow};
pub use table::PeriodTable;
pub use validation::{compute_flow_violations, composition_mass_residual, PlanViolations};
