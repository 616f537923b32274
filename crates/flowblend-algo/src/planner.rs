//! Two-phase solve orchestration.
//!
//! A plan moves through two states and never back:
//!
//! ```text
//! Network ──solve_flow──▶ FlowSolved ──propagate_quality──▶ QualityPropagated
//!                              │                                  │
//!                              └──────────── into_plan ───────────┘
//! ```
//!
//! Phase 1 runs with the composition balance deactivated. If it fails for any
//! reason the plan stops there. Phase 2 takes the phase 1 production, demand,
//! flow and storage as fixed values, seeds every composition unknown and
//! activates only the composition balance. Each phase runs against its own
//! wall-clock budget.

use std::sync::Arc;
use tracing::{info, warn};

use flowblend_core::Network;

use crate::activation::ConstraintActivation;
use crate::config::{PlanConfig, QualitySolverConfig};
use crate::deadline::run_with_deadline;
use crate::error::{PlanResult, SolvePhase};
use crate::flow::{solve_flow, FlowSolution};
use crate::quality::{propagate_quality, QualitySolution};
use crate::validation::{compute_flow_violations, PlanViolations};

/// Flow violations above this are logged as warnings.
const VIOLATION_WARN_THRESHOLD: f64 = 1e-6;

/// Runs plans with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlanConfig,
}

impl Planner {
    pub fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// Phase 1 only.
    pub fn solve_flow(&self, network: Arc<Network>) -> PlanResult<FlowSolved> {
        let flow_config = self.config.flow.clone();
        let worker_network = Arc::clone(&network);
        let flow = run_with_deadline(SolvePhase::Flow, flow_config.timeout(), move || {
            solve_flow(
                &worker_network,
                &ConstraintActivation::flow_phase(),
                &flow_config,
            )
        })?;

        let violations = compute_flow_violations(&network, &flow);
        let worst = violations.max_flow_violation();
        if worst > VIOLATION_WARN_THRESHOLD * (1.0 + flow.production.max_abs()) {
            warn!(worst, ?violations, "flow solution violates its constraints");
        }

        Ok(FlowSolved {
            network,
            flow: Arc::new(flow),
            violations,
        })
    }

    /// Run the full plan: phase 1, then phase 2 when composition is tracked.
    pub fn plan(&self, network: &Network) -> PlanResult<Plan> {
        self.plan_shared(Arc::new(network.clone()))
    }

    pub fn plan_shared(&self, network: Arc<Network>) -> PlanResult<Plan> {
        let solved = self.solve_flow(network)?;
        if !self.config.plan.track_composition {
            info!("composition tracking disabled, stopping after flow allocation");
            return Ok(solved.into_plan());
        }
        Ok(solved.propagate_quality(&self.config.quality)?.into_plan())
    }

    /// Plan independent scenarios, in parallel when the `parallel` feature is on.
    pub fn solve_batch(&self, scenarios: Vec<Scenario>) -> Vec<ScenarioOutcome> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            scenarios
                .into_par_iter()
                .map(|scenario| self.run_scenario(scenario))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            scenarios
                .into_iter()
                .map(|scenario| self.run_scenario(scenario))
                .collect()
        }
    }

    fn run_scenario(&self, scenario: Scenario) -> ScenarioOutcome {
        info!(scenario = %scenario.name, "planning scenario");
        let result = self.plan_shared(Arc::new(scenario.network));
        if let Err(err) = &result {
            warn!(scenario = %scenario.name, %err, "scenario failed");
        }
        ScenarioOutcome {
            name: scenario.name,
            result,
        }
    }
}

/// Phase 1 complete: flows are known, composition is not.
#[derive(Debug, Clone)]
pub struct FlowSolved {
    network: Arc<Network>,
    flow: Arc<FlowSolution>,
    violations: PlanViolations,
}

impl FlowSolved {
    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn flow(&self) -> &FlowSolution {
        &self.flow
    }

    pub fn violations(&self) -> &PlanViolations {
        &self.violations
    }

    /// Fix the phase 1 values and solve the composition balance.
    pub fn propagate_quality(self, config: &QualitySolverConfig) -> PlanResult<QualityPropagated> {
        info!(
            fixed = self.flow.stats.free_variables + self.flow.stats.pinned_variables,
            seed = config.composition_seed,
            "fixing flow quantities and activating composition balance"
        );
        let quality_config = config.clone();
        let network = Arc::clone(&self.network);
        let flow = Arc::clone(&self.flow);
        let quality = run_with_deadline(SolvePhase::Quality, config.timeout(), move || {
            propagate_quality(
                &network,
                &flow,
                &ConstraintActivation::quality_phase(),
                &quality_config,
            )
        })?;

        let mut violations = self.violations;
        violations.max_composition_residual = Some(quality.mass_residual);

        Ok(QualityPropagated {
            network: self.network,
            flow: self.flow,
            quality,
            violations,
        })
    }

    /// Finish without composition.
    pub fn into_plan(self) -> Plan {
        Plan {
            network: self.network,
            flow: self.flow,
            quality: None,
            violations: self.violations,
        }
    }
}

/// Phase 2 complete.
#[derive(Debug, Clone)]
pub struct QualityPropagated {
    network: Arc<Network>,
    flow: Arc<FlowSolution>,
    quality: QualitySolution,
    violations: PlanViolations,
}

impl QualityPropagated {
    pub fn flow(&self) -> &FlowSolution {
        &self.flow
    }

    pub fn quality(&self) -> &QualitySolution {
        &self.quality
    }

    pub fn into_plan(self) -> Plan {
        Plan {
            network: self.network,
            flow: self.flow,
            quality: Some(self.quality),
            violations: self.violations,
        }
    }
}

/// A finished plan.
#[derive(Debug, Clone)]
pub struct Plan {
    pub network: Arc<Network>,
    pub flow: Arc<FlowSolution>,
    /// `None` when composition tracking is disabled
    pub quality: Option<QualitySolution>,
    pub violations: PlanViolations,
}

impl Plan {
    pub fn objective(&self) -> f64 {
        self.flow.objective
    }
}

/// A named network for batch planning.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub network: Network,
}

/// Result of one batch scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: PlanResult<Plan>,
}
