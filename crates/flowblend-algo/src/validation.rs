//! Violation metrics for a solved plan.
//!
//! These recompute every balance and bound from the reported values rather than
//! trusting solver status, so a plan can be checked independently of how it was
//! produced.

use serde::Serialize;

use flowblend_core::Network;

use crate::flow::FlowSolution;
use crate::table::PeriodTable;

/// Largest violation of each plan property (all zero for an exact plan).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanViolations {
    /// Material balance residual
    pub max_balance_residual: f64,
    /// Flow above arc capacity
    pub max_arc_capacity_excess: f64,
    /// Storage above storage capacity
    pub max_storage_capacity_excess: f64,
    /// Freshwater production above availability
    pub max_availability_excess: f64,
    /// |final storage − initial storage| at pads and storage sites
    pub max_cycle_mismatch: f64,
    /// |reported − input| for known production and demand
    pub max_fixed_deviation: f64,
    /// Most negative decision quantity, as a positive number
    pub max_negativity: f64,
    /// Composition mass-balance residual, when composition was propagated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_composition_residual: Option<f64>,
}

impl PlanViolations {
    /// Largest of the flow-phase violations.
    pub fn max_flow_violation(&self) -> f64 {
        [
            self.max_balance_residual,
            self.max_arc_capacity_excess,
            self.max_storage_capacity_excess,
            self.max_availability_excess,
            self.max_cycle_mismatch,
            self.max_fixed_deviation,
            self.max_negativity,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    pub fn is_within(&self, tolerance: f64) -> bool {
        self.max_flow_violation() <= tolerance
    }
}

/// Check a flow solution against the network it was solved for.
pub fn compute_flow_violations(network: &Network, flows: &FlowSolution) -> PlanViolations {
    let periods = network.periods();
    let mut v = PlanViolations::default();

    for loc in network.locations() {
        let params = &loc.params;
        for t in periods.iter() {
            let i = t.value();
            let production = flows.production(loc.id, t);
            let demand = flows.demand(loc.id, t);
            let storage = flows.storage(loc.id, t);

            let supply = production
                + flows.inflow(network, loc.id, t)
                + flows.carried_storage(network, loc.id, t);
            let balance = supply - flows.throughput(network, loc.id, t);
            v.max_balance_residual = v.max_balance_residual.max(balance.abs());

            v.max_storage_capacity_excess = v
                .max_storage_capacity_excess
                .max(storage - params.storage_capacity);

            if loc.role.has_free_production() {
                v.max_availability_excess = v
                    .max_availability_excess
                    .max(production - params.freshwater_availability[i]);
            } else {
                v.max_fixed_deviation = v
                    .max_fixed_deviation
                    .max((production - params.water_profile[i]).abs());
            }
            if !loc.role.has_free_demand() {
                v.max_fixed_deviation = v
                    .max_fixed_deviation
                    .max((demand - params.demand[i]).abs());
            }

            v.max_negativity = v
                .max_negativity
                .max(-production)
                .max(-demand)
                .max(-storage);
        }

        if loc.role.requires_storage_cycle() {
            let last = flows.storage(loc.id, periods.last());
            v.max_cycle_mismatch = v
                .max_cycle_mismatch
                .max((last - params.storage_init).abs());
        }
    }

    for arc in network.arcs() {
        for t in periods.iter() {
            let flow = flows.flow(arc, t);
            v.max_arc_capacity_excess = v.max_arc_capacity_excess.max(flow - arc.capacity);
            v.max_negativity = v.max_negativity.max(-flow);
        }
    }

    v
}

/// Largest composition mass-balance residual given fixed flows:
/// `|P·ProdComp + Σ F_in·c_origin + S_prev·c_prev − W·c|`.
pub fn composition_mass_residual(
    network: &Network,
    flows: &FlowSolution,
    composition: &PeriodTable,
) -> f64 {
    let periods = network.periods();
    let mut worst: f64 = 0.0;
    for loc in network.locations() {
        let l = loc.id.value();
        let params = &loc.params;
        for t in periods.iter() {
            let mut mass_in =
                flows.production(loc.id, t) * params.production_composition[t.value()];
            for arc in network.inbound(loc.id) {
                mass_in += flows.flow(arc, t) * composition.get(arc.origin.value(), t);
            }
            mass_in += match periods.prev(t) {
                Some(prev) => flows.storage(loc.id, prev) * composition.get(l, prev),
                None => params.storage_init * params.storage_init_composition,
            };
            let mass_out = flows.throughput(network, loc.id, t) * composition.get(l, t);
            worst = worst.max((mass_in - mass_out).abs());
        }
    }
    worst
}
