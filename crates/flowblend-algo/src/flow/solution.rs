//! Phase 1 results.

use serde::Serialize;

use flowblend_core::{LocationId, Network, PeriodId, TransportArc};

use crate::config::LpBackend;
use crate::error::SolverStatus;
use crate::flow::formulation::FormulationStats;
use crate::table::PeriodTable;

/// Cost per category and index, with totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// `[location][period]`, non-zero only at disposal sites
    pub disposal: PeriodTable,
    /// `[location][period]`, non-zero only at freshwater sources
    pub freshwater: PeriodTable,
    /// `[arc][period]`
    pub transport: PeriodTable,
    pub total_disposal: f64,
    pub total_freshwater: f64,
    pub total_transport: f64,
}

impl CostBreakdown {
    /// Price a set of flow quantities with the network's unit costs.
    pub fn evaluate(
        network: &Network,
        production: &PeriodTable,
        flow: &PeriodTable,
    ) -> Self {
        let periods = network.periods();
        let n_t = periods.len();
        let mut disposal = PeriodTable::zeros(network.location_count(), n_t);
        let mut freshwater = PeriodTable::zeros(network.location_count(), n_t);
        let mut transport = PeriodTable::zeros(network.arc_count(), n_t);

        for loc in network.locations() {
            let i = loc.id.value();
            for t in periods.iter() {
                if loc.role.has_free_demand() {
                    let inbound: f64 = network
                        .inbound(loc.id)
                        .map(|arc| flow.get(arc.id.value(), t))
                        .sum();
                    disposal.set(i, t, loc.params.disposal_cost * inbound);
                }
                if loc.role.has_free_production() {
                    freshwater.set(i, t, loc.params.freshwater_cost * production.get(i, t));
                }
            }
        }
        for arc in network.arcs() {
            let a = arc.id.value();
            for t in periods.iter() {
                transport.set(a, t, arc.cost_per_unit() * flow.get(a, t));
            }
        }

        Self {
            total_disposal: disposal.total(),
            total_freshwater: freshwater.total(),
            total_transport: transport.total(),
            disposal,
            freshwater,
            transport,
        }
    }

    pub fn total(&self) -> f64 {
        self.total_disposal + self.total_freshwater + self.total_transport
    }
}

/// Optimal allocation: production, demand, flow and storage per index.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSolution {
    /// `[location][period]`
    pub production: PeriodTable,
    /// `[location][period]`
    pub demand: PeriodTable,
    /// `[location][period]`
    pub storage: PeriodTable,
    /// `[arc][period]`
    pub flow: PeriodTable,
    pub costs: CostBreakdown,
    /// Total cost (disposal + freshwater + transport)
    pub objective: f64,
    pub status: SolverStatus,
    pub backend: LpBackend,
    pub stats: FormulationStats,
    pub solve_time_ms: u128,
}

impl FlowSolution {
    pub fn production(&self, loc: LocationId, t: PeriodId) -> f64 {
        self.production.get(loc.value(), t)
    }

    pub fn demand(&self, loc: LocationId, t: PeriodId) -> f64 {
        self.demand.get(loc.value(), t)
    }

    pub fn storage(&self, loc: LocationId, t: PeriodId) -> f64 {
        self.storage.get(loc.value(), t)
    }

    pub fn flow(&self, arc: &TransportArc, t: PeriodId) -> f64 {
        self.flow.get(arc.id.value(), t)
    }

    /// Storage carried into period `t` (initial storage at the first period).
    pub fn carried_storage(&self, network: &Network, loc: LocationId, t: PeriodId) -> f64 {
        match network.periods().prev(t) {
            Some(prev) => self.storage(loc, prev),
            None => network.location(loc).params.storage_init,
        }
    }

    pub fn inflow(&self, network: &Network, loc: LocationId, t: PeriodId) -> f64 {
        network.inbound(loc).map(|arc| self.flow(arc, t)).sum()
    }

    pub fn outflow(&self, network: &Network, loc: LocationId, t: PeriodId) -> f64 {
        network.outbound(loc).map(|arc| self.flow(arc, t)).sum()
    }

    /// Demand + outbound flow + storage: the volume that leaves with the local blend.
    pub fn throughput(&self, network: &Network, loc: LocationId, t: PeriodId) -> f64 {
        self.demand(loc, t) + self.outflow(network, loc, t) + self.storage(loc, t)
    }
}
