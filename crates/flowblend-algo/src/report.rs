//! Flat result tables for a finished plan.

use serde::Serialize;

use flowblend_core::Network;

use crate::error::SolverStatus;
use crate::planner::Plan;
use crate::table::PeriodTable;
use crate::validation::PlanViolations;

/// One arc flow in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRow {
    pub origin: String,
    pub mode: String,
    pub destination: String,
    pub period: String,
    pub value: f64,
}

/// One location value in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRow {
    pub location: String,
    pub period: String,
    pub value: f64,
}

/// Scalar results, statuses and timings.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub objective: f64,
    pub disposal_cost: f64,
    pub freshwater_cost: f64,
    pub transport_cost: f64,
    pub flow_status: SolverStatus,
    pub flow_backend: String,
    pub flow_solve_time_ms: u128,
    pub free_variables: usize,
    pub pinned_variables: usize,
    pub rows: usize,
    pub presolved_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_status: Option<SolverStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_solve_time_ms: Option<u128>,
    pub violations: PlanViolations,
}

/// Every output table of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub transfers: Vec<TransferRow>,
    pub production: Vec<LocationRow>,
    pub demand: Vec<LocationRow>,
    pub storage: Vec<LocationRow>,
    /// Empty when composition was not tracked
    pub composition: Vec<LocationRow>,
    pub summary: PlanSummary,
}

impl Plan {
    pub fn report(&self) -> PlanReport {
        let network = self.network.as_ref();
        let flow = self.flow.as_ref();
        let quality = self.quality.as_ref();

        let summary = PlanSummary {
            objective: flow.objective,
            disposal_cost: flow.costs.total_disposal,
            freshwater_cost: flow.costs.total_freshwater,
            transport_cost: flow.costs.total_transport,
            flow_status: flow.status,
            flow_backend: flow.backend.to_string(),
            flow_solve_time_ms: flow.solve_time_ms,
            free_variables: flow.stats.free_variables,
            pinned_variables: flow.stats.pinned_variables,
            rows: flow.stats.rows,
            presolved_rows: flow.stats.presolved_rows,
            quality_status: quality.map(|q| q.status),
            quality_backend: quality.map(|q| q.backend.to_string()),
            quality_iterations: quality.map(|q| q.iterations),
            quality_solve_time_ms: quality.map(|q| q.solve_time_ms),
            violations: self.violations.clone(),
        };

        PlanReport {
            transfers: transfer_rows(network, &flow.flow),
            production: location_rows(network, &flow.production),
            demand: location_rows(network, &flow.demand),
            storage: location_rows(network, &flow.storage),
            composition: quality
                .map(|q| location_rows(network, &q.composition))
                .unwrap_or_default(),
            summary,
        }
    }
}

fn transfer_rows(network: &Network, flow: &PeriodTable) -> Vec<TransferRow> {
    let periods = network.periods();
    let mut rows = Vec::with_capacity(network.arc_count() * periods.len());
    for arc in network.arcs() {
        let origin = &network.location(arc.origin).name;
        let destination = &network.location(arc.destination).name;
        let mode = network.mode_name(arc.mode);
        for t in periods.iter() {
            rows.push(TransferRow {
                origin: origin.clone(),
                mode: mode.to_string(),
                destination: destination.clone(),
                period: periods.name(t).to_string(),
                value: flow.get(arc.id.value(), t),
            });
        }
    }
    rows
}

fn location_rows(network: &Network, table: &PeriodTable) -> Vec<LocationRow> {
    let periods = network.periods();
    let mut rows = Vec::with_capacity(network.location_count() * periods.len());
    for loc in network.locations() {
        for t in periods.iter() {
            rows.push(LocationRow {
                location: loc.name.clone(),
                period: periods.name(t).to_string(),
                value: table.get(loc.id.value(), t),
            });
        }
    }
    rows
}
