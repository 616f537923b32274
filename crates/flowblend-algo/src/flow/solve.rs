//! LP backends for the flow formulation.

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel, Variable,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use flowblend_core::Network;

use crate::activation::ConstraintActivation;
use crate::config::{FlowSolverConfig, LpBackend};
use crate::error::{PlanError, PlanResult, SolvePhase, SolverStatus};
use crate::flow::circulation::cancel_circulation;
use crate::flow::formulation::{self, FlowFormulation, FlowRow, Quantity, VariableMap};
use crate::flow::solution::{CostBreakdown, FlowSolution};
use crate::table::PeriodTable;

/// Solver values below this magnitude are reported as exactly zero. Sits just
/// above the interior-point feasibility noise.
const SNAP_TOLERANCE: f64 = 1e-7;

/// Build and solve the flow model for `network`.
///
/// Infeasibility, whether detected while building or reported by the LP
/// backend, is returned as [`PlanError::InfeasibleFlowModel`].
pub fn solve_flow(
    network: &Network,
    activation: &ConstraintActivation,
    config: &FlowSolverConfig,
) -> PlanResult<FlowSolution> {
    let start = Instant::now();
    let backend = config.backend;
    if !backend.is_available() {
        return Err(PlanError::Solver {
            phase: SolvePhase::Flow,
            status: SolverStatus::Error,
            message: format!("{} support was not compiled in", backend),
        });
    }

    let FlowFormulation {
        vars,
        map,
        rows,
        objective,
        stats,
    } = formulation::build(network, activation, config)?;
    info!(
        backend = %backend,
        free = stats.free_variables,
        pinned = stats.pinned_variables,
        rows = stats.rows,
        presolved = stats.presolved_rows,
        "solving flow allocation"
    );

    let values = if stats.free_variables == 0 {
        debug!("every quantity is pinned, skipping the LP solve");
        extract(network, &map, |_| 0.0)
    } else {
        let objective = objective.to_expression();
        // What is left of the phase budget, so the backend stops near the deadline.
        let budget = config.timeout();
        let limit = Limit {
            budget,
            seconds: budget.saturating_sub(start.elapsed()).as_secs_f64(),
        };
        let mut values = match backend {
            LpBackend::Clarabel => solve_clarabel(vars, objective, &rows, network, &map, limit)?,
            LpBackend::Highs => solve_highs(vars, objective, &rows, network, &map, limit)?,
        };
        let cycles = cancel_circulation(network, &mut values.flow, SNAP_TOLERANCE);
        if cycles > 0 {
            debug!(cycles, "cancelled circulating flow");
        }
        values
    };

    let costs = CostBreakdown::evaluate(network, &values.production, &values.flow);
    let objective = costs.total();
    let solve_time_ms = start.elapsed().as_millis();
    info!(objective, solve_time_ms, "flow allocation optimal");

    Ok(FlowSolution {
        production: values.production,
        demand: values.demand,
        storage: values.storage,
        flow: values.flow,
        costs,
        objective,
        status: SolverStatus::Optimal,
        backend,
        stats,
        solve_time_ms,
    })
}

/// Wall-clock limit handed to the LP backend.
#[derive(Debug, Clone, Copy)]
struct Limit {
    budget: Duration,
    /// What is left of `budget` once the model is built
    seconds: f64,
}

#[cfg(feature = "solver-clarabel")]
fn solve_clarabel(
    vars: ProblemVariables,
    objective: Expression,
    rows: &[FlowRow],
    network: &Network,
    map: &VariableMap,
    limit: Limit,
) -> PlanResult<FlowValues> {
    use good_lp::solvers::clarabel::clarabel;
    let mut model = vars.minimise(objective).using(clarabel);
    model.settings().time_limit(limit.seconds);
    run_model(model, rows, network, map, limit)
}

#[cfg(not(feature = "solver-clarabel"))]
fn solve_clarabel(
    _vars: ProblemVariables,
    _objective: Expression,
    _rows: &[FlowRow],
    _network: &Network,
    _map: &VariableMap,
    _limit: Limit,
) -> PlanResult<FlowValues> {
    Err(backend_missing(LpBackend::Clarabel))
}

#[cfg(feature = "solver-highs")]
fn solve_highs(
    vars: ProblemVariables,
    objective: Expression,
    rows: &[FlowRow],
    network: &Network,
    map: &VariableMap,
    limit: Limit,
) -> PlanResult<FlowValues> {
    use good_lp::solvers::highs::highs;
    use good_lp::WithTimeLimit;
    let model = vars
        .minimise(objective)
        .using(highs)
        .with_time_limit(limit.seconds);
    run_model(model, rows, network, map, limit)
}

#[cfg(not(feature = "solver-highs"))]
fn solve_highs(
    _vars: ProblemVariables,
    _objective: Expression,
    _rows: &[FlowRow],
    _network: &Network,
    _map: &VariableMap,
    _limit: Limit,
) -> PlanResult<FlowValues> {
    Err(backend_missing(LpBackend::Highs))
}

#[allow(dead_code)]
fn backend_missing(backend: LpBackend) -> PlanError {
    PlanError::Solver {
        phase: SolvePhase::Flow,
        status: SolverStatus::Error,
        message: format!("{} support was not compiled in", backend),
    }
}

fn run_model<M>(
    mut model: M,
    rows: &[FlowRow],
    network: &Network,
    map: &VariableMap,
    limit: Limit,
) -> PlanResult<FlowValues>
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in rows {
        model = model.with(row.to_constraint());
    }
    let solution = model
        .solve()
        .map_err(|err| resolution_error(err, limit.budget))?;
    if matches!(solution.status(), SolutionStatus::TimeLimit) {
        return Err(PlanError::SolverTimeout {
            phase: SolvePhase::Flow,
            budget: limit.budget,
        });
    }
    Ok(extract(network, map, |var| solution.value(var)))
}

fn resolution_error(err: ResolutionError, budget: Duration) -> PlanError {
    match err {
        ResolutionError::Other(message) if message.contains("Time limit") => {
            PlanError::SolverTimeout {
                phase: SolvePhase::Flow,
                budget,
            }
        }
        ResolutionError::Infeasible => PlanError::InfeasibleFlowModel {
            reason: "the LP solver proved the flow model infeasible".to_string(),
        },
        ResolutionError::Unbounded => PlanError::Solver {
            phase: SolvePhase::Flow,
            status: SolverStatus::Unbounded,
            message: "objective is unbounded below".to_string(),
        },
        other => PlanError::Solver {
            phase: SolvePhase::Flow,
            status: SolverStatus::Error,
            message: other.to_string(),
        },
    }
}

struct FlowValues {
    production: PeriodTable,
    demand: PeriodTable,
    storage: PeriodTable,
    flow: PeriodTable,
}

fn extract(network: &Network, map: &VariableMap, value: impl Fn(Variable) -> f64) -> FlowValues {
    let read = |q: Quantity| match q {
        Quantity::Pinned(v) => v,
        Quantity::Free(var) => {
            let v = value(var);
            if v.abs() < SNAP_TOLERANCE {
                0.0
            } else {
                v
            }
        }
    };

    let periods = network.periods();
    let n_t = periods.len();
    let n_loc = network.location_count();
    let mut out = FlowValues {
        production: PeriodTable::zeros(n_loc, n_t),
        demand: PeriodTable::zeros(n_loc, n_t),
        storage: PeriodTable::zeros(n_loc, n_t),
        flow: PeriodTable::zeros(network.arc_count(), n_t),
    };
    for loc in network.locations() {
        let i = loc.id.value();
        for t in periods.iter() {
            out.production.set(i, t, read(map.production(loc.id, t)));
            out.demand.set(i, t, read(map.demand(loc.id, t)));
            out.storage.set(i, t, read(map.storage(loc.id, t)));
        }
    }
    for arc in network.arcs() {
        for t in periods.iter() {
            out.flow.set(arc.id.value(), t, read(map.flow(arc, t)));
        }
    }
    out
}
