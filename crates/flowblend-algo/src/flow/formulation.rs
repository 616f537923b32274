//! LP formulation of the multi-period network flow.
//!
//! Every decision quantity is either a free LP variable or a pinned constant.
//! Pinned quantities (known production and demand, zero-capacity storage and
//! arcs, zero-availability freshwater, cycle-closing final storage) never become
//! solver variables; they are folded into the constant of every row that
//! mentions them. Each constraint family is a function that enumerates only the
//! index tuples it applies to, so absent arcs never appear in any sum.
//!
//! Rows left with no free term are evaluated immediately: satisfied rows are
//! dropped, violated rows make the model infeasible before any solver runs.

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use flowblend_core::{Location, LocationId, Network, PeriodId, TransportArc};

use crate::activation::{ConstraintActivation, ConstraintFamily};
use crate::config::FlowSolverConfig;
use crate::error::{PlanError, PlanResult};

/// Relative tolerance for rows evaluated at build time.
const PRESOLVE_TOLERANCE: f64 = 1e-9;

/// A decision quantity: LP variable or substituted constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    Free(Variable),
    Pinned(f64),
}

impl Quantity {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Quantity::Pinned(_))
    }
}

/// `Σ coef·var + constant`, with pinned quantities already folded in.
#[derive(Debug, Clone, Default)]
pub struct AffineRow {
    pub terms: Vec<(Variable, f64)>,
    pub constant: f64,
    /// Largest absolute constant contribution, used to scale presolve checks
    magnitude: f64,
}

impl AffineRow {
    pub fn add(&mut self, quantity: Quantity, coef: f64) {
        match quantity {
            Quantity::Free(var) => self.terms.push((var, coef)),
            Quantity::Pinned(value) => self.add_constant(coef * value),
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
        self.magnitude = self.magnitude.max(value.abs());
    }

    /// No free variable remains.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn to_expression(&self) -> Expression {
        let mut expr = Expression::from(self.constant);
        for (var, coef) in &self.terms {
            expr += *coef * *var;
        }
        expr
    }

    fn tolerance(&self) -> f64 {
        PRESOLVE_TOLERANCE * (1.0 + self.magnitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// `expr == 0`
    Equal,
    /// `expr <= 0`
    LessOrEqual,
}

/// One constraint of the flow model.
#[derive(Debug, Clone)]
pub struct FlowRow {
    pub family: ConstraintFamily,
    pub label: String,
    pub sense: RowSense,
    pub expr: AffineRow,
}

impl FlowRow {
    fn new(family: ConstraintFamily, label: String, sense: RowSense) -> Self {
        Self {
            family,
            label,
            sense,
            expr: AffineRow::default(),
        }
    }

    pub fn to_constraint(&self) -> Constraint {
        let expr = self.expr.to_expression();
        match self.sense {
            RowSense::Equal => constraint!(expr == 0.0),
            RowSense::LessOrEqual => constraint!(expr <= 0.0),
        }
    }

    /// For a constant row: does it hold?
    fn holds(&self) -> bool {
        let value = self.expr.constant;
        let tol = self.expr.tolerance();
        match self.sense {
            RowSense::Equal => value.abs() <= tol,
            RowSense::LessOrEqual => value <= tol,
        }
    }
}

/// Free/pinned assignment of every decision quantity.
#[derive(Debug, Clone)]
pub struct VariableMap {
    periods: usize,
    production: Vec<Quantity>,
    demand: Vec<Quantity>,
    storage: Vec<Quantity>,
    flow: Vec<Quantity>,
}

impl VariableMap {
    pub fn production(&self, loc: LocationId, t: PeriodId) -> Quantity {
        self.production[loc.value() * self.periods + t.value()]
    }

    pub fn demand(&self, loc: LocationId, t: PeriodId) -> Quantity {
        self.demand[loc.value() * self.periods + t.value()]
    }

    pub fn storage(&self, loc: LocationId, t: PeriodId) -> Quantity {
        self.storage[loc.value() * self.periods + t.value()]
    }

    pub fn flow(&self, arc: &TransportArc, t: PeriodId) -> Quantity {
        self.flow[arc.id.value() * self.periods + t.value()]
    }

    /// Storage carried into period `t`: initial storage at the first period.
    pub fn carried_storage(&self, loc: &Location, t: PeriodId) -> Quantity {
        if t.value() == 0 {
            Quantity::Pinned(loc.params.storage_init)
        } else {
            self.storage(loc.id, PeriodId::new(t.value() - 1))
        }
    }

    fn all(&self) -> impl Iterator<Item = &Quantity> {
        self.production
            .iter()
            .chain(&self.demand)
            .chain(&self.storage)
            .chain(&self.flow)
    }

    pub fn pinned_count(&self) -> usize {
        self.all().filter(|q| q.is_pinned()).count()
    }

    pub fn free_count(&self) -> usize {
        self.all().filter(|q| !q.is_pinned()).count()
    }
}

/// Size of a built formulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormulationStats {
    pub free_variables: usize,
    pub pinned_variables: usize,
    pub rows: usize,
    pub presolved_rows: usize,
    pub rows_by_family: BTreeMap<String, usize>,
}

/// A flow model ready to hand to an LP backend.
pub struct FlowFormulation {
    pub vars: ProblemVariables,
    pub map: VariableMap,
    pub rows: Vec<FlowRow>,
    pub objective: AffineRow,
    pub stats: FormulationStats,
}

/// Build the LP for `network` with the flow families in `activation`.
pub fn build(
    network: &Network,
    activation: &ConstraintActivation,
    config: &FlowSolverConfig,
) -> PlanResult<FlowFormulation> {
    let mut vars = ProblemVariables::new();
    let map = assign_quantities(network, activation, &mut vars);

    let mut rows = Vec::new();
    for family in ConstraintFamily::FLOW {
        if !activation.is_active(family) {
            continue;
        }
        let family_rows = match family {
            ConstraintFamily::MaterialBalance => material_balance(network, &map),
            ConstraintFamily::FreshwaterAvailability => freshwater_availability(network, &map),
            ConstraintFamily::TransportCapacity => transport_capacity(network, &map),
            ConstraintFamily::StorageCapacity => storage_capacity(network, &map),
            ConstraintFamily::StorageCycle => storage_cycle(network, &map),
            ConstraintFamily::CompositionBalance => Vec::new(),
        };
        rows.extend(family_rows);
    }

    let generated = rows.len();
    let rows = presolve(rows)?;
    let objective = cost_objective(network, &map, config.circulation_penalty);

    let mut rows_by_family = BTreeMap::new();
    for row in &rows {
        *rows_by_family.entry(row.family.to_string()).or_insert(0) += 1;
    }
    let stats = FormulationStats {
        free_variables: map.free_count(),
        pinned_variables: map.pinned_count(),
        rows: rows.len(),
        presolved_rows: generated - rows.len(),
        rows_by_family,
    };
    debug!(?stats, "flow formulation built");

    Ok(FlowFormulation {
        vars,
        map,
        rows,
        objective,
        stats,
    })
}

fn assign_quantities(
    network: &Network,
    activation: &ConstraintActivation,
    vars: &mut ProblemVariables,
) -> VariableMap {
    let periods = network.periods();
    let n_t = periods.len();
    let n_loc = network.location_count();
    let cycle_active = activation.is_active(ConstraintFamily::StorageCycle);

    let mut map = VariableMap {
        periods: n_t,
        production: Vec::with_capacity(n_loc * n_t),
        demand: Vec::with_capacity(n_loc * n_t),
        storage: Vec::with_capacity(n_loc * n_t),
        flow: Vec::with_capacity(network.arc_count() * n_t),
    };

    for loc in network.locations() {
        let params = &loc.params;
        for t in periods.iter() {
            let i = t.value();

            let production = if loc.role.has_free_production() {
                if params.freshwater_availability[i] > 0.0 {
                    Quantity::Free(vars.add(variable().min(0.0)))
                } else {
                    Quantity::Pinned(0.0)
                }
            } else {
                Quantity::Pinned(params.water_profile[i])
            };
            map.production.push(production);

            let demand = if loc.role.has_free_demand() {
                Quantity::Free(vars.add(variable().min(0.0)))
            } else {
                Quantity::Pinned(params.demand[i])
            };
            map.demand.push(demand);

            let storage = if params.storage_capacity <= 0.0 {
                Quantity::Pinned(0.0)
            } else if cycle_active && loc.role.requires_storage_cycle() && periods.is_last(t) {
                Quantity::Pinned(params.storage_init)
            } else {
                Quantity::Free(vars.add(variable().min(0.0)))
            };
            map.storage.push(storage);
        }
    }

    for arc in network.arcs() {
        for _ in 0..n_t {
            let flow = if arc.capacity <= 0.0 {
                Quantity::Pinned(0.0)
            } else {
                Quantity::Free(vars.add(variable().min(0.0)))
            };
            map.flow.push(flow);
        }
    }

    map
}

/// Production + inflow + carried storage - demand - outflow - storage = 0
/// at every location and period, including locations without arcs.
pub fn material_balance(network: &Network, map: &VariableMap) -> Vec<FlowRow> {
    let periods = network.periods();
    let mut rows = Vec::with_capacity(network.location_count() * periods.len());
    for loc in network.locations() {
        for t in periods.iter() {
            let mut row = FlowRow::new(
                ConstraintFamily::MaterialBalance,
                format!("balance[{},{}]", loc.name, periods.name(t)),
                RowSense::Equal,
            );
            row.expr.add(map.production(loc.id, t), 1.0);
            for arc in network.inbound(loc.id) {
                row.expr.add(map.flow(arc, t), 1.0);
            }
            row.expr.add(map.carried_storage(loc, t), 1.0);
            row.expr.add(map.demand(loc.id, t), -1.0);
            for arc in network.outbound(loc.id) {
                row.expr.add(map.flow(arc, t), -1.0);
            }
            row.expr.add(map.storage(loc.id, t), -1.0);
            rows.push(row);
        }
    }
    rows
}

/// Freshwater production <= availability at freshwater sources.
pub fn freshwater_availability(network: &Network, map: &VariableMap) -> Vec<FlowRow> {
    let periods = network.periods();
    let mut rows = Vec::new();
    for loc in network.locations().filter(|l| l.role.has_free_production()) {
        for t in periods.iter() {
            let mut row = FlowRow::new(
                ConstraintFamily::FreshwaterAvailability,
                format!("freshwater[{},{}]", loc.name, periods.name(t)),
                RowSense::LessOrEqual,
            );
            row.expr.add(map.production(loc.id, t), 1.0);
            row.expr
                .add_constant(-loc.params.freshwater_availability[t.value()]);
            rows.push(row);
        }
    }
    rows
}

/// Flow <= capacity on topology arcs only.
pub fn transport_capacity(network: &Network, map: &VariableMap) -> Vec<FlowRow> {
    let periods = network.periods();
    let mut rows = Vec::with_capacity(network.arc_count() * periods.len());
    for arc in network.arcs() {
        for t in periods.iter() {
            let mut row = FlowRow::new(
                ConstraintFamily::TransportCapacity,
                format!("capacity[{},{}]", network.arc_label(arc), periods.name(t)),
                RowSense::LessOrEqual,
            );
            row.expr.add(map.flow(arc, t), 1.0);
            row.expr.add_constant(-arc.capacity);
            rows.push(row);
        }
    }
    rows
}

/// Storage <= storage capacity.
pub fn storage_capacity(network: &Network, map: &VariableMap) -> Vec<FlowRow> {
    let periods = network.periods();
    let mut rows = Vec::new();
    for loc in network.locations() {
        for t in periods.iter() {
            let mut row = FlowRow::new(
                ConstraintFamily::StorageCapacity,
                format!("storage[{},{}]", loc.name, periods.name(t)),
                RowSense::LessOrEqual,
            );
            row.expr.add(map.storage(loc.id, t), 1.0);
            row.expr.add_constant(-loc.params.storage_capacity);
            rows.push(row);
        }
    }
    rows
}

/// Final storage = initial storage at pads and storage sites.
pub fn storage_cycle(network: &Network, map: &VariableMap) -> Vec<FlowRow> {
    let last = network.periods().last();
    network
        .locations()
        .filter(|l| l.role.requires_storage_cycle())
        .map(|loc| {
            let mut row = FlowRow::new(
                ConstraintFamily::StorageCycle,
                format!("cycle[{}]", loc.name),
                RowSense::Equal,
            );
            row.expr.add(map.storage(loc.id, last), 1.0);
            row.expr.add_constant(-loc.params.storage_init);
            row
        })
        .collect()
}

/// Evaluate constant rows: drop the satisfied ones, reject the first violated one.
fn presolve(rows: Vec<FlowRow>) -> PlanResult<Vec<FlowRow>> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if !row.expr.is_constant() {
            kept.push(row);
        } else if !row.holds() {
            let relation = match row.sense {
                RowSense::Equal => "= 0",
                RowSense::LessOrEqual => "<= 0",
            };
            return Err(PlanError::InfeasibleFlowModel {
                reason: format!(
                    "{} cannot hold with fixed values: {} {} is violated",
                    row.label, row.expr.constant, relation
                ),
            });
        }
    }
    Ok(kept)
}

/// Disposal + freshwater + transport cost, plus the circulation tie-breaker on free flows.
fn cost_objective(network: &Network, map: &VariableMap, circulation_penalty: f64) -> AffineRow {
    let periods = network.periods();
    let mut objective = AffineRow::default();

    for loc in network.locations() {
        let params = &loc.params;
        for t in periods.iter() {
            if loc.role.has_free_production() && params.freshwater_cost > 0.0 {
                objective.add(map.production(loc.id, t), params.freshwater_cost);
            }
            if loc.role.has_free_demand() && params.disposal_cost > 0.0 {
                for arc in network.inbound(loc.id) {
                    objective.add(map.flow(arc, t), params.disposal_cost);
                }
            }
        }
    }

    for arc in network.arcs() {
        let unit = arc.cost_per_unit() + circulation_penalty;
        if unit <= 0.0 {
            continue;
        }
        for t in periods.iter() {
            if let Quantity::Free(var) = map.flow(arc, t) {
                objective.terms.push((var, unit));
            }
        }
    }

    objective
}
