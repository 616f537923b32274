//! Phase 1: capacitated multi-period network flow, solved as an LP.

mod circulation;
pub mod formulation;
pub mod solution;
pub mod solve;

pub use formulation::{FlowFormulation, FlowRow, FormulationStats, Quantity, RowSense, VariableMap};
pub use solution::{CostBreakdown, FlowSolution};
pub use solve::solve_flow;
