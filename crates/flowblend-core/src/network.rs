//! The immutable water network.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::builder::DemandModel;
use crate::diagnostics::{self, Diagnostics};
use crate::periods::TimePeriods;
use crate::{ArcId, Location, LocationId, LocationRole, ModeId};

/// A directed transport arc `(origin, mode, destination)` present in the topology.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportArc {
    pub id: ArcId,
    pub origin: LocationId,
    pub mode: ModeId,
    pub destination: LocationId,
    /// Maximum flow per period
    pub capacity: f64,
    /// Cost per unit of flow per unit of distance
    pub unit_cost: f64,
    pub distance: f64,
}

impl TransportArc {
    /// Cost of moving one unit of water along this arc.
    pub fn cost_per_unit(&self) -> f64 {
        self.unit_cost * self.distance
    }
}

/// Water logistics network: locations, transport arcs and the planning horizon.
///
/// Built once through [`NetworkBuilder`](crate::NetworkBuilder) and never mutated
/// afterwards. Node indices coincide with [`LocationId`] values and edge indices
/// with [`ArcId`] values.
#[derive(Debug, Clone)]
pub struct Network {
    pub graph: DiGraph<Location, TransportArc>,
    pub(crate) periods: TimePeriods,
    pub(crate) modes: Vec<String>,
    pub(crate) location_lookup: HashMap<String, LocationId>,
    pub(crate) demand_model: DemandModel,
}

impl Network {
    pub fn periods(&self) -> &TimePeriods {
        &self.periods
    }

    pub fn modes(&self) -> &[String] {
        &self.modes
    }

    pub fn mode_name(&self, mode: ModeId) -> &str {
        &self.modes[mode.value()]
    }

    pub fn demand_model(&self) -> DemandModel {
        self.demand_model
    }

    pub fn location_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.graph[NodeIndex::new(id.value())]
    }

    pub fn location_by_name(&self, name: &str) -> Option<&Location> {
        self.location_lookup
            .get(name)
            .map(|id| self.location(*id))
    }

    /// All locations in declaration order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.graph.node_weights()
    }

    pub fn locations_with_role(&self, role: LocationRole) -> impl Iterator<Item = &Location> {
        self.graph.node_weights().filter(move |loc| loc.role == role)
    }

    /// Production and completions pads.
    pub fn pads(&self) -> impl Iterator<Item = &Location> {
        self.graph.node_weights().filter(|loc| loc.role.is_pad())
    }

    pub fn arc(&self, id: ArcId) -> &TransportArc {
        &self.graph[EdgeIndex::new(id.value())]
    }

    /// All topology arcs in insertion order.
    pub fn arcs(&self) -> impl Iterator<Item = &TransportArc> {
        self.graph.edge_weights()
    }

    pub fn inbound(&self, id: LocationId) -> impl Iterator<Item = &TransportArc> {
        self.graph
            .edges_directed(NodeIndex::new(id.value()), Direction::Incoming)
            .map(|edge| edge.weight())
    }

    pub fn outbound(&self, id: LocationId) -> impl Iterator<Item = &TransportArc> {
        self.graph
            .edges_directed(NodeIndex::new(id.value()), Direction::Outgoing)
            .map(|edge| edge.weight())
    }

    /// Look up the arc for an `(origin, mode, destination)` triple.
    pub fn find_arc(
        &self,
        origin: LocationId,
        mode: ModeId,
        destination: LocationId,
    ) -> Option<&TransportArc> {
        self.graph
            .edges_connecting(
                NodeIndex::new(origin.value()),
                NodeIndex::new(destination.value()),
            )
            .map(|edge| edge.weight())
            .find(|arc| arc.mode == mode)
    }

    /// Human-readable `origin -[mode]-> destination` label.
    pub fn arc_label(&self, arc: &TransportArc) -> String {
        format!(
            "{} -[{}]-> {}",
            self.location(arc.origin).name,
            self.mode_name(arc.mode),
            self.location(arc.destination).name
        )
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            periods: self.periods.len(),
            ..NetworkStats::default()
        };

        for loc in self.graph.node_weights() {
            *stats.locations_by_role.entry(loc.role.to_string()).or_default() += 1;
            stats.total_known_production += loc.params.water_profile.iter().sum::<f64>();
            if !loc.role.has_free_demand() {
                stats.total_known_demand += loc.params.demand.iter().sum::<f64>();
            }
            if loc.role.has_free_production() {
                stats.total_freshwater_availability +=
                    loc.params.freshwater_availability.iter().sum::<f64>();
            }
            stats.total_storage_capacity += loc.params.storage_capacity;
        }

        for arc in self.graph.edge_weights() {
            *stats
                .arcs_by_mode
                .entry(self.mode_name(arc.mode).to_string())
                .or_default() += 1;
        }

        stats.locations = self.graph.node_count();
        stats.arcs = self.graph.edge_count();
        stats
    }

    /// Inspect the network for suspicious but valid input.
    pub fn diagnose(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        diagnostics::diagnose_into(self, &mut diag);
        diag
    }

    /// Number of outbound arcs per location, indexed by `LocationId`.
    pub fn out_degrees(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .map(|node| self.graph.edges(node).count())
            .collect()
    }
}

/// Aggregate counts and volumes over a network.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub locations: usize,
    pub arcs: usize,
    pub periods: usize,
    pub locations_by_role: BTreeMap<String, usize>,
    pub arcs_by_mode: BTreeMap<String, usize>,
    pub total_known_production: f64,
    pub total_known_demand: f64,
    pub total_freshwater_availability: f64,
    pub total_storage_capacity: f64,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} locations, {} arcs, {} periods, production {:.1}, demand {:.1}, freshwater {:.1}",
            self.locations,
            self.arcs,
            self.periods,
            self.total_known_production,
            self.total_known_demand,
            self.total_freshwater_availability
        )
    }
}
