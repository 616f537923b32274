//! # flowblend-core: Water Logistics Network Model
//!
//! Provides the typed network model used by the allocation and blending solvers:
//! locations with roles, directed transport arcs, an ordered planning horizon and
//! the parameter tables attached to them.
//!
//! ## Design Philosophy
//!
//! Networks are modeled as **directed multigraphs** where:
//! - **Nodes**: Locations (pads, customers, sources, disposal, storage, junctions)
//! - **Edges**: Transport arcs `(origin, mode, destination)`
//!
//! Only arcs whose topology flag is set exist in the graph. Parallel arcs between
//! the same pair of locations are distinguished by their transport mode, each with
//! its own capacity, unit cost and distance. Because absent arcs have no edge, the
//! model grows with real connectivity rather than with the square of the number of
//! locations.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowblend_core::{LocationRole, NetworkBuilder};
//!
//! let mut builder = NetworkBuilder::new();
//! builder.periods(["T1"]).modes(["pipeline"]);
//! builder.location("F01", LocationRole::FreshwaterSource);
//! builder.location("K01", LocationRole::DisposalSite);
//! builder.connect("F01", "pipeline", "K01");
//! builder.transport_capacity("F01", "pipeline", "K01", 100.0);
//! builder.freshwater_availability("F01", "T1", 100.0);
//!
//! let network = builder.build().unwrap();
//! assert_eq!(network.location_count(), 2);
//! assert_eq!(network.arc_count(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`builder`] - Name-keyed construction and build-time validation
//! - [`network`] - The immutable [`Network`] and its queries
//! - [`periods`] - Ordered [`TimePeriods`]
//! - [`diagnostics`] - Warnings about suspicious but valid input
//! - [`graph_utils`] - Statistics, reachability and DOT export

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod network;
pub mod periods;

pub use builder::{DemandModel, NetworkBuilder, DEFAULT_TRANSPORT_DISTANCE};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{NetworkError, NetworkResult};
pub use graph_utils::*;
pub use network::{Network, TransportArc};
pub use periods::{PeriodId, TimePeriods};
pub use petgraph::graph::{EdgeIndex, NodeIndex};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcId(usize);

impl LocationId {
    #[inline]
    pub fn new(value: usize) -> Self {
        LocationId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl ModeId {
    #[inline]
    pub fn new(value: usize) -> Self {
        ModeId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl ArcId {
    #[inline]
    pub fn new(value: usize) -> Self {
        ArcId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

/// The role a location plays in the water network.
///
/// Roles decide which decisions are free: only freshwater sources choose their
/// production, only disposal sites choose how much they take in. Every other
/// location has its production and demand fixed by the input profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRole {
    Customer,
    ProductionPad,
    CompletionsPad,
    FreshwaterSource,
    DisposalSite,
    StorageSite,
    NetworkNode,
}

impl LocationRole {
    pub const ALL: [LocationRole; 7] = [
        LocationRole::Customer,
        LocationRole::ProductionPad,
        LocationRole::CompletionsPad,
        LocationRole::FreshwaterSource,
        LocationRole::DisposalSite,
        LocationRole::StorageSite,
        LocationRole::NetworkNode,
    ];

    /// Production or completions pad.
    pub fn is_pad(&self) -> bool {
        matches!(self, LocationRole::ProductionPad | LocationRole::CompletionsPad)
    }

    /// Production is a decision variable bounded by availability.
    pub fn has_free_production(&self) -> bool {
        matches!(self, LocationRole::FreshwaterSource)
    }

    /// Demand is a decision variable (the disposed volume).
    pub fn has_free_demand(&self) -> bool {
        matches!(self, LocationRole::DisposalSite)
    }

    /// Storage must return to its initial level at the end of the horizon.
    pub fn requires_storage_cycle(&self) -> bool {
        self.is_pad() || matches!(self, LocationRole::StorageSite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationRole::Customer => "customer",
            LocationRole::ProductionPad => "production_pad",
            LocationRole::CompletionsPad => "completions_pad",
            LocationRole::FreshwaterSource => "freshwater_source",
            LocationRole::DisposalSite => "disposal_site",
            LocationRole::StorageSite => "storage_site",
            LocationRole::NetworkNode => "network_node",
        }
    }
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "customer" | "customers" => Ok(LocationRole::Customer),
            "production_pad" | "productionpads" => Ok(LocationRole::ProductionPad),
            "completions_pad" | "completionspads" => Ok(LocationRole::CompletionsPad),
            "freshwater_source" | "freshwatersources" => Ok(LocationRole::FreshwaterSource),
            "disposal_site" | "swd" | "swdsites" => Ok(LocationRole::DisposalSite),
            "storage_site" | "storagesites" => Ok(LocationRole::StorageSite),
            "network_node" | "networknodes" => Ok(LocationRole::NetworkNode),
            _ => Err(format!("Unknown location role: {}", s)),
        }
    }
}

/// Per-location parameter tables.
///
/// Scalars apply to the whole horizon; vectors are indexed by
/// [`PeriodId::value`] and always have one entry per period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteParameters {
    /// Cost per unit of water received (disposal sites only)
    pub disposal_cost: f64,
    /// Cost per unit of water produced (freshwater sources)
    pub freshwater_cost: f64,
    /// Maximum storage level
    pub storage_capacity: f64,
    /// Storage level before the first period, and the cycle target after the last
    pub storage_init: f64,
    /// Composition of the initial storage
    pub storage_init_composition: f64,
    /// Freshwater available per period
    pub freshwater_availability: Vec<f64>,
    /// Known production profile per period
    pub water_profile: Vec<f64>,
    /// Total known demand per period
    pub demand: Vec<f64>,
    /// Completions share of `demand` (split demand model only)
    pub completions_demand: Vec<f64>,
    /// Composition of produced water per period
    pub production_composition: Vec<f64>,
}

impl SiteParameters {
    /// Zeroed tables sized for `periods` periods.
    pub fn zeroed(periods: usize) -> Self {
        Self {
            freshwater_availability: vec![0.0; periods],
            water_profile: vec![0.0; periods],
            demand: vec![0.0; periods],
            completions_demand: vec![0.0; periods],
            production_composition: vec![0.0; periods],
            ..Self::default()
        }
    }

    /// Customer share of the demand in period `t`.
    pub fn customer_demand(&self, t: PeriodId) -> f64 {
        self.demand[t.value()] - self.completions_demand[t.value()]
    }
}

/// A node of the network.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub role: LocationRole,
    pub params: SiteParameters,
}

impl Location {
    pub fn label(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_predicates() {
        assert!(LocationRole::ProductionPad.is_pad());
        assert!(LocationRole::CompletionsPad.requires_storage_cycle());
        assert!(LocationRole::StorageSite.requires_storage_cycle());
        assert!(!LocationRole::NetworkNode.requires_storage_cycle());
        assert!(LocationRole::FreshwaterSource.has_free_production());
        assert!(!LocationRole::ProductionPad.has_free_production());
        assert!(LocationRole::DisposalSite.has_free_demand());
        assert!(!LocationRole::Customer.has_free_demand());
    }

    #[test]
    fn role_parsing_accepts_table_names() {
        assert_eq!("SWDSites".parse::<LocationRole>(), Ok(LocationRole::DisposalSite));
        assert_eq!(
            "production-pad".parse::<LocationRole>(),
            Ok(LocationRole::ProductionPad)
        );
        assert!("reservoir".parse::<LocationRole>().is_err());
    }

    #[test]
    fn role_serde_roundtrip_uses_snake_case() {
        let json = serde_json::to_string(&LocationRole::FreshwaterSource).unwrap();
        assert_eq!(json, "\"freshwater_source\"");
    }

    #[test]
    fn customer_demand_is_the_remainder() {
        let mut params = SiteParameters::zeroed(2);
        params.demand[1] = 30.0;
        params.completions_demand[1] = 10.0;
        assert_eq!(params.customer_demand(PeriodId::new(1)), 20.0);
    }
}
