//! Name-keyed network construction.
//!
//! Input tables refer to locations, modes and periods by name. The builder
//! records entries as given and resolves them all in [`NetworkBuilder::build`],
//! which is the single place where references and values are validated.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{NetworkError, NetworkResult};
use crate::network::{Network, TransportArc};
use crate::periods::{PeriodId, TimePeriods};
use crate::{ArcId, Location, LocationId, LocationRole, ModeId, SiteParameters};

/// Distance assumed for arcs without a `TransportDistances` entry.
pub const DEFAULT_TRANSPORT_DISTANCE: f64 = 99999.0;

/// How demand is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandModel {
    /// A single `Demand` table
    #[default]
    Merged,
    /// `CompletionsDemand` and `CustomersDemand`, summed per location and period
    Split,
}

impl DemandModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandModel::Merged => "merged",
            DemandModel::Split => "split",
        }
    }
}

impl fmt::Display for DemandModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-arc parameter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcTable {
    TransportCapacity,
    TransportCost,
    TransportDistances,
}

impl ArcTable {
    pub fn name(&self) -> &'static str {
        match self {
            ArcTable::TransportCapacity => "TransportCapacity",
            ArcTable::TransportCost => "TransportCost",
            ArcTable::TransportDistances => "TransportDistances",
        }
    }
}

/// Per-location scalar tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteTable {
    DisposalCost,
    FreshwaterCost,
    StorageCapacity,
    StorageInit,
    StorageInitComp,
}

impl SiteTable {
    pub fn name(&self) -> &'static str {
        match self {
            SiteTable::DisposalCost => "DisposalCost",
            SiteTable::FreshwaterCost => "FreshWaterCost",
            SiteTable::StorageCapacity => "StorageCapacity",
            SiteTable::StorageInit => "StorageInit",
            SiteTable::StorageInitComp => "StorageInitComp",
        }
    }
}

/// Per-location, per-period tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesTable {
    FreshwaterAvailability,
    WaterProfiles,
    Demand,
    CompletionsDemand,
    CustomersDemand,
    ProdComp,
}

impl SeriesTable {
    pub fn name(&self) -> &'static str {
        match self {
            SeriesTable::FreshwaterAvailability => "FreshWaterAvailability",
            SeriesTable::WaterProfiles => "WaterProfiles",
            SeriesTable::Demand => "Demand",
            SeriesTable::CompletionsDemand => "CompletionsDemand",
            SeriesTable::CustomersDemand => "CustomersDemand",
            SeriesTable::ProdComp => "ProdComp",
        }
    }
}

#[derive(Debug, Clone)]
struct ArcKey {
    origin: String,
    mode: String,
    destination: String,
}

impl ArcKey {
    fn new(origin: &str, mode: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            mode: mode.to_string(),
            destination: destination.to_string(),
        }
    }
}

impl fmt::Display for ArcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.origin, self.mode, self.destination)
    }
}

/// Collects network tables by name and validates them into a [`Network`].
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    periods: Vec<String>,
    modes: Vec<String>,
    locations: Vec<(String, LocationRole)>,
    topology: Vec<ArcKey>,
    arc_values: Vec<(ArcTable, ArcKey, f64)>,
    site_values: Vec<(SiteTable, String, f64)>,
    series_values: Vec<(SeriesTable, String, String, f64)>,
    demand_model: DemandModel,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the planning horizon, in order.
    pub fn periods<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.periods = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn modes<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn demand_model(&mut self, model: DemandModel) -> &mut Self {
        self.demand_model = model;
        self
    }

    /// Declare a location. Names must be unique across all roles.
    pub fn location(&mut self, name: &str, role: LocationRole) -> &mut Self {
        self.locations.push((name.to_string(), role));
        self
    }

    /// Set the topology flag for `(origin, mode, destination)`.
    pub fn connect(&mut self, origin: &str, mode: &str, destination: &str) -> &mut Self {
        self.topology.push(ArcKey::new(origin, mode, destination));
        self
    }

    pub fn arc_value(
        &mut self,
        table: ArcTable,
        origin: &str,
        mode: &str,
        destination: &str,
        value: f64,
    ) -> &mut Self {
        self.arc_values
            .push((table, ArcKey::new(origin, mode, destination), value));
        self
    }

    pub fn site_value(&mut self, table: SiteTable, location: &str, value: f64) -> &mut Self {
        self.site_values.push((table, location.to_string(), value));
        self
    }

    pub fn series_value(
        &mut self,
        table: SeriesTable,
        location: &str,
        period: &str,
        value: f64,
    ) -> &mut Self {
        self.series_values
            .push((table, location.to_string(), period.to_string(), value));
        self
    }

    pub fn transport_capacity(&mut self, o: &str, m: &str, d: &str, value: f64) -> &mut Self {
        self.arc_value(ArcTable::TransportCapacity, o, m, d, value)
    }

    pub fn transport_cost(&mut self, o: &str, m: &str, d: &str, value: f64) -> &mut Self {
        self.arc_value(ArcTable::TransportCost, o, m, d, value)
    }

    pub fn transport_distance(&mut self, o: &str, m: &str, d: &str, value: f64) -> &mut Self {
        self.arc_value(ArcTable::TransportDistances, o, m, d, value)
    }

    pub fn disposal_cost(&mut self, location: &str, value: f64) -> &mut Self {
        self.site_value(SiteTable::DisposalCost, location, value)
    }

    pub fn freshwater_cost(&mut self, location: &str, value: f64) -> &mut Self {
        self.site_value(SiteTable::FreshwaterCost, location, value)
    }

    pub fn storage_capacity(&mut self, location: &str, value: f64) -> &mut Self {
        self.site_value(SiteTable::StorageCapacity, location, value)
    }

    pub fn storage_init(&mut self, location: &str, value: f64) -> &mut Self {
        self.site_value(SiteTable::StorageInit, location, value)
    }

    pub fn storage_init_composition(&mut self, location: &str, value: f64) -> &mut Self {
        self.site_value(SiteTable::StorageInitComp, location, value)
    }

    pub fn freshwater_availability(&mut self, location: &str, period: &str, value: f64) -> &mut Self {
        self.series_value(SeriesTable::FreshwaterAvailability, location, period, value)
    }

    pub fn water_profile(&mut self, location: &str, period: &str, value: f64) -> &mut Self {
        self.series_value(SeriesTable::WaterProfiles, location, period, value)
    }

    pub fn demand(&mut self, location: &str, period: &str, value: f64) -> &mut Self {
        self.series_value(SeriesTable::Demand, location, period, value)
    }

    pub fn completions_demand(&mut self, location: &str, period: &str, value: f64) -> &mut Self {
        self.series_value(SeriesTable::CompletionsDemand, location, period, value)
    }

    pub fn customers_demand(&mut self, location: &str, period: &str, value: f64) -> &mut Self {
        self.series_value(SeriesTable::CustomersDemand, location, period, value)
    }

    pub fn production_composition(&mut self, location: &str, period: &str, value: f64) -> &mut Self {
        self.series_value(SeriesTable::ProdComp, location, period, value)
    }

    /// Resolve every name and validate every value.
    pub fn build(&self) -> NetworkResult<Network> {
        let periods = TimePeriods::new(self.periods.iter().cloned())?;

        let mut mode_lookup: HashMap<&str, ModeId> = HashMap::with_capacity(self.modes.len());
        for (i, mode) in self.modes.iter().enumerate() {
            if mode_lookup.insert(mode.as_str(), ModeId::new(i)).is_some() {
                return Err(NetworkError::DuplicateName {
                    kind: "transport mode",
                    name: mode.clone(),
                });
            }
        }

        let mut graph: DiGraph<Location, TransportArc> = DiGraph::new();
        let mut location_lookup: HashMap<String, LocationId> = HashMap::new();
        for (name, role) in &self.locations {
            if location_lookup.contains_key(name) {
                return Err(NetworkError::DuplicateLocation { name: name.clone() });
            }
            let id = LocationId::new(graph.node_count());
            graph.add_node(Location {
                id,
                name: name.clone(),
                role: *role,
                params: SiteParameters::zeroed(periods.len()),
            });
            location_lookup.insert(name.clone(), id);
        }

        let resolve_location = |table: &str, name: &str| -> NetworkResult<LocationId> {
            location_lookup
                .get(name)
                .copied()
                .ok_or_else(|| NetworkError::UnknownLocation {
                    table: table.to_string(),
                    name: name.to_string(),
                })
        };
        let resolve_mode = |table: &str, name: &str| -> NetworkResult<ModeId> {
            mode_lookup
                .get(name)
                .copied()
                .ok_or_else(|| NetworkError::UnknownMode {
                    table: table.to_string(),
                    name: name.to_string(),
                })
        };
        let resolve_period = |table: &str, name: &str| -> NetworkResult<PeriodId> {
            periods
                .lookup(name)
                .ok_or_else(|| NetworkError::UnknownPeriod {
                    table: table.to_string(),
                    name: name.to_string(),
                })
        };

        // Topology: repeated flags for the same triple describe one arc.
        let mut arc_lookup: HashMap<(LocationId, ModeId, LocationId), ArcId> = HashMap::new();
        for key in &self.topology {
            let origin = resolve_location("Topology", &key.origin)?;
            let mode = resolve_mode("Topology", &key.mode)?;
            let destination = resolve_location("Topology", &key.destination)?;
            if arc_lookup.contains_key(&(origin, mode, destination)) {
                continue;
            }
            let id = ArcId::new(graph.edge_count());
            graph.add_edge(
                NodeIndex::new(origin.value()),
                NodeIndex::new(destination.value()),
                TransportArc {
                    id,
                    origin,
                    mode,
                    destination,
                    capacity: 0.0,
                    unit_cost: 0.0,
                    distance: DEFAULT_TRANSPORT_DISTANCE,
                },
            );
            arc_lookup.insert((origin, mode, destination), id);
        }

        for (table, key, value) in &self.arc_values {
            let table_name = table.name();
            let origin = resolve_location(table_name, &key.origin)?;
            let mode = resolve_mode(table_name, &key.mode)?;
            let destination = resolve_location(table_name, &key.destination)?;
            let id = arc_lookup.get(&(origin, mode, destination)).ok_or_else(|| {
                NetworkError::InvalidTopologyReference {
                    table: table_name.to_string(),
                    origin: key.origin.clone(),
                    mode: key.mode.clone(),
                    destination: key.destination.clone(),
                }
            })?;
            check_value(table_name, &key.to_string(), *value)?;
            let arc = &mut graph[petgraph::graph::EdgeIndex::new(id.value())];
            match table {
                ArcTable::TransportCapacity => arc.capacity = *value,
                ArcTable::TransportCost => arc.unit_cost = *value,
                ArcTable::TransportDistances => arc.distance = *value,
            }
        }

        for (table, name, value) in &self.site_values {
            let table_name = table.name();
            let id = resolve_location(table_name, name)?;
            check_value(table_name, name, *value)?;
            let location = &mut graph[NodeIndex::new(id.value())];
            let params = &mut location.params;
            match table {
                SiteTable::DisposalCost => {
                    if location.role != LocationRole::DisposalSite {
                        return Err(NetworkError::RoleMismatch {
                            table: table_name.to_string(),
                            name: name.clone(),
                            role: location.role.to_string(),
                            expected: LocationRole::DisposalSite.to_string(),
                        });
                    }
                    params.disposal_cost = *value;
                }
                SiteTable::FreshwaterCost => params.freshwater_cost = *value,
                SiteTable::StorageCapacity => params.storage_capacity = *value,
                SiteTable::StorageInit => params.storage_init = *value,
                SiteTable::StorageInitComp => params.storage_init_composition = *value,
            }
        }

        for (table, name, period, value) in &self.series_values {
            let table_name = table.name();
            self.check_demand_model(*table)?;
            let id = resolve_location(table_name, name)?;
            let t = resolve_period(table_name, period)?.value();
            check_value(table_name, &format!("{},{}", name, period), *value)?;
            let params = &mut graph[NodeIndex::new(id.value())].params;
            match table {
                SeriesTable::FreshwaterAvailability => params.freshwater_availability[t] = *value,
                SeriesTable::WaterProfiles => params.water_profile[t] = *value,
                SeriesTable::Demand => params.demand[t] = *value,
                SeriesTable::CompletionsDemand => {
                    params.completions_demand[t] = *value;
                    params.demand[t] += *value;
                }
                SeriesTable::CustomersDemand => params.demand[t] += *value,
                SeriesTable::ProdComp => params.production_composition[t] = *value,
            }
        }

        Ok(Network {
            graph,
            periods,
            modes: self.modes.clone(),
            location_lookup,
            demand_model: self.demand_model,
        })
    }

    fn check_demand_model(&self, table: SeriesTable) -> NetworkResult<()> {
        let allowed = match table {
            SeriesTable::Demand => self.demand_model == DemandModel::Merged,
            SeriesTable::CompletionsDemand | SeriesTable::CustomersDemand => {
                self.demand_model == DemandModel::Split
            }
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(NetworkError::DemandModelMismatch {
                table: table.name().to_string(),
                model: self.demand_model.as_str(),
            })
        }
    }
}

fn check_value(table: &str, key: &str, value: f64) -> NetworkResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(NetworkError::InvalidParameter {
            table: table.to_string(),
            key: key.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_distance_defaults_to_sentinel() {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["pipeline"]);
        b.location("A", LocationRole::NetworkNode);
        b.location("B", LocationRole::NetworkNode);
        b.connect("A", "pipeline", "B");
        let net = b.build().unwrap();
        let arc = net.arcs().next().unwrap();
        assert_eq!(arc.distance, DEFAULT_TRANSPORT_DISTANCE);
        assert_eq!(arc.capacity, 0.0);
    }

    #[test]
    fn repeated_topology_flag_is_one_arc() {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["pipeline"]);
        b.location("A", LocationRole::NetworkNode);
        b.location("B", LocationRole::NetworkNode);
        b.connect("A", "pipeline", "B").connect("A", "pipeline", "B");
        assert_eq!(b.build().unwrap().arc_count(), 1);
    }

    #[test]
    fn split_demand_is_summed() {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["truck"]).demand_model(DemandModel::Split);
        b.location("CP01", LocationRole::CompletionsPad);
        b.completions_demand("CP01", "T1", 30.0);
        b.customers_demand("CP01", "T1", 12.5);
        let net = b.build().unwrap();
        let params = &net.location_by_name("CP01").unwrap().params;
        assert_eq!(params.demand[0], 42.5);
        assert_eq!(params.completions_demand[0], 30.0);
        assert_eq!(params.customer_demand(PeriodId::new(0)), 12.5);
    }

    #[test]
    fn demand_table_must_match_model() {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["truck"]);
        b.location("CP01", LocationRole::CompletionsPad);
        b.completions_demand("CP01", "T1", 30.0);
        assert_eq!(
            b.build().unwrap_err(),
            NetworkError::DemandModelMismatch {
                table: "CompletionsDemand".into(),
                model: "merged",
            }
        );
    }

    #[test]
    fn negative_value_names_table_and_key() {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["truck"]);
        b.location("S01", LocationRole::StorageSite);
        b.storage_capacity("S01", -1.0);
        match b.build().unwrap_err() {
            NetworkError::InvalidParameter { table, key, value } => {
                assert_eq!(table, "StorageCapacity");
                assert_eq!(key, "S01");
                assert_eq!(value, -1.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nan_is_rejected() {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["truck"]);
        b.location("PP01", LocationRole::ProductionPad);
        b.water_profile("PP01", "T1", f64::NAN);
        assert!(matches!(
            b.build(),
            Err(NetworkError::InvalidParameter { .. })
        ));
    }
}
