//! Case files: named sets plus keyed parameter tables.
//!
//! A case lists every location under the set that gives it its role and keys
//! every parameter value by explicit fields:
//!
//! ```toml
//! [sets]
//! time_periods = ["T1", "T2"]
//! transport_modes = ["pipeline"]
//! production_pads = ["PP01"]
//! swd_sites = ["K01"]
//!
//! [[parameters.topology]]
//! origin = "PP01"
//! mode = "pipeline"
//! destination = "K01"
//!
//! [[parameters.water_profiles]]
//! location = "PP01"
//! period = "T1"
//! value = 60.0
//! ```
//!
//! Reference and value checks happen in [`NetworkBuilder::build`], so a case
//! that parses can still be rejected by [`CaseFile::to_network`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use flowblend_core::builder::{ArcTable, SeriesTable, SiteTable};
use flowblend_core::{DemandModel, LocationRole, Network, NetworkBuilder};

use crate::error::{CaseError, CaseResult};
use crate::format::CaseFormat;

/// Case-level switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseOptions {
    /// Demand comes as `completions_demand` + `customers_demand` instead of `demand`
    pub split_demand: bool,
}

/// Named collections. Each location belongs to exactly one role set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseSets {
    pub time_periods: Vec<String>,
    pub transport_modes: Vec<String>,
    pub customers: Vec<String>,
    pub production_pads: Vec<String>,
    pub completions_pads: Vec<String>,
    pub freshwater_sources: Vec<String>,
    pub swd_sites: Vec<String>,
    pub storage_sites: Vec<String>,
    pub network_nodes: Vec<String>,
}

impl CaseSets {
    /// Locations in declaration order, grouped by role.
    pub fn locations(&self) -> impl Iterator<Item = (&str, LocationRole)> + '_ {
        [
            (&self.customers, LocationRole::Customer),
            (&self.production_pads, LocationRole::ProductionPad),
            (&self.completions_pads, LocationRole::CompletionsPad),
            (&self.freshwater_sources, LocationRole::FreshwaterSource),
            (&self.swd_sites, LocationRole::DisposalSite),
            (&self.storage_sites, LocationRole::StorageSite),
            (&self.network_nodes, LocationRole::NetworkNode),
        ]
        .into_iter()
        .flat_map(|(names, role)| names.iter().map(move |name| (name.as_str(), role)))
    }
}

/// One topology row. `value` is the connectivity flag (1 when omitted); a
/// zero flag declares the arc absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArcEntry {
    pub origin: String,
    pub mode: String,
    pub destination: String,
    #[serde(default = "connected")]
    pub value: f64,
}

fn connected() -> f64 {
    1.0
}

impl ArcEntry {
    pub fn is_connected(&self) -> bool {
        self.value != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArcValue {
    pub origin: String,
    pub mode: String,
    pub destination: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteValue {
    pub location: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesValue {
    pub location: String,
    pub period: String,
    pub value: f64,
}

/// Parameter tables. Missing tables are empty; missing entries default to zero
/// (transport distances to `DEFAULT_TRANSPORT_DISTANCE`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseParameters {
    pub topology: Vec<ArcEntry>,
    pub transport_capacity: Vec<ArcValue>,
    pub transport_cost: Vec<ArcValue>,
    pub transport_distances: Vec<ArcValue>,
    pub disposal_cost: Vec<SiteValue>,
    pub freshwater_cost: Vec<SiteValue>,
    pub storage_capacity: Vec<SiteValue>,
    pub storage_init: Vec<SiteValue>,
    pub storage_init_comp: Vec<SiteValue>,
    pub freshwater_availability: Vec<SeriesValue>,
    pub water_profiles: Vec<SeriesValue>,
    pub demand: Vec<SeriesValue>,
    pub completions_demand: Vec<SeriesValue>,
    pub customers_demand: Vec<SeriesValue>,
    pub prod_comp: Vec<SeriesValue>,
}

/// A complete planning case as stored on disk. Unknown sections, tables and
/// fields are rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseFile {
    #[serde(default)]
    pub options: CaseOptions,
    pub sets: CaseSets,
    #[serde(default)]
    pub parameters: CaseParameters,
}

impl CaseFile {
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve names and validate values into a [`Network`].
    pub fn to_network(&self) -> CaseResult<Network> {
        let sets = &self.sets;
        let params = &self.parameters;
        let mut b = NetworkBuilder::new();

        b.periods(&sets.time_periods).modes(&sets.transport_modes);
        if self.options.split_demand {
            b.demand_model(DemandModel::Split);
        }
        for (name, role) in sets.locations() {
            b.location(name, role);
        }
        for arc in params.topology.iter().filter(|arc| arc.is_connected()) {
            b.connect(&arc.origin, &arc.mode, &arc.destination);
        }

        let arc_tables = [
            (ArcTable::TransportCapacity, &params.transport_capacity),
            (ArcTable::TransportCost, &params.transport_cost),
            (ArcTable::TransportDistances, &params.transport_distances),
        ];
        for (table, entries) in arc_tables {
            for e in entries {
                b.arc_value(table, &e.origin, &e.mode, &e.destination, e.value);
            }
        }

        let site_tables = [
            (SiteTable::DisposalCost, &params.disposal_cost),
            (SiteTable::FreshwaterCost, &params.freshwater_cost),
            (SiteTable::StorageCapacity, &params.storage_capacity),
            (SiteTable::StorageInit, &params.storage_init),
            (SiteTable::StorageInitComp, &params.storage_init_comp),
        ];
        for (table, entries) in site_tables {
            for e in entries {
                b.site_value(table, &e.location, e.value);
            }
        }

        let series_tables = [
            (SeriesTable::FreshwaterAvailability, &params.freshwater_availability),
            (SeriesTable::WaterProfiles, &params.water_profiles),
            (SeriesTable::Demand, &params.demand),
            (SeriesTable::CompletionsDemand, &params.completions_demand),
            (SeriesTable::CustomersDemand, &params.customers_demand),
            (SeriesTable::ProdComp, &params.prod_comp),
        ];
        for (table, entries) in series_tables {
            for e in entries {
                b.series_value(table, &e.location, &e.period, e.value);
            }
        }

        Ok(b.build()?)
    }
}

/// Read a case file, choosing the decoder by extension.
pub fn read_case(path: impl AsRef<Path>) -> CaseResult<CaseFile> {
    let path = path.as_ref();
    let format = CaseFormat::detect(path).ok_or_else(|| CaseError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let content = fs::read_to_string(path).map_err(|e| CaseError::io(path, e))?;
    debug!(path = %path.display(), format = format.friendly_name(), "reading case");

    let case = match format {
        CaseFormat::Json => CaseFile::from_json_str(&content).map_err(|source| CaseError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        CaseFormat::Toml => CaseFile::from_toml_str(&content).map_err(|source| CaseError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
    };
    Ok(case)
}

/// Read a case file and build its network.
pub fn load_network(path: impl AsRef<Path>) -> CaseResult<Network> {
    let path = path.as_ref();
    let network = read_case(path)?.to_network()?;
    info!(
        path = %path.display(),
        locations = network.location_count(),
        arcs = network.arc_count(),
        periods = network.periods().len(),
        "loaded case"
    );
    Ok(network)
}
