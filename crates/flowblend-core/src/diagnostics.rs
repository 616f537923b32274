//! Diagnostics for suspicious but valid network input.
//!
//! Build-time validation rejects input that cannot be planned at all. This module
//! collects the softer findings: parameters the model will ignore because of a
//! location's role, locations with demand but nowhere to receive water from, and
//! locations disconnected from everything else.
//!
//! # Example
//!
//! ```
//! use flowblend_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("topology", "Location has no arcs", "N07");
//! diag.add_error_with_entity("reachability", "Demand cannot be supplied", "CP01");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;
use serde::Serialize;

use crate::network::Network;
use crate::LocationRole;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Planning can proceed, but the input is probably not what was meant
    Warning,
    /// Planning will fail or produce a meaningless result
    Error,
}

/// A single diagnostic finding
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g., "ignored", "topology", "reachability")
    pub category: String,
    pub message: String,
    /// Location or arc the finding refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        Ok(())
    }
}

/// Collection of diagnostic issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn summary(&self) -> String {
        fn plural(n: usize, word: &str) -> String {
            format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
        }
        match (self.warning_count(), self.error_count()) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => plural(w, "warning"),
            (0, e) => plural(e, "error"),
            (w, e) => format!("{}, {}", plural(w, "warning"), plural(e, "error")),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Populate `diag` with findings about `network`.
pub fn diagnose_into(network: &Network, diag: &mut Diagnostics) {
    ignored_parameters(network, diag);
    isolated_locations(network, diag);
    unsupplied_demand(network, diag);
}

fn ignored_parameters(network: &Network, diag: &mut Diagnostics) {
    for loc in network.locations() {
        let params = &loc.params;
        if loc.role.has_free_production() && params.water_profile.iter().any(|v| *v > 0.0) {
            diag.add_warning_with_entity(
                "ignored",
                "WaterProfiles ignored: freshwater production is decided by the plan",
                &loc.name,
            );
        }
        if loc.role.has_free_demand() && params.demand.iter().any(|v| *v > 0.0) {
            diag.add_warning_with_entity(
                "ignored",
                "Demand ignored: disposal volume is decided by the plan",
                &loc.name,
            );
        }
        if !loc.role.has_free_production() {
            if params.freshwater_availability.iter().any(|v| *v > 0.0) {
                diag.add_warning_with_entity(
                    "ignored",
                    "FreshWaterAvailability only applies to freshwater sources",
                    &loc.name,
                );
            }
            if params.freshwater_cost > 0.0 {
                diag.add_warning_with_entity(
                    "ignored",
                    "FreshWaterCost only applies to freshwater sources",
                    &loc.name,
                );
            }
        }
        if params.storage_init > 0.0 && params.storage_capacity <= 0.0 {
            diag.add_warning_with_entity(
                "storage",
                "StorageInit is positive but StorageCapacity is zero",
                &loc.name,
            );
        }
    }
}

fn isolated_locations(network: &Network, diag: &mut Diagnostics) {
    for loc in network.locations() {
        if network.inbound(loc.id).next().is_none() && network.outbound(loc.id).next().is_none() {
            diag.add_warning_with_entity("topology", "Location has no arcs", &loc.name);
        }
    }
}

fn unsupplied_demand(network: &Network, diag: &mut Diagnostics) {
    // Every location from which water can originate: known production,
    // free production, or initial storage.
    let mut supplied = vec![false; network.location_count()];
    for loc in network.locations() {
        let params = &loc.params;
        let has_supply = loc.role.has_free_production()
            || params.water_profile.iter().any(|v| *v > 0.0)
            || params.storage_init > 0.0;
        if !has_supply {
            continue;
        }
        let mut bfs = Bfs::new(&network.graph, NodeIndex::new(loc.id.value()));
        while let Some(node) = bfs.next(&network.graph) {
            supplied[node.index()] = true;
        }
    }

    for loc in network.locations() {
        if loc.role.has_free_demand() || loc.role == LocationRole::FreshwaterSource {
            continue;
        }
        let total_demand: f64 = loc.params.demand.iter().sum();
        if total_demand <= 0.0 {
            continue;
        }
        if network.inbound(loc.id).next().is_none() && loc.params.storage_init <= 0.0 {
            diag.add_error_with_entity(
                "reachability",
                &format!("Demand of {:.1} but no inbound arcs", total_demand),
                &loc.name,
            );
        } else if !supplied[loc.id.value()] {
            diag.add_error_with_entity(
                "reachability",
                &format!("Demand of {:.1} unreachable from any supply", total_demand),
                &loc.name,
            );
        }
    }
}
