//! Constraint families and which of them a phase activates.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A group of rows generated by one rule over its index tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    /// Production + inflow + carried storage = demand + outflow + storage
    MaterialBalance,
    /// Freshwater production <= availability
    FreshwaterAvailability,
    /// Arc flow <= arc capacity
    TransportCapacity,
    /// Storage <= storage capacity
    StorageCapacity,
    /// Final storage = initial storage for pads and storage sites
    StorageCycle,
    /// Mass balance of the blended attribute (bilinear in flow and composition)
    CompositionBalance,
}

impl ConstraintFamily {
    /// Families that are linear in the flow quantities.
    pub const FLOW: [ConstraintFamily; 5] = [
        ConstraintFamily::MaterialBalance,
        ConstraintFamily::FreshwaterAvailability,
        ConstraintFamily::TransportCapacity,
        ConstraintFamily::StorageCapacity,
        ConstraintFamily::StorageCycle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConstraintFamily::MaterialBalance => "balance",
            ConstraintFamily::FreshwaterAvailability => "freshwater",
            ConstraintFamily::TransportCapacity => "capacity",
            ConstraintFamily::StorageCapacity => "storage",
            ConstraintFamily::StorageCycle => "cycle",
            ConstraintFamily::CompositionBalance => "composition",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of constraint families a solve includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintActivation {
    active: BTreeSet<ConstraintFamily>,
}

impl ConstraintActivation {
    /// Phase 1: every flow family, composition balance deactivated.
    pub fn flow_phase() -> Self {
        Self {
            active: ConstraintFamily::FLOW.into_iter().collect(),
        }
    }

    /// Phase 2: flows are fixed, only the composition balance remains.
    pub fn quality_phase() -> Self {
        Self {
            active: BTreeSet::from([ConstraintFamily::CompositionBalance]),
        }
    }

    pub fn is_active(&self, family: ConstraintFamily) -> bool {
        self.active.contains(&family)
    }

    pub fn deactivate(&mut self, family: ConstraintFamily) -> &mut Self {
        self.active.remove(&family);
        self
    }

    pub fn activate(&mut self, family: ConstraintFamily) -> &mut Self {
        self.active.insert(family);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = ConstraintFamily> + '_ {
        self.active.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_partition_the_families() {
        let flow = ConstraintActivation::flow_phase();
        let quality = ConstraintActivation::quality_phase();
        assert!(!flow.is_active(ConstraintFamily::CompositionBalance));
        assert!(quality.is_active(ConstraintFamily::CompositionBalance));
        for family in ConstraintFamily::FLOW {
            assert!(flow.is_active(family));
            assert!(!quality.is_active(family));
        }
    }

    #[test]
    fn families_can_be_toggled() {
        let mut activation = ConstraintActivation::flow_phase();
        activation.deactivate(ConstraintFamily::StorageCycle);
        assert!(!activation.is_active(ConstraintFamily::StorageCycle));
        assert_eq!(activation.iter().count(), 4);
    }
}
