//! Ordered planning horizon.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{NetworkError, NetworkResult};

/// Position of a period inside the horizon (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(usize);

impl PeriodId {
    #[inline]
    pub fn new(value: usize) -> Self {
        PeriodId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

/// Ordered, finite, non-empty sequence of named time periods.
///
/// Material and composition balances chain across consecutive periods, so the
/// order given at construction is significant and never re-sorted.
#[derive(Debug, Clone)]
pub struct TimePeriods {
    names: Vec<String>,
    lookup: HashMap<String, PeriodId>,
}

impl TimePeriods {
    /// Build a horizon from period names in planning order.
    pub fn new<I, S>(names: I) -> NetworkResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(NetworkError::EmptyHorizon);
        }
        let mut lookup = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if lookup.insert(name.clone(), PeriodId(i)).is_some() {
                return Err(NetworkError::DuplicateName {
                    kind: "time period",
                    name: name.clone(),
                });
            }
        }
        Ok(Self { names, lookup })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn first(&self) -> PeriodId {
        PeriodId(0)
    }

    pub fn last(&self) -> PeriodId {
        PeriodId(self.names.len() - 1)
    }

    /// The period before `t`, or `None` at the start of the horizon.
    pub fn prev(&self, t: PeriodId) -> Option<PeriodId> {
        t.0.checked_sub(1).map(PeriodId)
    }

    pub fn is_first(&self, t: PeriodId) -> bool {
        t.0 == 0
    }

    pub fn is_last(&self, t: PeriodId) -> bool {
        t.0 + 1 == self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PeriodId> + '_ {
        (0..self.names.len()).map(PeriodId)
    }

    pub fn name(&self, t: PeriodId) -> &str {
        &self.names[t.0]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn lookup(&self, name: &str) -> Option<PeriodId> {
        self.lookup.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_navigation() {
        let horizon = TimePeriods::new(["T1", "T2", "T3"]).unwrap();
        assert_eq!(horizon.len(), 3);
        assert_eq!(horizon.first(), PeriodId::new(0));
        assert_eq!(horizon.last(), PeriodId::new(2));
        assert_eq!(horizon.prev(horizon.first()), None);
        assert_eq!(horizon.prev(PeriodId::new(2)), Some(PeriodId::new(1)));
        assert!(horizon.is_last(PeriodId::new(2)));
        assert_eq!(horizon.lookup("T2"), Some(PeriodId::new(1)));
        assert_eq!(horizon.name(PeriodId::new(0)), "T1");
    }

    #[test]
    fn single_period_is_first_and_last() {
        let horizon = TimePeriods::new(["only"]).unwrap();
        assert!(horizon.is_first(horizon.last()));
        assert!(horizon.is_last(horizon.first()));
    }

    #[test]
    fn rejects_empty_and_duplicate_horizons() {
        assert_eq!(
            TimePeriods::new(Vec::<String>::new()).unwrap_err(),
            NetworkError::EmptyHorizon
        );
        assert!(matches!(
            TimePeriods::new(["T1", "T1"]),
            Err(NetworkError::DuplicateName { .. })
        ));
    }
}
