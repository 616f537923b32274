//! Dense `[entity][period]` value tables.

use flowblend_core::PeriodId;
use serde::Serialize;

/// Row-major table of one value per entity (location or arc) per period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTable {
    periods: usize,
    values: Vec<f64>,
}

impl PeriodTable {
    pub fn zeros(entities: usize, periods: usize) -> Self {
        Self {
            periods,
            values: vec![0.0; entities * periods],
        }
    }

    pub fn entities(&self) -> usize {
        if self.periods == 0 {
            0
        } else {
            self.values.len() / self.periods
        }
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    #[inline]
    pub fn get(&self, entity: usize, t: PeriodId) -> f64 {
        self.values[entity * self.periods + t.value()]
    }

    #[inline]
    pub fn set(&mut self, entity: usize, t: PeriodId, value: f64) {
        self.values[entity * self.periods + t.value()] = value;
    }

    /// All periods of one entity.
    pub fn row(&self, entity: usize) -> &[f64] {
        &self.values[entity * self.periods..(entity + 1) * self.periods]
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    pub(crate) fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn from_values(periods: usize, values: Vec<f64>) -> Self {
        Self { periods, values }
    }
}
