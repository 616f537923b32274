//! Solver configuration.
//!
//! [`PlanConfig`] is an explicit value handed to the [`Planner`](crate::Planner).
//! Every section defaults independently, so a partial TOML file only overrides
//! what it names:
//!
//! ```toml
//! [flow]
//! backend = "clarabel"
//! timeout_seconds = 60.0
//!
//! [quality]
//! backend = "direct"
//! tolerance = 1e-8
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// LP backend for the allocation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LpBackend {
    /// Clarabel interior-point solver (pure Rust).
    #[default]
    Clarabel,
    /// HiGHS dual simplex (requires the `solver-highs` feature).
    Highs,
}

impl LpBackend {
    pub fn display_name(&self) -> &'static str {
        match self {
            LpBackend::Clarabel => "Clarabel",
            LpBackend::Highs => "HiGHS",
        }
    }

    /// Whether this backend was compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            LpBackend::Clarabel => cfg!(feature = "solver-clarabel"),
            LpBackend::Highs => cfg!(feature = "solver-highs"),
        }
    }
}

impl fmt::Display for LpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LpBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(LpBackend::Clarabel),
            "highs" => Ok(LpBackend::Highs),
            _ => Err(format!("Unknown LP backend: {}. Valid options: clarabel, highs", s)),
        }
    }
}

/// Backend for the composition balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBackend {
    /// Squared-residual minimization with an exterior non-negativity penalty (L-BFGS).
    #[default]
    PenaltyLbfgs,
    /// Dense LU factorization of the assembled linear system.
    Direct,
}

impl QualityBackend {
    pub fn display_name(&self) -> &'static str {
        match self {
            QualityBackend::PenaltyLbfgs => "penalty L-BFGS",
            QualityBackend::Direct => "direct LU",
        }
    }
}

impl fmt::Display for QualityBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for QualityBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "penalty-lbfgs" | "lbfgs" | "penalty" => Ok(QualityBackend::PenaltyLbfgs),
            "direct" | "lu" => Ok(QualityBackend::Direct),
            _ => Err(format!(
                "Unknown quality backend: {}. Valid options: penalty-lbfgs, direct",
                s
            )),
        }
    }
}

/// Allocation phase settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSolverConfig {
    pub backend: LpBackend,
    /// Wall-clock budget in seconds
    pub timeout_seconds: f64,
    /// Tie-breaking cost per unit of free flow. Keeps zero-cost arcs from
    /// carrying circulating water in interior-point solutions.
    pub circulation_penalty: f64,
}

impl Default for FlowSolverConfig {
    fn default() -> Self {
        Self {
            backend: LpBackend::default(),
            timeout_seconds: 300.0,
            circulation_penalty: 1e-6,
        }
    }
}

impl FlowSolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }
}

/// Blending phase settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySolverConfig {
    pub backend: QualityBackend,
    /// Wall-clock budget in seconds
    pub timeout_seconds: f64,
    /// Total L-BFGS iterations, split across penalty rounds
    pub max_iterations: usize,
    /// Relative tolerance on the normalized balance residual
    pub tolerance: f64,
    /// Starting value for every composition unknown
    pub composition_seed: f64,
}

impl Default for QualitySolverConfig {
    fn default() -> Self {
        Self {
            backend: QualityBackend::default(),
            timeout_seconds: 300.0,
            max_iterations: 2000,
            tolerance: 1e-6,
            composition_seed: 50_000.0,
        }
    }
}

impl QualitySolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }
}

/// Plan-level switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Run the blending phase after allocation
    pub track_composition: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            track_composition: true,
        }
    }
}

/// Complete planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub flow: FlowSolverConfig,
    pub quality: QualitySolverConfig,
    pub plan: PlanOptions,
}

/// A setting outside its valid range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field} must be {requirement}, got {value}")]
pub struct ConfigError {
    pub field: &'static str,
    pub requirement: &'static str,
    pub value: f64,
}

impl PlanConfig {
    /// Reject budgets and tolerances a solve could not honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("flow.timeout_seconds", self.flow.timeout_seconds),
            ("quality.timeout_seconds", self.quality.timeout_seconds),
            ("quality.tolerance", self.quality.tolerance),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError {
                    field,
                    requirement: "a positive finite number",
                    value,
                });
            }
        }
        if !(self.flow.circulation_penalty.is_finite() && self.flow.circulation_penalty >= 0.0) {
            return Err(ConfigError {
                field: "flow.circulation_penalty",
                requirement: "non-negative",
                value: self.flow.circulation_penalty,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlanConfig::default();
        assert_eq!(config.flow.backend, LpBackend::Clarabel);
        assert_eq!(config.quality.backend, QualityBackend::PenaltyLbfgs);
        assert_eq!(config.quality.composition_seed, 50_000.0);
        assert_eq!(config.quality.tolerance, 1e-6);
        assert!(config.plan.track_composition);
        assert_eq!(config.flow.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: PlanConfig = toml::from_str(
            r#"
            [quality]
            backend = "direct"
            max_iterations = 50

            [plan]
            track_composition = false
            "#,
        )
        .unwrap();
        assert_eq!(config.quality.backend, QualityBackend::Direct);
        assert_eq!(config.quality.max_iterations, 50);
        assert_eq!(config.quality.tolerance, 1e-6);
        assert_eq!(config.flow, FlowSolverConfig::default());
        assert!(!config.plan.track_composition);
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("HiGHS".parse::<LpBackend>(), Ok(LpBackend::Highs));
        assert_eq!(
            "penalty_lbfgs".parse::<QualityBackend>(),
            Ok(QualityBackend::PenaltyLbfgs)
        );
        assert_eq!("lu".parse::<QualityBackend>(), Ok(QualityBackend::Direct));
        assert!("gurobi".parse::<LpBackend>().is_err());
    }

    #[test]
    fn defaults_validate() {
        assert_eq!(PlanConfig::default().validate(), Ok(()));
    }

    #[test]
    fn non_positive_timeout_is_rejected() {
        let config: PlanConfig = toml::from_str("[quality]\ntimeout_seconds = -5.0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "quality.timeout_seconds");
        assert!(err.to_string().contains("-5"));

        let mut config = PlanConfig::default();
        config.flow.timeout_seconds = 0.0;
        assert_eq!(config.validate().unwrap_err().field, "flow.timeout_seconds");
    }

    #[test]
    fn clarabel_is_compiled_by_default() {
        assert!(LpBackend::Clarabel.is_available());
    }
}
