//! Loading [`PlanConfig`] from TOML.

use std::fs;
use std::path::Path;
use tracing::debug;

use flowblend_algo::PlanConfig;

use crate::error::{CaseError, CaseResult};

/// Read solver settings. Sections and fields left out keep their defaults;
/// values outside their valid range are rejected.
pub fn read_plan_config(path: impl AsRef<Path>) -> CaseResult<PlanConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| CaseError::io(path, e))?;
    let config: PlanConfig = toml::from_str(&content).map_err(|source| CaseError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate().map_err(|source| CaseError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), ?config, "loaded plan config");
    Ok(config)
}
