use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use flowblend_algo::PlanConfig;
use flowblend_cli::SolverArgs;
use flowblend_core::Network;
use flowblend_io::{load_network, read_plan_config};

/// Config file (or defaults) with command-line overrides applied.
pub fn plan_config(args: &SolverArgs) -> Result<PlanConfig> {
    let mut config = match &args.config {
        Some(path) => read_plan_config(path)
            .with_context(|| format!("loading plan config {}", path.display()))?,
        None => PlanConfig::default(),
    };
    if let Some(backend) = args.lp_backend {
        config.flow.backend = backend;
    }
    if let Some(backend) = args.quality_backend {
        config.quality.backend = backend;
    }
    if let Some(seconds) = args.flow_timeout {
        config.flow.timeout_seconds = positive_seconds("--flow-timeout", seconds)?;
    }
    if let Some(seconds) = args.quality_timeout {
        config.quality.timeout_seconds = positive_seconds("--quality-timeout", seconds)?;
    }
    if args.no_composition {
        config.plan.track_composition = false;
    }
    if !config.flow.backend.is_available() {
        bail!(
            "LP backend {} is not compiled into this build",
            config.flow.backend
        );
    }
    debug!(?config, "effective plan config");
    Ok(config)
}

fn positive_seconds(flag: &str, seconds: f64) -> Result<f64> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        bail!("{flag} must be a positive number of seconds, got {seconds}")
    }
}

pub fn load_case(path: &Path) -> Result<Network> {
    load_network(path).with_context(|| format!("loading case {}", path.display()))
}

/// Case name used for batch scenario labels and output folders.
fn case_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One name per case, unique across the batch: the file stem, numbered when
/// stems repeat.
pub fn scenario_names(paths: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = case_name(path);
            let mut name = stem.clone();
            let mut n = 1;
            while !used.insert(name.clone()) {
                n += 1;
                name = format!("{stem}-{n}");
            }
            name
        })
        .collect()
}
