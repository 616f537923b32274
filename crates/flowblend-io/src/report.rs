//! Plan report output: one CSV per table plus `summary.json`.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use flowblend_algo::PlanReport;

use crate::error::{CaseError, CaseResult};

pub const TRANSFERS_FILE: &str = "transfers.csv";
pub const PRODUCTION_FILE: &str = "production.csv";
pub const DEMAND_FILE: &str = "demand.csv";
pub const STORAGE_FILE: &str = "storage.csv";
pub const COMPOSITION_FILE: &str = "composition.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Write every table of `report` into `dir`, creating it if needed.
///
/// `composition.csv` is skipped when the plan carries no composition. Returns
/// the written paths in write order.
pub fn write_report(report: &PlanReport, dir: &Path) -> CaseResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| CaseError::io(dir, e))?;

    let mut written = Vec::with_capacity(6);
    written.push(write_csv(&dir.join(TRANSFERS_FILE), &report.transfers)?);
    written.push(write_csv(&dir.join(PRODUCTION_FILE), &report.production)?);
    written.push(write_csv(&dir.join(DEMAND_FILE), &report.demand)?);
    written.push(write_csv(&dir.join(STORAGE_FILE), &report.storage)?);
    if !report.composition.is_empty() {
        written.push(write_csv(&dir.join(COMPOSITION_FILE), &report.composition)?);
    }

    let summary_path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(&report.summary).map_err(|source| {
        CaseError::Json {
            path: summary_path.clone(),
            source,
        }
    })?;
    fs::write(&summary_path, json).map_err(|e| CaseError::io(&summary_path, e))?;
    written.push(summary_path);

    info!(dir = %dir.display(), files = written.len(), "wrote plan report");
    Ok(written)
}

/// Write `rows` with a header taken from the row's field names.
pub fn write_csv<R: Serialize>(path: &Path, rows: &[R]) -> CaseResult<PathBuf> {
    let csv_err = |source| CaseError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| CaseError::io(path, e))?;
    Ok(path.to_path_buf())
}
