use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tabwriter::TabWriter;
use tracing::info;

use flowblend_algo::{PlanSummary, Planner};
use flowblend_cli::{SolverArgs, SummaryFormat};
use flowblend_io::write_report;

use crate::commands::util::{load_case, plan_config};

pub fn handle(
    case: &Path,
    out: Option<&PathBuf>,
    format: SummaryFormat,
    solver: &SolverArgs,
) -> Result<()> {
    let start = Instant::now();
    let config = plan_config(solver)?;
    let network = load_case(case)?;
    info!(case = %case.display(), "{}", network.stats());

    let plan = Planner::new(config)
        .plan(&network)
        .with_context(|| format!("planning {}", case.display()))?;
    let report = plan.report();

    if let Some(dir) = out {
        write_report(&report, dir)
            .with_context(|| format!("writing report to {}", dir.display()))?;
        info!(dir = %dir.display(), "report written");
    }

    match format {
        SummaryFormat::Table => print!("{}", render_summary(&report.summary)?),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&report.summary)?),
    }
    info!(elapsed_ms = start.elapsed().as_millis(), "solve finished");
    Ok(())
}

/// Two-column key/value table of a plan summary.
pub fn render_summary(summary: &PlanSummary) -> Result<String> {
    let mut writer = TabWriter::new(Vec::new()).padding(2);
    writeln!(writer, "objective\t{:.4}", summary.objective)?;
    writeln!(writer, "  disposal\t{:.4}", summary.disposal_cost)?;
    writeln!(writer, "  freshwater\t{:.4}", summary.freshwater_cost)?;
    writeln!(writer, "  transport\t{:.4}", summary.transport_cost)?;
    writeln!(
        writer,
        "flow\t{} ({}, {} ms)",
        summary.flow_status, summary.flow_backend, summary.flow_solve_time_ms
    )?;
    writeln!(
        writer,
        "variables\t{} free, {} pinned",
        summary.free_variables, summary.pinned_variables
    )?;
    writeln!(
        writer,
        "rows\t{} ({} removed by presolve)",
        summary.rows, summary.presolved_rows
    )?;
    match (&summary.quality_status, &summary.quality_backend) {
        (Some(status), Some(backend)) => writeln!(
            writer,
            "quality\t{} ({}, {} iterations, {} ms)",
            status,
            backend,
            summary.quality_iterations.unwrap_or(0),
            summary.quality_solve_time_ms.unwrap_or(0)
        )?,
        _ => writeln!(writer, "quality\tnot tracked")?,
    }
    writeln!(
        writer,
        "max violation\t{:.3e}",
        summary.violations.max_flow_violation()
    )?;
    if let Some(residual) = summary.violations.max_composition_residual {
        writeln!(writer, "mass residual\t{:.3e}", residual)?;
    }
    writer.flush()?;
    Ok(String::from_utf8(writer.into_inner()?)?)
}
