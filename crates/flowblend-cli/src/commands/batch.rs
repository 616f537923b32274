use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tabwriter::TabWriter;
use tracing::{info, warn};

use flowblend_algo::{Planner, Scenario};
use flowblend_cli::SolverArgs;
use flowblend_io::write_report;

use crate::commands::util::{load_case, plan_config, scenario_names};

pub fn handle(cases: &[PathBuf], out: Option<&PathBuf>, solver: &SolverArgs) -> Result<()> {
    let config = plan_config(solver)?;
    let names = scenario_names(cases);

    let mut scenarios = Vec::new();
    let mut load_failures = HashMap::new();
    for (path, name) in cases.iter().zip(&names) {
        match load_case(path) {
            Ok(network) => scenarios.push(Scenario {
                name: name.clone(),
                network,
            }),
            Err(err) => {
                warn!(case = %path.display(), "{err:#}");
                load_failures.insert(name.clone(), err);
            }
        }
    }
    info!(
        scenarios = scenarios.len(),
        unreadable = load_failures.len(),
        "planning batch"
    );

    let mut outcomes = Planner::new(config).solve_batch(scenarios).into_iter();

    let mut writer = TabWriter::new(Vec::new()).padding(2);
    writeln!(writer, "SCENARIO\tSTATUS\tOBJECTIVE\tDETAIL")?;
    let mut failures = 0;
    for name in &names {
        if let Some(err) = load_failures.remove(name) {
            failures += 1;
            writeln!(writer, "{}\tinvalid\t-\t{:#}", name, err)?;
            continue;
        }
        let Some(outcome) = outcomes.next() else {
            break;
        };
        match &outcome.result {
            Ok(plan) => {
                let report = plan.report();
                let detail = match out {
                    Some(dir) => {
                        let target = dir.join(&outcome.name);
                        write_report(&report, &target).with_context(|| {
                            format!("writing report for scenario {}", outcome.name)
                        })?;
                        target.display().to_string()
                    }
                    None => String::new(),
                };
                writeln!(
                    writer,
                    "{}\t{}\t{:.4}\t{}",
                    outcome.name, report.summary.flow_status, report.summary.objective, detail
                )?;
            }
            Err(err) => {
                failures += 1;
                let status = err
                    .status()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "invalid".to_string());
                writeln!(writer, "{}\t{}\t-\t{}", outcome.name, status, err)?;
            }
        }
    }
    writer.flush()?;
    print!("{}", String::from_utf8(writer.into_inner()?)?);

    if failures > 0 {
        bail!("{failures} of {} scenario(s) failed", names.len());
    }
    Ok(())
}
