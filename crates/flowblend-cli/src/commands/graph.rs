use std::fs;

use anyhow::{Context, Result};

use flowblend_cli::GraphCommands;
use flowblend_core::graph_utils;

use crate::commands::util::load_case;

pub fn handle(command: &GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { case } => {
            let network = load_case(case)?;
            let stats = graph_utils::graph_stats(&network)?;
            let summary = network.stats();
            println!("Graph statistics for {}:", case.display());
            println!("  Locations     : {}", stats.node_count);
            println!("  Arcs          : {}", stats.edge_count);
            println!("  Periods       : {}", summary.periods);
            println!("  Components    : {}", stats.connected_components);
            println!(
                "  Out-degree [min/avg/max]: {}/{:.2}/{}",
                stats.min_out_degree, stats.avg_out_degree, stats.max_out_degree
            );
            for (role, count) in &summary.locations_by_role {
                println!("  {:<14}: {}", role, count);
            }
            for (mode, count) in &summary.arcs_by_mode {
                println!("  arcs/{:<9}: {}", mode, count);
            }
            Ok(())
        }
        GraphCommands::Components { case } => {
            let network = load_case(case)?;
            for component in graph_utils::weak_components(&network) {
                println!(
                    "Component {}: {} location(s): {}",
                    component.component_id,
                    component.location_count,
                    component.members.join(", ")
                );
            }
            Ok(())
        }
        GraphCommands::Export { case, format, out } => {
            let network = load_case(case)?;
            let rendered = graph_utils::export_graph(&network, format)?;
            match out {
                Some(path) => {
                    fs::write(path, &rendered)
                        .with_context(|| format!("writing graph export to {}", path.display()))?;
                    println!("Graph exported to {}", path.display());
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
    }
}
