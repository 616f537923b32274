use crate::Network;
use anyhow::{anyhow, Result};
use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};

/// Summary statistics produced by `graph stats` (degree distribution and weak components).
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    pub min_out_degree: usize,
    pub avg_out_degree: f64,
    pub max_out_degree: usize,
}

/// A weakly connected group of locations.
#[derive(Debug)]
pub struct ComponentSummary {
    pub component_id: usize,
    pub location_count: usize,
    pub members: Vec<String>,
}

/// Degree and weak-component statistics over the topology.
pub fn graph_stats(network: &Network) -> Result<GraphStats> {
    let degrees = network.out_degrees();
    let node_count = network.graph.node_count();
    let avg_out_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / node_count as f64
    };
    Ok(GraphStats {
        node_count,
        edge_count: network.graph.edge_count(),
        connected_components: connected_components(&network.graph),
        min_out_degree: degrees.iter().copied().min().unwrap_or(0),
        avg_out_degree,
        max_out_degree: degrees.iter().copied().max().unwrap_or(0),
    })
}

/// Group locations into weakly connected components, ignoring arc direction.
pub fn weak_components(network: &Network) -> Vec<ComponentSummary> {
    let mut visited = HashSet::new();
    let mut components = Vec::new();
    for start in network.graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(network.graph[node].name.clone());
            for neighbor in network.graph.neighbors_undirected(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(ComponentSummary {
            component_id: components.len(),
            location_count: members.len(),
            members,
        });
    }
    components
}

/// Export the topology to a DOT string (Graphviz) so external tools can visualize the layout.
pub fn export_graph(network: &Network, format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(network)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(network: &Network) -> String {
    let mut buffer = String::new();
    buffer.push_str("digraph water_network {\n");
    for node in network.graph.node_indices() {
        let loc = &network.graph[node];
        buffer.push_str(&format!(
            "  n{} [label=\"{}\", shape={}];\n",
            node.index(),
            sanitize_label(loc.label()),
            shape_for(loc.role)
        ));
    }
    for edge in network.graph.edge_references() {
        let arc = edge.weight();
        buffer.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            edge.source().index(),
            edge.target().index(),
            sanitize_label(network.mode_name(arc.mode))
        ));
    }
    buffer.push('}');
    buffer
}

fn shape_for(role: crate::LocationRole) -> &'static str {
    use crate::LocationRole::*;
    match role {
        ProductionPad | CompletionsPad => "box",
        FreshwaterSource => "invtriangle",
        DisposalSite => "triangle",
        StorageSite => "cylinder",
        Customer => "house",
        NetworkNode => "point",
    }
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocationRole, NetworkBuilder};

    fn two_islands() -> Network {
        let mut b = NetworkBuilder::new();
        b.periods(["T1"]).modes(["pipeline"]);
        b.location("A", LocationRole::ProductionPad);
        b.location("B", LocationRole::DisposalSite);
        b.location("C", LocationRole::StorageSite);
        b.connect("A", "pipeline", "B");
        b.build().unwrap()
    }

    #[test]
    fn components_ignore_direction() {
        let components = weak_components(&two_islands());
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].members, vec!["A", "B"]);
        assert_eq!(components[1].location_count, 1);
    }

    #[test]
    fn stats_report_out_degrees() {
        let stats = graph_stats(&two_islands()).unwrap();
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.max_out_degree, 1);
        assert_eq!(stats.min_out_degree, 0);
        assert_eq!(stats.connected_components, 2);
    }

    #[test]
    fn dot_export_is_directed_and_labeled() {
        let dot = export_graph(&two_islands(), "dot").unwrap();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("n0 -> n1 [label=\"pipeline\"]"));
        assert!(export_graph(&two_islands(), "svg").is_err());
    }
}
