//! Removal of circulating flow from an LP solution.
//!
//! An interior-point solution can carry a small amount of water around a
//! directed cycle of arcs. Subtracting the smallest flow on the cycle from
//! every arc on it leaves inflow minus outflow unchanged at every location, so
//! the balance rows still hold, and it never raises cost or breaks a capacity.

use flowblend_core::{ArcId, Network, PeriodId, TransportArc};

use crate::table::PeriodTable;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    OnPath,
    Done,
}

/// Cancel every directed flow cycle, period by period. Flows that drop below
/// `snap` are set to exactly zero. Returns the number of cycles cancelled.
pub(crate) fn cancel_circulation(network: &Network, flow: &mut PeriodTable, snap: f64) -> usize {
    let mut cancelled = 0;
    for t in network.periods().iter() {
        while let Some(cycle) = find_cycle(network, flow, t) {
            let amount = cycle
                .iter()
                .map(|arc| flow.get(arc.value(), t))
                .fold(f64::INFINITY, f64::min);
            for arc in &cycle {
                let left = flow.get(arc.value(), t) - amount;
                flow.set(arc.value(), t, if left < snap { 0.0 } else { left });
            }
            cancelled += 1;
        }
    }
    cancelled
}

/// Depth-first search over arcs with positive flow in period `t`; the first
/// back edge found closes a cycle.
fn find_cycle(network: &Network, flow: &PeriodTable, t: PeriodId) -> Option<Vec<ArcId>> {
    let n = network.location_count();
    let mut adjacency: Vec<Vec<&TransportArc>> = vec![Vec::new(); n];
    for arc in network.arcs() {
        if flow.get(arc.id.value(), t) > 0.0 {
            adjacency[arc.origin.value()].push(arc);
        }
    }

    let mut mark = vec![Mark::New; n];
    for root in 0..n {
        if mark[root] != Mark::New || adjacency[root].is_empty() {
            continue;
        }
        mark[root] = Mark::OnPath;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        let mut path: Vec<&TransportArc> = Vec::new();

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            match adjacency[node].get(top.1) {
                Some(&arc) => {
                    top.1 += 1;
                    let head = arc.destination.value();
                    match mark[head] {
                        Mark::New => {
                            mark[head] = Mark::OnPath;
                            path.push(arc);
                            stack.push((head, 0));
                        }
                        Mark::OnPath => {
                            let start = path
                                .iter()
                                .position(|a| a.origin.value() == head)
                                .unwrap_or(path.len());
                            let mut cycle: Vec<ArcId> = path[start..].iter().map(|a| a.id).collect();
                            cycle.push(arc.id);
                            return Some(cycle);
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    mark[node] = Mark::Done;
                    stack.pop();
                    path.pop();
                }
            }
        }
    }
    None
}
