//! Composition balance with flows held fixed.
//!
//! For a location `l` in period `t` with throughput `W = D + Σ out + S`:
//!
//! ```text
//! W·c[l,t] = P·ProdComp + Σ_in F·c[origin,t] + S_prev·c[l,t-1]
//! ```
//!
//! where the carried term is `StorageInit·StorageInitComp` at the first period.
//! Once flows are fixed every coefficient is known, so the balance is a square
//! linear system `A·c = b` with one unknown per `(location, period)`. Rows are
//! divided by `W` so the diagonal is 1 and off-diagonal rows sum to at most 1.
//! A location with no throughput carries its previous composition forward.

use sprs::{CsMat, TriMat};

use flowblend_core::{Network, PeriodId};

use crate::flow::FlowSolution;

/// Throughput below this is treated as no throughput.
pub const THROUGHPUT_EPSILON: f64 = 1e-9;

/// The assembled, row-normalized composition system.
#[derive(Debug, Clone)]
pub struct CompositionSystem {
    /// `n × n` CSR matrix, `n = locations × periods`
    pub matrix: CsMat<f64>,
    pub rhs: Vec<f64>,
    /// Throughput per unknown (0 for carried-forward rows)
    pub throughput: Vec<f64>,
    pub locations: usize,
    pub periods: usize,
}

impl CompositionSystem {
    pub fn assemble(network: &Network, flows: &FlowSolution) -> Self {
        let horizon = network.periods();
        let n_t = horizon.len();
        let n = network.location_count() * n_t;
        let index = |loc: usize, t: PeriodId| loc * n_t + t.value();

        let mut triplets = TriMat::new((n, n));
        let mut rhs = vec![0.0; n];
        let mut throughput = vec![0.0; n];

        for loc in network.locations() {
            let l = loc.id.value();
            let params = &loc.params;
            for t in horizon.iter() {
                let row = index(l, t);
                let w = flows.throughput(network, loc.id, t);
                triplets.add_triplet(row, row, 1.0);

                if w <= THROUGHPUT_EPSILON {
                    match horizon.prev(t) {
                        Some(prev) => triplets.add_triplet(row, index(l, prev), -1.0),
                        None => rhs[row] = params.storage_init_composition,
                    }
                    continue;
                }

                throughput[row] = w;
                for arc in network.inbound(loc.id) {
                    let f = flows.flow(arc, t);
                    if f > 0.0 {
                        triplets.add_triplet(row, index(arc.origin.value(), t), -f / w);
                    }
                }
                let mut source = flows.production(loc.id, t) * params.production_composition[t.value()];
                match horizon.prev(t) {
                    Some(prev) => {
                        let carried = flows.storage(loc.id, prev);
                        if carried > 0.0 {
                            triplets.add_triplet(row, index(l, prev), -carried / w);
                        }
                    }
                    None => source += params.storage_init * params.storage_init_composition,
                }
                rhs[row] = source / w;
            }
        }

        Self {
            matrix: triplets.to_csr(),
            rhs,
            throughput,
            locations: network.location_count(),
            periods: n_t,
        }
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    #[inline]
    pub fn index(&self, loc: usize, t: PeriodId) -> usize {
        loc * self.periods + t.value()
    }

    /// `A·x − b`
    pub fn residual(&self, x: &[f64]) -> Vec<f64> {
        let mut r = Vec::with_capacity(self.len());
        for (i, row) in self.matrix.outer_iterator().enumerate() {
            let ax: f64 = row.iter().map(|(j, a)| a * x[j]).sum();
            r.push(ax - self.rhs[i]);
        }
        r
    }

    /// `Aᵀ·r`
    pub fn transpose_apply(&self, r: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        for (i, row) in self.matrix.outer_iterator().enumerate() {
            for (j, a) in row.iter() {
                out[j] += a * r[i];
            }
        }
        out
    }

    pub fn max_residual(&self, x: &[f64]) -> f64 {
        self.residual(x).iter().fold(0.0, |acc, r| acc.max(r.abs()))
    }

    /// Absolute residual tolerance for a relative tolerance `tol`.
    pub fn tolerance(&self, tol: f64) -> f64 {
        let b_max = self.rhs.iter().fold(0.0_f64, |acc, b| acc.max(b.abs()));
        tol * (1.0 + b_max)
    }

    /// Characteristic magnitude of the unknowns, used to scale iterative solves.
    ///
    /// Taken from the right-hand side so that [`Self::tolerance`] divided by the
    /// scale never drops below the relative tolerance.
    pub fn scale(&self) -> f64 {
        self.rhs.iter().fold(1.0_f64, |acc, b| acc.max(b.abs()))
    }
}
