//! DistFlow backward/forward sweep for radial feeders.
//!
//! Works on squared voltage magnitudes and branch sending-end flows
//! (Baran-Wu). Buses not reachable from the source through closed branches
//! are de-energised and read 0 pu.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Convergence controls for [`solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Largest voltage change between sweeps accepted as converged (pu).
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 50,
        }
    }
}

/// One series element between two buses, in per unit.
#[derive(Debug, Clone, Copy)]
pub struct Branch {
    pub from: usize,
    pub to: usize,
    pub r: f64,
    pub x: f64,
    pub closed: bool,
}

/// Spanning tree of the energised network.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Energised buses in breadth-first order from the source.
    order: Vec<usize>,
    /// `(parent bus, branch index)` for each energised non-source bus.
    parent: Vec<Option<(usize, usize)>>,
    energized: Vec<bool>,
}

impl Topology {
    /// Walks closed branches outward from `source`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MeshedTopology` if closed branches form a loop.
    pub fn build(n_buses: usize, source: usize, branches: &[Branch], bus_names: &[String]) -> Result<Self> {
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n_buses];
        for (idx, b) in branches.iter().enumerate().filter(|(_, b)| b.closed) {
            adjacency[b.from].push((b.to, idx));
            adjacency[b.to].push((b.from, idx));
        }

        let mut parent = vec![None; n_buses];
        let mut energized = vec![false; n_buses];
        let mut order = Vec::with_capacity(n_buses);
        let mut queue = VecDeque::from([source]);
        energized[source] = true;

        while let Some(bus) = queue.pop_front() {
            order.push(bus);
            let via = parent[bus].map(|(_, branch)| branch);
            for &(next, branch) in &adjacency[bus] {
                if Some(branch) == via {
                    continue;
                }
                if energized[next] {
                    return Err(Error::MeshedTopology {
                        bus: bus_names.get(next).cloned().unwrap_or_default(),
                    });
                }
                energized[next] = true;
                parent[next] = Some((bus, branch));
                queue.push_back(next);
            }
        }

        Ok(Self {
            order,
            parent,
            energized,
        })
    }

    pub fn is_energized(&self, bus: usize) -> bool {
        self.energized.get(bus).copied().unwrap_or(false)
    }

    pub fn energized(&self) -> &[bool] {
        &self.energized
    }
}

/// Power-flow result in per unit.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Voltage magnitude per bus; 0 for de-energised buses.
    pub v_pu: Vec<f64>,
    /// Sending-end active flow per branch; 0 for branches outside the tree.
    pub p_send: Vec<f64>,
    pub q_send: Vec<f64>,
    /// Total active power drawn from the source.
    pub p_source: f64,
    pub q_source: f64,
    pub energized: Vec<bool>,
    pub iterations: usize,
}

/// Runs the sweep until the voltage update falls below the tolerance.
///
/// `loads` holds per-bus net demand `(p, q)` in per unit; generation is
/// negative.
///
/// # Errors
///
/// Returns `Error::NotConverged` when the iteration limit is reached or a
/// squared voltage goes non-positive.
pub fn solve(
    topology: &Topology,
    branches: &[Branch],
    loads: &[(f64, f64)],
    source_pu: f64,
    settings: &SolverSettings,
) -> Result<Solution> {
    let n = loads.len();
    let source = topology.order[0];
    let mut v2 = vec![0.0; n];
    for &bus in &topology.order {
        v2[bus] = source_pu * source_pu;
    }
    let mut p_send = vec![0.0; branches.len()];
    let mut q_send = vec![0.0; branches.len()];
    let mut p_recv = vec![0.0; n];
    let mut q_recv = vec![0.0; n];
    let mut mismatch = f64::INFINITY;

    for iteration in 1..=settings.max_iterations {
        // 1. Backward sweep: accumulate downstream demand plus losses
        for &bus in &topology.order {
            p_recv[bus] = loads[bus].0;
            q_recv[bus] = loads[bus].1;
        }
        for &bus in topology.order.iter().rev() {
            let Some((up, idx)) = topology.parent[bus] else {
                continue;
            };
            let b = &branches[idx];
            let loss = (p_recv[bus].powi(2) + q_recv[bus].powi(2)) / v2[bus];
            p_send[idx] = p_recv[bus] + b.r * loss;
            q_send[idx] = q_recv[bus] + b.x * loss;
            p_recv[up] += p_send[idx];
            q_recv[up] += q_send[idx];
        }

        // 2. Forward sweep: voltage drop along each branch
        mismatch = 0.0;
        for &bus in topology.order.iter().skip(1) {
            let Some((up, idx)) = topology.parent[bus] else {
                continue;
            };
            let b = &branches[idx];
            let (p, q) = (p_send[idx], q_send[idx]);
            let next = v2[up] - 2.0 * (b.r * p + b.x * q)
                + (b.r * b.r + b.x * b.x) * (p * p + q * q) / v2[up];
            if !next.is_finite() || next <= 0.0 {
                return Err(Error::NotConverged {
                    iterations: iteration,
                    mismatch: f64::INFINITY,
                });
            }
            mismatch = mismatch.max((next.sqrt() - v2[bus].sqrt()).abs());
            v2[bus] = next;
        }

        if mismatch < settings.tolerance {
            return Ok(Solution {
                v_pu: v2.iter().map(|v| v.sqrt()).collect(),
                p_send,
                q_send,
                p_source: p_recv[source],
                q_source: q_recv[source],
                energized: topology.energized.clone(),
                iterations: iteration,
            });
        }
    }

    Err(Error::NotConverged {
        iterations: settings.max_iterations,
        mismatch,
    })
}
