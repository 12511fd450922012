// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Slab Decomposition and Collectives
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Slab partition metadata and the collective operations the estimator
//! and driver need.
//!
//! `SerialComm` covers the single-worker case. `LocalGroup` runs N workers
//! on scoped threads; an MPI binding implements the same trait.

use kspace_types::error::{KspaceError, KspaceResult};
use std::ops::AddAssign;
use std::sync::{Barrier, Mutex, PoisonError};

/// Rows `[slab_start, slab_end)` of the first grid axis owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabDecomposition {
    pub rank: usize,
    pub nworkers: usize,
    pub grid_dim: usize,
    pub slab_start: usize,
    pub slab_count: usize,
}

impl SlabDecomposition {
    /// Balanced contiguous split; the first `grid_dim % nworkers` workers
    /// get one extra row.
    pub fn decompose(grid_dim: usize, nworkers: usize) -> KspaceResult<Vec<Self>> {
        if grid_dim < 2 {
            return Err(KspaceError::InvalidInput(
                "Slab decomposition requires grid_dim >= 2".to_string(),
            ));
        }
        if nworkers < 1 {
            return Err(KspaceError::InvalidInput(
                "Slab decomposition requires nworkers >= 1".to_string(),
            ));
        }
        if nworkers > grid_dim {
            return Err(KspaceError::InvalidInput(format!(
                "Cannot split grid_dim={grid_dim} across nworkers={nworkers}"
            )));
        }

        let base = grid_dim / nworkers;
        let rem = grid_dim % nworkers;
        let mut out = Vec::with_capacity(nworkers);
        let mut cursor = 0usize;
        for rank in 0..nworkers {
            let slab_count = base + usize::from(rank < rem);
            out.push(SlabDecomposition {
                rank,
                nworkers,
                grid_dim,
                slab_start: cursor,
                slab_count,
            });
            cursor += slab_count;
        }
        Ok(out)
    }

    pub fn slab_end(&self) -> usize {
        self.slab_start + self.slab_count
    }
}

/// Blocking collectives over a fixed group of workers.
///
/// Every worker must make the same sequence of calls with buffers of the
/// same length; a worker that skips a call stalls the group.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    /// Replace `buf` by the element-wise sum over all workers.
    fn all_reduce_sum_f64(&self, buf: &mut [f64]) -> KspaceResult<()>;
    fn all_reduce_sum_u64(&self, buf: &mut [u64]) -> KspaceResult<()>;
    fn barrier(&self) -> KspaceResult<()>;
}

/// One worker; every collective is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum_f64(&self, _buf: &mut [f64]) -> KspaceResult<()> {
        Ok(())
    }

    fn all_reduce_sum_u64(&self, _buf: &mut [u64]) -> KspaceResult<()> {
        Ok(())
    }

    fn barrier(&self) -> KspaceResult<()> {
        Ok(())
    }
}

/// Shared state of an in-process worker group.
///
/// Each worker deposits its contribution in its own slot; after a barrier
/// every worker sums the slots in rank order, so all workers see the same
/// bits whatever order they arrived in.
#[derive(Debug)]
pub struct LocalGroup {
    size: usize,
    barrier: Barrier,
    slots_f64: Mutex<Vec<Vec<f64>>>,
    slots_u64: Mutex<Vec<Vec<u64>>>,
}

/// Handle through which one worker of a [`LocalGroup`] communicates.
#[derive(Debug, Clone, Copy)]
pub struct LocalComm<'g> {
    group: &'g LocalGroup,
    rank: usize,
}

impl LocalGroup {
    pub fn new(size: usize) -> KspaceResult<Self> {
        if size < 1 {
            return Err(KspaceError::Communication(
                "Worker group needs at least one member".to_string(),
            ));
        }
        Ok(LocalGroup {
            size,
            barrier: Barrier::new(size),
            slots_f64: Mutex::new(vec![Vec::new(); size]),
            slots_u64: Mutex::new(vec![Vec::new(); size]),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn comm(&self, rank: usize) -> KspaceResult<LocalComm<'_>> {
        if rank >= self.size {
            return Err(KspaceError::Communication(format!(
                "Rank {rank} outside group of size {}",
                self.size
            )));
        }
        Ok(LocalComm { group: self, rank })
    }

    /// Run `f` once per worker on its own thread, handing worker `r` the
    /// state `states[r]`. Results come back in rank order.
    pub fn run_each<T, R, F>(&self, states: Vec<T>, f: F) -> KspaceResult<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(LocalComm<'_>, T) -> R + Sync,
    {
        if states.len() != self.size {
            return Err(KspaceError::Communication(format!(
                "Got {} worker states for a group of size {}",
                states.len(),
                self.size
            )));
        }
        let f = &f;
        let results: Vec<R> = std::thread::scope(|scope| {
            let handles: Vec<_> = states
                .into_iter()
                .enumerate()
                .map(|(rank, state)| {
                    let comm = LocalComm { group: self, rank };
                    scope.spawn(move || f(comm, state))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
                .collect()
        });
        Ok(results)
    }

    fn reduce<T>(&self, slots: &Mutex<Vec<Vec<T>>>, rank: usize, buf: &mut [T]) -> KspaceResult<()>
    where
        T: Copy + Default + AddAssign,
    {
        {
            let mut guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
            guard[rank].clear();
            guard[rank].extend_from_slice(buf);
        }
        self.barrier.wait();
        let outcome = {
            let guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((bad, slot)) = guard.iter().enumerate().find(|(_, s)| s.len() != buf.len()) {
                Err(KspaceError::Communication(format!(
                    "All-reduce length mismatch: rank {rank} has {}, rank {bad} has {}",
                    buf.len(),
                    slot.len()
                )))
            } else {
                buf.iter_mut().for_each(|v| *v = T::default());
                for slot in guard.iter() {
                    for (b, x) in buf.iter_mut().zip(slot.iter()) {
                        *b += *x;
                    }
                }
                Ok(())
            }
        };
        // Nobody may overwrite a slot until every worker has read them all.
        self.barrier.wait();
        outcome
    }
}

impl Communicator for LocalComm<'_> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.group.size
    }

    fn all_reduce_sum_f64(&self, buf: &mut [f64]) -> KspaceResult<()> {
        self.group.reduce(&self.group.slots_f64, self.rank, buf)
    }

    fn all_reduce_sum_u64(&self, buf: &mut [u64]) -> KspaceResult<()> {
        self.group.reduce(&self.group.slots_u64, self.rank, buf)
    }

    fn barrier(&self) -> KspaceResult<()> {
        self.group.barrier.wait();
        Ok(())
    }
}
