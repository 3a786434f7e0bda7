//! Collective communication between the processes of a run.
//!
//! The coordinator never asks for rank or size from the environment. It is
//! handed a [Collective] that provides the few reductions it needs. Three
//! backends exist:
//! - [SingleProcess] for serial runs,
//! - [ThreadGroup] which emulates ranks with threads of one process,
//! - `MpiCollective` (feature `mpi`) for any MPI communicator.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use itertools::izip;
use num::traits::Zero;

#[cfg(feature = "mpi")]
pub use mpi_backend::MpiCollective;

/// Reductions over all participating processes.
///
/// All methods are collective: every process of the group must call them in
/// the same order with arrays of the same length.
pub trait Collective {
    /// Rank of this process.
    fn rank(&self) -> usize;

    /// Number of processes.
    fn size(&self) -> usize;

    /// Elementwise sum of `local` over all processes.
    fn sum_f64_array(&self, local: &[f64]) -> Vec<f64>;

    /// Elementwise sum of `local` over all processes.
    fn sum_u64_array(&self, local: &[u64]) -> Vec<u64>;

    /// Sum of a scalar over all processes.
    fn sum_u64(&self, local: u64) -> u64 {
        self.sum_u64_array(&[local])[0]
    }

    /// True if `flag` is set on any process.
    fn any(&self, flag: bool) -> bool;

    /// True on the coordinating process.
    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// Return an array of length `size` that is zero except for `value` at `rank`.
///
/// Summing these arrays over all processes gathers one value per rank.
pub fn one_hot<T: Zero + Copy>(size: usize, rank: usize, value: T) -> Vec<T> {
    let mut arr = vec![T::zero(); size];
    arr[rank] = value;
    arr
}

/// The trivial group of one process.
#[derive(Copy, Clone, Debug, Default)]
pub struct SingleProcess;

impl Collective for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn sum_f64_array(&self, local: &[f64]) -> Vec<f64> {
        local.to_vec()
    }

    fn sum_u64_array(&self, local: &[u64]) -> Vec<u64> {
        local.to_vec()
    }

    fn any(&self, flag: bool) -> bool {
        flag
    }
}

#[derive(Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

/// A reusable barrier that can be torn down when a member dies.
struct AbortableBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl AbortableBarrier {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(BarrierState::default()),
            released: Condvar::new(),
        }
    }

    /// Block until all members arrived. Panics if the barrier was aborted.
    fn wait(&self) {
        let mut state = lock(&self.state);
        if state.aborted {
            panic!("A rank of the thread group panicked.");
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation += 1;
            self.released.notify_all();
            return;
        }

        while state.generation == generation && !state.aborted {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.generation == generation {
            panic!("A rank of the thread group panicked.");
        }
    }

    fn abort(&self) {
        lock(&self.state).aborted = true;
        self.released.notify_all();
    }
}

struct Shared {
    barrier: AbortableBarrier,
    f64_slots: Mutex<Vec<Vec<f64>>>,
    u64_slots: Mutex<Vec<Vec<u64>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A group of ranks living on threads of the same process.
///
/// Each [ThreadRank] is moved into its own thread. A reduction blocks until
/// every rank of the group has contributed.
///
/// If a thread panics while holding its rank, the group is aborted: ranks
/// waiting in a reduction, and any later reduction, panic as well. Joining
/// the threads then reports the failure instead of blocking forever.
pub struct ThreadGroup;

impl ThreadGroup {
    /// Create the ranks of a group of `size` members.
    pub fn create(size: usize) -> Vec<ThreadRank> {
        assert!(size > 0, "A thread group needs at least one rank.");

        let shared = Arc::new(Shared {
            barrier: AbortableBarrier::new(size),
            f64_slots: Mutex::new(vec![Vec::new(); size]),
            u64_slots: Mutex::new(vec![Vec::new(); size]),
        });

        (0..size)
            .map(|rank| ThreadRank {
                rank,
                size,
                shared: shared.clone(),
            })
            .collect()
    }
}

/// One member of a [ThreadGroup].
pub struct ThreadRank {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadRank {
    fn exchange<T: Zero + Copy>(&self, slots: &Mutex<Vec<Vec<T>>>, local: &[T]) -> Vec<T> {
        lock(slots)[self.rank] = local.to_vec();

        // Wait until every rank has written its contribution.
        self.shared.barrier.wait();

        let result = {
            let slots = lock(slots);
            let mut result = vec![T::zero(); local.len()];
            for contribution in slots.iter() {
                for (res, &value) in izip!(result.iter_mut(), contribution.iter()) {
                    *res = *res + value;
                }
            }
            result
        };

        // No rank may overwrite its slot before all ranks have read.
        self.shared.barrier.wait();

        result
    }
}

impl Drop for ThreadRank {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.barrier.abort();
        }
    }
}

impl Collective for ThreadRank {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn sum_f64_array(&self, local: &[f64]) -> Vec<f64> {
        self.exchange(&self.shared.f64_slots, local)
    }

    fn sum_u64_array(&self, local: &[u64]) -> Vec<u64> {
        self.exchange(&self.shared.u64_slots, local)
    }

    fn any(&self, flag: bool) -> bool {
        self.sum_u64(u64::from(flag)) > 0
    }
}

#[cfg(feature = "mpi")]
mod mpi_backend {
    use mpi::{collective::SystemOperation, traits::CommunicatorCollectives};

    use super::Collective;

    /// Collectives over an MPI communicator.
    pub struct MpiCollective<'c, C> {
        comm: &'c C,
    }

    impl<'c, C: CommunicatorCollectives> MpiCollective<'c, C> {
        /// Wrap a communicator.
        pub fn new(comm: &'c C) -> Self {
            Self { comm }
        }

        /// Return the communicator.
        pub fn comm(&self) -> &C {
            self.comm
        }
    }

    impl<C: CommunicatorCollectives> Collective for MpiCollective<'_, C> {
        fn rank(&self) -> usize {
            self.comm.rank() as usize
        }

        fn size(&self) -> usize {
            self.comm.size() as usize
        }

        fn sum_f64_array(&self, local: &[f64]) -> Vec<f64> {
            let mut global = vec![0.0; local.len()];
            self.comm
                .all_reduce_into(local, &mut global[..], SystemOperation::sum());
            global
        }

        fn sum_u64_array(&self, local: &[u64]) -> Vec<u64> {
            let mut global = vec![0_u64; local.len()];
            self.comm
                .all_reduce_into(local, &mut global[..], SystemOperation::sum());
            global
        }

        fn any(&self, flag: bool) -> bool {
            let mut global_flag = false;
            self.comm
                .all_reduce_into(&flag, &mut global_flag, SystemOperation::logical_or());
            global_flag
        }
    }
}
