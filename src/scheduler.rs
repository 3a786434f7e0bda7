//! Scheduling policies driving the coordinator.

use log::{debug, trace};

use crate::{
    algorithm::IcAlgorithm,
    comm::Collective,
    curve::CurveStatus,
    provider::DomainProvider,
    queues::{CurveHandle, Queue},
};

/// A policy deciding in which order curves are advanced.
///
/// [IcAlgorithm::execute] calls `pre_run`, `run` and `post_run` in turn.
pub trait Scheduler<P: DomainProvider, C: Collective> {
    /// Name printed in the statistics report.
    fn name(&self) -> &str;

    /// Called before [Scheduler::run].
    fn pre_run(&mut self, _algo: &mut IcAlgorithm<'_, P, C>) {}

    /// Advance curves until none can make progress on this process.
    fn run(&mut self, algo: &mut IcAlgorithm<'_, P, C>);

    /// Called after [Scheduler::run]. Finalizes the terminated curves.
    fn post_run(&mut self, algo: &mut IcAlgorithm<'_, P, C>) {
        algo.post_run_algorithm();
    }
}

/// Advances curves one after another on a process that can reach every block.
///
/// Curves are handled in groups of the provider's work group size. The rest
/// wait in the inactive queue. Before a curve is picked the active queue is
/// sorted so that curves in resident blocks go first. A picked curve is
/// advanced for as long as its next block is resident.
#[derive(Clone, Debug, Default)]
pub struct SerialScheduler {
    advanced: usize,
}

impl SerialScheduler {
    /// Create a new scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of advections performed by the last run.
    pub fn advanced(&self) -> usize {
        self.advanced
    }
}

/// Move up to `count` curves from the inactive to the active queue. Zero moves all.
fn refill<P: DomainProvider, C: Collective>(algo: &mut IcAlgorithm<'_, P, C>, count: usize) {
    let waiting = algo.queues().handles(Queue::Inactive).len();
    let count = if count == 0 { waiting } else { count.min(waiting) };

    for _ in 0..count {
        if let Some(handle) = algo.queues().front(Queue::Inactive) {
            algo.move_curve(handle, Queue::Active);
        }
    }
}

impl SerialScheduler {
    fn advance<P: DomainProvider, C: Collective>(
        &mut self,
        algo: &mut IcAlgorithm<'_, P, C>,
        handle: CurveHandle,
    ) {
        loop {
            if algo.get_domain(handle).is_none() {
                trace!("No domain for curve {:?}, terminating.", handle);
                algo.terminate_curve(handle);
                return;
            }

            algo.advect_particle(handle);
            self.advanced += 1;

            let Some(curve) = algo.queues().get(handle) else {
                return;
            };

            match curve.status() {
                CurveStatus::AtSpatialBoundary => match curve.current_block().copied() {
                    None => {
                        algo.terminate_curve(handle);
                        return;
                    }
                    Some(next) if algo.domain_loaded(&next) => {}
                    Some(_) => {
                        algo.move_curve(handle, Queue::Active);
                        return;
                    }
                },
                CurveStatus::AtTemporalBoundary | CurveStatus::Terminated => {
                    algo.move_curve(handle, Queue::Terminated);
                    return;
                }
                CurveStatus::Active => {
                    algo.terminate_curve(handle);
                    return;
                }
            }
        }
    }
}

impl<P: DomainProvider, C: Collective> Scheduler<P, C> for SerialScheduler {
    fn name(&self) -> &str {
        "SerialStreamlines"
    }

    fn pre_run(&mut self, algo: &mut IcAlgorithm<'_, P, C>) {
        self.advanced = 0;

        let group = algo.provider().settings().work_group_size;
        if group > 0 {
            let parked = algo
                .queues()
                .handles(Queue::Active)
                .iter()
                .skip(group)
                .copied()
                .collect::<Vec<_>>();
            for handle in parked {
                algo.move_curve(handle, Queue::Inactive);
            }
        }
    }

    fn run(&mut self, algo: &mut IcAlgorithm<'_, P, C>) {
        let group = algo.provider().settings().work_group_size;

        loop {
            if algo.queues().is_empty(Queue::Active) {
                if algo.queues().is_empty(Queue::Inactive) {
                    break;
                }
                refill(algo, group);
                debug!(
                    "Next work group: {} active, {} waiting.",
                    algo.queues().len(Queue::Active),
                    algo.queues().len(Queue::Inactive)
                );
            }

            algo.sort_integral_curves(Queue::Active);
            let Some(handle) = algo.queues().front(Queue::Active) else {
                continue;
            };
            self.advance(algo, handle);
        }

        debug!(
            "{} finished after {} advections, {} curves terminated.",
            <Self as Scheduler<P, C>>::name(self),
            self.advanced,
            algo.queues().len(Queue::Terminated)
        );
    }
}
