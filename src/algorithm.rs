//! The integral curve advection coordinator.
//!
//! An [IcAlgorithm] owns the curves of one process. A [Scheduler] decides in
//! which order curves are advanced; the coordinator supplies what every
//! scheduling policy needs: domain access, advection, locality sorting,
//! queue transitions, timers and counters, and the statistics report.
//!
//! A run looks like
//! ```ignore
//! let mut algo = IcAlgorithm::new(provider, &comm, AlgorithmConfig::default());
//! algo.initialize(seeds);
//! algo.execute(&mut SerialScheduler::default());
//! algo.post_execute()?;
//! ```

use std::borrow::BorrowMut;
use std::io::Write;
use std::time::{Duration, Instant};

use itertools::Itertools;
use log::{debug, info, trace};

use crate::{
    comm::Collective,
    config::AlgorithmConfig,
    curve::IntegralCurve,
    error::{Error, Result},
    geometry::Point,
    provider::DomainProvider,
    queues::{CurveHandle, CurveQueues, Queue},
    report::{timings_file_name, write_file, write_histograms, write_report, ReportHeader},
    scheduler::Scheduler,
    sort::{sort_by_locality, sort_queue},
    statistics::{AlgorithmStatistics, ProviderCounts},
    types::{BlockId, CurveId},
};

/// Coordinates the advection of the integral curves of one process.
pub struct IcAlgorithm<'c, P, C> {
    provider: P,
    comm: &'c C,
    config: AlgorithmConfig,
    queues: CurveQueues,
    stats: AlgorithmStatistics,
    num_seed_points: usize,
    algorithm_name: String,
}

impl<'c, P: DomainProvider, C: Collective> IcAlgorithm<'c, P, C> {
    /// Create a new coordinator.
    pub fn new(provider: P, comm: &'c C, config: AlgorithmConfig) -> Self {
        Self {
            provider,
            comm,
            config,
            queues: CurveQueues::new(),
            stats: AlgorithmStatistics::new(),
            num_seed_points: 0,
            algorithm_name: String::new(),
        }
    }

    /// Return the domain provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Return the domain provider mutably.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Give up the coordinator and return the provider.
    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Return the communicator.
    pub fn comm(&self) -> &C {
        self.comm
    }

    /// Return the configuration.
    pub fn config(&self) -> &AlgorithmConfig {
        &self.config
    }

    /// Return the curve queues.
    pub fn queues(&self) -> &CurveQueues {
        &self.queues
    }

    /// Return the statistics.
    pub fn statistics(&self) -> &AlgorithmStatistics {
        &self.stats
    }

    /// Number of seeds handed to [IcAlgorithm::initialize].
    pub fn num_seed_points(&self) -> usize {
        self.num_seed_points
    }

    /// Name of the scheduling algorithm of the last execution.
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    /// Take the seed curves and prime the timers with the provider's start-up cost.
    pub fn initialize(&mut self, seeds: Vec<IntegralCurve>) {
        self.num_seed_points = seeds.len();

        let initial_io_time = self.provider.initial_io_time();
        self.stats.io_time.set(initial_io_time);
        self.stats.total_time.set(initial_io_time);
        self.stats
            .dom_load_cnt
            .set(self.provider.initial_dom_loads() as f64);

        for seed in seeds {
            self.queues.insert(seed, Queue::Active);
        }
    }

    /// Run one round: pre run, run and post run of `scheduler`.
    pub fn execute<S: Scheduler<P, C>>(&mut self, scheduler: &mut S) {
        self.algorithm_name = scheduler.name().to_string();

        let start = Instant::now();
        scheduler.pre_run(self);
        scheduler.run(self);
        scheduler.post_run(self);
        self.stats.total_time.add(start.elapsed().as_secs_f64());
    }

    /// Finalize all terminated curves.
    pub fn post_run_algorithm(&mut self) {
        let provider = &mut self.provider;
        self.queues.for_each_mut(Queue::Terminated, |curve| {
            provider.finalize_curve(curve);
            curve.finalize();
        });
    }

    /// Hand the terminated curves to the provider and write the report if enabled.
    pub fn post_execute(&mut self) -> Result<()> {
        debug!("IcAlgorithm::post_execute()");

        let curves = self.queues.drain(Queue::Terminated);
        self.provider.create_integral_curve_output(curves);

        if self.config.report_statistics {
            self.report_statistics()?;
        }
        Ok(())
    }

    /// Fetch the block a curve currently needs.
    ///
    /// Returns `None` if the curve has no candidate block or the block is not
    /// available. In that case the curve must not be advanced. On success the
    /// spatial boundary status of the curve is cleared.
    pub fn get_domain(&mut self, handle: CurveHandle) -> Option<P::Domain> {
        let curve = self.queues.get(handle)?;
        let block = *curve.current_block()?;
        let point = curve.location;

        let domain = self.get_domain_for(&block, &point);
        if domain.is_some() {
            if let Some(curve) = self.queues.get_mut(handle) {
                curve.clear_spatial_boundary();
            }
        }
        domain
    }

    /// Fetch `block` for a point, timing the call as IO.
    pub fn get_domain_for(&mut self, block: &BlockId, point: &Point) -> Option<P::Domain> {
        let start = Instant::now();
        let domain = self.provider.get_domain(block, point);
        self.stats.io_time.add(start.elapsed().as_secs_f64());
        domain
    }

    /// Advect a curve through its current block. Returns the steps taken.
    pub fn advect_particle(&mut self, handle: CurveHandle) -> usize {
        let Some(curve) = self.queues.get_mut(handle) else {
            return 0;
        };

        let start = Instant::now();
        let advection = self.provider.advect_particle(curve);
        self.stats
            .integrate_time
            .add(start.elapsed().as_secs_f64());
        self.stats.integrate_cnt.add(1.0);
        self.stats.integrate_step_cnt.add(advection.steps as f64);

        curve.apply_advection(advection.steps, advection.boundary);
        advection.steps
    }

    /// True if the provider holds `block` in its cache.
    pub fn domain_loaded(&self, block: &BlockId) -> bool {
        self.provider.domain_loaded(block)
    }

    /// Sort a queue for locality.
    pub fn sort_integral_curves(&mut self, queue: Queue) {
        let start = Instant::now();
        let provider = &self.provider;
        sort_queue(&mut self.queues, queue, |block| provider.domain_loaded(block));
        self.stats.sort_time.add(start.elapsed().as_secs_f64());
    }

    /// Sort curves held outside of the queues for locality.
    pub fn sort_curves<T: BorrowMut<IntegralCurve>>(&mut self, curves: &mut [T]) {
        let start = Instant::now();
        let provider = &self.provider;
        sort_by_locality(curves, |block| provider.domain_loaded(block));
        self.stats.sort_time.add(start.elapsed().as_secs_f64());
    }

    /// Move a curve to the back of `queue`.
    pub fn move_curve(&mut self, handle: CurveHandle, queue: Queue) -> bool {
        self.queues.move_to(handle, queue)
    }

    /// Mark a curve as finished and move it to the terminated queue.
    pub fn terminate_curve(&mut self, handle: CurveHandle) {
        if let Some(curve) = self.queues.get_mut(handle) {
            curve.terminate();
        }
        self.queues.move_to(handle, Queue::Terminated);
    }

    /// Park the current thread.
    pub fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Back off for the configured idle time.
    pub fn idle(&self) {
        self.sleep(self.config.idle_sleep);
    }

    /// The terminated curves in queue order.
    pub fn terminated_ics(&self) -> Vec<&IntegralCurve> {
        self.queues.iter(Queue::Terminated).collect()
    }

    /// Delete terminated curves by id. Unknown and repeated ids are ignored.
    pub fn delete_integral_curves(&mut self, ids: &[CurveId]) {
        for &id in ids {
            if let Some(handle) = self.queues.find(Queue::Terminated, id) {
                self.queues.remove(handle);
            }
        }
    }

    /// Recompute the block of terminated curves that wait in `time_slice`.
    ///
    /// The mesh may change between time slices, which invalidates the blocks
    /// the curves were assigned to.
    pub fn update_ics_domain(&mut self, time_slice: usize) {
        let provider = &mut self.provider;
        self.queues.for_each_mut(Queue::Terminated, |curve| {
            if curve
                .current_block()
                .is_some_and(|block| block.time_step == time_slice)
            {
                provider.set_domain(curve);
            }
        });
    }

    /// True if a curve on any process waits for the next time slice.
    pub fn check_next_time_step_needed(&self, time_slice: usize) -> bool {
        let local = self
            .queues
            .iter(Queue::Terminated)
            .any(|curve| curve.encountered_temporal_boundary());

        let needed = self.comm.any(local);
        trace!(
            "Time slice {}: next needed locally {}, globally {}.",
            time_slice,
            local,
            needed
        );
        needed
    }

    /// Move the curves waiting at the temporal boundary back to the active
    /// queue and let the provider find their blocks in the new time slice.
    pub fn activate_ics_for_next_time_step(&mut self) {
        let moved = self.queues.move_where(Queue::Terminated, Queue::Active, |curve| {
            curve.encountered_temporal_boundary()
        });

        for handle in moved {
            if let Some(curve) = self.queues.get_mut(handle) {
                curve.clear_temporal_boundary();
                self.provider.find_candidate_blocks(curve);
            }
        }
    }

    /// Move every terminated curve back to the active queue.
    ///
    /// Used to continue a run after a global synchronization. Not to be
    /// combined with [IcAlgorithm::activate_ics_for_next_time_step] in the
    /// same round.
    pub fn reset_integral_curves_for_continue_execute(&mut self) {
        self.queues
            .for_each_mut(Queue::Terminated, |curve| curve.reactivate());
        self.queues.move_all(Queue::Terminated, Queue::Active);
    }

    /// Run rounds over the time slices `first..=last` until no process needs
    /// the next slice. Returns the last time slice that was executed.
    pub fn execute_time_slices<S: Scheduler<P, C>>(
        &mut self,
        scheduler: &mut S,
        first: usize,
        last: usize,
    ) -> usize {
        let mut time_slice = first;
        self.provider.set_time_slice(time_slice);

        loop {
            self.execute(scheduler);

            if time_slice >= last || !self.check_next_time_step_needed(time_slice) {
                break;
            }

            time_slice += 1;
            info!("Continuing with time slice {}.", time_slice);

            self.provider.set_time_slice(time_slice);
            self.update_ics_domain(time_slice);
            self.activate_ics_for_next_time_step();
        }

        time_slice
    }

    /// String of the curves of a queue, for debugging.
    pub fn queue_info(&self, queue: Queue) -> String {
        let curves = self
            .queues
            .iter(queue)
            .map(|curve| match queue {
                Queue::Terminated => format!(
                    "({}:{},{} {} ) ",
                    curve.id(),
                    curve.location,
                    curve.time,
                    curve.status()
                ),
                _ => format!("{} ", curve),
            })
            .join("");

        let info = format!("[{}]", curves);
        trace!("{:?} curves: {}", queue, info);
        info
    }

    /// Zero all timers and counters so that the next round is reported on its own.
    ///
    /// Compiled statistics are frozen until this is called. Like the compile
    /// itself it must be called on all processes.
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    /// Reduce all statistics over the processes. Only the first call after
    /// construction or [IcAlgorithm::reset_statistics] has an effect.
    pub fn compile_algorithm_statistics(&mut self) {
        let counts = ProviderCounts {
            domain_load_count: self.provider.domain_load_count(),
            num_domains: self.provider.num_domains(),
            load_ds_count: self.provider.load_ds_count(),
            purge_ds_count: self.provider.purge_ds_count(),
        };
        self.stats.compile(self.comm, &counts);
    }

    /// The header of the statistics report.
    pub fn report_header(&self) -> ReportHeader {
        ReportHeader {
            algorithm_name: self.algorithm_name.clone(),
            n_procs: self.comm.size(),
            num_domains: self.provider.num_domains(),
            num_seed_points: self.num_seed_points,
            settings: self.provider.settings(),
        }
    }

    /// Compile the statistics and write the report to `out`.
    pub fn report_statistics_to<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.compile_algorithm_statistics();
        write_report(out, &self.report_header(), &self.stats)
    }

    /// Compile the statistics and write the report files.
    ///
    /// Every process writes `timings<rank>.txt` into the report directory.
    /// The coordinating process also prints the report to stdout and, in
    /// multi-process runs, writes the counter histograms.
    pub fn report_statistics(&mut self) -> Result<()> {
        self.compile_algorithm_statistics();

        let dir = self.config.report_dir.clone();
        std::fs::create_dir_all(&dir).map_err(|source| Error::Report {
            path: dir.clone(),
            source,
        })?;

        let header = self.report_header();
        let path = dir.join(timings_file_name(self.comm.rank()));
        write_file(&path, |out| write_report(out, &header, &self.stats))?;

        if self.comm.is_root() {
            write_report(&mut std::io::stdout().lock(), &header, &self.stats)?;

            if self.comm.size() > 1 && self.config.write_histograms {
                write_histograms(&dir, &self.stats)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::time::{Duration, Instant};

    use itertools::Itertools;

    use super::IcAlgorithm;
    use crate::{
        comm::SingleProcess,
        config::AlgorithmConfig,
        curve::{CurveStatus, IntegralCurve},
        geometry::Point,
        provider::{Advection, Boundary, DomainProvider, ProviderSettings},
        queues::Queue,
        types::BlockId,
    };

    /// Serves every domain below `num_domains` and moves curves by a fixed script.
    struct Scripted {
        num_domains: usize,
        resident: Vec<BlockId>,
        next: Advection,
        candidates: usize,
        output: Vec<IntegralCurve>,
        loads: BTreeMap<usize, u64>,
    }

    impl DomainProvider for Scripted {
        type Domain = BlockId;

        fn get_domain(&mut self, block: &BlockId, _point: &Point) -> Option<BlockId> {
            (block.domain < self.num_domains).then_some(*block)
        }

        fn advect_particle(&mut self, curve: &mut IntegralCurve) -> Advection {
            curve.time += 1.0;
            self.next
        }

        fn find_candidate_blocks(&mut self, curve: &mut IntegralCurve) {
            self.candidates += 1;
            curve.block_list.push_back(BlockId::new(0, 1));
        }

        fn set_domain(&mut self, curve: &mut IntegralCurve) {
            curve.block_list.clear();
            curve.block_list.push_back(BlockId::new(1, 1));
        }

        fn domain_loaded(&self, block: &BlockId) -> bool {
            self.resident.contains(block)
        }

        fn create_integral_curve_output(&mut self, curves: Vec<IntegralCurve>) {
            self.output.extend(curves);
        }

        fn domain_load_count(&self) -> &BTreeMap<usize, u64> {
            &self.loads
        }

        fn load_ds_count(&self) -> u64 {
            3
        }

        fn purge_ds_count(&self) -> u64 {
            1
        }

        fn num_domains(&self) -> usize {
            self.num_domains
        }

        fn settings(&self) -> ProviderSettings {
            ProviderSettings {
                input_name: "scripted".to_string(),
                max_count: 10,
                cache_q_len: 2,
                work_group_size: 0,
            }
        }

        fn initial_io_time(&self) -> f64 {
            0.5
        }

        fn initial_dom_loads(&self) -> u64 {
            2
        }
    }

    fn curve(id: usize, domain: Option<usize>) -> IntegralCurve {
        let location = Point::new([id as f64, 0.0, 0.0]);
        match domain {
            Some(domain) => IntegralCurve::with_block(id, location, 0.0, BlockId::new(domain, 0)),
            None => IntegralCurve::new(id, location, 0.0),
        }
    }

    fn ids<P: DomainProvider>(algo: &IcAlgorithm<P, SingleProcess>, queue: Queue) -> Vec<usize> {
        algo.queues().iter(queue).map(|c| c.id()).collect_vec()
    }

    fn coordinator(comm: &SingleProcess) -> IcAlgorithm<'_, Scripted, SingleProcess> {
        let provider = Scripted {
            num_domains: 4,
            resident: Vec::new(),
            next: Advection::new(1, Boundary::None),
            candidates: 0,
            output: Vec::new(),
            loads: BTreeMap::new(),
        };
        IcAlgorithm::new(provider, comm, AlgorithmConfig::default())
    }

    #[test]
    fn test_initialize() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize((0..3).map(|id| curve(id, Some(0))).collect());

        assert_eq!(algo.num_seed_points(), 3);
        assert_eq!(ids(&algo, Queue::Active), vec![0, 1, 2]);
        assert_eq!(algo.statistics().io_time.local_value(), 0.5);
        assert_eq!(algo.statistics().total_time.local_value(), 0.5);
        assert_eq!(algo.statistics().dom_load_cnt.local_value(), 2.0);
    }

    #[test]
    fn test_get_domain() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize(vec![curve(0, None), curve(1, Some(7)), curve(2, Some(3))]);
        let handles = algo.queues().handles(Queue::Active).iter().copied().collect_vec();

        // No candidate block and an unavailable block both yield nothing.
        assert!(algo.get_domain(handles[0]).is_none());
        assert!(algo.get_domain(handles[1]).is_none());

        let advection = Advection::new(4, Boundary::Spatial);
        algo.provider_mut().next = advection;
        assert_eq!(algo.advect_particle(handles[2]), 4);
        assert_eq!(
            algo.queues().get(handles[2]).map(|c| c.status()),
            Some(CurveStatus::AtSpatialBoundary)
        );

        assert_eq!(algo.get_domain(handles[2]), Some(BlockId::new(3, 0)));
        assert_eq!(
            algo.queues().get(handles[2]).map(|c| c.status()),
            Some(CurveStatus::Active)
        );

        assert_eq!(algo.statistics().integrate_cnt.local_value(), 1.0);
        assert_eq!(algo.statistics().integrate_step_cnt.local_value(), 4.0);
    }

    #[test]
    fn test_sort_integral_curves() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.provider_mut().resident = vec![BlockId::new(2, 0)];
        algo.initialize(vec![
            curve(0, Some(3)),
            curve(1, Some(2)),
            curve(2, None),
            curve(3, Some(1)),
            curve(4, Some(2)),
        ]);

        algo.sort_integral_curves(Queue::Active);

        assert_eq!(ids(&algo, Queue::Active), vec![2, 1, 4, 3, 0]);
        let keys = algo.queues().iter(Queue::Active).map(|c| c.sort_key()).collect_vec();
        assert_eq!(keys, vec![-1, -2, -2, 1, 3]);
    }

    #[test]
    fn test_delete_integral_curves() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize((0..5).map(|id| curve(id, Some(0))).collect());
        let handles = algo.queues().handles(Queue::Active).iter().copied().collect_vec();
        for handle in handles {
            algo.terminate_curve(handle);
        }

        // Repeated and unknown ids are ignored.
        algo.delete_integral_curves(&[1, 3, 3, 42]);

        assert_eq!(ids(&algo, Queue::Terminated), vec![0, 2, 4]);
        assert_eq!(algo.terminated_ics().len(), 3);
    }

    #[test]
    fn test_handles_of_deleted_curves_stay_dead() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize(vec![curve(0, Some(0))]);
        let old = algo.queues().front(Queue::Active).unwrap();
        algo.terminate_curve(old);
        algo.post_execute().unwrap();

        // The new seed takes over the slot of the handed over curve.
        algo.initialize(vec![curve(1, Some(0))]);

        assert!(!algo.move_curve(old, Queue::Terminated));
        algo.terminate_curve(old);
        assert_eq!(algo.advect_particle(old), 0);
        assert!(algo.get_domain(old).is_none());

        assert_eq!(ids(&algo, Queue::Active), vec![1]);
        assert!(algo.queues().is_empty(Queue::Terminated));
        assert_eq!(algo.statistics().integrate_cnt.local_value(), 0.0);
        let survivor = algo.queues().front(Queue::Active).unwrap();
        assert_eq!(
            algo.queues().get(survivor).map(|c| c.status()),
            Some(CurveStatus::Active)
        );
    }

    #[test]
    fn test_reset_for_continue_execute() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize((0..6).map(|id| curve(id, Some(0))).collect());
        for id in [1, 4, 5] {
            let handle = algo.queues().find(Queue::Active, id).unwrap();
            algo.terminate_curve(handle);
        }

        algo.reset_integral_curves_for_continue_execute();

        assert!(algo.queues().is_empty(Queue::Terminated));
        let active = ids(&algo, Queue::Active);
        assert_eq!(active, vec![0, 2, 3, 1, 4, 5]);
        for curve in algo.queues().iter(Queue::Active) {
            assert_eq!(curve.status(), CurveStatus::Active);
        }
    }

    #[test]
    fn test_activate_for_next_time_step() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize((0..4).map(|id| curve(id, Some(0))).collect());
        let handles = algo.queues().handles(Queue::Active).iter().copied().collect_vec();

        algo.provider_mut().next = Advection::new(1, Boundary::Temporal);
        for &handle in &handles[..2] {
            algo.advect_particle(handle);
            algo.move_curve(handle, Queue::Terminated);
        }
        algo.provider_mut().next = Advection::new(1, Boundary::None);
        for &handle in &handles[2..] {
            algo.advect_particle(handle);
            algo.move_curve(handle, Queue::Terminated);
        }

        assert!(algo.check_next_time_step_needed(0));

        algo.update_ics_domain(0);
        algo.activate_ics_for_next_time_step();

        assert_eq!(ids(&algo, Queue::Active), vec![0, 1]);
        assert_eq!(ids(&algo, Queue::Terminated), vec![2, 3]);
        assert_eq!(algo.provider().candidates, 2);
        for curve in algo.queues().iter(Queue::Active) {
            assert_eq!(curve.status(), CurveStatus::Active);
            assert_eq!(curve.block_list.back(), Some(&BlockId::new(0, 1)));
        }
        assert!(!algo.check_next_time_step_needed(1));

        let mut seen = algo
            .queues()
            .handles(Queue::Active)
            .iter()
            .chain(algo.queues().handles(Queue::Inactive))
            .chain(algo.queues().handles(Queue::Terminated))
            .collect_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), algo.queues().total_len());
    }

    #[test]
    fn test_update_ics_domain() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize(vec![
            IntegralCurve::with_block(0, Point::default(), 0.0, BlockId::new(0, 1)),
            IntegralCurve::with_block(1, Point::default(), 0.0, BlockId::new(0, 0)),
        ]);
        let handles = algo.queues().handles(Queue::Active).iter().copied().collect_vec();
        for handle in handles {
            algo.move_curve(handle, Queue::Terminated);
        }

        algo.update_ics_domain(1);

        let blocks = algo
            .queues()
            .iter(Queue::Terminated)
            .map(|c| c.current_block().copied())
            .collect_vec();
        assert_eq!(
            blocks,
            vec![Some(BlockId::new(1, 1)), Some(BlockId::new(0, 0))]
        );
    }

    #[test]
    fn test_post_execute_hands_over_curves() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize((0..3).map(|id| curve(id, Some(0))).collect());
        let handles = algo.queues().handles(Queue::Active).iter().copied().collect_vec();
        for handle in handles {
            algo.terminate_curve(handle);
        }
        algo.post_run_algorithm();

        algo.post_execute().unwrap();

        assert_eq!(algo.queues().total_len(), 0);
        let output = &algo.provider().output;
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|c| c.is_finalized()));
    }

    #[test]
    fn test_idle_sleeps_configured_time() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.config = AlgorithmConfig::default().with_idle_sleep(Duration::from_millis(2));

        let start = Instant::now();
        algo.idle();
        assert!(start.elapsed() >= Duration::from_millis(2));
    }

    #[test]
    fn test_queue_info() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize(vec![curve(0, Some(0)), curve(1, Some(0))]);
        let handle = algo.queues().find(Queue::Active, 1).unwrap();
        algo.terminate_curve(handle);

        assert_eq!(
            algo.queue_info(Queue::Active),
            "[(0 (0, 0, 0) 0) ]".to_string()
        );
        assert_eq!(
            algo.queue_info(Queue::Terminated),
            "[(1:(1, 0, 0),0 terminated ) ]".to_string()
        );
        assert_eq!(algo.queue_info(Queue::Inactive), "[]".to_string());
    }

    #[test]
    fn test_reset_statistics_rearms_compile() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize(vec![curve(0, Some(0))]);
        let handle = algo.queues().front(Queue::Active).unwrap();

        algo.advect_particle(handle);
        algo.compile_algorithm_statistics();
        assert_eq!(algo.statistics().integrate_cnt.total, 1.0);

        // Compiled numbers stay frozen.
        algo.advect_particle(handle);
        algo.compile_algorithm_statistics();
        assert_eq!(algo.statistics().integrate_cnt.total, 1.0);

        algo.reset_statistics();
        assert!(!algo.statistics().is_compiled());
        for _ in 0..3 {
            algo.advect_particle(handle);
        }
        algo.compile_algorithm_statistics();
        assert_eq!(algo.statistics().integrate_cnt.total, 3.0);
        assert_eq!(algo.statistics().integrate_step_cnt.total, 3.0);
    }

    #[test]
    fn test_report_statistics_to() {
        let comm = SingleProcess;
        let mut algo = coordinator(&comm);
        algo.initialize(vec![curve(0, Some(0))]);

        let mut out = Vec::new();
        algo.report_statistics_to(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(algo.statistics().is_compiled());
        assert!(report.contains("File= scripted"));
        assert!(report.contains("nCPUs= 1 nDom= 4 nPts= 1"));
        assert!(report.contains("maxCount= 10 domCache= 2 workGrp=  0"));
        // The initial loads plus the loads reported by the provider.
        assert_eq!(algo.statistics().dom_load_cnt.total, 5.0);
        assert_eq!(algo.statistics().dom_purge_cnt.total, 1.0);
    }
}
