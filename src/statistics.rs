//! Timing and counter statistics of an advection run.
//!
//! Every [Statistic] holds the reading of this process in `value`. Once a run
//! is done the statistic is reduced over all processes into total, min, max,
//! mean, population standard deviation and a sorted histogram of the
//! per-process readings. Readings that are absent or negative do not take
//! part in the reduction.

use std::collections::BTreeMap;
use std::fmt::Display;

use itertools::{izip, Itertools};
use log::{debug, trace};

use crate::comm::{one_hot, Collective};

/// A named running statistic.
#[derive(Clone, Debug, PartialEq)]
pub struct Statistic {
    name: &'static str,
    /// Reading of this process. `None` marks it as not applicable.
    pub value: Option<f64>,
    /// Sum over all included processes.
    pub total: f64,
    /// Smallest included reading.
    pub min: f64,
    /// Largest included reading.
    pub max: f64,
    /// Mean over included readings.
    pub mean: f64,
    /// Population standard deviation over included readings.
    pub sigma: f64,
    /// The included readings in ascending order.
    pub histogram: Vec<f64>,
}

impl Statistic {
    /// Create a zeroed statistic.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: Some(0.0),
            total: 0.0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            sigma: 0.0,
            histogram: Vec::new(),
        }
    }

    /// Return the name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add `amount` to the reading of this process.
    pub fn add(&mut self, amount: f64) {
        *self.value.get_or_insert(0.0) += amount;
    }

    /// Overwrite the reading of this process.
    pub fn set(&mut self, value: f64) {
        self.value = Some(value);
    }

    /// Exclude this process from the reduction.
    pub fn set_not_applicable(&mut self) {
        self.value = None;
    }

    /// The reading of this process, with excluded readings shown as zero.
    pub fn local_value(&self) -> f64 {
        applicable(self.value).unwrap_or(0.0)
    }

    /// Zero the statistic so that it can be accumulated and reduced again.
    pub fn reset(&mut self) {
        *self = Self::new(self.name);
    }

    /// Reduction for a run with a single process.
    pub fn compute_local(&mut self) {
        let value = self.value.unwrap_or(0.0);
        self.min = value;
        self.max = value;
        self.mean = value;
        self.sigma = 0.0;
        self.total = value;
    }

    /// Reduction over the readings of all processes, one entry per rank.
    pub fn compute_from_gathered(&mut self, gathered: &[Option<f64>]) {
        let mut included = gathered
            .iter()
            .filter_map(|&value| applicable(value))
            .collect_vec();
        let count = included.len();

        self.total = included.iter().sum();

        if count == 0 {
            self.mean = self.value.unwrap_or(0.0);
        } else {
            self.mean = self.total / count as f64;

            let variance = included
                .iter()
                .map(|x| (x - self.mean) * (x - self.mean))
                .sum::<f64>()
                / count as f64;
            self.sigma = if variance > 0.0 { variance.sqrt() } else { 0.0 };
        }

        included.sort_by(f64::total_cmp);
        if let (Some(&first), Some(&last)) = (included.first(), included.last()) {
            self.min = first;
            self.max = last;
        }
        self.histogram = included;
    }

    /// Reduce the statistic over all processes of `comm`.
    pub fn compute<C: Collective>(&mut self, comm: &C) {
        let size = comm.size();
        if size == 1 {
            self.compute_local();
            return;
        }

        let rank = comm.rank();
        let (value, present) = match self.value {
            Some(value) => (value, 1_u64),
            None => (0.0, 0_u64),
        };

        let values = comm.sum_f64_array(&one_hot(size, rank, value));
        let present = comm.sum_u64_array(&one_hot(size, rank, present));

        let gathered = izip!(values, present)
            .map(|(value, present)| (present > 0).then_some(value))
            .collect_vec();

        self.compute_from_gathered(&gathered);
    }
}

impl Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} V: {} {} [{}, {}, {} : {}]",
            self.name,
            self.local_value(),
            self.total,
            self.min,
            self.max,
            self.mean,
            self.sigma
        )
    }
}

// Negative readings are treated like absent ones.
fn applicable(value: Option<f64>) -> Option<f64> {
    value.filter(|&x| x >= 0.0)
}

/// Summary of how often domains were loaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainLoads {
    /// Number of domains loaded at least once.
    pub domains_used: usize,
    /// Total number of loads.
    pub total_loaded: u64,
    /// Fewest loads of a used domain.
    pub min_loaded: u64,
    /// Most loads of a used domain.
    pub max_loaded: u64,
    /// Average loads per used domain.
    pub avg_loaded: f64,
}

impl DomainLoads {
    fn from_counts<I: Iterator<Item = u64>>(counts: I) -> Self {
        let mut loads = Self::default();

        for count in counts {
            if loads.domains_used == 0 {
                loads.min_loaded = count;
                loads.max_loaded = count;
            } else {
                loads.min_loaded = loads.min_loaded.min(count);
                loads.max_loaded = loads.max_loaded.max(count);
            }
            loads.domains_used += 1;
            loads.total_loaded += count;
        }

        if loads.total_loaded > 0 {
            loads.avg_loaded = loads.total_loaded as f64 / loads.domains_used as f64;
        }

        loads
    }
}

/// Domain load summary for this process and for the whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainLoadStatistics {
    /// Loads seen by this process.
    pub local: DomainLoads,
    /// Loads summed over all processes.
    pub global: DomainLoads,
}

impl DomainLoadStatistics {
    /// Summarize the per-domain load counts of a provider.
    ///
    /// Counts of domain ids outside `0..num_domains` are ignored.
    pub fn compute<C: Collective>(
        domain_load_count: &BTreeMap<usize, u64>,
        num_domains: usize,
        comm: &C,
    ) -> Self {
        let mut dom_loads = vec![0_u64; num_domains];

        let in_range = domain_load_count
            .iter()
            .filter(|&(&domain, _)| {
                if domain >= num_domains {
                    trace!(
                        "Ignoring load count of domain {} (only {} domains).",
                        domain,
                        num_domains
                    );
                }
                domain < num_domains
            })
            .map(|(&domain, &count)| {
                dom_loads[domain] = count;
                count
            })
            .collect_vec();

        let local = DomainLoads::from_counts(in_range.into_iter());

        debug!("Local Dom report:");
        for (domain, count) in dom_loads.iter().enumerate() {
            debug!("{:>3}: {}", domain, count);
        }

        if comm.size() == 1 {
            return Self {
                global: local.clone(),
                local,
            };
        }

        let sums = comm.sum_u64_array(&dom_loads);

        debug!("Global Dom report:");
        for (domain, count) in sums.iter().enumerate() {
            debug!("{:>3}: {}", domain, count);
        }

        let global = DomainLoads::from_counts(sums.into_iter().filter(|&count| count != 0));

        Self { local, global }
    }
}

/// All statistics gathered by the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmStatistics {
    /// Wall time of the run.
    pub total_time: Statistic,
    /// Time spent fetching domains.
    pub io_time: Statistic,
    /// Time spent integrating.
    pub integrate_time: Statistic,
    /// Time spent sorting.
    pub sort_time: Statistic,
    /// Time not accounted for by the other timers.
    pub extra_time: Statistic,
    /// Number of calls into the integrator.
    pub integrate_cnt: Statistic,
    /// Number of integration steps.
    pub integrate_step_cnt: Statistic,
    /// Number of domain loads.
    pub dom_load_cnt: Statistic,
    /// Number of domain purges.
    pub dom_purge_cnt: Statistic,
    /// Per-domain load summary.
    pub domain_loads: DomainLoadStatistics,
    compiled: bool,
}

impl Default for AlgorithmStatistics {
    fn default() -> Self {
        Self {
            total_time: Statistic::new("TotalTime"),
            io_time: Statistic::new("IOTime"),
            integrate_time: Statistic::new("IntegrateTime"),
            sort_time: Statistic::new("SortTime"),
            extra_time: Statistic::new("ExtraTime"),
            integrate_cnt: Statistic::new("IntegrateCnt"),
            integrate_step_cnt: Statistic::new("IntegrateStepCnt"),
            dom_load_cnt: Statistic::new("DomLoadCnt"),
            dom_purge_cnt: Statistic::new("DomPurgeCnt"),
            domain_loads: DomainLoadStatistics::default(),
            compiled: false,
        }
    }
}

impl AlgorithmStatistics {
    /// Create zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the statistics have been reduced.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Zero all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Derive the extra time from the other timers.
    ///
    /// Timers with a non-positive reading are not subtracted.
    pub fn calculate_extra_time(&mut self) {
        let mut extra = self.total_time.value.unwrap_or(0.0);
        for timer in [&self.io_time, &self.integrate_time, &self.sort_time] {
            if let Some(value) = timer.value.filter(|&v| v > 0.0) {
                extra -= value;
            }
        }
        self.extra_time.set(extra);
    }

    /// Reduce the timers.
    pub fn compile_timing_statistics<C: Collective>(&mut self, comm: &C) {
        self.total_time.compute(comm);
        self.io_time.compute(comm);
        self.integrate_time.compute(comm);
        self.sort_time.compute(comm);
    }

    /// Reduce the counters, adding the load and purge counts of the provider.
    pub fn compile_counter_statistics<C: Collective>(
        &mut self,
        comm: &C,
        loads: &ProviderCounts,
    ) {
        self.integrate_cnt.compute(comm);
        self.integrate_step_cnt.compute(comm);
        self.dom_load_cnt.add(loads.load_ds_count as f64);
        self.dom_purge_cnt.add(loads.purge_ds_count as f64);
        self.dom_load_cnt.compute(comm);
        self.dom_purge_cnt.compute(comm);

        self.domain_loads =
            DomainLoadStatistics::compute(loads.domain_load_count, loads.num_domains, comm);
    }

    /// Reduce every statistic. Does nothing if already compiled.
    pub fn compile<C: Collective>(&mut self, comm: &C, loads: &ProviderCounts) {
        if self.compiled {
            return;
        }

        self.compile_timing_statistics(comm);
        self.compile_counter_statistics(comm, loads);

        // The extra time needs the final readings of the other timers.
        self.calculate_extra_time();
        self.extra_time.compute(comm);

        self.compiled = true;
    }
}

/// Counters read from the domain provider when compiling statistics.
pub struct ProviderCounts<'a> {
    /// Loads per domain id.
    pub domain_load_count: &'a BTreeMap<usize, u64>,
    /// Number of domains of the dataset.
    pub num_domains: usize,
    /// Block loads of the run.
    pub load_ds_count: u64,
    /// Block purges of the run.
    pub purge_ds_count: u64,
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::thread;

    use super::{AlgorithmStatistics, DomainLoadStatistics, ProviderCounts, Statistic};
    use crate::comm::{Collective, SingleProcess, ThreadGroup};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "{} != {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_single_process_statistic() {
        let mut stat = Statistic::new("IOTime");
        stat.add(1.5);
        stat.add(2.0);
        stat.compute(&SingleProcess);

        assert_eq!(stat.total, 3.5);
        assert_eq!(stat.min, 3.5);
        assert_eq!(stat.max, 3.5);
        assert_eq!(stat.mean, 3.5);
        assert_eq!(stat.sigma, 0.0);
    }

    #[test]
    fn test_gathered_statistic() {
        let mut stat = Statistic::new("IntegrateCnt");
        stat.compute_from_gathered(&[Some(2.0), Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)]);

        assert_close(stat.total, 40.0);
        assert_close(stat.mean, 5.0);
        assert_close(stat.sigma, 2.0);
        assert_eq!(stat.min, 2.0);
        assert_eq!(stat.max, 9.0);
        assert_eq!(stat.histogram, vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_excluded_entries() {
        let mut stat = Statistic::new("SortTime");
        stat.compute_from_gathered(&[Some(-1.0), Some(6.0), None, Some(4.0)]);

        assert_close(stat.total, 10.0);
        assert_close(stat.mean, 5.0);
        assert_close(stat.sigma, 1.0);
        assert_eq!(stat.histogram, vec![4.0, 6.0]);
        assert_eq!((stat.min, stat.max), (4.0, 6.0));
    }

    #[test]
    fn test_no_participants() {
        let mut stat = Statistic::new("IOTime");
        stat.set(3.0);
        stat.compute_from_gathered(&[None, Some(-1.0)]);

        assert_eq!(stat.total, 0.0);
        assert_eq!(stat.mean, 3.0);
        assert_eq!(stat.sigma, 0.0);
        assert!(stat.histogram.is_empty());
    }

    #[test]
    fn test_extra_time() {
        let mut stats = AlgorithmStatistics::new();
        stats.total_time.set(10.0);
        stats.io_time.set(3.0);
        stats.integrate_time.set(2.0);
        stats.sort_time.set(1.0);
        stats.calculate_extra_time();
        assert_eq!(stats.extra_time.value, Some(4.0));

        stats.io_time.set(0.0);
        stats.calculate_extra_time();
        assert_eq!(stats.extra_time.value, Some(7.0));
    }

    #[test]
    fn test_domain_loads_single_process() {
        let counts: BTreeMap<usize, u64> = [(0, 3), (2, 1), (3, 5), (17, 9)].into_iter().collect();
        let loads = DomainLoadStatistics::compute(&counts, 4, &SingleProcess);

        assert_eq!(loads.local.domains_used, 3);
        assert_eq!(loads.local.total_loaded, 9);
        assert_eq!(loads.local.min_loaded, 1);
        assert_eq!(loads.local.max_loaded, 5);
        assert_close(loads.local.avg_loaded, 3.0);
        assert_eq!(loads.global, loads.local);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let counts = BTreeMap::new();
        let provider_counts = ProviderCounts {
            domain_load_count: &counts,
            num_domains: 0,
            load_ds_count: 4,
            purge_ds_count: 1,
        };

        let mut stats = AlgorithmStatistics::new();
        stats.total_time.set(2.0);
        stats.compile(&SingleProcess, &provider_counts);
        stats.compile(&SingleProcess, &provider_counts);

        assert!(stats.is_compiled());
        assert_eq!(stats.dom_load_cnt.total, 4.0);
        assert_eq!(stats.dom_purge_cnt.total, 1.0);
        assert_eq!(stats.extra_time.total, 2.0);

        stats.reset();
        assert!(!stats.is_compiled());
        assert_eq!(stats.dom_load_cnt.value, Some(0.0));
    }

    #[test]
    fn test_multi_process_compute() {
        let handles = ThreadGroup::create(3)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let mut stat = Statistic::new("IntegrateTime");
                    match comm.rank() {
                        0 => stat.set_not_applicable(),
                        1 => stat.set(4.0),
                        _ => stat.set(6.0),
                    }
                    stat.compute(&comm);

                    let counts: BTreeMap<usize, u64> =
                        [(comm.rank(), 2), (3, 1)].into_iter().collect();
                    let loads = DomainLoadStatistics::compute(&counts, 5, &comm);

                    (stat, loads)
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            let (stat, loads) = handle.join().unwrap();
            assert_close(stat.total, 10.0);
            assert_close(stat.mean, 5.0);
            assert_eq!(stat.histogram, vec![4.0, 6.0]);

            // Domains 0, 1, 2 loaded twice, domain 3 once on every rank.
            assert_eq!(loads.local.domains_used, 2);
            assert_eq!(loads.global.domains_used, 4);
            assert_eq!(loads.global.total_loaded, 9);
            assert_eq!(loads.global.min_loaded, 2);
            assert_eq!(loads.global.max_loaded, 3);
            assert_close(loads.global.avg_loaded, 2.25);
        }
    }
}
