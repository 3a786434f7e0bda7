//! The interface to the component that owns the data.
//!
//! A domain provider loads and purges blocks, keeps the domain cache and
//! performs the actual integration of a curve through a block. The
//! coordinator never touches the cache itself; it only asks about residency
//! and reads the counters for the statistics report.

use std::collections::BTreeMap;

use crate::{curve::IntegralCurve, geometry::Point, types::BlockId};

/// The boundary a curve ran into while it was integrated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// No boundary was hit. The curve stopped because it is finished,
    /// e.g. it exhausted its step budget or left the dataset.
    None,
    /// The curve left its block. Its block list holds the next candidates.
    Spatial,
    /// The curve reached the end of the loaded time slice.
    Temporal,
}

/// Result of advecting one curve through one block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Advection {
    /// Number of integration steps taken.
    pub steps: usize,
    /// Why the integration stopped.
    pub boundary: Boundary,
}

impl Advection {
    /// Create a new advection result.
    pub fn new(steps: usize, boundary: Boundary) -> Self {
        Self { steps, boundary }
    }
}

/// Static configuration of a provider, printed in the report header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Name of the input dataset.
    pub input_name: String,
    /// Maximum number of curves handled at once.
    pub max_count: usize,
    /// Capacity of the domain cache.
    pub cache_q_len: usize,
    /// Number of curves worked on as one group. Zero means unbounded.
    pub work_group_size: usize,
}

/// Supplies domains and integrates curves through them.
pub trait DomainProvider {
    /// A loaded block of data.
    type Domain;

    /// Return the block `block` containing `point`, loading it if necessary.
    ///
    /// `None` means the block is not available to this process.
    fn get_domain(&mut self, block: &BlockId, point: &Point) -> Option<Self::Domain>;

    /// Integrate `curve` through its current block.
    ///
    /// The provider moves the trace head and updates the block list. The
    /// curve status is left to the coordinator, which applies the returned
    /// [Advection].
    fn advect_particle(&mut self, curve: &mut IntegralCurve) -> Advection;

    /// Repopulate the block list of a curve, e.g. for a new time slice.
    fn find_candidate_blocks(&mut self, curve: &mut IntegralCurve);

    /// Recompute the current block of a curve from its location.
    ///
    /// Needed when the mesh changes between time slices.
    fn set_domain(&mut self, curve: &mut IntegralCurve);

    /// True if `block` is currently held in the domain cache.
    fn domain_loaded(&self, block: &BlockId) -> bool;

    /// Take ownership of the finished curves for output construction.
    fn create_integral_curve_output(&mut self, curves: Vec<IntegralCurve>);

    /// Post-run processing of a terminated curve.
    fn finalize_curve(&mut self, _curve: &mut IntegralCurve) {}

    /// Make `time_slice` the current time slice.
    fn set_time_slice(&mut self, _time_slice: usize) {}

    /// How often each domain was loaded, by domain id.
    fn domain_load_count(&self) -> &BTreeMap<usize, u64>;

    /// Number of block loads since the last statistics compile.
    fn load_ds_count(&self) -> u64;

    /// Number of block purges since the last statistics compile.
    fn purge_ds_count(&self) -> u64;

    /// Number of spatial domains in the dataset.
    fn num_domains(&self) -> usize;

    /// Static settings of the provider.
    fn settings(&self) -> ProviderSettings;

    /// Time spent on IO before the coordinator was started.
    fn initial_io_time(&self) -> f64 {
        0.0
    }

    /// Number of domains loaded before the coordinator was started.
    fn initial_dom_loads(&self) -> u64 {
        0
    }
}
