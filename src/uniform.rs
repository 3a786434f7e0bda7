//! A self-contained domain provider on a regular block decomposition.
//!
//! The dataset is a box split into `n x n x n` blocks over a number of equally
//! long time slices. Velocities come from an analytic field and curves are
//! stepped with forward Euler. Blocks are held in a least recently used cache
//! of bounded length.

use std::collections::{BTreeMap, VecDeque};

use log::trace;

use crate::{
    curve::IntegralCurve,
    geometry::{PhysicalBox, Point},
    provider::{Advection, Boundary, DomainProvider, ProviderSettings},
    types::BlockId,
};

/// Relative tolerance when comparing a curve time with the end of a time slice.
const TIME_TOLERANCE: f64 = 1E-12;

/// A steady velocity field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VelocityField {
    /// The same velocity everywhere.
    Constant([f64; 3]),
    /// Rigid rotation about the z-parallel axis through `center`.
    Vortex {
        /// Axis position in the xy plane.
        center: [f64; 2],
        /// Angular speed in radians per unit time.
        angular_speed: f64,
    },
}

impl VelocityField {
    /// Velocity at `point`.
    pub fn velocity(&self, point: &Point) -> [f64; 3] {
        match *self {
            VelocityField::Constant(velocity) => velocity,
            VelocityField::Vortex {
                center,
                angular_speed,
            } => {
                let [x, y, _] = point.coords();
                [
                    -angular_speed * (y - center[1]),
                    angular_speed * (x - center[0]),
                    0.0,
                ]
            }
        }
    }
}

/// A loaded block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UniformBlock {
    /// Id of the block.
    pub id: BlockId,
    /// Extent of the block.
    pub bounds: PhysicalBox,
}

/// Domain provider over a uniformly decomposed box.
pub struct UniformFieldProvider {
    bounding_box: PhysicalBox,
    blocks_per_axis: usize,
    field: VelocityField,
    num_time_slices: usize,
    slice_duration: f64,
    step_size: f64,
    max_steps: usize,
    time_slice: usize,
    cache: VecDeque<BlockId>,
    cache_len: usize,
    domain_loads: BTreeMap<usize, u64>,
    load_count: u64,
    purge_count: u64,
    max_count: usize,
    work_group_size: usize,
    output: Vec<IntegralCurve>,
}

impl UniformFieldProvider {
    /// Split the unit cube into `blocks_per_axis^3` blocks.
    ///
    /// Defaults to a single unbounded time slice, a step size of 0.01, at most
    /// 1000 steps per curve and a cache of four blocks.
    pub fn new(blocks_per_axis: usize, field: VelocityField) -> Self {
        Self {
            bounding_box: PhysicalBox::unit(),
            blocks_per_axis: blocks_per_axis.max(1),
            field,
            num_time_slices: 1,
            slice_duration: f64::INFINITY,
            step_size: 0.01,
            max_steps: 1000,
            time_slice: 0,
            cache: VecDeque::new(),
            cache_len: 4,
            domain_loads: BTreeMap::new(),
            load_count: 0,
            purge_count: 0,
            max_count: 0,
            work_group_size: 0,
            output: Vec::new(),
        }
    }

    /// Use `bounding_box` instead of the unit cube.
    pub fn with_bounding_box(mut self, bounding_box: PhysicalBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Split time into `count` slices of length `duration`.
    pub fn with_time_slices(mut self, count: usize, duration: f64) -> Self {
        self.num_time_slices = count.max(1);
        self.slice_duration = duration;
        self
    }

    /// Set the Euler step size and the step budget of a curve.
    pub fn with_steps(mut self, step_size: f64, max_steps: usize) -> Self {
        self.step_size = step_size;
        self.max_steps = max_steps;
        self
    }

    /// Set the number of blocks the cache holds.
    pub fn with_cache(mut self, cache_len: usize) -> Self {
        self.cache_len = cache_len.max(1);
        self
    }

    /// Set the work group size reported to schedulers.
    pub fn with_work_group_size(mut self, work_group_size: usize) -> Self {
        self.work_group_size = work_group_size;
        self
    }

    /// Set the maximum curve count shown in the report.
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    /// Number of time slices.
    pub fn num_time_slices(&self) -> usize {
        self.num_time_slices
    }

    /// The blocks in the cache, most recently used first.
    pub fn cached_blocks(&self) -> impl Iterator<Item = &BlockId> {
        self.cache.iter()
    }

    /// Curves handed over by the coordinator.
    pub fn curves(&self) -> &[IntegralCurve] {
        &self.output
    }

    /// Take the curves handed over by the coordinator.
    pub fn take_curves(&mut self) -> Vec<IntegralCurve> {
        std::mem::take(&mut self.output)
    }

    /// The domain containing `point`, if the point lies in the dataset.
    ///
    /// Points on an interior face belong to the upper block.
    pub fn domain_of(&self, point: &Point) -> Option<usize> {
        if !self.bounding_box.contains(point) {
            return None;
        }

        let n = self.blocks_per_axis;
        let index = self
            .bounding_box
            .physical_to_reference(point)
            .map(|x| ((x * n as f64) as usize).min(n - 1));

        Some(index[0] + n * (index[1] + n * index[2]))
    }

    /// Extent of `domain`.
    pub fn domain_bounds(&self, domain: usize) -> PhysicalBox {
        let n = self.blocks_per_axis;
        let index = [domain % n, (domain / n) % n, domain / (n * n)];
        let h = 1.0 / n as f64;

        let lower = self
            .bounding_box
            .reference_to_physical(index.map(|i| i as f64 * h));
        let upper = self
            .bounding_box
            .reference_to_physical(index.map(|i| (i + 1) as f64 * h));

        let [x0, y0, z0] = lower.coords();
        let [x1, y1, z1] = upper.coords();
        PhysicalBox::new([x0, y0, z0, x1, y1, z1])
    }

    fn slice_end(&self, time_step: usize) -> f64 {
        (time_step + 1) as f64 * self.slice_duration
    }

    fn at_time(&self, time: f64, end: f64) -> bool {
        end.is_finite() && end - time <= TIME_TOLERANCE * end.abs().max(1.0)
    }

    fn touch(&mut self, block: &BlockId) {
        if let Some(pos) = self.cache.iter().position(|b| b == block) {
            self.cache.remove(pos);
            self.cache.push_front(*block);
            return;
        }

        trace!("Loading block {}.", block);
        self.cache.push_front(*block);
        self.load_count += 1;
        *self.domain_loads.entry(block.domain).or_insert(0) += 1;

        while self.cache.len() > self.cache_len {
            if let Some(purged) = self.cache.pop_back() {
                trace!("Purging block {}.", purged);
                self.purge_count += 1;
            }
        }
    }
}

impl DomainProvider for UniformFieldProvider {
    type Domain = UniformBlock;

    fn get_domain(&mut self, block: &BlockId, _point: &Point) -> Option<UniformBlock> {
        if block.domain >= self.num_domains() || block.time_step > self.time_slice {
            return None;
        }

        self.touch(block);
        Some(UniformBlock {
            id: *block,
            bounds: self.domain_bounds(block.domain),
        })
    }

    fn advect_particle(&mut self, curve: &mut IntegralCurve) -> Advection {
        let Some(block) = curve.block_list.pop_front() else {
            return Advection::new(0, Boundary::None);
        };
        curve.block_list.clear();

        let bounds = self.domain_bounds(block.domain);
        let slice_end = self.slice_end(block.time_step);
        let budget = self.max_steps.saturating_sub(curve.steps());

        let mut steps = 0;
        loop {
            if self.at_time(curve.time, slice_end) {
                if block.time_step + 1 >= self.num_time_slices {
                    return Advection::new(steps, Boundary::None);
                }
                if let Some(domain) = self.domain_of(&curve.location) {
                    curve
                        .block_list
                        .push_back(BlockId::new(domain, block.time_step + 1));
                }
                return Advection::new(steps, Boundary::Temporal);
            }

            if steps >= budget {
                return Advection::new(steps, Boundary::None);
            }

            let dt = self.step_size.min(slice_end - curve.time);
            curve.location = curve
                .location
                .advanced(self.field.velocity(&curve.location), dt);
            curve.time += dt;
            steps += 1;

            if bounds.contains(&curve.location) {
                continue;
            }

            return match self.domain_of(&curve.location) {
                Some(domain) => {
                    curve
                        .block_list
                        .push_back(BlockId::new(domain, block.time_step));
                    Advection::new(steps, Boundary::Spatial)
                }
                None => Advection::new(steps, Boundary::None),
            };
        }
    }

    fn find_candidate_blocks(&mut self, curve: &mut IntegralCurve) {
        curve.block_list.clear();
        if let Some(domain) = self.domain_of(&curve.location) {
            curve
                .block_list
                .push_back(BlockId::new(domain, self.time_slice));
        }
    }

    fn set_domain(&mut self, curve: &mut IntegralCurve) {
        let time_step = curve
            .current_block()
            .map_or(self.time_slice, |block| block.time_step);

        curve.block_list.clear();
        if let Some(domain) = self.domain_of(&curve.location) {
            curve.block_list.push_back(BlockId::new(domain, time_step));
        }
    }

    fn domain_loaded(&self, block: &BlockId) -> bool {
        self.cache.contains(block)
    }

    fn create_integral_curve_output(&mut self, curves: Vec<IntegralCurve>) {
        self.output.extend(curves);
    }

    fn set_time_slice(&mut self, time_slice: usize) {
        self.time_slice = time_slice;
    }

    fn domain_load_count(&self) -> &BTreeMap<usize, u64> {
        &self.domain_loads
    }

    fn load_ds_count(&self) -> u64 {
        self.load_count
    }

    fn purge_ds_count(&self) -> u64 {
        self.purge_count
    }

    fn num_domains(&self) -> usize {
        self.blocks_per_axis.pow(3)
    }

    fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            input_name: format!(
                "uniform_{}x{}x{}",
                self.blocks_per_axis, self.blocks_per_axis, self.blocks_per_axis
            ),
            max_count: self.max_count,
            cache_q_len: self.cache_len,
            work_group_size: self.work_group_size,
        }
    }
}
