//! Integral curves and their coordinator-owned status.

use std::collections::VecDeque;
use std::fmt::Display;

use crate::{
    geometry::Point,
    provider::Boundary,
    types::{BlockId, CurveId},
};

/// Where a curve stands with respect to the blocks it is traced through.
///
/// Only the coordinator changes the status. Providers report what happened
/// during integration through [crate::provider::Advection].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CurveStatus {
    /// The curve can be integrated in its current block.
    #[default]
    Active,
    /// The curve left its block and waits for the next candidate block.
    AtSpatialBoundary,
    /// The curve reached the end of the loaded time slice.
    AtTemporalBoundary,
    /// The curve is finished.
    Terminated,
}

impl Display for CurveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CurveStatus::Active => "active",
            CurveStatus::AtSpatialBoundary => "spatial-boundary",
            CurveStatus::AtTemporalBoundary => "temporal-boundary",
            CurveStatus::Terminated => "terminated",
        };
        write!(f, "{}", name)
    }
}

/// A single traced particle.
#[derive(Clone, Debug)]
pub struct IntegralCurve {
    id: CurveId,
    /// Candidate blocks the curve may currently reside in. The front is the
    /// current guess.
    pub block_list: VecDeque<BlockId>,
    /// Last known position of the trace head.
    pub location: Point,
    /// Time of the trace head.
    pub time: f64,
    status: CurveStatus,
    sort_key: i64,
    steps: usize,
    finalized: bool,
}

impl IntegralCurve {
    /// Create a new active curve at `location` and `time`.
    pub fn new(id: CurveId, location: Point, time: f64) -> Self {
        Self {
            id,
            block_list: VecDeque::new(),
            location,
            time,
            status: CurveStatus::Active,
            sort_key: 0,
            steps: 0,
            finalized: false,
        }
    }

    /// Create a new curve with an initial candidate block.
    pub fn with_block(id: CurveId, location: Point, time: f64, block: BlockId) -> Self {
        let mut curve = Self::new(id, location, time);
        curve.block_list.push_back(block);
        curve
    }

    /// Return the id.
    pub fn id(&self) -> CurveId {
        self.id
    }

    /// Return the status.
    pub fn status(&self) -> CurveStatus {
        self.status
    }

    /// Return the sort key from the last locality sort.
    pub fn sort_key(&self) -> i64 {
        self.sort_key
    }

    /// Total number of integration steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// True once the curve went through the post-run finalization.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The block the curve currently needs, if any.
    pub fn current_block(&self) -> Option<&BlockId> {
        self.block_list.front()
    }

    /// True if the curve stopped at the end of the loaded time slice.
    pub fn encountered_temporal_boundary(&self) -> bool {
        self.status == CurveStatus::AtTemporalBoundary
    }

    /// True if the curve stopped at the boundary of its block.
    pub fn encountered_spatial_boundary(&self) -> bool {
        self.status == CurveStatus::AtSpatialBoundary
    }

    /// True if the curve may still be integrated in this round.
    pub fn is_integrable(&self) -> bool {
        matches!(
            self.status,
            CurveStatus::Active | CurveStatus::AtSpatialBoundary
        )
    }

    pub(crate) fn set_sort_key(&mut self, key: i64) {
        self.sort_key = key;
    }

    pub(crate) fn clear_spatial_boundary(&mut self) {
        if self.status == CurveStatus::AtSpatialBoundary {
            self.status = CurveStatus::Active;
        }
    }

    pub(crate) fn clear_temporal_boundary(&mut self) {
        if self.status == CurveStatus::AtTemporalBoundary {
            self.status = CurveStatus::Active;
        }
    }

    pub(crate) fn reactivate(&mut self) {
        self.status = CurveStatus::Active;
    }

    pub(crate) fn terminate(&mut self) {
        self.status = CurveStatus::Terminated;
    }

    pub(crate) fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Record the outcome of one call into the provider.
    pub(crate) fn apply_advection(&mut self, steps: usize, boundary: Boundary) {
        self.steps += steps;
        self.status = match boundary {
            Boundary::Spatial => CurveStatus::AtSpatialBoundary,
            Boundary::Temporal => CurveStatus::AtTemporalBoundary,
            Boundary::None => CurveStatus::Terminated,
        };
    }
}

impl Display for IntegralCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.id, self.location, self.time)
    }
}
