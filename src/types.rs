//! Identifier types.

use std::fmt::Display;

/// Identity of an integral curve.
pub type CurveId = usize;

/// Identifies one block of the dataset: a spatial domain at a time step.
///
/// Block ids are handed out by the domain provider. The coordinator only
/// compares them, sorts by them and asks the provider whether they are
/// resident.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId {
    /// The spatial domain.
    pub domain: usize,
    /// The time step the domain belongs to.
    pub time_step: usize,
}

impl BlockId {
    /// Create a new block id.
    pub fn new(domain: usize, time_step: usize) -> Self {
        Self { domain, time_step }
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(dom: {}, ts: {})", self.domain, self.time_step)
    }
}
