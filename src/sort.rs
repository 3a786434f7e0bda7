//! Locality sorting of integral curves.
//!
//! Before curves are advanced they are sorted so that curves whose next block
//! is already resident are handled before the domain gets evicted. The sorted
//! order is
//! 1. curves without a candidate block,
//! 2. curves whose block is resident, grouped by domain, smallest domain first,
//! 3. curves whose block must be loaded, grouped by domain, smallest domain first.
//!
//! Each curve also records the classic sort key: `-1` without a candidate
//! block, `-domain` if the block is resident and `+domain` otherwise. Note
//! that `-1` is shared by curves without work and curves waiting for a
//! resident domain 1, which is why the order is not derived from the key
//! alone.

use std::borrow::{Borrow, BorrowMut};

use crate::{
    constants::NO_BLOCK_SORT_KEY,
    curve::IntegralCurve,
    queues::{CurveQueues, Queue},
    types::BlockId,
};

/// Sort group of a curve, ordered by priority.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Group {
    NoBlock,
    Resident,
    NotResident,
}

fn classify<F>(curve: &IntegralCurve, is_resident: F) -> (i64, (Group, usize))
where
    F: Fn(&BlockId) -> bool,
{
    match curve.current_block() {
        Some(block) if is_resident(block) => {
            (-(block.domain as i64), (Group::Resident, block.domain))
        }
        Some(block) => (block.domain as i64, (Group::NotResident, block.domain)),
        None => (NO_BLOCK_SORT_KEY, (Group::NoBlock, 0)),
    }
}

/// Compute the locality sort key of a curve.
pub fn locality_sort_key<F>(curve: &IntegralCurve, is_resident: F) -> i64
where
    F: Fn(&BlockId) -> bool,
{
    classify(curve, is_resident).0
}

/// Assign sort keys and stable sort a slice of curves.
pub fn sort_by_locality<T, F>(curves: &mut [T], is_resident: F)
where
    T: BorrowMut<IntegralCurve>,
    F: Fn(&BlockId) -> bool,
{
    for curve in curves.iter_mut() {
        let curve = <T as BorrowMut<IntegralCurve>>::borrow_mut(curve);
        let key = locality_sort_key(curve, &is_resident);
        curve.set_sort_key(key);
    }

    curves.sort_by_cached_key(|curve| {
        classify(<T as Borrow<IntegralCurve>>::borrow(curve), &is_resident).1
    });
}

/// Assign sort keys and stable sort one queue of the arena.
pub fn sort_queue<F>(queues: &mut CurveQueues, queue: Queue, is_resident: F)
where
    F: Fn(&BlockId) -> bool,
{
    let order = std::mem::take(queues.order_mut(queue));

    let mut ranked = order
        .into_iter()
        .map(|handle| {
            let rank = match queues.get_mut(handle) {
                Some(curve) => {
                    let (key, rank) = classify(curve, &is_resident);
                    curve.set_sort_key(key);
                    rank
                }
                None => (Group::NoBlock, 0),
            };
            (rank, handle)
        })
        .collect::<Vec<_>>();

    ranked.sort_by_key(|&(rank, _)| rank);

    *queues.order_mut(queue) = ranked.into_iter().map(|(_, handle)| handle).collect();
}
