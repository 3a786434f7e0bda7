//! Arena storage of the curves of one process.
//!
//! Curves live in slots of an arena and are referred to by [CurveHandle].
//! Every live curve belongs to exactly one [Queue], and moving a curve between
//! queues is an explicit operation that updates both the queue order and the
//! membership recorded in the slot.
//!
//! A slot is reused once its curve is removed. Each reuse bumps the slot's
//! generation, so a handle to a removed curve never resolves to its successor.

use std::collections::VecDeque;

use crate::{curve::IntegralCurve, types::CurveId};

/// The work queues of the coordinator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Queue {
    /// Curves being advanced.
    Active,
    /// Curves parked for later.
    Inactive,
    /// Curves that cannot advance any further in this round.
    Terminated,
}

/// Refers to a curve stored in [CurveQueues].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurveHandle {
    index: usize,
    generation: u64,
}

struct Entry {
    curve: IntegralCurve,
    queue: Queue,
}

struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

/// The active, inactive and terminated queues.
#[derive(Default)]
pub struct CurveQueues {
    slots: Vec<Slot>,
    free: Vec<usize>,
    active: VecDeque<CurveHandle>,
    inactive: VecDeque<CurveHandle>,
    terminated: VecDeque<CurveHandle>,
}

impl CurveQueues {
    /// Create empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    fn order(&self, queue: Queue) -> &VecDeque<CurveHandle> {
        match queue {
            Queue::Active => &self.active,
            Queue::Inactive => &self.inactive,
            Queue::Terminated => &self.terminated,
        }
    }

    pub(crate) fn order_mut(&mut self, queue: Queue) -> &mut VecDeque<CurveHandle> {
        match queue {
            Queue::Active => &mut self.active,
            Queue::Inactive => &mut self.inactive,
            Queue::Terminated => &mut self.terminated,
        }
    }

    fn entry(&self, handle: CurveHandle) -> Option<&Entry> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, handle: CurveHandle) -> Option<&mut Entry> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    // Empty a live slot and retire its generation.
    fn take_entry(&mut self, handle: CurveHandle) -> Option<Entry> {
        let slot = self
            .slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)?;
        let entry = slot.entry.take()?;
        slot.generation += 1;
        self.free.push(handle.index);
        Some(entry)
    }

    /// Store `curve` at the back of `queue`.
    pub fn insert(&mut self, curve: IntegralCurve, queue: Queue) -> CurveHandle {
        let entry = Some(Entry { curve, queue });
        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.entry = entry;
            CurveHandle {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry,
            });
            CurveHandle {
                index: self.slots.len() - 1,
                generation: 0,
            }
        };
        self.order_mut(queue).push_back(handle);
        handle
    }

    /// Return the curve behind `handle`. `None` once the curve was removed.
    pub fn get(&self, handle: CurveHandle) -> Option<&IntegralCurve> {
        self.entry(handle).map(|entry| &entry.curve)
    }

    /// Return the curve behind `handle` mutably.
    pub fn get_mut(&mut self, handle: CurveHandle) -> Option<&mut IntegralCurve> {
        self.entry_mut(handle).map(|entry| &mut entry.curve)
    }

    /// Return the queue a curve belongs to.
    pub fn queue_of(&self, handle: CurveHandle) -> Option<Queue> {
        self.entry(handle).map(|entry| entry.queue)
    }

    /// Return the handles of `queue` in queue order.
    pub fn handles(&self, queue: Queue) -> &VecDeque<CurveHandle> {
        self.order(queue)
    }

    /// Iterate over the curves of `queue` in queue order.
    pub fn iter(&self, queue: Queue) -> impl Iterator<Item = &IntegralCurve> + '_ {
        self.order(queue)
            .iter()
            .filter_map(move |&handle| self.get(handle))
    }

    /// Call `f` on every curve of `queue` in queue order.
    pub fn for_each_mut<F>(&mut self, queue: Queue, mut f: F)
    where
        F: FnMut(&mut IntegralCurve),
    {
        let order = match queue {
            Queue::Active => &self.active,
            Queue::Inactive => &self.inactive,
            Queue::Terminated => &self.terminated,
        };
        for handle in order {
            if let Some(entry) = self
                .slots
                .get_mut(handle.index)
                .filter(|slot| slot.generation == handle.generation)
                .and_then(|slot| slot.entry.as_mut())
            {
                f(&mut entry.curve);
            }
        }
    }

    /// Number of curves in `queue`.
    pub fn len(&self, queue: Queue) -> usize {
        self.order(queue).len()
    }

    /// True if `queue` holds no curves.
    pub fn is_empty(&self, queue: Queue) -> bool {
        self.order(queue).is_empty()
    }

    /// Number of curves over all queues.
    pub fn total_len(&self) -> usize {
        self.active.len() + self.inactive.len() + self.terminated.len()
    }

    /// The first curve of `queue`.
    pub fn front(&self, queue: Queue) -> Option<CurveHandle> {
        self.order(queue).front().copied()
    }

    /// Find the curve with id `id` in `queue`.
    pub fn find(&self, queue: Queue, id: CurveId) -> Option<CurveHandle> {
        self.order(queue)
            .iter()
            .copied()
            .find(|&handle| self.get(handle).is_some_and(|curve| curve.id() == id))
    }

    /// Move a curve to the back of `target`.
    ///
    /// Moving a curve into the queue it is already in sends it to the back.
    /// Returns false for a stale handle.
    pub fn move_to(&mut self, handle: CurveHandle, target: Queue) -> bool {
        let Some(source) = self.queue_of(handle) else {
            return false;
        };

        let order = self.order_mut(source);
        if let Some(pos) = order.iter().position(|&h| h == handle) {
            order.remove(pos);
        }

        if let Some(entry) = self.entry_mut(handle) {
            entry.queue = target;
        }
        self.order_mut(target).push_back(handle);
        true
    }

    /// Move every curve of `source` to the back of `target`, keeping their order.
    pub fn move_all(&mut self, source: Queue, target: Queue) {
        if source == target {
            return;
        }
        let mut moved = std::mem::take(self.order_mut(source));
        for &handle in &moved {
            if let Some(entry) = self.entry_mut(handle) {
                entry.queue = target;
            }
        }
        self.order_mut(target).append(&mut moved);
    }

    /// Move the curves of `source` matching `pred` to the back of `target`.
    ///
    /// Returns the moved handles in their original order.
    pub fn move_where<F>(&mut self, source: Queue, target: Queue, mut pred: F) -> Vec<CurveHandle>
    where
        F: FnMut(&IntegralCurve) -> bool,
    {
        if source == target {
            return Vec::new();
        }

        let order = std::mem::take(self.order_mut(source));
        let (moved, kept): (VecDeque<_>, VecDeque<_>) = order
            .into_iter()
            .partition(|&handle| self.get(handle).is_some_and(&mut pred));

        *self.order_mut(source) = kept;
        for &handle in &moved {
            if let Some(entry) = self.entry_mut(handle) {
                entry.queue = target;
            }
        }
        self.order_mut(target).extend(moved.iter().copied());

        moved.into_iter().collect()
    }

    /// Remove a curve from the arena.
    pub fn remove(&mut self, handle: CurveHandle) -> Option<IntegralCurve> {
        let queue = self.queue_of(handle)?;
        let order = self.order_mut(queue);
        if let Some(pos) = order.iter().position(|&h| h == handle) {
            order.remove(pos);
        }
        self.take_entry(handle).map(|entry| entry.curve)
    }

    /// Remove all curves of `queue` and return them in queue order.
    pub fn drain(&mut self, queue: Queue) -> Vec<IntegralCurve> {
        let order = std::mem::take(self.order_mut(queue));
        order
            .into_iter()
            .filter_map(|handle| self.take_entry(handle).map(|entry| entry.curve))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use super::{CurveQueues, Queue};
    use crate::{curve::IntegralCurve, geometry::Point};

    fn curve(id: usize) -> IntegralCurve {
        IntegralCurve::new(id, Point::new([0.0, 0.0, 0.0]), 0.0)
    }

    fn ids(queues: &CurveQueues, queue: Queue) -> Vec<usize> {
        queues.iter(queue).map(|c| c.id()).collect_vec()
    }

    #[test]
    fn test_insert_and_move() {
        let mut queues = CurveQueues::new();
        let handles = (0..5)
            .map(|id| queues.insert(curve(id), Queue::Active))
            .collect_vec();

        assert!(queues.move_to(handles[1], Queue::Terminated));
        assert!(queues.move_to(handles[3], Queue::Inactive));

        assert_eq!(ids(&queues, Queue::Active), vec![0, 2, 4]);
        assert_eq!(ids(&queues, Queue::Inactive), vec![3]);
        assert_eq!(ids(&queues, Queue::Terminated), vec![1]);
        assert_eq!(queues.queue_of(handles[1]), Some(Queue::Terminated));
        assert_eq!(queues.total_len(), 5);

        // Same queue sends the curve to the back.
        queues.move_to(handles[0], Queue::Active);
        assert_eq!(ids(&queues, Queue::Active), vec![2, 4, 0]);
    }

    #[test]
    fn test_move_where_and_move_all() {
        let mut queues = CurveQueues::new();
        for id in 0..6 {
            queues.insert(curve(id), Queue::Terminated);
        }
        queues.insert(curve(10), Queue::Active);

        let moved = queues.move_where(Queue::Terminated, Queue::Active, |c| c.id() % 2 == 0);
        assert_eq!(moved.len(), 3);
        assert_eq!(ids(&queues, Queue::Active), vec![10, 0, 2, 4]);
        assert_eq!(ids(&queues, Queue::Terminated), vec![1, 3, 5]);

        queues.move_all(Queue::Terminated, Queue::Active);
        assert!(queues.is_empty(Queue::Terminated));
        assert_eq!(ids(&queues, Queue::Active), vec![10, 0, 2, 4, 1, 3, 5]);
        for handle in queues.handles(Queue::Active) {
            assert_eq!(queues.queue_of(*handle), Some(Queue::Active));
        }
    }

    #[test]
    fn test_remove_reuses_slots() {
        let mut queues = CurveQueues::new();
        let first = queues.insert(curve(1), Queue::Terminated);
        queues.insert(curve(2), Queue::Terminated);

        assert_eq!(queues.remove(first).map(|c| c.id()), Some(1));
        assert!(queues.remove(first).is_none());
        assert!(queues.get(first).is_none());

        let reused = queues.insert(curve(3), Queue::Active);
        assert_ne!(reused, first);
        assert_eq!(queues.find(Queue::Active, 3), Some(reused));
        assert_eq!(queues.find(Queue::Terminated, 3), None);

        // The old handle does not reach the curve now living in its slot.
        assert!(queues.get(first).is_none());
        assert!(queues.get_mut(first).is_none());
        assert_eq!(queues.queue_of(first), None);
        assert!(!queues.move_to(first, Queue::Terminated));
        assert!(queues.remove(first).is_none());
        assert_eq!(ids(&queues, Queue::Active), vec![3]);
        assert_eq!(ids(&queues, Queue::Terminated), vec![2]);

        let drained = queues.drain(Queue::Terminated);
        assert_eq!(drained.iter().map(|c| c.id()).collect_vec(), vec![2]);
        assert_eq!(queues.total_len(), 1);
    }
}
