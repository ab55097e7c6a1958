//! Bounded max-heap that re-sequences items by priority weight.
//!
//! Items with equal weight leave the heap in the order they were inserted:
//! every insert is stamped with an increasing sequence number and the heap
//! orders on `(weight, Reverse(seq))`.
//!
//! A queue is a plain owned value. [`order_by_priority`] builds a fresh one
//! for every call, so concurrent requests never share heap state.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use thiserror::Error;

use crate::models::{Task, TaskPriority};

/// Anything that can be ranked by the priority queue.
pub trait Prioritized {
    fn priority_weight(&self) -> u8;
}

impl Prioritized for TaskPriority {
    fn priority_weight(&self) -> u8 {
        self.weight()
    }
}

impl Prioritized for Task {
    fn priority_weight(&self) -> u8 {
        self.priority.weight()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("priority queue is full (capacity {capacity})")]
pub struct QueueFull {
    pub capacity: usize,
}

struct Slot<T> {
    weight: u8,
    seq: Reverse<u64>,
    item: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.seq == other.seq
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

pub struct PriorityQueue<T> {
    heap: BinaryHeap<Slot<T>>,
    capacity: usize,
    next_seq: u64,
}

impl<T: Prioritized> PriorityQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// O(log n). Fails without touching the heap once `capacity` items are held.
    pub fn insert(&mut self, item: T) -> Result<(), QueueFull> {
        if self.heap.len() >= self.capacity {
            return Err(QueueFull {
                capacity: self.capacity,
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Slot {
            weight: item.priority_weight(),
            seq: Reverse(seq),
            item,
        });
        Ok(())
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|slot| &slot.item)
    }

    /// Remove and return the highest-priority item.
    pub fn extract_max(&mut self) -> Option<T> {
        self.heap.pop().map(|slot| slot.item)
    }

    /// Drain the queue into a vector, highest priority first.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.heap.len());
        while let Some(item) = self.extract_max() {
            sorted.push(item);
        }
        sorted
    }
}

/// Reorder `items` by descending priority weight, stable among equals.
///
/// The queue is bounded to the input length.
pub fn order_by_priority<T: Prioritized>(items: Vec<T>) -> Result<Vec<T>, QueueFull> {
    let mut queue = PriorityQueue::with_capacity(items.len());
    for item in items {
        queue.insert(item)?;
    }
    Ok(queue.into_sorted_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority::{High, Low, Medium};

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, TaskPriority);

    impl Prioritized for Item {
        fn priority_weight(&self) -> u8 {
            self.1.weight()
        }
    }

    #[test]
    fn orders_by_descending_weight() {
        let ordered = order_by_priority(vec![Low, High, Medium]).expect("ordered");
        assert_eq!(ordered, vec![High, Medium, Low]);
    }

    #[test]
    fn equal_priorities_keep_input_order() {
        let input = vec![
            Item("a", Low),
            Item("b", High),
            Item("c", Low),
            Item("d", High),
            Item("e", Medium),
            Item("f", Low),
        ];
        let names: Vec<_> = order_by_priority(input)
            .expect("ordered")
            .into_iter()
            .map(|item| item.0)
            .collect();
        assert_eq!(names, ["b", "d", "e", "a", "c", "f"]);
    }

    #[test]
    fn output_is_non_increasing_for_mixed_input() {
        let pattern = [Low, Medium, High, High, Low, Medium, Low, High, Medium];
        let input: Vec<TaskPriority> = pattern.iter().cycle().take(200).copied().collect();
        let ordered = order_by_priority(input.clone()).expect("ordered");

        assert_eq!(ordered.len(), input.len());
        assert!(
            ordered
                .windows(2)
                .all(|pair| pair[0].weight() >= pair[1].weight())
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(
            order_by_priority(Vec::<TaskPriority>::new())
                .expect("ordered")
                .is_empty()
        );
    }

    #[test]
    fn insert_fails_when_full() {
        let mut queue = PriorityQueue::with_capacity(2);
        queue.insert(Low).expect("first insert");
        queue.insert(High).expect("second insert");

        assert_eq!(queue.insert(Medium), Err(QueueFull { capacity: 2 }));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.capacity(), 2);
        assert_eq!(queue.peek(), Some(&High));
    }

    #[test]
    fn ordering_fills_the_queue_exactly() {
        let input: Vec<TaskPriority> = [High, Low, Medium].iter().cycle().take(64).copied().collect();
        let ordered = order_by_priority(input).expect("sized to input");
        assert_eq!(ordered.len(), 64);
        assert_eq!(ordered.first(), Some(&High));
        assert_eq!(ordered.last(), Some(&Low));
    }

    #[test]
    fn drains_to_empty() {
        let mut queue = PriorityQueue::with_capacity(3);
        for priority in [Medium, Low, High] {
            queue.insert(priority).expect("insert");
        }

        let mut drained = Vec::new();
        while !queue.is_empty() {
            drained.extend(queue.extract_max());
        }

        assert_eq!(drained, vec![High, Medium, Low]);
        assert_eq!(queue.extract_max(), None);
    }

    #[test]
    fn queues_do_not_share_state() {
        let first = order_by_priority(vec![Item("x", Low), Item("y", High)]).expect("ordered");
        let second = order_by_priority(vec![Item("z", Medium)]).expect("ordered");

        assert_eq!(first, vec![Item("y", High), Item("x", Low)]);
        assert_eq!(second, vec![Item("z", Medium)]);
    }
}
