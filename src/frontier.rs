//! Orderings of not-yet-expanded search nodes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::mem;

use crate::solve::NodeId;

/// The open list of a search. The engine loop is written once against this
/// trait; each implementation decides which node is expanded next.
pub trait Frontier: Default {
    /// Whether the priority passed to [`Frontier::push`] is used, so the
    /// engine has to evaluate the heuristic.
    const INFORMED: bool = false;
    /// Whether children are pushed in reverse direction order, so that they
    /// are popped in forward order.
    const REVERSED: bool = false;
    /// Bytes held per queued node.
    const ENTRY_SIZE: usize = mem::size_of::<NodeId>();

    fn push(&mut self, id: NodeId, priority: u32);
    fn pop(&mut self) -> Option<NodeId>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First in, first out. Breadth-first search.
#[derive(Debug, Default)]
pub struct Fifo(VecDeque<NodeId>);

impl Frontier for Fifo {
    fn push(&mut self, id: NodeId, _priority: u32) {
        self.0.push_back(id);
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.0.pop_front()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Last in, first out. Depth-first search.
#[derive(Debug, Default)]
pub struct Lifo(Vec<NodeId>);

impl Frontier for Lifo {
    const REVERSED: bool = true;

    fn push(&mut self, id: NodeId, _priority: u32) {
        self.0.push(id);
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.0.pop()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Lowest priority first; ties go to the earliest push.
#[derive(Debug, Default)]
pub struct BestFirst {
    heap: BinaryHeap<Reverse<(u32, u64, NodeId)>>,
    seq: u64,
}

impl Frontier for BestFirst {
    const INFORMED: bool = true;
    const ENTRY_SIZE: usize = mem::size_of::<Reverse<(u32, u64, NodeId)>>();

    fn push(&mut self, id: NodeId, priority: u32) {
        self.heap.push(Reverse((priority, self.seq, id)));
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<NodeId> {
        let Reverse((_, _, id)) = self.heap.pop()?;
        Some(id)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}
