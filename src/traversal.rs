use std::collections::VecDeque;

use roaring::RoaringBitmap;

use crate::{TraversableDirectedGraph, Vertex};

/// Which way a traversal follows edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// From a vertex to its children.
    Forward,
    /// From a vertex to its parents.
    Backward,
}

fn extend_with_neighbours<G: TraversableDirectedGraph>(
    graph: &G,
    direction: Direction,
    u: Vertex,
    neighbours: &mut Vec<Vertex>,
) {
    match direction {
        Direction::Forward => graph.extend_with_children(u, neighbours),
        Direction::Backward => graph.extend_with_parents(u, neighbours),
    }
}

/// Pre-order depth-first walk.  Each vertex is emitted once, including the
/// starting ones.
pub(crate) struct DfsVerticesIterator<G> {
    pub(crate) graph: G,
    pub(crate) direction: Direction,
    pub(crate) visited: RoaringBitmap,
    pub(crate) to_visit: Vec<Vertex>,
}

impl<G: TraversableDirectedGraph> Iterator for DfsVerticesIterator<G> {
    type Item = Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(u) = self.to_visit.pop() {
            if !self.visited.insert(u) {
                continue;
            }
            let start = self.to_visit.len();
            extend_with_neighbours(&self.graph, self.direction, u, &mut self.to_visit);
            // Push in reverse so neighbours come off the stack in list order.
            self.to_visit[start..].reverse();
            return Some(u);
        }
        None
    }
}

/// Depth-first walk emitting each vertex only after all of its descendants.
pub(crate) struct DfsPostOrderVerticesIterator<G> {
    pub(crate) graph: G,
    pub(crate) visited: RoaringBitmap,
    pub(crate) to_visit: Vec<Vertex>,
    pub(crate) scratch: Vec<Vertex>,
}

impl<G: TraversableDirectedGraph> Iterator for DfsPostOrderVerticesIterator<G> {
    type Item = Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        // A recursive topological sort with an explicit stack and without the
        // final reversal.
        loop {
            let u = self.to_visit.last().copied()?;
            if self.visited.contains(u) {
                self.to_visit.pop();
                continue;
            }
            self.scratch.clear();
            self.graph.extend_with_children(u, &mut self.scratch);
            self.scratch.retain(|v| !self.visited.contains(*v));
            if self.scratch.is_empty() {
                // Every descendant of u has been emitted already.
                self.to_visit.pop();
                self.visited.insert(u);
                return Some(u);
            }
            self.to_visit.extend(self.scratch.drain(..));
        }
    }
}

/// Breadth-first walk.  Each vertex is emitted once, including the starting
/// ones.
pub(crate) struct BfsVerticesIterator<G> {
    pub(crate) graph: G,
    pub(crate) direction: Direction,
    pub(crate) visited: RoaringBitmap,
    pub(crate) to_visit: VecDeque<Vertex>,
    pub(crate) scratch: Vec<Vertex>,
}

impl<G: TraversableDirectedGraph> Iterator for BfsVerticesIterator<G> {
    type Item = Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(u) = self.to_visit.pop_front() {
            if !self.visited.insert(u) {
                continue;
            }
            self.scratch.clear();
            extend_with_neighbours(&self.graph, self.direction, u, &mut self.scratch);
            self.to_visit.extend(
                self.scratch
                    .iter()
                    .copied()
                    .filter(|v| !self.visited.contains(*v)),
            );
            return Some(u);
        }
        None
    }
}

pub(crate) fn dfs<G: TraversableDirectedGraph>(
    graph: G,
    direction: Direction,
    mut start: Vec<Vertex>,
) -> DfsVerticesIterator<G> {
    start.reverse();
    DfsVerticesIterator {
        graph,
        direction,
        visited: RoaringBitmap::new(),
        to_visit: start,
    }
}

pub(crate) fn dfs_post_order<G: TraversableDirectedGraph>(
    graph: G,
    start: Vec<Vertex>,
) -> DfsPostOrderVerticesIterator<G> {
    DfsPostOrderVerticesIterator {
        graph,
        visited: RoaringBitmap::new(),
        to_visit: start,
        scratch: Vec::new(),
    }
}

pub(crate) fn bfs<G: TraversableDirectedGraph>(
    graph: G,
    direction: Direction,
    start: Vec<Vertex>,
) -> BfsVerticesIterator<G> {
    BfsVerticesIterator {
        graph,
        direction,
        visited: RoaringBitmap::new(),
        to_visit: start.into(),
        scratch: Vec::new(),
    }
}
