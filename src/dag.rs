//! [Directed Acyclic
//! Graphs](https://en.wikipedia.org/wiki/Directed_acyclic_graph) (DAGs) over a
//! fixed set of integer vertices, stored as adjacency lists.
//!
//! The graph refuses to become cyclic: every edge insertion is followed by a
//! full cycle check, and an edge that would close a cycle is rolled back
//! before [`DirectedAcyclicGraph::add_edge`] returns.  Rejection is a normal
//! outcome reported through [`EdgeInsertion`], not an error.
//!
//! There are a few assumptions imposed on *your* code:
//!
//! 1. DAG vertices are integer numbers starting at 0.
//! 1. The number of vertices is determined at construction time and
//!    growing/shrinking requires a new graph to be constructed.
//! 1. Edges are never removed once inserted.
//!
//! In exchange you get a graph that is acyclic at every observable point and
//! that answers ancestry queries where a vertex may have any number of
//! parents (see [`DirectedAcyclicGraph::lowest_common_ancestors`]).
//!
//! ## Anti-features
//!
//! * No support for storing anything in the vertices.
//! * No support for assigning weights to either edges or vertices.
//! * No serde impls.  Serialize the list of edges with a library of your
//!   choosing.
//!
//! Cycle checking is O(|V| + |E|) per insertion, which is fine for the small
//! graphs this crate targets and quadratic for large bulk loads.

use std::fmt;
use std::io::Write;
use std::ops::Range;

use proptest::prelude::*;
use proptest::strategy::{NewTree, ValueTree};
use proptest::test_runner::TestRunner;
use rand::distributions::Uniform;
use rand::prelude::Distribution;
use roaring::RoaringBitmap;

use crate::error::GraphError;
use crate::traversal::{self, Direction};
use crate::{TraversableDirectedGraph, Vertex};

/// What [`DirectedAcyclicGraph::add_edge`] did with an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeInsertion {
    Inserted,
    /// The edge was already present.  Nothing changed.
    Duplicate,
    /// The edge would have closed a cycle and was rolled back.
    CycleCompleting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VertexState {
    Unvisited,
    /// On the current DFS path.
    InProgress,
    /// Fully explored, no cycle reachable from here.
    Visited,
}

/// A mutable, single-threaded directed acyclic graph.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectedAcyclicGraph {
    vertex_count: Vertex,
    adjacency: Vec<Vec<Vertex>>,
}

impl fmt::Debug for DirectedAcyclicGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges: Vec<(Vertex, Vertex)> = self.iter_edges().collect();
        write!(
            f,
            "DirectedAcyclicGraph::from_edges_iter({}, vec!{:?})",
            self.get_vertex_count(),
            edges
        )
    }
}

/// One line per vertex: `"<id>: <child> <child> \n"`, in increasing id order.
impl fmt::Display for DirectedAcyclicGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (u, children) in self.adjacency.iter().enumerate() {
            write!(f, "{}: ", u)?;
            for v in children {
                write!(f, "{} ", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl TraversableDirectedGraph for DirectedAcyclicGraph {
    fn extend_with_children(&self, u: Vertex, children: &mut Vec<Vertex>) {
        self.extend_with_children(u, children)
    }

    fn extend_with_parents(&self, v: Vertex, parents: &mut Vec<Vertex>) {
        self.extend_with_parents(v, parents)
    }
}

/// A graph view whose parent lookups hit a precomputed table instead of
/// scanning every adjacency list.
struct IndexedParents<'a> {
    dag: &'a DirectedAcyclicGraph,
    parents: Vec<Vec<Vertex>>,
}

impl TraversableDirectedGraph for IndexedParents<'_> {
    fn extend_with_children(&self, u: Vertex, children: &mut Vec<Vertex>) {
        self.dag.extend_with_children(u, children)
    }

    fn extend_with_parents(&self, v: Vertex, parents: &mut Vec<Vertex>) {
        if let Some(row) = self.parents.get(v as usize) {
            parents.extend(row.iter().copied());
        }
    }
}

impl DirectedAcyclicGraph {
    /// Constructs a new graph with `vertex_count` vertices and no edges.
    pub fn new(vertex_count: Vertex) -> Self {
        Self {
            vertex_count,
            adjacency: vec![Vec::new(); vertex_count as usize],
        }
    }

    /// Constructs a DAG by calling [`Self::add_edge`] for every pair in
    /// `edges`.  Duplicate and cycle-completing pairs are skipped the same way
    /// `add_edge` skips them.
    pub fn from_edges_iter<I>(vertex_count: Vertex, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (Vertex, Vertex)>,
    {
        let mut dag = Self::new(vertex_count);
        for (u, v) in edges {
            dag.add_edge(u, v)?;
        }
        Ok(dag)
    }

    #[inline]
    pub fn get_vertex_count(&self) -> Vertex {
        self.vertex_count
    }

    pub(crate) fn check_vertex(&self, vertex: Vertex) -> Result<(), GraphError> {
        if vertex < self.vertex_count {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange {
                vertex,
                vertex_count: self.vertex_count,
            })
        }
    }

    /// Adds the edge `origin -> destination` unless it is already present or
    /// would close a cycle.
    ///
    /// Fails only when either endpoint is not a vertex of this graph, in which
    /// case the graph is left untouched.
    pub fn add_edge(
        &mut self,
        origin: Vertex,
        destination: Vertex,
    ) -> Result<EdgeInsertion, GraphError> {
        self.check_vertex(origin)?;
        self.check_vertex(destination)?;
        Ok(self.insert_edge(origin, destination))
    }

    /// Requires both endpoints to be in range.
    fn insert_edge(&mut self, origin: Vertex, destination: Vertex) -> EdgeInsertion {
        let children = &mut self.adjacency[origin as usize];
        if children.contains(&destination) {
            cov_mark::hit!(duplicate_edge_ignored);
            tracing::debug!(origin, destination, "duplicate edge ignored");
            return EdgeInsertion::Duplicate;
        }
        children.push(destination);

        if self.contains_cycle() {
            // The new edge is the last one in its list.
            self.adjacency[origin as usize].pop();
            cov_mark::hit!(cycle_completing_edge_rolled_back);
            tracing::debug!(origin, destination, "cycle-completing edge ignored");
            return EdgeInsertion::CycleCompleting;
        }
        EdgeInsertion::Inserted
    }

    /// Returns whether the graph currently has a directed cycle.  Always
    /// `false` from the outside; [`Self::add_edge`] uses it to validate a
    /// tentative edge.
    pub fn contains_cycle(&self) -> bool {
        let mut states = vec![VertexState::Unvisited; self.adjacency.len()];
        // (vertex, index of the next child to look at)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.adjacency.len() {
            if states[root] != VertexState::Unvisited {
                continue;
            }
            states[root] = VertexState::InProgress;
            stack.push((root, 0));

            while let Some((u, next)) = stack.last_mut() {
                let u = *u;
                match self.adjacency[u].get(*next) {
                    Some(&v) => {
                        *next += 1;
                        let v = v as usize;
                        match states[v] {
                            VertexState::InProgress => return true,
                            VertexState::Visited => {}
                            VertexState::Unvisited => {
                                states[v] = VertexState::InProgress;
                                stack.push((v, 0));
                            }
                        }
                    }
                    None => {
                        states[u] = VertexState::Visited;
                        stack.pop();
                    }
                }
            }
        }
        false
    }

    /// Returns `false` for out of range vertices.
    pub fn has_edge(&self, u: Vertex, v: Vertex) -> bool {
        self.adjacency
            .get(u as usize)
            .map_or(false, |children| children.contains(&v))
    }

    pub fn get_edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Iterates over edges grouped by origin, in insertion order within each
    /// origin.
    pub fn iter_edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        (0..self.vertex_count).flat_map(move |u| self.iter_children(u).map(move |v| (u, v)))
    }

    /// Iterates over vertices `v` such that there's an edge `(u, v)` in the
    /// DAG, in insertion order.  Empty for out of range `u`.
    pub fn iter_children(&self, u: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        self.adjacency
            .get(u as usize)
            .into_iter()
            .flat_map(|children| children.iter().copied())
    }

    /// Iterates over vertices `u` such that there's an edge `(u, v)` in the
    /// DAG, in increasing order.  This scans every adjacency list; use
    /// [`Self::parent_table`] for repeated lookups.
    pub fn iter_parents(&self, v: Vertex) -> impl Iterator<Item = Vertex> + '_ {
        (0..self.vertex_count).filter(move |u| self.adjacency[*u as usize].contains(&v))
    }

    pub fn extend_with_children(&self, u: Vertex, children: &mut Vec<Vertex>) {
        children.extend(self.iter_children(u))
    }

    pub fn extend_with_parents(&self, v: Vertex, parents: &mut Vec<Vertex>) {
        parents.extend(self.iter_parents(v))
    }

    /// The adjacency lists reversed: entry `v` lists every `u` with an edge
    /// `(u, v)`, in increasing order of `u`.
    pub fn parent_table(&self) -> Vec<Vec<Vertex>> {
        let mut parents: Vec<Vec<Vertex>> = vec![Vec::new(); self.adjacency.len()];
        for (u, v) in self.iter_edges() {
            parents[v as usize].push(u);
        }
        parents
    }

    /// Visit all vertices reachable from `start_vertex` in a depth-first-search
    /// (DFS) order, excluding `start_vertex` itself.
    pub fn iter_descendants_dfs(
        &self,
        start_vertex: Vertex,
    ) -> Box<dyn Iterator<Item = Vertex> + '_> {
        let iter = traversal::dfs(self, Direction::Forward, self.start(start_vertex))
            .filter(move |vertex| *vertex != start_vertex);
        Box::new(iter)
    }

    /// Visit all vertices from which `start_vertex` is reachable in a
    /// depth-first-search (DFS) order, excluding `start_vertex` itself.
    ///
    /// Builds the [`Self::parent_table`] once up front, so the walk costs
    /// O(|V| + |E|).
    pub fn iter_ancestors_dfs(&self, start_vertex: Vertex) -> Box<dyn Iterator<Item = Vertex> + '_> {
        let graph = IndexedParents {
            dag: self,
            parents: self.parent_table(),
        };
        let iter = traversal::dfs(graph, Direction::Backward, self.start(start_vertex))
            .filter(move |vertex| *vertex != start_vertex);
        Box::new(iter)
    }

    /// Visit all vertices reachable from `vertex` in a breadth-first-search
    /// (BFS) order, `vertex` first.
    pub fn iter_descendants_bfs(&self, vertex: Vertex) -> Box<dyn Iterator<Item = Vertex> + '_> {
        Box::new(traversal::bfs(self, Direction::Forward, self.start(vertex)))
    }

    /// Visit all vertices of a DAG in a breadth-first-search (BFS) order.
    pub fn iter_vertices_bfs(&self) -> Box<dyn Iterator<Item = Vertex> + '_> {
        Box::new(traversal::bfs(
            self,
            Direction::Forward,
            self.get_vertices_without_incoming_edges(),
        ))
    }

    /// Visit all vertices of a DAG in a depth-first-search postorder, i.e. emitting vertices only
    /// after all their descendants were emitted first.
    pub fn iter_vertices_dfs_post_order(&self) -> Box<dyn Iterator<Item = Vertex> + '_> {
        Box::new(traversal::dfs_post_order(
            self,
            self.get_vertices_without_incoming_edges(),
        ))
    }

    /// Combines [`Self::iter_vertices_dfs_post_order`] with [`slice::reverse()`] to get a
    /// topologically ordered sequence of vertices of a DAG.
    pub fn get_topologically_ordered_vertices(&self) -> Vec<Vertex> {
        let mut result: Vec<Vertex> = Vec::with_capacity(self.adjacency.len());
        result.extend(self.iter_vertices_dfs_post_order());
        result.reverse();
        result
    }

    /// Returns a set "seed" vertices of a DAG from which a traversal may start so
    /// that the process covers all vertices in the graph.
    pub fn get_vertices_without_incoming_edges(&self) -> Vec<Vertex> {
        let mut has_parent = RoaringBitmap::new();
        for (_, v) in self.iter_edges() {
            has_parent.insert(v);
        }
        (0..self.vertex_count)
            .filter(|v| !has_parent.contains(*v))
            .collect()
    }

    /// Out of range vertices start an empty traversal.
    fn start(&self, vertex: Vertex) -> Vec<Vertex> {
        if vertex < self.vertex_count {
            vec![vertex]
        } else {
            Vec::new()
        }
    }

    /// Outputs the DAG in the [Graphviz DOT](https://graphviz.org/) format.
    pub fn to_dot<W: Write>(&self, output: &mut W) -> std::result::Result<(), std::io::Error> {
        writeln!(output, "digraph dag_{} {{", self.get_vertex_count())?;

        for elem in 0..self.get_vertex_count() {
            writeln!(output, "\t_{}[label=\"{}\"];", elem, elem)?;
        }

        writeln!(output, "\n")?;

        for (left, right) in self.iter_edges() {
            writeln!(output, "\t_{} -> _{};", left, right)?;
        }

        writeln!(output, "}}")?;
        Ok(())
    }
}

/// A proptest strategy generating DAGs by feeding random (possibly
/// cycle-completing or duplicate) edges through
/// [`DirectedAcyclicGraph::add_edge`].
pub fn arb_dag(vertex_count: impl Into<Range<Vertex>>) -> DirectedAcyclicGraphStrategy {
    DirectedAcyclicGraphStrategy {
        vertex_count: vertex_count.into(),
    }
}

#[derive(Debug)]
pub struct DirectedAcyclicGraphStrategy {
    vertex_count: Range<Vertex>,
}

/// Shrinks by binary search over how many of the generated edge attempts are
/// replayed.
#[derive(Debug)]
pub struct DirectedAcyclicGraphValueTree {
    vertex_count: Vertex,
    attempts: Vec<(Vertex, Vertex)>,
    lo: usize,
    curr: usize,
    hi: usize,
}

impl Strategy for DirectedAcyclicGraphStrategy {
    type Tree = DirectedAcyclicGraphValueTree;

    type Value = DirectedAcyclicGraph;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        // Copied out of self.vertex_count.assert_nonempty(), because that's private to proptest
        if self.vertex_count.is_empty() {
            panic!(
                "Invalid use of empty size range. (hint: did you \
                 accidentally write {}..{} where you meant {}..={} \
                 somewhere?)",
                self.vertex_count.start,
                self.vertex_count.end,
                self.vertex_count.start,
                self.vertex_count.end
            );
        }
        let vertex_count =
            Uniform::new(self.vertex_count.start, self.vertex_count.end).sample(runner.rng());

        let mut attempts = Vec::new();
        if vertex_count > 0 {
            let vertices = Uniform::new(0, vertex_count);
            let attempt_count = Uniform::new_inclusive(0, 2 * vertex_count).sample(runner.rng());
            for _ in 0..attempt_count {
                let u = vertices.sample(runner.rng());
                let v = vertices.sample(runner.rng());
                attempts.push((u, v));
            }
        }

        let len = attempts.len();
        Ok(DirectedAcyclicGraphValueTree {
            vertex_count,
            attempts,
            lo: 0,
            curr: len,
            hi: len,
        })
    }
}

impl DirectedAcyclicGraphValueTree {
    fn reposition(&mut self) -> bool {
        let new_mid = self.lo + (self.hi - self.lo) / 2;
        if new_mid == self.curr {
            false
        } else {
            self.curr = new_mid;
            true
        }
    }
}

impl ValueTree for DirectedAcyclicGraphValueTree {
    type Value = DirectedAcyclicGraph;

    fn current(&self) -> Self::Value {
        let mut dag = DirectedAcyclicGraph::new(self.vertex_count);
        for &(u, v) in &self.attempts[..self.curr] {
            // Attempts are sampled below vertex_count.
            dag.insert_edge(u, v);
        }
        dag
    }

    fn simplify(&mut self) -> bool {
        if self.hi <= self.lo {
            return false;
        }
        self.hi = self.curr;
        self.reposition()
    }

    fn complicate(&mut self) -> bool {
        if self.hi <= self.lo {
            return false;
        }
        self.lo = self.curr + 1;
        self.reposition()
    }
}
