//! Lowest Common Ancestor (LCA) queries.
//!
//! In a DAG a vertex may have several parents, so two vertices can have
//! several *incomparable* lowest common ancestors.  In the diamond
//!
//! ```text
//! 0   2
//! |\ /|
//! | X |
//! |/ \|
//! 3   5
//! ```
//!
//! both 0 and 2 are lowest common ancestors of 3 and 5.
//!
//! # Algorithm
//!
//! Mark the ancestor closure of `v1` (including `v1`), then walk upward from
//! `v2` one level of parents at a time.  The answer is every marked vertex on
//! the first level that touches the marked set, and the walk stops there.
//!
//! The level is counted from `v2` only.  A common ancestor found on that level
//! is not guaranteed to be undominated: with edges 0→1, 1→2, 0→3, 1→4, 4→5,
//! 5→3 the query `(2, 3)` yields `{0}`, since 0 is one level above 3 while 1
//! is three levels above it.

use roaring::RoaringBitmap;

use crate::dag::DirectedAcyclicGraph;
use crate::error::GraphError;
use crate::Vertex;

fn mark_ancestors(parents: &[Vec<Vertex>], vertex: Vertex) -> RoaringBitmap {
    let mut marked = RoaringBitmap::new();
    let mut to_visit = vec![vertex];
    while let Some(u) = to_visit.pop() {
        if marked.insert(u) {
            to_visit.extend(parents[u as usize].iter().filter(|p| !marked.contains(**p)));
        }
    }
    marked
}

impl DirectedAcyclicGraph {
    /// Every vertex from which `vertex` is reachable, `vertex` included.
    pub fn ancestors(&self, vertex: Vertex) -> Result<RoaringBitmap, GraphError> {
        self.check_vertex(vertex)?;
        Ok(mark_ancestors(&self.parent_table(), vertex))
    }

    /// Returns the common ancestors of `v1` and `v2` that lie on the nearest
    /// parent level of `v2` holding any ancestor of `v1`.
    ///
    /// An empty set means the two vertices share no ancestor.
    ///
    /// # Special cases
    ///
    /// - If `v1 == v2`, returns `{v1}`.
    /// - If `v2` is an ancestor of `v1`, returns `{v2}`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexOutOfRange`] if either vertex is not in
    /// the graph.
    pub fn lowest_common_ancestors(
        &self,
        v1: Vertex,
        v2: Vertex,
    ) -> Result<RoaringBitmap, GraphError> {
        self.check_vertex(v1)?;
        self.check_vertex(v2)?;

        if v1 == v2 {
            return Ok(RoaringBitmap::from([v1]));
        }

        let parents = self.parent_table();
        let ancestors_of_v1 = mark_ancestors(&parents, v1);
        if ancestors_of_v1.contains(v2) {
            cov_mark::hit!(second_vertex_is_ancestor);
            return Ok(RoaringBitmap::from([v2]));
        }

        let mut visited = RoaringBitmap::from([v2]);
        let mut level: Vec<Vertex> = Vec::new();
        for &p in &parents[v2 as usize] {
            if visited.insert(p) {
                level.push(p);
            }
        }

        while !level.is_empty() {
            let common: RoaringBitmap = level
                .iter()
                .copied()
                .filter(|u| ancestors_of_v1.contains(*u))
                .collect();
            if !common.is_empty() {
                return Ok(common);
            }

            let mut next_level = Vec::new();
            for &u in &level {
                for &p in &parents[u as usize] {
                    if visited.insert(p) {
                        next_level.push(p);
                    }
                }
            }
            level = next_level;
        }

        cov_mark::hit!(no_common_ancestor);
        Ok(RoaringBitmap::new())
    }

    /// Picks one vertex out of [`Self::lowest_common_ancestors`].
    ///
    /// All members of that set lie at the same distance from `v2`, so the
    /// smallest vertex id breaks the tie.  `Ok(None)` means no common
    /// ancestor exists.
    pub fn lowest_common_ancestor(
        &self,
        v1: Vertex,
        v2: Vertex,
    ) -> Result<Option<Vertex>, GraphError> {
        Ok(self.lowest_common_ancestors(v1, v2)?.min())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::dag::arb_dag;

    fn ten_vertices_with(edges: &[(Vertex, Vertex)]) -> DirectedAcyclicGraph {
        DirectedAcyclicGraph::from_edges_iter(10, edges.iter().copied()).unwrap()
    }

    fn diamond() -> DirectedAcyclicGraph {
        ten_vertices_with(&[(0, 3), (0, 5), (2, 3), (2, 5)])
    }

    fn chain() -> DirectedAcyclicGraph {
        ten_vertices_with(&[(0, 3), (0, 5), (3, 7), (5, 7), (7, 8), (5, 9), (9, 4)])
    }

    #[test]
    fn diamond_has_two_lowest_common_ancestors() {
        let dag = diamond();
        assert_eq!(
            dag.lowest_common_ancestors(3, 5),
            Ok(RoaringBitmap::from([0, 2]))
        );
        assert_eq!(dag.lowest_common_ancestor(3, 5), Ok(Some(0)));
    }

    #[test]
    fn nearer_level_wins_on_a_chain() {
        let dag = chain();
        assert_eq!(dag.lowest_common_ancestors(7, 9), Ok(RoaringBitmap::from([5])));
        assert_eq!(dag.lowest_common_ancestors(8, 4), Ok(RoaringBitmap::from([5])));
        assert_eq!(dag.lowest_common_ancestors(3, 9), Ok(RoaringBitmap::from([0])));
    }

    #[test]
    fn vertex_is_its_own_lowest_common_ancestor() {
        let dag = chain();
        assert_eq!(dag.lowest_common_ancestors(2, 2), Ok(RoaringBitmap::from([2])));
        assert_eq!(dag.lowest_common_ancestor(2, 2), Ok(Some(2)));
    }

    #[test]
    fn ancestor_vertex_is_the_answer() {
        let dag = chain();
        {
            cov_mark::check!(second_vertex_is_ancestor);
            assert_eq!(dag.lowest_common_ancestors(8, 3), Ok(RoaringBitmap::from([3])));
        }
        // The other way round the walk from 8 reaches 3 through 7.
        assert_eq!(dag.lowest_common_ancestors(3, 8), Ok(RoaringBitmap::from([3])));
    }

    #[test]
    fn invalid_vertex_is_an_error() {
        let dag = chain();
        assert_eq!(
            dag.lowest_common_ancestors(Vertex::MAX, 7),
            Err(GraphError::VertexOutOfRange {
                vertex: Vertex::MAX,
                vertex_count: 10
            })
        );
        assert_eq!(
            dag.lowest_common_ancestors(10, 2),
            Err(GraphError::VertexOutOfRange {
                vertex: 10,
                vertex_count: 10
            })
        );
        assert!(dag.lowest_common_ancestor(2, 10).is_err());
        assert!(dag.ancestors(10).is_err());
    }

    #[test]
    fn disjoint_vertices_have_no_common_ancestor() {
        let dag = chain();
        {
            cov_mark::check!(no_common_ancestor);
            assert_eq!(dag.lowest_common_ancestors(1, 7), Ok(RoaringBitmap::new()));
        }
        assert_eq!(dag.lowest_common_ancestor(1, 7), Ok(None));
        assert_eq!(dag.lowest_common_ancestors(3, 6), Ok(RoaringBitmap::new()));
    }

    #[test]
    fn ancestors_include_the_vertex_itself() {
        let dag = chain();
        assert_eq!(dag.ancestors(4), Ok(RoaringBitmap::from([0, 4, 5, 9])));
        assert_eq!(dag.ancestors(0), Ok(RoaringBitmap::from([0])));
    }

    #[test]
    fn search_stops_at_the_first_matching_level() {
        // 0 is a common ancestor of 2 and 3 too, but 1 sits between them.
        let dag = ten_vertices_with(&[(0, 1), (1, 2), (1, 3)]);
        assert_eq!(dag.lowest_common_ancestors(2, 3), Ok(RoaringBitmap::from([1])));
    }

    #[test]
    fn levels_are_counted_from_the_second_vertex() {
        let dag = ten_vertices_with(&[(0, 1), (1, 2), (0, 3), (1, 4), (4, 5), (5, 3)]);
        assert_eq!(dag.lowest_common_ancestors(2, 3), Ok(RoaringBitmap::from([0])));
        // Swapped, the walk starts from 2 and meets 1 first.
        assert_eq!(dag.lowest_common_ancestors(3, 2), Ok(RoaringBitmap::from([1])));
    }

    #[test]
    fn every_match_on_the_first_matching_level_is_returned() {
        // Seen from 3, the first level is {2, 5} and the second is {1, 6}.
        let dag = ten_vertices_with(&[(1, 2), (2, 3), (1, 4), (6, 4), (6, 5), (5, 3)]);
        assert_eq!(dag.lowest_common_ancestors(4, 3), Ok(RoaringBitmap::from([1, 6])));
    }

    proptest! {
        #[test]
        fn every_lowest_common_ancestor_is_a_common_ancestor(dag in arb_dag(1..20)) {
            for v1 in 0..dag.get_vertex_count() {
                let ancestors_of_v1 = dag.ancestors(v1).unwrap();
                for v2 in 0..dag.get_vertex_count() {
                    let ancestors_of_v2 = dag.ancestors(v2).unwrap();
                    let lcas = dag.lowest_common_ancestors(v1, v2).unwrap();
                    prop_assert!(lcas.is_subset(&ancestors_of_v1));
                    prop_assert!(lcas.is_subset(&ancestors_of_v2));
                    prop_assert_eq!(lcas.is_empty(), ancestors_of_v1.is_disjoint(&ancestors_of_v2));
                }
            }
        }

        #[test]
        fn single_answer_is_the_smallest_of_the_set(dag in arb_dag(1..20)) {
            for v1 in 0..dag.get_vertex_count() {
                for v2 in 0..dag.get_vertex_count() {
                    let lcas = dag.lowest_common_ancestors(v1, v2).unwrap();
                    prop_assert_eq!(dag.lowest_common_ancestor(v1, v2).unwrap(), lcas.min());
                }
            }
        }
    }
}
