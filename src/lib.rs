pub mod bst;
pub mod dag;
pub mod error;
mod lca;
mod traversal;

pub type Vertex = u32;

trait TraversableDirectedGraph {
    fn extend_with_children(&self, u: Vertex, children: &mut Vec<Vertex>);
    fn extend_with_parents(&self, v: Vertex, parents: &mut Vec<Vertex>);
}

impl<T: TraversableDirectedGraph> TraversableDirectedGraph for &T {
    fn extend_with_children(&self, u: Vertex, children: &mut Vec<Vertex>) {
        T::extend_with_children(self, u, children)
    }

    fn extend_with_parents(&self, v: Vertex, parents: &mut Vec<Vertex>) {
        T::extend_with_parents(self, v, parents)
    }
}

pub use bst::BinarySearchTree;
pub use dag::{arb_dag, DirectedAcyclicGraph, EdgeInsertion};
pub use error::GraphError;
