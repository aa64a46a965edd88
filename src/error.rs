use crate::Vertex;

/// Errors from graph mutations and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A vertex id outside `0..vertex_count` was passed in.
    #[error("vertex {vertex} out of range for a graph of {vertex_count} vertices")]
    VertexOutOfRange { vertex: Vertex, vertex_count: Vertex },
}
