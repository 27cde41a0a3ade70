use node::{NodeType, PropertyError};
use scene_graph::GraphError;
use thiserror::Error;

/// Every way a command can fail.
///
/// The `Display` text is what remote callers see in `Response.error`.
/// Partially applied text styling is not an error: it is reported as a
/// warning on a successful reply.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent node not found: {0}")]
    ParentNotFound(String),

    #[error("Cannot append to node type: {0}")]
    InvalidParent(NodeType),

    #[error("Node type does not support {property}: {node_type}")]
    UnsupportedProperty {
        node_type: NodeType,
        property: &'static str,
    },

    #[error("Component not found with key: {0}")]
    ComponentNotFound(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    InvalidProperty(#[from] PropertyError),

    /// A structural change the document refuses (cycles, removing the root).
    #[error("{0}")]
    Refused(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Failed to encode result: {0}")]
    Encode(String),

    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}

impl From<GraphError> for BridgeError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NotFound(id) => Self::NodeNotFound(id),
            GraphError::InvalidParent(node_type) => Self::InvalidParent(node_type),
            err @ (GraphError::Cycle | GraphError::Protected(_)) => Self::Refused(err.to_string()),
        }
    }
}
