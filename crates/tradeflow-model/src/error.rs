use thiserror::Error;

use crate::commodity::{Commodity, Role};
use crate::network::NodeId;

/// Inconsistent static configuration. Raised while an [`crate::Economy`] is
/// assembled, before any LP text exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Network has no nodes")]
    EmptyNetwork,
    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),
    #[error("Unknown node {node} referenced by {context}")]
    UnknownNode { node: NodeId, context: String },
    #[error("Node {0} listed twice in the adjacency")]
    DuplicateNode(NodeId),
    #[error("Node {0} has no neighbours")]
    IsolatedNode(NodeId),
    #[error("Node {0} lists itself as a neighbour")]
    SelfLoop(NodeId),
    #[error("Node {node} lists neighbour {neighbor} more than once")]
    DuplicateNeighbor { node: NodeId, neighbor: NodeId },
    #[error("Edge {from}-{to} is missing its reverse entry {to}-{from}")]
    AsymmetricEdge { from: NodeId, to: NodeId },
    #[error("Node {node} is assigned both {first} and {second}")]
    DuplicateRole { node: NodeId, first: Role, second: Role },
    #[error("Node {0} has no role")]
    UnassignedNode(NodeId),
    #[error("Unknown commodity: {0}")]
    UnknownCommodity(String),
    #[error("Market has no price for {0}")]
    MissingPrice(Commodity),
    #[error("{role} has no ratio for {commodity}")]
    MissingRatio { role: Role, commodity: Commodity },
    #[error("Quarry must output exactly two commodities, found {0}")]
    QuarryOutputArity(usize),
    #[error("Factory must make exactly one product, found {0}")]
    FactoryProductArity(usize),
    #[error("Factory recipe has no demand entries")]
    EmptyDemand,
    #[error("Factory product {0} cannot also be a demand")]
    ProductInDemand(Commodity),
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: String, value: f64 },
    #[error("Invalid variable name: {0}")]
    InvalidVariable(String),
    #[error("Cannot read config {path}: {message}")]
    ReadConfig { path: String, message: String },
    #[error("Cannot parse config {path}: {message}")]
    ParseConfig { path: String, message: String },
}
