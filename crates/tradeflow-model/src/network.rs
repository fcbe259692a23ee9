use std::collections::{BTreeMap, HashSet};

use crate::error::ModelError;

pub type NodeId = u32;

/// Undirected graph stored as adjacency lists. Every edge appears once in
/// each endpoint's list; [`Network::arcs`] yields both directions and
/// [`Network::edges`] yields each edge once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Network {
    pub fn new(adjacency: BTreeMap<NodeId, Vec<NodeId>>) -> Result<Self, ModelError> {
        if adjacency.is_empty() {
            return Err(ModelError::EmptyNetwork);
        }

        for (&node, neighbors) in &adjacency {
            // rows over an isolated node would have no terms
            if neighbors.is_empty() {
                return Err(ModelError::IsolatedNode(node));
            }
            let mut seen = HashSet::new();
            for &neighbor in neighbors {
                if neighbor == node {
                    return Err(ModelError::SelfLoop(node));
                }
                if !seen.insert(neighbor) {
                    return Err(ModelError::DuplicateNeighbor { node, neighbor });
                }
                let back = adjacency.get(&neighbor).ok_or_else(|| ModelError::UnknownNode {
                    node: neighbor,
                    context: format!("adjacency of node {}", node),
                })?;
                if !back.contains(&node) {
                    return Err(ModelError::AsymmetricEdge { from: node, to: neighbor });
                }
            }
        }

        Ok(Self { adjacency })
    }

    /// The fixed 12-node trading graph
    pub fn standard() -> Self {
        let lists: [(NodeId, [NodeId; 3]); 12] = [
            (1, [2, 3, 5]),
            (2, [1, 7, 8]),
            (3, [1, 4, 9]),
            (4, [3, 5, 9]),
            (5, [1, 4, 6]),
            (6, [5, 7, 10]),
            (7, [2, 6, 8]),
            (8, [2, 7, 12]),
            (9, [3, 4, 11]),
            (10, [6, 11, 12]),
            (11, [9, 10, 12]),
            (12, [8, 10, 11]),
        ];
        Self {
            adjacency: lists.into_iter().map(|(n, ns)| (n, ns.to_vec())).collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn adjacency(&self) -> &BTreeMap<NodeId, Vec<NodeId>> {
        &self.adjacency
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Directed arcs `(node, neighbor)` in adjacency-list order
    pub fn arcs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&node, neighbors)| neighbors.iter().map(move |&n| (node, n)))
    }

    /// Each undirected edge once, as `(low, high)`. An edge is reported from
    /// its lower endpoint, so the order matches a walk that drops back
    /// references as it goes.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.arcs().filter(|(a, b)| a < b)
    }

    pub fn arc_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(lists: &[(NodeId, &[NodeId])]) -> BTreeMap<NodeId, Vec<NodeId>> {
        lists.iter().map(|(n, ns)| (*n, ns.to_vec())).collect()
    }

    #[test]
    fn test_standard_network_is_valid() {
        let standard = Network::standard();
        let rebuilt = Network::new(standard.adjacency().clone()).unwrap();
        assert_eq!(rebuilt, standard);
        assert_eq!(standard.node_count(), 12);
        assert_eq!(standard.arc_count(), 36);
    }

    #[test]
    fn test_edges_match_independent_count() {
        let network = Network::standard();
        let mut pairs = HashSet::new();
        for (node, neighbors) in network.adjacency() {
            for neighbor in neighbors {
                pairs.insert((*node.min(neighbor), *node.max(neighbor)));
            }
        }
        let edges: Vec<_> = network.edges().collect();
        assert_eq!(edges.len(), pairs.len());
        assert_eq!(edges.len(), 18);
        assert!(edges.iter().all(|e| pairs.contains(e)));
    }

    #[test]
    fn test_edge_order_follows_first_discovery() {
        let network = Network::standard();
        let first: Vec<_> = network.edges().take(6).collect();
        assert_eq!(first, vec![(1, 2), (1, 3), (1, 5), (2, 7), (2, 8), (3, 4)]);
    }

    #[test]
    fn test_rejects_asymmetric_edge() {
        let err = Network::new(adjacency(&[(1, &[2]), (2, &[])])).unwrap_err();
        assert_eq!(err, ModelError::AsymmetricEdge { from: 1, to: 2 });
    }

    #[test]
    fn test_rejects_isolated_node() {
        let err = Network::new(adjacency(&[(1, &[2]), (2, &[1]), (3, &[])])).unwrap_err();
        assert_eq!(err, ModelError::IsolatedNode(3));
        assert_eq!(Network::new(adjacency(&[(4, &[])])).unwrap_err(), ModelError::IsolatedNode(4));
    }

    #[test]
    fn test_rejects_unknown_neighbor() {
        let err = Network::new(adjacency(&[(1, &[7])])).unwrap_err();
        assert!(matches!(err, ModelError::UnknownNode { node: 7, .. }));
    }

    #[test]
    fn test_rejects_self_loop_and_duplicates() {
        assert_eq!(
            Network::new(adjacency(&[(1, &[1])])).unwrap_err(),
            ModelError::SelfLoop(1)
        );
        assert_eq!(
            Network::new(adjacency(&[(1, &[2, 2]), (2, &[1])])).unwrap_err(),
            ModelError::DuplicateNeighbor { node: 1, neighbor: 2 }
        );
        assert_eq!(Network::new(BTreeMap::new()).unwrap_err(), ModelError::EmptyNetwork);
    }

    #[test]
    fn test_neighbors_of_unknown_node_is_empty() {
        let network = Network::standard();
        assert_eq!(network.neighbors(5), &[1, 4, 6]);
        assert!(network.neighbors(99).is_empty());
        assert!(!network.contains(99));
    }
}
