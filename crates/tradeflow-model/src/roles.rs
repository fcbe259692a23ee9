use std::collections::BTreeMap;

use crate::commodity::Role;
use crate::error::ModelError;
use crate::network::{Network, NodeId};

/// Partition of the network's nodes into quarries, markets and factories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    quarries: Vec<NodeId>,
    markets: Vec<NodeId>,
    factories: Vec<NodeId>,
    by_node: BTreeMap<NodeId, Role>,
}

impl RoleAssignment {
    /// Every network node must appear in exactly one of the three lists
    pub fn new(
        network: &Network,
        quarries: Vec<NodeId>,
        markets: Vec<NodeId>,
        factories: Vec<NodeId>,
    ) -> Result<Self, ModelError> {
        let mut by_node = BTreeMap::new();
        for (role, nodes) in [
            (Role::Quarry, &quarries),
            (Role::Market, &markets),
            (Role::Factory, &factories),
        ] {
            for &node in nodes {
                if !network.contains(node) {
                    return Err(ModelError::UnknownNode {
                        node,
                        context: format!("{} role list", role),
                    });
                }
                if let Some(first) = by_node.insert(node, role) {
                    return Err(ModelError::DuplicateRole { node, first, second: role });
                }
            }
        }

        if let Some(node) = network.nodes().find(|n| !by_node.contains_key(n)) {
            return Err(ModelError::UnassignedNode(node));
        }

        Ok(Self {
            quarries,
            markets,
            factories,
            by_node,
        })
    }

    /// Roles for [`Network::standard`]
    pub fn standard() -> Self {
        let quarries = vec![1, 2, 3, 8, 9, 11, 12];
        let markets = vec![5, 6];
        let factories = vec![4, 7, 10];
        let by_node = [(&quarries, Role::Quarry), (&markets, Role::Market), (&factories, Role::Factory)]
            .into_iter()
            .flat_map(|(nodes, role)| nodes.iter().map(move |&n| (n, role)))
            .collect();
        Self {
            quarries,
            markets,
            factories,
            by_node,
        }
    }

    pub fn nodes(&self, role: Role) -> &[NodeId] {
        match role {
            Role::Quarry => &self.quarries,
            Role::Market => &self.markets,
            Role::Factory => &self.factories,
        }
    }

    pub fn role_of(&self, node: NodeId) -> Option<Role> {
        self.by_node.get(&node).copied()
    }

    pub fn is(&self, node: NodeId, role: Role) -> bool {
        self.role_of(node) == Some(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_roles_partition_nodes() {
        let network = Network::standard();
        let roles = RoleAssignment::standard();
        let rebuilt = RoleAssignment::new(
            &network,
            roles.nodes(Role::Quarry).to_vec(),
            roles.nodes(Role::Market).to_vec(),
            roles.nodes(Role::Factory).to_vec(),
        )
        .unwrap();
        assert_eq!(rebuilt, roles);

        for node in network.nodes() {
            let count = Role::ALL
                .iter()
                .filter(|r| roles.nodes(**r).contains(&node))
                .count();
            assert_eq!(count, 1, "node {} must have exactly one role", node);
        }
        assert_eq!(roles.role_of(5), Some(Role::Market));
        assert!(roles.is(10, Role::Factory));
    }

    #[test]
    fn test_node_in_two_roles() {
        let err = RoleAssignment::new(
            &Network::standard(),
            vec![1, 2, 3, 8, 9, 11, 12],
            vec![5, 6, 4],
            vec![4, 7, 10],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateRole {
                node: 4,
                first: Role::Market,
                second: Role::Factory
            }
        );
    }

    #[test]
    fn test_unassigned_node() {
        let err = RoleAssignment::new(
            &Network::standard(),
            vec![1, 2, 3, 8, 9, 11],
            vec![5, 6],
            vec![4, 7, 10],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::UnassignedNode(12));
    }

    #[test]
    fn test_role_for_unknown_node() {
        let err = RoleAssignment::new(&Network::standard(), vec![13], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownNode { node: 13, .. }));
    }
}
