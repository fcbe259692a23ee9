use log::warn;

use crate::commodity::Role;
use crate::error::ModelError;
use crate::network::Network;
use crate::params::{self, FactoryParams, Limits, MarketParams, QuarryParams};
use crate::roles::RoleAssignment;

/// Validated, immutable input to the LP generator
#[derive(Debug, Clone, PartialEq)]
pub struct Economy {
    network: Network,
    roles: RoleAssignment,
    quarry: QuarryParams,
    market: MarketParams,
    factory: FactoryParams,
    limits: Limits,
}

impl Economy {
    /// Fails on the first inconsistency: roles that do not partition the
    /// network, missing or non-finite parameters, non-finite limits
    pub fn new(
        network: Network,
        roles: RoleAssignment,
        quarry: QuarryParams,
        market: MarketParams,
        factory: FactoryParams,
        limits: Limits,
    ) -> Result<Self, ModelError> {
        check_roles(&network, &roles)?;
        params::validate_all(&quarry, &market, &factory)?;
        check_limits(&limits)?;

        Ok(Self {
            network,
            roles,
            quarry,
            market,
            factory,
            limits,
        })
    }

    /// The fixed 12-node scenario: edge limit 165, energy budget 850
    pub fn standard() -> Self {
        Self {
            network: Network::standard(),
            roles: RoleAssignment::standard(),
            quarry: QuarryParams::standard(),
            market: MarketParams::standard(),
            factory: FactoryParams::standard(),
            limits: Limits::standard(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Result<Self, ModelError> {
        check_limits(&limits)?;
        self.limits = limits;
        Ok(self)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    pub fn quarry(&self) -> &QuarryParams {
        &self.quarry
    }

    pub fn market(&self) -> &MarketParams {
        &self.market
    }

    pub fn factory(&self) -> &FactoryParams {
        &self.factory
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }
}

/// `roles` may have been built against a different network
fn check_roles(network: &Network, roles: &RoleAssignment) -> Result<(), ModelError> {
    for role in Role::ALL {
        if let Some(&node) = roles.nodes(role).iter().find(|n| !network.contains(**n)) {
            return Err(ModelError::UnknownNode {
                node,
                context: format!("{} role list", role),
            });
        }
    }
    match network.nodes().find(|n| roles.role_of(*n).is_none()) {
        Some(node) => Err(ModelError::UnassignedNode(node)),
        None => Ok(()),
    }
}

fn check_limits(limits: &Limits) -> Result<(), ModelError> {
    limits.validate()?;
    if limits.edge_flow < 0.0 {
        warn!("edge flow limit {} is negative, the LP has no feasible point", limits.edge_flow);
    }
    if limits.max_energy < 0.0 {
        warn!("energy budget {} is negative, the LP has no feasible point", limits.max_energy);
    }
    Ok(())
}
