//! TOML overrides for the standard scenario.
//!
//! Every section is optional; a missing section or field keeps the value
//! from [`Economy::standard`]. Commodity keys use the `G`/`D`/`J` symbols.
//!
//! ```toml
//! [limits]
//! edge_flow = 120
//!
//! [market.prices]
//! G = 150
//! D = 200
//! J = 1000
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::commodity::{Commodity, Role};
use crate::economy::Economy;
use crate::error::ModelError;
use crate::network::{Network, NodeId};
use crate::params::{FactoryParams, Limits, MarketParams, QuarryParams};
use crate::roles::RoleAssignment;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub network: Option<NetworkConfig>,
    pub roles: Option<RolesConfig>,
    pub quarry: Option<QuarryConfig>,
    pub market: Option<MarketConfig>,
    pub factory: Option<FactoryConfig>,
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Node id (as a string key) to neighbour list
    pub adjacency: BTreeMap<String, Vec<NodeId>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolesConfig {
    pub quarry: Vec<NodeId>,
    pub market: Vec<NodeId>,
    pub factory: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuarryConfig {
    pub energy: Option<f64>,
    pub energy_commodity: Option<String>,
    pub output: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    pub prices: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    pub energy: Option<f64>,
    /// Exactly one entry: product symbol to its recipe ratio
    pub product: Option<BTreeMap<String, f64>>,
    pub demand: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub edge_flow: Option<f64>,
    pub max_energy: Option<f64>,
}

impl EconomyConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ModelError> {
        toml::from_str(source).map_err(|err| ModelError::ParseConfig {
            path: "<inline>".to_string(),
            message: err.to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        read_toml(path.as_ref())
    }

    /// Resolve overrides against the standard scenario and validate the result
    pub fn into_economy(self) -> Result<Economy, ModelError> {
        let standard = Economy::standard();

        let network = match self.network {
            Some(config) => {
                let mut adjacency = BTreeMap::new();
                for (key, neighbors) in config.adjacency {
                    let node = key
                        .trim()
                        .parse::<NodeId>()
                        .map_err(|_| ModelError::InvalidNodeId(key.clone()))?;
                    // "1" and "01" name the same node
                    if adjacency.insert(node, neighbors).is_some() {
                        return Err(ModelError::DuplicateNode(node));
                    }
                }
                Network::new(adjacency)?
            }
            None => standard.network().clone(),
        };

        let roles = match self.roles {
            Some(config) => RoleAssignment::new(&network, config.quarry, config.market, config.factory)?,
            // Standard roles must still partition a replaced network
            None => RoleAssignment::new(
                &network,
                standard.roles().nodes(Role::Quarry).to_vec(),
                standard.roles().nodes(Role::Market).to_vec(),
                standard.roles().nodes(Role::Factory).to_vec(),
            )?,
        };

        let quarry = match self.quarry {
            Some(config) => {
                let base = standard.quarry();
                QuarryParams {
                    energy: config.energy.unwrap_or(base.energy),
                    energy_commodity: match config.energy_commodity {
                        Some(symbol) => symbol.parse()?,
                        None => base.energy_commodity,
                    },
                    output: match config.output {
                        Some(map) => commodity_map(map)?,
                        None => base.output.clone(),
                    },
                }
            }
            None => standard.quarry().clone(),
        };

        let market = match self.market.and_then(|m| m.prices) {
            Some(prices) => MarketParams {
                prices: commodity_map(prices)?,
            },
            None => standard.market().clone(),
        };

        let factory = match self.factory {
            Some(config) => {
                let base = standard.factory();
                let (product, product_ratio) = match config.product {
                    Some(map) => {
                        let map = commodity_map(map)?;
                        if map.len() != 1 {
                            return Err(ModelError::FactoryProductArity(map.len()));
                        }
                        map.into_iter()
                            .next()
                            .ok_or(ModelError::FactoryProductArity(0))?
                    }
                    None => (base.product, base.product_ratio),
                };
                FactoryParams {
                    energy: config.energy.unwrap_or(base.energy),
                    product,
                    product_ratio,
                    demand: match config.demand {
                        Some(map) => commodity_map(map)?,
                        None => base.demand.clone(),
                    },
                }
            }
            None => standard.factory().clone(),
        };

        let limits = match self.limits {
            Some(config) => Limits {
                edge_flow: config.edge_flow.unwrap_or(standard.limits().edge_flow),
                max_energy: config.max_energy.unwrap_or(standard.limits().max_energy),
            },
            None => standard.limits(),
        };

        Economy::new(network, roles, quarry, market, factory, limits)
    }
}

fn commodity_map(map: BTreeMap<String, f64>) -> Result<BTreeMap<Commodity, f64>, ModelError> {
    map.into_iter()
        .map(|(symbol, value)| Ok((symbol.parse::<Commodity>()?, value)))
        .collect()
}

/// Read and deserialize a TOML file. Callers with sections of their own can
/// flatten [`EconomyConfig`] into a wider struct and load it here.
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = fs::read_to_string(path).map_err(|err| ModelError::ReadConfig {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    debug!("loaded config from {}", path.display());
    toml::from_str(&content).map_err(|err| ModelError::ParseConfig {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}
