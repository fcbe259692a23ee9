mod commodity;
pub mod config;
mod economy;
mod error;
pub mod generator;
mod network;
mod params;
mod roles;
mod variable;

pub use commodity::{Commodity, Role};
pub use config::{EconomyConfig, read_toml};
pub use economy::Economy;
pub use error::ModelError;
pub use generator::{ConstraintFamily, Generator, generate};
pub use network::{Network, NodeId};
pub use params::{FactoryParams, Limits, MarketParams, QuarryParams};
pub use roles::RoleAssignment;
pub use variable::Variable;
