use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Goods moving through the network. Gold and Diamond are raw, Jewelry is
/// manufactured from them. Ordering follows declaration order, which is the
/// order constraints and variables are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Commodity {
    Gold,
    Diamond,
    Jewelry,
}

impl Commodity {
    pub const ALL: [Commodity; 3] = [Commodity::Gold, Commodity::Diamond, Commodity::Jewelry];

    /// One-letter prefix used in variable names and config keys
    pub fn symbol(self) -> &'static str {
        match self {
            Commodity::Gold => "G",
            Commodity::Diamond => "D",
            Commodity::Jewelry => "J",
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Commodity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "G" | "gold" | "Gold" => Ok(Commodity::Gold),
            "D" | "diamond" | "Diamond" => Ok(Commodity::Diamond),
            "J" | "jewelry" | "Jewelry" => Ok(Commodity::Jewelry),
            _ => Err(ModelError::UnknownCommodity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Quarry,
    Market,
    Factory,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Quarry, Role::Market, Role::Factory];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Quarry => "quarry",
            Role::Market => "market",
            Role::Factory => "factory",
        };
        f.pad(name)
    }
}
