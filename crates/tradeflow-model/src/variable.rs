use std::fmt;
use std::str::FromStr;

use crate::commodity::Commodity;
use crate::error::ModelError;
use crate::network::NodeId;

/// LP decision variable. Rendered as `G_1_2` for gold flowing 1 -> 2 and
/// `E_4` for the energy derived at node 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    Flow {
        commodity: Commodity,
        from: NodeId,
        to: NodeId,
    },
    Energy(NodeId),
}

impl Variable {
    pub fn flow(commodity: Commodity, from: NodeId, to: NodeId) -> Self {
        Variable::Flow { commodity, from, to }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Flow { commodity, from, to } => write!(f, "{}_{}_{}", commodity, from, to),
            Variable::Energy(node) => write!(f, "E_{}", node),
        }
    }
}

impl FromStr for Variable {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidVariable(s.to_string());
        let parts: Vec<&str> = s.split('_').collect();
        let node = |text: &str| text.parse::<NodeId>().map_err(|_| invalid());
        match parts.as_slice() {
            ["E", n] => Ok(Variable::Energy(node(n)?)),
            [c, a, b] => {
                let commodity = c.parse::<Commodity>().map_err(|_| invalid())?;
                if commodity.symbol() != *c {
                    return Err(invalid());
                }
                Ok(Variable::flow(commodity, node(a)?, node(b)?))
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Variable::flow(Commodity::Gold, 1, 2).name(), "G_1_2");
        assert_eq!(Variable::flow(Commodity::Jewelry, 10, 12).name(), "J_10_12");
        assert_eq!(Variable::Energy(7).name(), "E_7");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("D_11_9".parse::<Variable>().unwrap(), Variable::flow(Commodity::Diamond, 11, 9));
        assert_eq!("E_4".parse::<Variable>().unwrap(), Variable::Energy(4));
    }

    #[test]
    fn test_reject_malformed_names() {
        for bad in ["G_1", "X_1_2", "gold_1_2", "E_x", "G_1_2_3", "profit"] {
            assert!(bad.parse::<Variable>().is_err(), "{} should not parse", bad);
        }
    }
}
