use std::collections::BTreeMap;

use crate::commodity::{Commodity, Role};
use crate::error::ModelError;

/// Quarries extract raw goods at a fixed ratio. The `output` numbers serve
/// both as per-node production ceilings and as the ratio terms.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarryParams {
    /// Energy per unit of `energy_commodity` output
    pub energy: f64,
    pub output: BTreeMap<Commodity, f64>,
    /// Output commodity whose production defines the energy variable
    pub energy_commodity: Commodity,
}

impl QuarryParams {
    pub fn standard() -> Self {
        Self {
            energy: 100.0,
            output: BTreeMap::from([(Commodity::Gold, 200.0), (Commodity::Diamond, 75.0)]),
            energy_commodity: Commodity::Gold,
        }
    }

    /// The two `(commodity, ratio)` entries the ratio row couples, in
    /// commodity order
    pub fn ratio_pair(&self) -> ((Commodity, f64), (Commodity, f64)) {
        let mut entries = self.output.iter().map(|(c, r)| (*c, *r));
        let first = entries.next().unwrap_or((Commodity::Gold, 0.0));
        let second = entries.next().unwrap_or((Commodity::Diamond, 0.0));
        (first, second)
    }

    pub fn energy_yield(&self) -> f64 {
        self.output.get(&self.energy_commodity).copied().unwrap_or(0.0)
    }

    /// Commodities a quarry may only pass through
    pub fn transit_commodities(&self) -> impl Iterator<Item = Commodity> + '_ {
        Commodity::ALL.into_iter().filter(|c| !self.output.contains_key(c))
    }

    fn validate(&self) -> Result<(), ModelError> {
        check_finite("quarry.energy", self.energy)?;
        check_map("quarry.output", &self.output)?;
        // Ratio coupling is defined for exactly two outputs
        if self.output.len() != 2 {
            return Err(ModelError::QuarryOutputArity(self.output.len()));
        }
        if !self.output.contains_key(&self.energy_commodity) {
            return Err(ModelError::MissingRatio {
                role: Role::Quarry,
                commodity: self.energy_commodity,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketParams {
    pub prices: BTreeMap<Commodity, f64>,
}

impl MarketParams {
    pub fn standard() -> Self {
        Self {
            prices: BTreeMap::from([
                (Commodity::Gold, 150.0),
                (Commodity::Diamond, 200.0),
                (Commodity::Jewelry, 1000.0),
            ]),
        }
    }

    pub fn price(&self, commodity: Commodity) -> f64 {
        self.prices.get(&commodity).copied().unwrap_or(0.0)
    }

    fn validate(&self) -> Result<(), ModelError> {
        check_map("market.prices", &self.prices)?;
        match Commodity::ALL.into_iter().find(|c| !self.prices.contains_key(c)) {
            Some(missing) => Err(ModelError::MissingPrice(missing)),
            None => Ok(()),
        }
    }
}

/// Factories turn raw goods into one product at a fixed recipe
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryParams {
    /// Energy per unit of product
    pub energy: f64,
    pub product: Commodity,
    /// Product side of the recipe; also the per-node production ceiling and
    /// the energy yield
    pub product_ratio: f64,
    pub demand: BTreeMap<Commodity, f64>,
}

impl FactoryParams {
    pub fn standard() -> Self {
        Self {
            energy: 300.0,
            product: Commodity::Jewelry,
            product_ratio: 60.0,
            demand: BTreeMap::from([(Commodity::Gold, 70.0), (Commodity::Diamond, 20.0)]),
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        check_finite("factory.energy", self.energy)?;
        check_finite(&format!("factory.product.{}", self.product), self.product_ratio)?;
        check_map("factory.demand", &self.demand)?;
        if self.demand.contains_key(&self.product) {
            return Err(ModelError::ProductInDemand(self.product));
        }
        if self.demand.is_empty() {
            return Err(ModelError::EmptyDemand);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Ceiling on the total flow of all commodities across one edge, both directions
    pub edge_flow: f64,
    /// Ceiling on the sum of all energy variables
    pub max_energy: f64,
}

impl Limits {
    pub fn standard() -> Self {
        Self {
            edge_flow: 165.0,
            max_energy: 850.0,
        }
    }

    /// Negative limits are legal (the LP is then infeasible); NaN and
    /// infinities cannot be written as LP numbers
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        check_finite("limits.edge_flow", self.edge_flow)?;
        check_finite("limits.max_energy", self.max_energy)
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

fn check_map(section: &str, map: &BTreeMap<Commodity, f64>) -> Result<(), ModelError> {
    for (commodity, &value) in map {
        check_finite(&format!("{}.{}", section, commodity), value)?;
    }
    Ok(())
}

pub(crate) fn validate_all(quarry: &QuarryParams, market: &MarketParams, factory: &FactoryParams) -> Result<(), ModelError> {
    quarry.validate()?;
    market.validate()?;
    factory.validate()
}
