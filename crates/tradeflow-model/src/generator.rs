use log::{debug, info};
use tradeflow_lp::{Bound, ConstraintOp, LinearExpr, LpProblem, Sense};

use crate::commodity::{Commodity, Role};
use crate::economy::Economy;
use crate::network::NodeId;
use crate::variable::Variable;

/// Name of the objective row
pub const OBJECTIVE_NAME: &str = "profit";
/// Name of the single global energy row
pub const ENERGY_BUDGET_ROW: &str = "energy_budget";

/// One economic law, emitted as one commented block of rows.
/// [`ConstraintFamily::ALL`] is the order blocks appear in the LP document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintFamily {
    /// Total flow of all commodities over an undirected edge
    FlowCapacity,
    /// Net output of a producer bounded by its capacity
    ProductionCapacity,
    /// Factory output tied to each raw input by the recipe
    FactoryRecipe,
    /// Quarry outputs held at the fixed ratio
    QuarryRatio,
    /// Factories never export raw inputs
    FactoryConsumption,
    /// Factories never import their product on net
    FactoryProduction,
    /// Quarries never import their outputs on net
    QuarryProduction,
    /// Goods a quarry does not extract only pass through it
    QuarryTransit,
    FactoryEnergy,
    QuarryEnergy,
    EnergyBudget,
    /// Markets cannot ship more than they receive
    MarketBalance,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 12] = [
        ConstraintFamily::FlowCapacity,
        ConstraintFamily::ProductionCapacity,
        ConstraintFamily::FactoryRecipe,
        ConstraintFamily::QuarryRatio,
        ConstraintFamily::FactoryConsumption,
        ConstraintFamily::FactoryProduction,
        ConstraintFamily::QuarryProduction,
        ConstraintFamily::QuarryTransit,
        ConstraintFamily::FactoryEnergy,
        ConstraintFamily::QuarryEnergy,
        ConstraintFamily::EnergyBudget,
        ConstraintFamily::MarketBalance,
    ];

    /// Comment line written above the block
    pub fn describe(self, economy: &Economy) -> String {
        match self {
            ConstraintFamily::FlowCapacity => {
                format!("flow capacity: total flow over each edge <= {}", economy.limits().edge_flow)
            }
            ConstraintFamily::ProductionCapacity => "production capacity: net output <= capacity".to_string(),
            ConstraintFamily::FactoryRecipe => {
                let factory = economy.factory();
                let mut symbols = vec![factory.product.symbol().to_string()];
                let mut ratios = vec![factory.product_ratio.to_string()];
                for (commodity, ratio) in &factory.demand {
                    symbols.push(commodity.symbol().to_string());
                    ratios.push(ratio.to_string());
                }
                format!("factory recipe {} = {}", symbols.join(":"), ratios.join(":"))
            }
            ConstraintFamily::QuarryRatio => {
                let ((a, ra), (b, rb)) = economy.quarry().ratio_pair();
                format!("quarry output ratio {}:{} = {}:{}", a, b, ra, rb)
            }
            ConstraintFamily::FactoryConsumption => "factories consume raw goods".to_string(),
            ConstraintFamily::FactoryProduction => "factories produce their product".to_string(),
            ConstraintFamily::QuarryProduction => "quarries produce raw goods".to_string(),
            ConstraintFamily::QuarryTransit => "quarries only transport other goods".to_string(),
            ConstraintFamily::FactoryEnergy => "energy from factory output".to_string(),
            ConstraintFamily::QuarryEnergy => "energy from quarry output".to_string(),
            ConstraintFamily::EnergyBudget => {
                format!("energy budget: total energy <= {}", economy.limits().max_energy)
            }
            ConstraintFamily::MarketBalance => "market input >= output".to_string(),
        }
    }
}

/// Translates an [`Economy`] into a maximization LP.
///
/// Flows are nonnegative variables `C_a_b` per commodity and directed arc.
/// Every per-node rule is written in terms of net outflow,
/// `sum(C_n_m) - sum(C_m_n)` over the node's neighbours `m`.
pub struct Generator<'a> {
    economy: &'a Economy,
}

impl<'a> Generator<'a> {
    pub fn new(economy: &'a Economy) -> Self {
        Self { economy }
    }

    pub fn generate(&self) -> LpProblem {
        let mut lp = LpProblem::new(Sense::Maximize);
        lp.set_objective(OBJECTIVE_NAME, self.objective());

        for family in ConstraintFamily::ALL {
            lp.begin_block(family.describe(self.economy));
            let before = lp.num_constraints();
            self.emit(family, &mut lp);
            debug!("{:?}: {} rows", family, lp.num_constraints() - before);
        }

        self.emit_bounds(&mut lp);

        info!(
            "generated LP with {} rows, {} bounds, {} objective terms",
            lp.num_constraints(),
            lp.bounds.len(),
            lp.objective.expr.len()
        );
        lp
    }

    /// Arbitrage profit: a market pays for what it ships to a non-market
    /// neighbour and earns on what it receives from one. Market-to-market
    /// trades are left out.
    pub fn objective(&self) -> LinearExpr {
        let roles = self.economy.roles();
        let market = self.economy.market();
        let mut expr = LinearExpr::new();
        for &node in roles.nodes(Role::Market) {
            for &neighbor in self.economy.network().neighbors(node) {
                if roles.is(neighbor, Role::Market) {
                    continue;
                }
                for commodity in Commodity::ALL {
                    let price = market.price(commodity);
                    expr.add(-price, Variable::flow(commodity, node, neighbor).name());
                    expr.add(price, Variable::flow(commodity, neighbor, node).name());
                }
            }
        }
        expr
    }

    /// `sum(C_node_m) - sum(C_m_node)` over all neighbours `m`
    pub fn net_outflow(&self, commodity: Commodity, node: NodeId) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for &neighbor in self.economy.network().neighbors(node) {
            expr.add(1.0, Variable::flow(commodity, node, neighbor).name());
            expr.add(-1.0, Variable::flow(commodity, neighbor, node).name());
        }
        expr
    }

    fn net_inflow(&self, commodity: Commodity, node: NodeId) -> LinearExpr {
        let mut expr = LinearExpr::new();
        expr.add_scaled(-1.0, &self.net_outflow(commodity, node));
        expr
    }

    pub fn emit(&self, family: ConstraintFamily, lp: &mut LpProblem) {
        match family {
            ConstraintFamily::FlowCapacity => self.flow_capacity(lp),
            ConstraintFamily::ProductionCapacity => self.production_capacity(lp),
            ConstraintFamily::FactoryRecipe => self.factory_recipe(lp),
            ConstraintFamily::QuarryRatio => self.quarry_ratio(lp),
            ConstraintFamily::FactoryConsumption => self.factory_consumption(lp),
            ConstraintFamily::FactoryProduction => self.factory_production(lp),
            ConstraintFamily::QuarryProduction => self.quarry_production(lp),
            ConstraintFamily::QuarryTransit => self.quarry_transit(lp),
            ConstraintFamily::FactoryEnergy => self.factory_energy(lp),
            ConstraintFamily::QuarryEnergy => self.quarry_energy(lp),
            ConstraintFamily::EnergyBudget => self.energy_budget(lp),
            ConstraintFamily::MarketBalance => self.market_balance(lp),
        }
    }

    /// One row per undirected edge, reported from its lower endpoint
    fn flow_capacity(&self, lp: &mut LpProblem) {
        let limit = self.economy.limits().edge_flow;
        for (a, b) in self.economy.network().edges() {
            let mut expr = LinearExpr::new();
            for commodity in Commodity::ALL {
                expr.add(1.0, Variable::flow(commodity, a, b).name());
                expr.add(1.0, Variable::flow(commodity, b, a).name());
            }
            lp.add_constraint(format!("cap_{}_{}", a, b), expr, ConstraintOp::Le, limit);
        }
    }

    fn production_capacity(&self, lp: &mut LpProblem) {
        let factory = self.economy.factory();
        for &node in self.economy.roles().nodes(Role::Factory) {
            lp.add_constraint(
                format!("prod_{}_{}", factory.product, node),
                self.net_outflow(factory.product, node),
                ConstraintOp::Le,
                factory.product_ratio,
            );
        }

        for (&commodity, &capacity) in &self.economy.quarry().output {
            for &node in self.economy.roles().nodes(Role::Quarry) {
                lp.add_constraint(
                    format!("prod_{}_{}", commodity, node),
                    self.net_outflow(commodity, node),
                    ConstraintOp::Le,
                    capacity,
                );
            }
        }
    }

    /// `r_X * out(P) + p * out(X) = 0` for each input X. Inputs flow in, so
    /// `out(X)` is the negated consumption.
    fn factory_recipe(&self, lp: &mut LpProblem) {
        let factory = self.economy.factory();
        for (&input, &input_ratio) in &factory.demand {
            for &node in self.economy.roles().nodes(Role::Factory) {
                let mut expr = LinearExpr::new();
                expr.add_scaled(input_ratio, &self.net_outflow(factory.product, node));
                expr.add_scaled(factory.product_ratio, &self.net_outflow(input, node));
                lp.add_constraint(
                    format!("recipe_{}_{}", input, node),
                    expr,
                    ConstraintOp::Eq,
                    0.0,
                );
            }
        }
    }

    /// For outputs (A, a) and (B, b): `a * out(B) - b * out(A) = 0`, which
    /// keeps `out(A) : out(B) = a : b`
    fn quarry_ratio(&self, lp: &mut LpProblem) {
        let ((first, first_ratio), (second, second_ratio)) = self.economy.quarry().ratio_pair();
        for &node in self.economy.roles().nodes(Role::Quarry) {
            let mut expr = LinearExpr::new();
            expr.add_scaled(first_ratio, &self.net_outflow(second, node));
            expr.add_scaled(-second_ratio, &self.net_outflow(first, node));
            lp.add_constraint(format!("ratio_{}", node), expr, ConstraintOp::Eq, 0.0);
        }
    }

    fn factory_consumption(&self, lp: &mut LpProblem) {
        for &input in self.economy.factory().demand.keys() {
            for &node in self.economy.roles().nodes(Role::Factory) {
                lp.add_constraint(
                    format!("use_{}_{}", input, node),
                    self.net_inflow(input, node),
                    ConstraintOp::Ge,
                    0.0,
                );
            }
        }
    }

    fn factory_production(&self, lp: &mut LpProblem) {
        let product = self.economy.factory().product;
        for &node in self.economy.roles().nodes(Role::Factory) {
            lp.add_constraint(
                format!("make_{}_{}", product, node),
                self.net_outflow(product, node),
                ConstraintOp::Ge,
                0.0,
            );
        }
    }

    fn quarry_production(&self, lp: &mut LpProblem) {
        for &commodity in self.economy.quarry().output.keys() {
            for &node in self.economy.roles().nodes(Role::Quarry) {
                lp.add_constraint(
                    format!("out_{}_{}", commodity, node),
                    self.net_outflow(commodity, node),
                    ConstraintOp::Ge,
                    0.0,
                );
            }
        }
    }

    fn quarry_transit(&self, lp: &mut LpProblem) {
        for &node in self.economy.roles().nodes(Role::Quarry) {
            for commodity in self.economy.quarry().transit_commodities() {
                lp.add_constraint(
                    format!("transit_{}_{}", commodity, node),
                    self.net_outflow(commodity, node),
                    ConstraintOp::Eq,
                    0.0,
                );
            }
        }
    }

    /// `energy * out(C) - yield * E_n = 0`
    fn energy_row(&self, lp: &mut LpProblem, node: NodeId, commodity: Commodity, energy: f64, energy_yield: f64) {
        let mut expr = LinearExpr::new();
        expr.add_scaled(energy, &self.net_outflow(commodity, node));
        expr.add(-energy_yield, Variable::Energy(node).name());
        lp.add_constraint(format!("energy_{}", node), expr, ConstraintOp::Eq, 0.0);
    }

    fn factory_energy(&self, lp: &mut LpProblem) {
        let factory = self.economy.factory();
        for &node in self.economy.roles().nodes(Role::Factory) {
            self.energy_row(lp, node, factory.product, factory.energy, factory.product_ratio);
        }
    }

    fn quarry_energy(&self, lp: &mut LpProblem) {
        let quarry = self.economy.quarry();
        for &node in self.economy.roles().nodes(Role::Quarry) {
            self.energy_row(lp, node, quarry.energy_commodity, quarry.energy, quarry.energy_yield());
        }
    }

    /// Every node contributes its energy variable, markets included
    fn energy_budget(&self, lp: &mut LpProblem) {
        let mut expr = LinearExpr::new();
        for node in self.economy.network().nodes() {
            expr.add(1.0, Variable::Energy(node).name());
        }
        lp.add_constraint(ENERGY_BUDGET_ROW, expr, ConstraintOp::Le, self.economy.limits().max_energy);
    }

    fn market_balance(&self, lp: &mut LpProblem) {
        for &node in self.economy.roles().nodes(Role::Market) {
            let mut expr = LinearExpr::new();
            for &neighbor in self.economy.network().neighbors(node) {
                for commodity in Commodity::ALL {
                    expr.add(-1.0, Variable::flow(commodity, node, neighbor).name());
                    expr.add(1.0, Variable::flow(commodity, neighbor, node).name());
                }
            }
            lp.add_constraint(format!("market_{}", node), expr, ConstraintOp::Ge, 0.0);
        }
    }

    /// Explicit `>= 0` for every flow variable, then every energy variable
    fn emit_bounds(&self, lp: &mut LpProblem) {
        for (node, neighbor) in self.economy.network().arcs() {
            for commodity in Commodity::ALL {
                lp.add_bound(Bound::nonnegative(Variable::flow(commodity, node, neighbor).name()));
            }
        }
        for node in self.economy.network().nodes() {
            lp.add_bound(Bound::nonnegative(Variable::Energy(node).name()));
        }
    }
}

/// Generate the LP for `economy`
pub fn generate(economy: &Economy) -> LpProblem {
    Generator::new(economy).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn block_len(lp: &LpProblem, family: ConstraintFamily, economy: &Economy) -> usize {
        lp.block(&family.describe(economy))
            .map(|b| b.constraints.len())
            .unwrap_or(0)
    }

    #[test]
    fn test_blocks_in_documented_order() {
        let economy = Economy::standard();
        let lp = generate(&economy);
        let comments: Vec<_> = lp.blocks.iter().map(|b| b.comment.clone().unwrap()).collect();
        let expected: Vec<_> = ConstraintFamily::ALL.iter().map(|f| f.describe(&economy)).collect();
        assert_eq!(comments, expected);
    }

    #[test]
    fn test_row_counts_per_family() {
        let economy = Economy::standard();
        let lp = generate(&economy);
        let counts: HashMap<_, _> = ConstraintFamily::ALL
            .iter()
            .map(|f| (*f, block_len(&lp, *f, &economy)))
            .collect();

        // 7 quarries, 3 factories, 2 markets, 18 edges
        assert_eq!(counts[&ConstraintFamily::FlowCapacity], 18);
        assert_eq!(counts[&ConstraintFamily::ProductionCapacity], 3 + 7 * 2);
        assert_eq!(counts[&ConstraintFamily::FactoryRecipe], 2 * 3);
        assert_eq!(counts[&ConstraintFamily::QuarryRatio], 7);
        assert_eq!(counts[&ConstraintFamily::FactoryConsumption], 2 * 3);
        assert_eq!(counts[&ConstraintFamily::FactoryProduction], 3);
        assert_eq!(counts[&ConstraintFamily::QuarryProduction], 7 * 2);
        assert_eq!(counts[&ConstraintFamily::QuarryTransit], 7);
        assert_eq!(counts[&ConstraintFamily::FactoryEnergy], 3);
        assert_eq!(counts[&ConstraintFamily::QuarryEnergy], 7);
        assert_eq!(counts[&ConstraintFamily::EnergyBudget], 1);
        assert_eq!(counts[&ConstraintFamily::MarketBalance], 2);
        assert_eq!(lp.num_constraints(), counts.values().sum::<usize>());
    }

    #[test]
    fn test_row_names_are_unique() {
        let lp = generate(&Economy::standard());
        let mut names = HashSet::new();
        for row in lp.constraints() {
            assert!(names.insert(row.name.clone()), "duplicate row {}", row.name);
        }
    }

    #[test]
    fn test_objective_skips_market_to_market_trades() {
        let economy = Economy::standard();
        let objective = Generator::new(&economy).objective();
        // market 5 trades with 1 and 4, market 6 with 7 and 10
        assert_eq!(objective.len(), 4 * 3 * 2);
        assert_eq!(objective.coefficient("G_5_1"), Some(-150.0));
        assert_eq!(objective.coefficient("G_1_5"), Some(150.0));
        assert_eq!(objective.coefficient("J_10_6"), Some(1000.0));
        assert_eq!(objective.coefficient("D_6_7"), Some(-200.0));
        assert_eq!(objective.coefficient("G_5_6"), None);
        assert_eq!(objective.coefficient("G_6_5"), None);
    }

    #[test]
    fn test_flow_capacity_row() {
        let lp = generate(&Economy::standard());
        let row = lp.constraint("cap_1_2").unwrap();
        assert_eq!(row.op, ConstraintOp::Le);
        assert_eq!(row.rhs, 165.0);
        let vars: Vec<_> = row.expr.variables().collect();
        assert_eq!(vars, vec!["G_1_2", "G_2_1", "D_1_2", "D_2_1", "J_1_2", "J_2_1"]);
        assert!(lp.constraint("cap_2_1").is_none());
    }

    #[test]
    fn test_net_outflow_signs() {
        let economy = Economy::standard();
        let net = Generator::new(&economy).net_outflow(Commodity::Gold, 4);
        assert_eq!(net.len(), 6);
        for neighbor in [3, 5, 9] {
            assert_eq!(net.coefficient(&format!("G_4_{}", neighbor)), Some(1.0));
            assert_eq!(net.coefficient(&format!("G_{}_4", neighbor)), Some(-1.0));
        }
    }

    #[test]
    fn test_factory_recipe_row() {
        let lp = generate(&Economy::standard());
        let row = lp.constraint("recipe_G_4").unwrap();
        assert_eq!(row.op, ConstraintOp::Eq);
        assert_eq!(row.rhs, 0.0);
        assert_eq!(row.expr.coefficient("J_4_3"), Some(70.0));
        assert_eq!(row.expr.coefficient("J_3_4"), Some(-70.0));
        assert_eq!(row.expr.coefficient("G_4_3"), Some(60.0));
        assert_eq!(row.expr.coefficient("G_3_4"), Some(-60.0));

        let diamond = lp.constraint("recipe_D_10").unwrap();
        assert_eq!(diamond.expr.coefficient("J_10_6"), Some(20.0));
        assert_eq!(diamond.expr.coefficient("D_6_10"), Some(-60.0));
    }

    #[test]
    fn test_recipe_holds_for_consistent_flows() {
        // factory 4 buys 70 gold and 20 diamond, ships 60 jewelry
        let lp = generate(&Economy::standard());
        let flows = HashMap::from([("G_3_4", 70.0), ("D_9_4", 20.0), ("J_4_5", 60.0)]);
        for name in ["recipe_G_4", "recipe_D_4"] {
            let row = lp.constraint(name).unwrap();
            assert_eq!(row.expr.evaluate(|v| flows.get(v).copied()), 0.0, "{}", name);
        }
        let consumption = lp.constraint("use_G_4").unwrap();
        assert_eq!(consumption.expr.evaluate(|v| flows.get(v).copied()), 70.0);
    }

    #[test]
    fn test_quarry_ratio_row() {
        let lp = generate(&Economy::standard());
        let row = lp.constraint("ratio_1").unwrap();
        assert_eq!(row.op, ConstraintOp::Eq);
        assert_eq!(row.expr.coefficient("D_1_2"), Some(200.0));
        assert_eq!(row.expr.coefficient("D_2_1"), Some(-200.0));
        assert_eq!(row.expr.coefficient("G_1_2"), Some(-75.0));
        assert_eq!(row.expr.coefficient("G_2_1"), Some(75.0));

        // 200 gold : 75 diamond satisfies 75 g = 200 d
        let flows = HashMap::from([("G_1_5", 200.0), ("D_1_5", 75.0)]);
        assert_eq!(row.expr.evaluate(|v| flows.get(v).copied()), 0.0);
    }

    #[test]
    fn test_quarry_transit_row() {
        let lp = generate(&Economy::standard());
        let row = lp.constraint("transit_J_8").unwrap();
        assert_eq!(row.op, ConstraintOp::Eq);
        assert!(row.expr.variables().all(|v| v.starts_with("J_")));
        assert_eq!(row.expr.len(), 6);
    }

    #[test]
    fn test_energy_rows() {
        let lp = generate(&Economy::standard());
        let factory = lp.constraint("energy_7").unwrap();
        assert_eq!(factory.expr.coefficient("J_7_2"), Some(300.0));
        assert_eq!(factory.expr.coefficient("J_2_7"), Some(-300.0));
        assert_eq!(factory.expr.coefficient("E_7"), Some(-60.0));

        let quarry = lp.constraint("energy_12").unwrap();
        assert_eq!(quarry.expr.coefficient("G_12_8"), Some(100.0));
        assert_eq!(quarry.expr.coefficient("E_12"), Some(-200.0));
        assert_eq!(quarry.expr.coefficient("D_12_8"), None);
    }

    #[test]
    fn test_energy_budget_covers_every_node() {
        let lp = generate(&Economy::standard());
        let row = lp.constraint(ENERGY_BUDGET_ROW).unwrap();
        assert_eq!(row.op, ConstraintOp::Le);
        assert_eq!(row.rhs, 850.0);
        assert_eq!(row.expr.len(), 12);
        assert!(row.expr.terms.iter().all(|t| t.coefficient == 1.0));
        let total: f64 = row.expr.terms.iter().map(|t| t.coefficient).sum();
        assert_eq!(total, 12.0);
    }

    #[test]
    fn test_market_balance_row() {
        let lp = generate(&Economy::standard());
        let row = lp.constraint("market_6").unwrap();
        assert_eq!(row.op, ConstraintOp::Ge);
        // 3 neighbours (including market 5), 3 commodities, 2 directions
        assert_eq!(row.expr.len(), 18);
        assert_eq!(row.expr.coefficient("J_6_5"), Some(-1.0));
        assert_eq!(row.expr.coefficient("J_5_6"), Some(1.0));
    }

    #[test]
    fn test_bounds_cover_each_variable_once() {
        let lp = generate(&Economy::standard());
        let mut bounded = HashSet::new();
        for bound in &lp.bounds {
            assert_eq!(bound.op, ConstraintOp::Ge);
            assert_eq!(bound.value, 0.0);
            assert!(bounded.insert(bound.variable.clone()), "{} bounded twice", bound.variable);
        }
        assert_eq!(lp.bounds.len(), 36 * 3 + 12);

        let used = lp
            .constraints()
            .flat_map(|c| c.expr.variables())
            .chain(lp.objective.expr.variables());
        for name in used {
            assert!(bounded.contains(name), "{} has no bound", name);
        }
    }
}
