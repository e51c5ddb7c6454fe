//! The supply-demand balance per time slot, node and carrier.
use super::variables::VariableMap;
use crate::model::Model;
use crate::plant::PlantCategory;
use crate::problem::{Constraint, LinearExpr, Problem, RuleOutcome};
use anyhow::Result;
use itertools::iproduct;

/// Constraint family name
pub const SUPPLY: &str = "supply";

/// Add the supply rule.
///
/// For every time slot, node and carrier:
///
/// ```text
/// sum(pwr) - sum(pwr of selling/curtailment plants) + incoming trm
///     == (demand + outgoing trm + storage charging + conversion input draw) * (1 + grid losses)
/// ```
///
/// Selling and curtailment plants are net consumers, so their output counts negatively. The
/// conversion draw covers plants at this node which turn this carrier into another one: each
/// consumes its output power divided by its efficiency.
pub fn add_supply_rules(problem: &mut Problem, variables: &VariableMap, model: &Model) -> Result<()> {
    let params = &model.params;
    let index = iproduct!(model.time_slot_info.iter_ids(), &model.node_carriers)
        .map(|(slot, (node, carrier))| (*slot, node.clone(), carrier.clone()));

    problem.add_family(SUPPLY, index, |(slot, node, carrier)| {
        let mut production = LinearExpr::default();
        for plant in model.iter_plants_at(node, carrier) {
            let pwr = variables
                .pwr
                .require(&(*slot, plant.id.clone(), carrier.clone()), SUPPLY)?;
            let sign = if plant.is_net_consumer() { -1.0 } else { 1.0 };
            production.add_term(pwr, sign);
        }
        for from in model.iter_sources_of(node, carrier) {
            let key = (*slot, from.clone(), node.clone(), carrier.clone());
            production.add_term(variables.trm.require(&key, SUPPLY)?, 1.0);
        }

        let demand = params
            .demand
            .require(&(*slot, node.clone(), carrier.clone()), SUPPLY)?;
        let mut consumption = LinearExpr::constant(demand.value());
        for to in model.iter_destinations_of(node, carrier) {
            let key = (*slot, node.clone(), to.clone(), carrier.clone());
            consumption.add_term(variables.trm.require(&key, SUPPLY)?, 1.0);
        }
        for plant in model
            .iter_plants_at(node, carrier)
            .filter(|plant| plant.is(PlantCategory::Storage))
        {
            let key = (*slot, plant.id.clone(), carrier.clone());
            consumption.add_term(variables.pwr_st_ch.require(&key, SUPPLY)?, 1.0);
        }
        for (plant, carrier_out) in model.iter_conversions_drawing(node, carrier) {
            let eff = params
                .pp_eff
                .require(&(plant.id.clone(), carrier_out.clone()), SUPPLY)?;
            let key = (*slot, plant.id.clone(), carrier_out.clone());
            consumption.add_term(variables.pwr.require(&key, SUPPLY)?, 1.0 / eff.value());
        }

        let losses = params
            .grid_losses
            .require(&(node.clone(), carrier.clone()), SUPPLY)?;
        Ok(RuleOutcome::Constraint(Constraint::equal(
            production,
            consumption * (1.0 + losses.value()),
        )))
    })
}
