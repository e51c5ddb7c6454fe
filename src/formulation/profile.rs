//! Profile-following rules for variable renewables and CHP plants.
use super::variables::VariableMap;
use crate::id::{CarrierID, NodeID, PlantID};
use crate::model::Model;
use crate::plant::PlantCategory;
use crate::problem::{Constraint, LinearExpr, Problem, RuleOutcome};
use crate::time_slot::TimeSlot;
use anyhow::Result;
use itertools::iproduct;
use log::warn;

/// Output of profile plants equals profile times capacity
pub const VARIABLES_PROF: &str = "variables_prof";
/// Output of CHP plants is at least profile times capacity
pub const CHP_PROF: &str = "chp_prof";
/// Aggregate CHP capacity per node is at least the mandated minimum
pub const SET_CHP_CAP: &str = "set_chp_cap";

/// Time slot, plant, node and carrier tuples for plants in the given category
fn slot_plant_node_carriers(
    model: &Model,
    category: PlantCategory,
) -> impl Iterator<Item = (TimeSlot, PlantID, NodeID, CarrierID)> {
    let tuples: Vec<_> = model
        .iter_plant_carriers_in(category)
        .map(|(plant, carrier)| (plant.id.clone(), plant.node.clone(), carrier.clone()))
        .collect();

    iproduct!(model.time_slot_info.iter_ids(), tuples)
        .map(|(slot, (plant, node, carrier))| (*slot, plant, node, carrier))
}

/// Add the profile rule for plants following an exogenous supply profile:
/// `pwr = supprof * cap_pwr_tot`.
pub fn add_variables_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let index = slot_plant_node_carriers(model, PlantCategory::Profile);
    problem.add_family(VARIABLES_PROF, index, |(slot, plant, _, carrier)| {
        let pwr = variables
            .pwr
            .require(&(*slot, plant.clone(), carrier.clone()), VARIABLES_PROF)?;
        let cap_pwr_tot = variables
            .cap_pwr_tot
            .require(&(plant.clone(), carrier.clone()), VARIABLES_PROF)?;
        let profile = model
            .params
            .supprof
            .require(&(*slot, plant.clone(), carrier.clone()), VARIABLES_PROF)?;

        Ok(Constraint::equal(pwr, LinearExpr::term(cap_pwr_tot, profile.value())).into())
    })
}

/// Add the CHP rules.
///
/// * `pwr >= chpprof * cap_pwr_tot` for CHP plants on the primary carrier. Instances for other
///   carriers are skipped.
/// * `sum(cap_pwr_tot) >= chp_cap_pwr_leg` over the CHP plants of each node, for nodes with a
///   mandated CHP capacity. Nodes without one are skipped.
pub fn add_chp_rules(problem: &mut Problem, variables: &VariableMap, model: &Model) -> Result<()> {
    let params = &model.params;

    let index = slot_plant_node_carriers(model, PlantCategory::Chp);
    problem.add_family(CHP_PROF, index, |(slot, plant, node, carrier)| {
        if !model.is_primary_carrier(carrier) {
            return Ok(RuleOutcome::Skip);
        }

        let pwr = variables
            .pwr
            .require(&(*slot, plant.clone(), carrier.clone()), CHP_PROF)?;
        let cap_pwr_tot = variables
            .cap_pwr_tot
            .require(&(plant.clone(), carrier.clone()), CHP_PROF)?;
        let profile = params
            .chpprof
            .require(&(*slot, node.clone(), carrier.clone()), CHP_PROF)?;

        Ok(Constraint::at_least(pwr, LinearExpr::term(cap_pwr_tot, profile.value())).into())
    })?;

    problem.add_family(SET_CHP_CAP, model.nodes.iter().cloned(), |node| {
        let Some(minimum) = params.chp_cap_pwr_leg.get(node) else {
            return Ok(RuleOutcome::Skip);
        };

        let mut total = LinearExpr::default();
        for plant in model
            .iter_plants_at(node, &model.primary_carrier)
            .filter(|plant| plant.is(PlantCategory::Chp))
        {
            let key = (plant.id.clone(), model.primary_carrier.clone());
            total.add_term(variables.cap_pwr_tot.require(&key, SET_CHP_CAP)?, 1.0);
        }
        if total.is_constant() {
            warn!("Node {node} has a mandated CHP capacity but no CHP plants; skipping");
            return Ok(RuleOutcome::Skip);
        }

        Ok(Constraint::at_least(total, minimum.value()).into())
    })
}
