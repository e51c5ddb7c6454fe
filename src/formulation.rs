//! The constraint-and-objective generation engine.
//!
//! Given a [`Model`], [`build_problem`] declares every decision variable and then generates each
//! constraint family in turn, finishing with the objective. Components only ever append to the
//! [`Problem`]; the one exception is the transmission bound-tightening step, which sets variable
//! bounds in place and runs before anything else reads them.
use crate::id::{CarrierID, PlantID};
use crate::model::Model;
use crate::plant::Plant;
use crate::problem::Problem;
use crate::time_slot::TimeSlot;
use anyhow::Result;
use itertools::iproduct;
use log::info;

pub mod aggregation;
pub mod balance;
pub mod capacity;
pub mod costs;
pub mod fuel;
pub mod objective;
pub mod profile;
pub mod ramp;
pub mod storage;
pub mod transmission;
pub mod variables;
use variables::VariableMap;

/// A formulated problem along with the variables it was built from
pub struct Formulation {
    /// The problem
    pub problem: Problem,
    /// Handles to the problem's decision variables
    pub variables: VariableMap,
}

/// Formulate the optimisation problem for the given model.
///
/// # Arguments
///
/// * `model` - The model
///
/// # Returns
///
/// The [`Formulation`], or an error if the model's parameters do not cover the index sets the
/// constraint families are defined over.
pub fn build_problem(model: &Model) -> Result<Formulation> {
    let mut problem = Problem::new();
    let variables = VariableMap::declare(&mut problem, model);
    info!(
        "Declared {} variables for {} plants",
        problem.num_variables(),
        model.plants.len()
    );

    // Bounds must be final before any constraint reads them
    transmission::apply_transmission_bounds(&mut problem, &variables, model)?;

    balance::add_supply_rules(&mut problem, &variables, model)?;
    aggregation::add_energy_aggregation_rules(&mut problem, &variables, model)?;
    aggregation::add_monthly_total_rules(&mut problem, &variables, model)?;
    capacity::add_capacity_rules(&mut problem, &variables, model)?;
    profile::add_variables_rules(&mut problem, &variables, model)?;
    profile::add_chp_rules(&mut problem, &variables, model)?;
    ramp::add_ramp_rate_rules(&mut problem, &variables, model)?;
    fuel::add_energy_constraint_rules(&mut problem, &variables, model)?;
    storage::add_charging_level_rules(&mut problem, &variables, model)?;
    storage::add_hydro_rules(&mut problem, &variables, model)?;
    costs::add_yearly_cost_rules(&mut problem, &variables, model)?;
    objective::add_objective_rules(&mut problem, &variables, model)?;

    info!(
        "Formulated problem with {} variables and {} constraints",
        problem.num_variables(),
        problem.num_constraints()
    );

    Ok(Formulation { problem, variables })
}

/// Plant-carrier pairs of plants matching `filter`, crossed with every time slot
fn plant_carrier_slots<'a>(
    model: &'a Model,
    filter: impl Fn(&Plant) -> bool,
) -> impl Iterator<Item = (PlantID, CarrierID, TimeSlot)> + 'a {
    let pairs: Vec<_> = model
        .iter_plant_carriers()
        .filter(|(plant, _)| filter(plant))
        .map(|(plant, carrier)| (plant.id.clone(), carrier.clone()))
        .collect();

    iproduct!(model.time_slot_info.iter_ids(), pairs)
        .map(|(slot, (plant, carrier))| (plant, carrier, *slot))
}
