//! Ramp rates and their absolute values.
//!
//! The absolute ramp is not pinned to `|pwr_ramp|` directly. Two inequalities force
//! `pwr_ramp_abs >= |pwr_ramp|`, and the ramping cost in the objective pulls it down to equality at
//! the optimum.
use super::plant_carrier_slots;
use super::variables::VariableMap;
use crate::model::Model;
use crate::plant::{Plant, PlantCategory};
use crate::problem::{Constraint, LinearExpr, Problem};
use anyhow::Result;

/// Signed ramp since the previous time slot
pub const CALC_RAMP_RATE: &str = "calc_ramp_rate";
/// Upper relaxation of the absolute ramp
pub const RAMP_RATE_ABS_POS: &str = "ramp_rate_abs_pos";
/// Lower relaxation of the absolute ramp
pub const RAMP_RATE_ABS_NEG: &str = "ramp_rate_abs_neg";

/// Add the ramp rate rules for ramp-rated plants.
///
/// * `pwr_ramp[t] = pwr[t] - pwr[t-1]`, where the predecessor of the first time slot is the last
/// * `pwr_ramp <= pwr_ramp_abs`
/// * `-pwr_ramp <= pwr_ramp_abs`
pub fn add_ramp_rate_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let is_ramp_rated = |plant: &Plant| plant.is(PlantCategory::RampRated);

    let index = plant_carrier_slots(model, is_ramp_rated);
    problem.add_family(CALC_RAMP_RATE, index, |(plant, carrier, slot)| {
        let previous = model.time_slot_info.previous(slot)?;
        let ramp = variables
            .pwr_ramp
            .require(&(*slot, plant.clone(), carrier.clone()), CALC_RAMP_RATE)?;
        let current_pwr = variables
            .pwr
            .require(&(*slot, plant.clone(), carrier.clone()), CALC_RAMP_RATE)?;
        let previous_pwr = variables
            .pwr
            .require(&(*previous, plant.clone(), carrier.clone()), CALC_RAMP_RATE)?;

        Ok(Constraint::equal(ramp, LinearExpr::from(current_pwr) - previous_pwr).into())
    })?;

    for (name, sign) in [(RAMP_RATE_ABS_POS, 1.0), (RAMP_RATE_ABS_NEG, -1.0)] {
        let index = plant_carrier_slots(model, is_ramp_rated);
        problem.add_family(name, index, |(plant, carrier, slot)| {
            let key = (*slot, plant.clone(), carrier.clone());
            let ramp = variables.pwr_ramp.require(&key, name)?;
            let abs = variables.pwr_ramp_abs.require(&key, name)?;

            Ok(Constraint::at_most(LinearExpr::term(ramp, sign), abs).into())
        })?;
    }

    Ok(())
}
