//! Bound-tightening for transmission flows.
use super::variables::VariableMap;
use crate::model::Model;
use crate::problem::Problem;
use anyhow::Result;
use log::info;

/// Name used in error messages for missing transmission capacities
pub const TRANSMISSION_BOUNDS: &str = "transmission_bounds";

/// Bound every transmission flow by the corridor's monthly capacities.
///
/// The flow from `nd1` to `nd2` may not exceed the export capacity, nor fall below the negative of
/// the import capacity. This modifies the bounds of the `trm` variables and adds no constraints.
pub fn apply_transmission_bounds(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    if variables.trm.is_empty() {
        return Ok(());
    }

    info!("Setting transmission bounds");
    let params = &model.params;
    for ((slot, from, to, carrier), var) in variables.trm.iter() {
        let month = model.time_slot_info.get(slot)?.month;
        let key = (month, from.clone(), to.clone(), carrier.clone());
        let upper = params.cap_trme_leg.require(&key, TRANSMISSION_BOUNDS)?;
        let lower = -params.cap_trmi_leg.require(&key, TRANSMISSION_BOUNDS)?;
        problem.set_bounds(var, lower.value(), upper.value())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, two_node_model};
    use crate::id::{CarrierID, NodeID};
    use crate::time_slot::{Month, TimeSlot};
    use crate::units::Power;
    use rstest::rstest;

    #[rstest]
    fn test_apply_transmission_bounds(two_node_model: Model) {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, &two_node_model);
        apply_transmission_bounds(&mut problem, &variables, &two_node_model).unwrap();

        // Slot 3 falls in month 2
        let key = (
            TimeSlot(3),
            NodeID::new("north"),
            NodeID::new("south"),
            CarrierID::new("EL"),
        );
        let def = problem.variable(variables.trm.get(&key).unwrap());
        assert_eq!((def.lower, def.upper), (-15.0, 25.0));
        assert_eq!(problem.num_constraints(), 0);
    }

    #[rstest]
    fn test_apply_transmission_bounds_missing(mut two_node_model: Model) {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, &two_node_model);
        two_node_model.params.cap_trme_leg = crate::parameters::ParameterMap::new("cap_trme_leg");
        two_node_model
            .params
            .cap_trme_leg
            .insert(
                (
                    Month(1),
                    NodeID::new("north"),
                    NodeID::new("south"),
                    CarrierID::new("EL"),
                ),
                Power(10.0),
            )
            .unwrap();

        assert_error!(
            apply_transmission_bounds(&mut problem, &variables, &two_node_model),
            "Missing parameter 'cap_trme_leg' for (1, south, north, EL) required by constraint \
            family 'transmission_bounds'"
        );
    }
}
