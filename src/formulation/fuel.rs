//! Limits on the yearly use of quantity-constrained fuels.
use super::variables::VariableMap;
use crate::model::Model;
use crate::problem::{Constraint, LinearExpr, Problem, RuleOutcome};
use anyhow::{Context, Result};

/// Yearly fuel consumption limited by available input energy
pub const PP_MAX_FUEL: &str = "pp_max_fuel";

/// Add the fuel constraint rule.
///
/// For every (node, carrier, fuel) used by a plant: `sum(erg_fl_yr) <= erg_inp`, summed over the
/// plants burning that fuel for that carrier at that node. Skipped unless the fuel is constrained,
/// its input energy is non-zero and at least one plant uses it. A constrained fuel without an
/// input energy is an error.
pub fn add_energy_constraint_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    problem.add_family(PP_MAX_FUEL, model.fuel_tuples(), |key| {
        let (node, carrier, fuel_id) = key;
        let fuel = model
            .fuels
            .get(fuel_id)
            .with_context(|| format!("Unknown fuel {fuel_id}"))?;
        if !fuel.constrained {
            return Ok(RuleOutcome::Skip);
        }

        let erg_inp = model.params.erg_inp.require(key, PP_MAX_FUEL)?;
        if erg_inp.value() == 0.0 {
            return Ok(RuleOutcome::Skip);
        }

        let mut total = LinearExpr::default();
        for plant in model.iter_plants_using(node, carrier, fuel_id) {
            let var_key = (
                plant.id.clone(),
                node.clone(),
                carrier.clone(),
                fuel_id.clone(),
            );
            total.add_term(variables.erg_fl_yr.require(&var_key, PP_MAX_FUEL)?, 1.0);
        }
        if total.is_constant() {
            return Ok(RuleOutcome::Skip);
        }

        Ok(Constraint::at_most(total, erg_inp.value()).into())
    })
}
