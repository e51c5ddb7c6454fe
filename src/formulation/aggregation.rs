//! Yearly and monthly aggregates of time-sliced variables.
//!
//! Each aggregate variable is defined by exactly one equality here. Cost components and the
//! objective read the aggregates rather than summing over time slots again.
use super::variables::VariableMap;
use crate::model::Model;
use crate::plant::PlantCategory;
use crate::problem::{Constraint, LinearExpr, Problem, RuleOutcome};
use anyhow::Result;
use itertools::iproduct;

/// Yearly energy output per plant and carrier
pub const YEARLY_ENERGY: &str = "yearly_energy";
/// Yearly ramping per ramp-rated plant and carrier
pub const YEARLY_RAMP: &str = "yearly_ramp";
/// Yearly fuel consumption per plant, node, carrier and fuel
pub const YEARLY_FUEL_CONS: &str = "yearly_fuel_cons";
/// Yearly charged energy per storage plant and carrier
pub const YEARLY_CHARGING: &str = "yearly_charging";
/// Monthly energy output per reservoir plant and carrier
pub const MONTHLY_TOTALS: &str = "monthly_totals";

/// Add the yearly aggregation rules.
///
/// * `erg_yr = sum(pwr * weight)` for every plant and carrier
/// * `pwr_ramp_yr = sum(pwr_ramp_abs)` for ramp-rated plants
/// * `erg_fl_yr = erg_yr` for every plant, as each plant burns a single fuel
/// * `erg_ch_yr = sum(pwr_st_ch * weight)` for storage plants
pub fn add_energy_aggregation_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let slots = &model.time_slot_info;

    problem.add_family(YEARLY_ENERGY, variables.erg_yr.keys().cloned(), |key| {
        let (plant, carrier) = key;
        let erg_yr = variables.erg_yr.require(key, YEARLY_ENERGY)?;
        let mut total = LinearExpr::default();
        for (slot, data) in slots.iter() {
            let pwr = variables
                .pwr
                .require(&(*slot, plant.clone(), carrier.clone()), YEARLY_ENERGY)?;
            total.add_term(pwr, data.weight.value());
        }

        Ok(Constraint::equal(erg_yr, total).into())
    })?;

    problem.add_family(YEARLY_RAMP, variables.pwr_ramp_yr.keys().cloned(), |key| {
        let (plant, carrier) = key;
        let ramp_yr = variables.pwr_ramp_yr.require(key, YEARLY_RAMP)?;
        let mut total = LinearExpr::default();
        for slot in slots.iter_ids() {
            let abs = variables
                .pwr_ramp_abs
                .require(&(*slot, plant.clone(), carrier.clone()), YEARLY_RAMP)?;
            total.add_term(abs, 1.0);
        }

        Ok(Constraint::equal(ramp_yr, total).into())
    })?;

    problem.add_family(YEARLY_FUEL_CONS, variables.erg_fl_yr.keys().cloned(), |key| {
        let (plant, _, carrier, _) = key;
        let erg_fl_yr = variables.erg_fl_yr.require(key, YEARLY_FUEL_CONS)?;
        let erg_yr = variables
            .erg_yr
            .require(&(plant.clone(), carrier.clone()), YEARLY_FUEL_CONS)?;

        Ok(Constraint::equal(erg_fl_yr, erg_yr).into())
    })?;

    problem.add_family(YEARLY_CHARGING, variables.erg_ch_yr.keys().cloned(), |key| {
        let (plant, carrier) = key;
        let erg_ch_yr = variables.erg_ch_yr.require(key, YEARLY_CHARGING)?;
        let mut total = LinearExpr::default();
        for (slot, data) in slots.iter() {
            let charge = variables
                .pwr_st_ch
                .require(&(*slot, plant.clone(), carrier.clone()), YEARLY_CHARGING)?;
            total.add_term(charge, data.weight.value());
        }

        Ok(Constraint::equal(erg_ch_yr, total).into())
    })
}

/// Add the monthly totals rule for reservoir plants: `erg_mt = sum(pwr * weight)` over the time
/// slots of each month.
pub fn add_monthly_total_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let slots = &model.time_slot_info;
    let reservoirs: Vec<_> = model
        .iter_plant_carriers_in(PlantCategory::HydroReservoir)
        .map(|(plant, carrier)| (plant.id.clone(), carrier.clone()))
        .collect();
    let index = iproduct!(slots.iter_months(), reservoirs)
        .map(|(month, (plant, carrier))| (*month, plant, carrier));

    problem.add_family(MONTHLY_TOTALS, index, |(month, plant, carrier)| {
        let erg_mt = variables
            .erg_mt
            .require(&(*month, plant.clone(), carrier.clone()), MONTHLY_TOTALS)?;
        let mut total = LinearExpr::default();
        for (slot, data) in slots.iter_month(*month) {
            let pwr = variables
                .pwr
                .require(&(*slot, plant.clone(), carrier.clone()), MONTHLY_TOTALS)?;
            total.add_term(pwr, data.weight.value());
        }

        Ok(RuleOutcome::Constraint(Constraint::equal(erg_mt, total)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::hydro_model;
    use crate::id::{CarrierID, PlantID};
    use crate::time_slot::{Month, TimeSlot};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn build(model: &Model) -> (Problem, VariableMap) {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, model);
        add_energy_aggregation_rules(&mut problem, &variables, model).unwrap();
        add_monthly_total_rules(&mut problem, &variables, model).unwrap();
        (problem, variables)
    }

    /// A point where every plant produces `10 * slot` and all aggregates hold
    fn consistent_point(problem: &Problem, variables: &VariableMap, model: &Model) -> Vec<f64> {
        let slots = &model.time_slot_info;
        let energy = |slot: &TimeSlot, weight: f64| 10.0 * f64::from(slot.0) * weight;

        let mut values = vec![0.0; problem.num_variables()];
        for ((slot, _, _), var) in variables.pwr.iter() {
            values[var.index()] = 10.0 * f64::from(slot.0);
        }
        let yearly: f64 = slots
            .iter()
            .map(|(slot, data)| energy(slot, data.weight.value()))
            .sum();
        for (_, var) in variables.erg_yr.iter() {
            values[var.index()] = yearly;
        }
        for (_, var) in variables.erg_fl_yr.iter() {
            values[var.index()] = yearly;
        }
        for ((month, _, _), var) in variables.erg_mt.iter() {
            values[var.index()] = slots
                .iter_month(*month)
                .map(|(slot, data)| energy(slot, data.weight.value()))
                .sum();
        }

        values
    }

    #[rstest]
    fn test_monthly_totals_sum_to_yearly(hydro_model: Model) {
        let (problem, variables) = build(&hydro_model);
        let values = consistent_point(&problem, &variables, &hydro_model);
        assert_eq!(problem.iter_violations(&values, 1e-9).count(), 0);

        let plant = PlantID::new("reservoir");
        let carrier = CarrierID::new("EL");
        let monthly: f64 = hydro_model
            .time_slot_info
            .iter_months()
            .map(|month| {
                let var = variables
                    .erg_mt
                    .get(&(*month, plant.clone(), carrier.clone()))
                    .unwrap();
                values[var.index()]
            })
            .sum();
        let yearly = variables.erg_yr.get(&(plant, carrier)).unwrap();
        assert_approx_eq!(f64, monthly, values[yearly.index()]);
    }

    #[rstest]
    fn test_monthly_totals_only_cover_month(hydro_model: Model) {
        let (problem, variables) = build(&hydro_model);
        let key = (Month(2), PlantID::new("reservoir"), CarrierID::new("EL"));
        let constraint = problem.family(MONTHLY_TOTALS).unwrap().get(&key).unwrap();
        let pwr = |slot| {
            variables
                .pwr
                .get(&(TimeSlot(slot), PlantID::new("reservoir"), CarrierID::new("EL")))
                .unwrap()
        };
        assert_approx_eq!(f64, constraint.expr.coefficient(pwr(1)), 0.0);
        assert_approx_eq!(f64, constraint.expr.coefficient(pwr(3)), -1.0);
    }

    #[rstest]
    fn test_yearly_fuel_cons_for_every_plant(hydro_model: Model) {
        let (problem, _) = build(&hydro_model);
        assert_eq!(
            problem.family(YEARLY_FUEL_CONS).unwrap().len(),
            hydro_model.iter_plant_carriers().count()
        );
    }
}
