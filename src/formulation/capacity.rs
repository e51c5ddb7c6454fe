//! Capacity bookkeeping and operating limits.
use super::plant_carrier_slots;
use super::variables::VariableMap;
use crate::model::Model;
use crate::plant::{Plant, PlantCategory};
use crate::problem::{Constraint, LinearExpr, Problem};
use anyhow::Result;

/// Total power capacity
pub const CALC_CAP_PWR_TOT: &str = "calc_cap_pwr_tot";
/// Total energy capacity of storage and reservoir plants
pub const CALC_CAP_ERG_TOT: &str = "calc_cap_erg_tot";
/// Power output limited by capacity
pub const PPST_CAPAC: &str = "ppst_capac";
/// Charging power limited by capacity
pub const CAPAC_ST_PW_CH: &str = "capac_st_pw_ch";
/// Stored energy limited by energy capacity
pub const CAPAC_ST_EN: &str = "capac_st_en";

/// Add the capacity rules.
///
/// * `cap_pwr_tot = cap_pwr_leg [+ cap_pwr_new] [- cap_pwr_rem]`, where the optional terms apply
///   to addable and retirable plants respectively
/// * `cap_erg_tot = cap_pwr_tot * discharge_duration` for storage and reservoir plants
/// * `pwr <= cap_pwr_tot * cap_avlb` for dispatchable plants and `pwr <= cap_pwr_tot` for storage
///   and reservoir plants. Must-run plants (profiles, run-of-river, selling, curtailment) are not
///   limited
/// * `pwr_st_ch <= cap_pwr_tot` for storage plants
/// * `erg_st <= cap_erg_tot` for storage and reservoir plants
pub fn add_capacity_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let params = &model.params;

    problem.add_family(CALC_CAP_PWR_TOT, variables.cap_pwr_tot.keys().cloned(), |key| {
        let (plant_id, _) = key;
        let cap_pwr_tot = variables.cap_pwr_tot.require(key, CALC_CAP_PWR_TOT)?;
        let cap_pwr_leg = params.cap_pwr_leg.require(key, CALC_CAP_PWR_TOT)?;
        let mut total = LinearExpr::constant(cap_pwr_leg.value());
        if let Some(plant) = model.plant(plant_id) {
            if plant.is(PlantCategory::Addable) {
                total.add_term(variables.cap_pwr_new.require(key, CALC_CAP_PWR_TOT)?, 1.0);
            }
            if plant.is(PlantCategory::Retirable) {
                total.add_term(variables.cap_pwr_rem.require(key, CALC_CAP_PWR_TOT)?, -1.0);
            }
        }

        Ok(Constraint::equal(cap_pwr_tot, total).into())
    })?;

    problem.add_family(CALC_CAP_ERG_TOT, variables.cap_erg_tot.keys().cloned(), |key| {
        let cap_erg_tot = variables.cap_erg_tot.require(key, CALC_CAP_ERG_TOT)?;
        let cap_pwr_tot = variables.cap_pwr_tot.require(key, CALC_CAP_ERG_TOT)?;
        let duration = params.discharge_duration.require(key, CALC_CAP_ERG_TOT)?;

        Ok(Constraint::equal(cap_erg_tot, LinearExpr::term(cap_pwr_tot, duration.value())).into())
    })?;

    let index = plant_carrier_slots(model, |plant| {
        (plant.is(PlantCategory::Dispatchable) && !plant.is(PlantCategory::Profile))
            || plant.has_energy_state()
    });
    problem.add_family(PPST_CAPAC, index, |(plant_id, carrier, slot)| {
        let pwr = variables
            .pwr
            .require(&(*slot, plant_id.clone(), carrier.clone()), PPST_CAPAC)?;
        let key = (plant_id.clone(), carrier.clone());
        let cap_pwr_tot = variables.cap_pwr_tot.require(&key, PPST_CAPAC)?;

        let dispatchable = model
            .plant(plant_id)
            .is_some_and(|plant| plant.is(PlantCategory::Dispatchable));
        let availability = if dispatchable {
            let month = model.time_slot_info.get(slot)?.month;
            params
                .cap_avlb
                .require(&(month, plant_id.clone(), carrier.clone()), PPST_CAPAC)?
                .value()
        } else {
            1.0
        };

        Ok(Constraint::at_most(pwr, LinearExpr::term(cap_pwr_tot, availability)).into())
    })?;

    let index = plant_carrier_slots(model, |plant| plant.is(PlantCategory::Storage));
    problem.add_family(CAPAC_ST_PW_CH, index, |(plant_id, carrier, slot)| {
        let charge = variables
            .pwr_st_ch
            .require(&(*slot, plant_id.clone(), carrier.clone()), CAPAC_ST_PW_CH)?;
        let cap_pwr_tot = variables
            .cap_pwr_tot
            .require(&(plant_id.clone(), carrier.clone()), CAPAC_ST_PW_CH)?;

        Ok(Constraint::at_most(charge, cap_pwr_tot).into())
    })?;

    let index = plant_carrier_slots(model, Plant::has_energy_state);
    problem.add_family(CAPAC_ST_EN, index, |(plant_id, carrier, slot)| {
        let erg_st = variables
            .erg_st
            .require(&(*slot, plant_id.clone(), carrier.clone()), CAPAC_ST_EN)?;
        let cap_erg_tot = variables
            .cap_erg_tot
            .require(&(plant_id.clone(), carrier.clone()), CAPAC_ST_EN)?;

        Ok(Constraint::at_most(erg_st, cap_erg_tot).into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, hydro_model, storage_model, two_node_model};
    use crate::id::{CarrierID, PlantID};
    use crate::problem::ConstraintSense;
    use crate::time_slot::TimeSlot;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn build(model: &Model) -> Result<(Problem, VariableMap)> {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, model);
        add_capacity_rules(&mut problem, &variables, model)?;
        Ok((problem, variables))
    }

    #[rstest]
    #[case("pp", 0.0, 0.0)]
    #[case("pp;add", -1.0, 0.0)]
    #[case("pp;rem", 0.0, 1.0)]
    #[case("pp;add;rem", -1.0, 1.0)]
    fn test_calc_cap_pwr_tot_terms(
        mut two_node_model: Model,
        #[case] tags: &str,
        #[case] new_coeff: f64,
        #[case] rem_coeff: f64,
    ) {
        let gas: PlantID = "gas_plant".into();
        two_node_model.plants[&gas].categories = tags.parse().unwrap();
        let (problem, variables) = build(&two_node_model).unwrap();

        let key = (gas, CarrierID::new("EL"));
        let constraint = problem.family(CALC_CAP_PWR_TOT).unwrap().get(&key).unwrap();
        let expr = &constraint.expr;
        assert_eq!(constraint.sense, ConstraintSense::Equal);
        assert_approx_eq!(f64, expr.coefficient(variables.cap_pwr_tot.get(&key).unwrap()), 1.0);
        assert_approx_eq!(f64, expr.constant_value(), -100.0);

        let coeff = |var: Option<_>| var.map_or(0.0, |var| expr.coefficient(var));
        assert_approx_eq!(f64, coeff(variables.cap_pwr_new.get(&key)), new_coeff);
        assert_approx_eq!(f64, coeff(variables.cap_pwr_rem.get(&key)), rem_coeff);
    }

    #[rstest]
    fn test_ppst_capac_skips_profile_plants(two_node_model: Model) {
        let (problem, variables) = build(&two_node_model).unwrap();
        let family = problem.family(PPST_CAPAC).unwrap();

        // Wind follows a profile, so only the gas plant and heat pump are limited
        assert_eq!(family.len(), 2 * 4);
        let wind = (PlantID::new("wind"), CarrierID::new("EL"), TimeSlot(1));
        assert!(family.get(&wind).is_none());

        // Availability of the gas plant is 0.8 in month 2
        let key = (PlantID::new("gas_plant"), CarrierID::new("EL"));
        let constraint = family
            .get(&(key.0.clone(), key.1.clone(), TimeSlot(4)))
            .unwrap();
        let cap = variables.cap_pwr_tot.get(&key).unwrap();
        assert_approx_eq!(f64, constraint.expr.coefficient(cap), -0.8);
    }

    #[rstest]
    fn test_ppst_capac_skips_run_of_river(hydro_model: Model) {
        let (problem, _) = build(&hydro_model).unwrap();
        let family = problem.family(PPST_CAPAC).unwrap();

        // Only the reservoir is limited; river output is fixed by its inflow
        assert_eq!(family.len(), 4);
        for slot in 1..=4 {
            let river = (PlantID::new("river"), CarrierID::new("EL"), TimeSlot(slot));
            assert!(family.get(&river).is_none());
            let reservoir = (PlantID::new("reservoir"), CarrierID::new("EL"), TimeSlot(slot));
            assert!(family.get(&reservoir).is_some());
        }
    }

    #[rstest]
    #[case("sll")]
    #[case("curt")]
    fn test_ppst_capac_skips_must_run(mut storage_model: Model, #[case] tags: &str) {
        let gas: PlantID = "gas_plant".into();
        storage_model.plants[&gas].categories = tags.parse().unwrap();
        let (problem, _) = build(&storage_model).unwrap();
        let family = problem.family(PPST_CAPAC).unwrap();

        assert_eq!(family.len(), 4);
        for slot in 1..=4 {
            let key = (gas.clone(), CarrierID::new("EL"), TimeSlot(slot));
            assert!(family.get(&key).is_none());
        }
    }

    #[rstest]
    fn test_ppst_capac_missing_availability(mut two_node_model: Model) {
        two_node_model.params.cap_avlb = crate::parameters::ParameterMap::new("cap_avlb");
        assert_error!(
            build(&two_node_model),
            "Missing parameter 'cap_avlb' for (1, gas_plant, EL) required by constraint family \
            'ppst_capac'"
        );
    }

    #[rstest]
    fn test_storage_limits(storage_model: Model) {
        let (problem, variables) = build(&storage_model).unwrap();
        assert_eq!(problem.family(CAPAC_ST_PW_CH).unwrap().len(), 4);
        assert_eq!(problem.family(CAPAC_ST_EN).unwrap().len(), 4);

        // Energy capacity is four hours of full power
        let key = (PlantID::new("battery"), CarrierID::new("EL"));
        let constraint = problem.family(CALC_CAP_ERG_TOT).unwrap().get(&key).unwrap();
        let cap_pwr_tot = variables.cap_pwr_tot.get(&key).unwrap();
        assert_approx_eq!(f64, constraint.expr.coefficient(cap_pwr_tot), -4.0);

        // The battery is not dispatchable, so no availability factor applies
        let constraint = problem
            .family(PPST_CAPAC)
            .unwrap()
            .get(&(key.0.clone(), key.1.clone(), TimeSlot(2)))
            .unwrap();
        assert_approx_eq!(f64, constraint.expr.coefficient(cap_pwr_tot), -1.0);
    }
}
