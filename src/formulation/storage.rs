//! Storage and reservoir dynamics.
//!
//! Plants with a level recurrence (storage, hydro reservoirs and run-of-river) carry their stored
//! energy from one time slot to the next, wrapping around from the last time slot to the first.
//! Where a reservoir has a boundary condition for a time slot, its level is pinned instead and the
//! recurrence does not apply to that instance.
use super::plant_carrier_slots;
use super::variables::VariableMap;
use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use crate::model::Model;
use crate::plant::{Plant, PlantCategory};
use crate::problem::{Constraint, LinearExpr, Problem, RuleOutcome};
use crate::time_slot::{Month, TimeSlot};
use crate::units::Dimensionless;
use anyhow::{Context, Result};
use itertools::iproduct;

/// Stored energy recurrence
pub const ERG_STORE_LEVEL: &str = "erg_store_level";
/// Reservoir levels pinned by boundary conditions
pub const HY_RESERVOIR_BOUNDARY_CONDITIONS: &str = "hy_reservoir_boundary_conditions";
/// Minimum monthly reservoir output
pub const HY_MONTH_MIN: &str = "hy_month_min";
/// Minimum reservoir level
pub const HY_ERG_MIN: &str = "hy_erg_min";

/// Which rule determines a plant's stored energy in a given time slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StorageLevelRule {
    /// The level follows from the previous time slot's level and this slot's net inflow
    Recurrence,
    /// The level is fixed to a share of the energy capacity
    Pinned(Dimensionless),
}

impl StorageLevelRule {
    /// Select the rule for the given plant and time slot.
    ///
    /// Only reservoir plants can be pinned.
    pub fn select(model: &Model, plant: &Plant, slot: TimeSlot) -> Self {
        if !plant.is(PlantCategory::HydroReservoir) {
            return Self::Recurrence;
        }

        match model.params.hyd_erg_bc.get(&(slot, plant.id.clone())) {
            Some(share) => Self::Pinned(share),
            None => Self::Recurrence,
        }
    }
}

/// Find a plant by ID
fn get_plant<'a>(model: &'a Model, id: &PlantID) -> Result<&'a Plant> {
    model
        .plant(id)
        .with_context(|| format!("Unknown plant {id}"))
}

/// Plant, node, carrier and fuel tuples for plants matching `filter`
fn plant_node_carrier_fuels(
    model: &Model,
    filter: impl Fn(&Plant) -> bool,
) -> Vec<(PlantID, NodeID, CarrierID, FuelID)> {
    model
        .iter_plant_carriers()
        .filter(|(plant, _)| filter(plant))
        .map(|(plant, carrier)| {
            (
                plant.id.clone(),
                plant.node.clone(),
                carrier.clone(),
                plant.fuel.clone(),
            )
        })
        .collect()
}

/// Add the storage level rule.
///
/// For every plant with a level recurrence and every time slot `t`:
///
/// ```text
/// erg_st[t] = erg_st[t-1] + net inflow[t]
/// ```
///
/// where the predecessor of the first time slot is the last one. For storage plants the round-trip
/// loss is split evenly between charging and discharging:
///
/// ```text
/// net inflow = (pwr_st_ch * sqrt(1 - st_lss_rt) - pwr / sqrt(1 - st_lss_rt)) * weight
/// ```
///
/// For reservoir and run-of-river plants the inflow is an exogenous profile of the yearly input
/// energy for the plant's own node, carrier and fuel:
///
/// ```text
/// net inflow = (inflowprof * erg_inp - pwr) * weight
/// ```
///
/// Run-of-river plants hold no energy, so their level terms vanish. Pinned reservoir instances are
/// skipped.
pub fn add_charging_level_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let params = &model.params;
    let tuples = plant_node_carrier_fuels(model, Plant::has_level_recurrence);
    let index = iproduct!(tuples, model.time_slot_info.iter_ids().copied().collect::<Vec<_>>())
        .map(|((plant, node, carrier, fuel), slot)| (plant, node, carrier, fuel, slot));

    problem.add_family(ERG_STORE_LEVEL, index, |(plant_id, node, carrier, fuel, slot)| {
        let plant = get_plant(model, plant_id)?;
        if StorageLevelRule::select(model, plant, *slot) != StorageLevelRule::Recurrence {
            return Ok(RuleOutcome::Skip);
        }

        let weight = model.time_slot_info.get(slot)?.weight.value();
        let previous = model.time_slot_info.previous(slot)?;
        let key = (*slot, plant_id.clone(), carrier.clone());
        let pwr = variables.pwr.require(&key, ERG_STORE_LEVEL)?;

        let mut level = LinearExpr::default();
        let mut carried = LinearExpr::default();
        if plant.has_energy_state() {
            level.add_term(variables.erg_st.require(&key, ERG_STORE_LEVEL)?, 1.0);
            let previous_key = (*previous, plant_id.clone(), carrier.clone());
            carried.add_term(
                variables.erg_st.require(&previous_key, ERG_STORE_LEVEL)?,
                1.0,
            );
        }

        if plant.is(PlantCategory::Storage) {
            let loss = params
                .st_lss_rt
                .require(&(plant_id.clone(), carrier.clone()), ERG_STORE_LEVEL)?;
            let factor = (1.0 - loss.value()).sqrt();
            let charge = variables.pwr_st_ch.require(&key, ERG_STORE_LEVEL)?;
            carried.add_term(charge, factor * weight);
            carried.add_term(pwr, -weight / factor);
        } else {
            let inflow = params.inflowprof.require(&key, ERG_STORE_LEVEL)?;
            let erg_inp = params.erg_inp.require(
                &(node.clone(), carrier.clone(), fuel.clone()),
                ERG_STORE_LEVEL,
            )?;
            carried.add_constant(inflow.value() * erg_inp.value() * weight);
            carried.add_term(pwr, -weight);
        }

        Ok(Constraint::equal(level, carried).into())
    })
}

/// Add the hydro reservoir rules.
///
/// * Boundary conditions: `erg_st = hyd_erg_bc * cap_erg_tot` for every reservoir and time slot
///   with a boundary condition; all other instances are skipped.
/// * Monthly minimum output: `erg_mt >= max_erg_mt_in_share * min_erg_mt_out_share * erg_inp`
///   for reservoirs registered with both shares.
/// * Minimum level: `erg_st >= min_erg_share * cap_erg_tot` for reservoirs registered with a
///   minimum share.
pub fn add_hydro_rules(problem: &mut Problem, variables: &VariableMap, model: &Model) -> Result<()> {
    let params = &model.params;
    let is_reservoir = |plant: &Plant| plant.is(PlantCategory::HydroReservoir);
    let reservoir_slots = || plant_carrier_slots(model, is_reservoir);

    problem.add_family(
        HY_RESERVOIR_BOUNDARY_CONDITIONS,
        reservoir_slots(),
        |(plant_id, carrier, slot)| {
            let plant = get_plant(model, plant_id)?;
            let StorageLevelRule::Pinned(share) = StorageLevelRule::select(model, plant, *slot)
            else {
                return Ok(RuleOutcome::Skip);
            };

            let erg_st = variables.erg_st.require(
                &(*slot, plant_id.clone(), carrier.clone()),
                HY_RESERVOIR_BOUNDARY_CONDITIONS,
            )?;
            let cap_erg_tot = variables.cap_erg_tot.require(
                &(plant_id.clone(), carrier.clone()),
                HY_RESERVOIR_BOUNDARY_CONDITIONS,
            )?;

            Ok(Constraint::equal(erg_st, LinearExpr::term(cap_erg_tot, share.value())).into())
        },
    )?;

    let tuples = plant_node_carrier_fuels(model, is_reservoir);
    let months: Vec<Month> = model.time_slot_info.iter_months().copied().collect();
    let index = iproduct!(months, tuples)
        .map(|(month, (plant, node, carrier, fuel))| (month, plant, node, carrier, fuel));
    problem.add_family(HY_MONTH_MIN, index, |(month, plant_id, node, carrier, fuel)| {
        let (Some(max_in), Some(min_out)) = (
            params.max_erg_mt_in_share.get(plant_id),
            params.min_erg_mt_out_share.get(plant_id),
        ) else {
            return Ok(RuleOutcome::Skip);
        };

        let erg_mt = variables
            .erg_mt
            .require(&(*month, plant_id.clone(), carrier.clone()), HY_MONTH_MIN)?;
        let erg_inp = params
            .erg_inp
            .require(&(node.clone(), carrier.clone(), fuel.clone()), HY_MONTH_MIN)?;
        let minimum = max_in * min_out * erg_inp;

        Ok(Constraint::at_least(erg_mt, minimum.value()).into())
    })?;

    problem.add_family(HY_ERG_MIN, reservoir_slots(), |(plant_id, carrier, slot)| {
        let Some(share) = params.min_erg_share.get(plant_id) else {
            return Ok(RuleOutcome::Skip);
        };

        let erg_st = variables
            .erg_st
            .require(&(*slot, plant_id.clone(), carrier.clone()), HY_ERG_MIN)?;
        let cap_erg_tot = variables
            .cap_erg_tot
            .require(&(plant_id.clone(), carrier.clone()), HY_ERG_MIN)?;

        Ok(Constraint::at_least(erg_st, LinearExpr::term(cap_erg_tot, share.value())).into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, hydro_model, storage_model};
    use crate::problem::ConstraintSense;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn build(model: &Model) -> Result<(Problem, VariableMap)> {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, model);
        add_charging_level_rules(&mut problem, &variables, model)?;
        add_hydro_rules(&mut problem, &variables, model)?;
        Ok((problem, variables))
    }

    fn level_key(plant: &str, fuel: &str, slot: u32) -> (PlantID, NodeID, CarrierID, FuelID, TimeSlot) {
        (
            plant.into(),
            "north".into(),
            "EL".into(),
            fuel.into(),
            TimeSlot(slot),
        )
    }

    #[rstest]
    fn test_storage_recurrence_wraps_around(storage_model: Model) {
        let (problem, variables) = build(&storage_model).unwrap();
        let family = problem.family(ERG_STORE_LEVEL).unwrap();
        assert_eq!(family.len(), 4);

        let var = |vars: &crate::formulation::variables::VariableFamily<_>, slot| {
            vars.get(&(TimeSlot(slot), PlantID::new("battery"), CarrierID::new("EL")))
                .unwrap()
        };
        let expr = &family
            .get(&level_key("battery", "electricity", 1))
            .unwrap()
            .expr;

        // Round-trip loss of 19% means 90% efficiency each way
        assert_approx_eq!(f64, expr.coefficient(var(&variables.erg_st, 1)), 1.0);
        assert_approx_eq!(f64, expr.coefficient(var(&variables.erg_st, 4)), -1.0);
        assert_approx_eq!(f64, expr.coefficient(var(&variables.pwr_st_ch, 1)), -0.9);
        assert_approx_eq!(f64, expr.coefficient(var(&variables.pwr, 1)), 1.0 / 0.9);
        assert_approx_eq!(f64, expr.constant_value(), 0.0);
    }

    #[rstest]
    fn test_boundary_condition_replaces_recurrence(hydro_model: Model) {
        let (problem, variables) = build(&hydro_model).unwrap();

        // The reservoir is pinned at slot 3 only
        let recurrence = problem.family(ERG_STORE_LEVEL).unwrap();
        assert!(recurrence.get(&level_key("reservoir", "water", 3)).is_none());
        assert!(recurrence.get(&level_key("reservoir", "water", 2)).is_some());
        assert_eq!(recurrence.skipped, 1);

        let pinned = problem.family(HY_RESERVOIR_BOUNDARY_CONDITIONS).unwrap();
        assert_eq!(pinned.len(), 1);
        let key = (PlantID::new("reservoir"), CarrierID::new("EL"));
        let constraint = pinned
            .get(&(key.0.clone(), key.1.clone(), TimeSlot(3)))
            .unwrap();
        let cap_erg_tot = variables.cap_erg_tot.get(&key).unwrap();
        assert_approx_eq!(f64, constraint.expr.coefficient(cap_erg_tot), -0.5);
    }

    #[rstest]
    fn test_run_of_river_has_no_level(hydro_model: Model) {
        let (problem, variables) = build(&hydro_model).unwrap();
        let constraint = problem
            .family(ERG_STORE_LEVEL)
            .unwrap()
            .get(&level_key("river", "water", 2))
            .unwrap();
        assert_eq!(constraint.sense, ConstraintSense::Equal);

        // 0 = (0.25 * 400 - pwr) * 1
        let pwr = variables
            .pwr
            .get(&(TimeSlot(2), PlantID::new("river"), CarrierID::new("EL")))
            .unwrap();
        assert_eq!(constraint.expr.coefficients().len(), 1);
        assert_approx_eq!(f64, constraint.expr.coefficient(pwr), 1.0);
        assert_approx_eq!(f64, constraint.expr.constant_value(), -100.0);
    }

    #[rstest]
    fn test_inflow_uses_own_fuel_input(mut hydro_model: Model) {
        // Input energy for another fuel at the same node and carrier must not be picked up
        hydro_model.params.erg_inp = crate::parameters::ParameterMap::new("erg_inp");
        hydro_model
            .params
            .erg_inp
            .insert(
                ("north".into(), "EL".into(), "gas".into()),
                crate::units::Energy(400.0),
            )
            .unwrap();
        assert_error!(
            build(&hydro_model),
            "Missing parameter 'erg_inp' for (north, EL, water) required by constraint family \
            'erg_store_level'"
        );
    }

    #[rstest]
    fn test_hydro_minimums(mut hydro_model: Model) {
        let (problem, _) = build(&hydro_model).unwrap();
        let month_min = problem.family(HY_MONTH_MIN).unwrap();
        assert_eq!(month_min.len(), 2);
        let key = (
            Month(1),
            PlantID::new("reservoir"),
            NodeID::new("north"),
            CarrierID::new("EL"),
            FuelID::new("water"),
        );
        // 0.6 * 0.5 * 400
        assert_approx_eq!(f64, month_min.get(&key).unwrap().expr.constant_value(), -120.0);
        assert_eq!(problem.family(HY_ERG_MIN).unwrap().len(), 4);

        // Registry membership gates the rules; absence is not a zero minimum
        hydro_model.params.min_erg_share = crate::parameters::ParameterMap::new("min_erg_share");
        hydro_model.params.min_erg_mt_out_share =
            crate::parameters::ParameterMap::new("min_erg_mt_out_share");
        let (problem, _) = build(&hydro_model).unwrap();
        assert!(problem.family(HY_MONTH_MIN).unwrap().is_empty());
        let erg_min = problem.family(HY_ERG_MIN).unwrap();
        assert!(erg_min.is_empty());
        assert_eq!(erg_min.skipped, 4);
    }
}
