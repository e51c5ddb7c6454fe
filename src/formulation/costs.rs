//! Yearly cost terms per plant.
//!
//! Each cost variable is defined by one equality from an aggregate (yearly energy, ramping or
//! capacity) and a unit cost. Fuel costs are the exception: depending on the price data available
//! for a (fuel, node, carrier) they are summed from time-sliced power instead.
use super::variables::VariableMap;
use crate::id::{CarrierID, FuelID, NodeID};
use crate::model::Model;
use crate::parameters::{ParameterMap, Parameters, PriceProfile};
use crate::plant::PlantCategory;
use crate::problem::{Constraint, LinearExpr, Problem};
use crate::time_slot::Month;
use crate::units::MoneyPerEnergy;
use anyhow::{Context, Result};

/// Yearly fuel cost
pub const CALC_VC_FL_PP: &str = "calc_vc_fl_pp";
/// Yearly variable O&M cost
pub const CALC_VC_OM_PP: &str = "calc_vc_om_pp";
/// Yearly ramping cost
pub const CALC_VC_RAMP: &str = "calc_vc_ramp";
/// Yearly fixed O&M cost
pub const CALC_FC_OM: &str = "calc_fc_om";
/// Yearly annualised capital cost
pub const CALC_FC_CP: &str = "calc_fc_cp";

/// The price data from which a plant's fuel cost is calculated.
///
/// The bases are tried in the order listed here and the first one with data wins. Changing the
/// order changes which price applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FuelCostBasis<'a> {
    /// A price per time slot for the (fuel, node, carrier)
    PriceProfile(&'a PriceProfile),
    /// A price per month for the (fuel, node)
    MonthlyPrice(&'a ParameterMap<Month, MoneyPerEnergy>),
    /// A single price for the (fuel, node)
    FlatPrice,
}

impl<'a> FuelCostBasis<'a> {
    /// Select the basis for the given fuel, node and carrier
    pub fn select(
        params: &'a Parameters,
        fuel: &FuelID,
        node: &NodeID,
        carrier: &CarrierID,
    ) -> Self {
        if let Some(profile) = params
            .priceprof
            .get(&(fuel.clone(), node.clone(), carrier.clone()))
        {
            Self::PriceProfile(profile)
        } else if let Some(monthly) = params.vc_fl_monthly.get(&(fuel.clone(), node.clone())) {
            Self::MonthlyPrice(monthly)
        } else {
            Self::FlatPrice
        }
    }
}

/// Add the yearly cost rules.
///
/// * Fuel cost, for dispatchable and selling plants other than marginal-cost ones. Negative for
///   selling plants. Depending on the [`FuelCostBasis`]:
///   * price profile: `vc_fl_pp_yr = sum(weight * priceprof / pp_eff * pwr)`
///   * monthly price: `vc_fl_pp_yr = sum(weight * vc_fl[month] / pp_eff * pwr)`
///   * flat price: `vc_fl_pp_yr = erg_fl_yr / pp_eff * vc_fl`
/// * `vc_om_pp_yr = erg_yr * vc_om` for every plant
/// * `vc_ramp_yr = pwr_ramp_yr * vc_ramp` for ramp-rated plants
/// * `fc_om_pp_yr = cap_pwr_tot * fc_om` for every plant
/// * `fc_cp_pp_yr = cap_pwr_new * fc_cp_ann` for addable plants
pub fn add_yearly_cost_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    let params = &model.params;
    let slots = &model.time_slot_info;

    let index: Vec<_> = model
        .iter_plant_carriers()
        .filter(|(plant, _)| plant.has_ordinary_fuel_cost())
        .map(|(plant, carrier)| {
            (
                plant.id.clone(),
                plant.node.clone(),
                carrier.clone(),
                plant.fuel.clone(),
            )
        })
        .collect();
    problem.add_family(CALC_VC_FL_PP, index, |(plant_id, node, carrier, fuel)| {
        let plant = model
            .plant(plant_id)
            .with_context(|| format!("Unknown plant {plant_id}"))?;
        let sign = if plant.is(PlantCategory::Selling) {
            -1.0
        } else {
            1.0
        };
        let cost = variables
            .vc_fl_pp_yr
            .require(&(plant_id.clone(), carrier.clone(), fuel.clone()), CALC_VC_FL_PP)?;
        let eff = params
            .pp_eff
            .require(&(plant_id.clone(), carrier.clone()), CALC_VC_FL_PP)?;

        let mut total = LinearExpr::default();
        match FuelCostBasis::select(params, fuel, node, carrier) {
            FuelCostBasis::PriceProfile(profile) => {
                for (slot, data) in slots.iter() {
                    let price = profile.require(slot, CALC_VC_FL_PP)?;
                    let pwr = variables
                        .pwr
                        .require(&(*slot, plant_id.clone(), carrier.clone()), CALC_VC_FL_PP)?;
                    total.add_term(pwr, sign * data.weight.value() * (price / eff).value());
                }
            }
            FuelCostBasis::MonthlyPrice(monthly) => {
                for (slot, data) in slots.iter() {
                    let price = monthly.require(&data.month, CALC_VC_FL_PP)?;
                    let pwr = variables
                        .pwr
                        .require(&(*slot, plant_id.clone(), carrier.clone()), CALC_VC_FL_PP)?;
                    total.add_term(pwr, sign * data.weight.value() * (price / eff).value());
                }
            }
            FuelCostBasis::FlatPrice => {
                let price = params
                    .vc_fl
                    .require(&(fuel.clone(), node.clone()), CALC_VC_FL_PP)?;
                let erg_fl_yr = variables.erg_fl_yr.require(
                    &(plant_id.clone(), node.clone(), carrier.clone(), fuel.clone()),
                    CALC_VC_FL_PP,
                )?;
                total.add_term(erg_fl_yr, sign * (price / eff).value());
            }
        }

        Ok(Constraint::equal(cost, total).into())
    })?;

    problem.add_family(CALC_VC_OM_PP, variables.vc_om_pp_yr.keys().cloned(), |key| {
        let cost = variables.vc_om_pp_yr.require(key, CALC_VC_OM_PP)?;
        let erg_yr = variables.erg_yr.require(key, CALC_VC_OM_PP)?;
        let rate = params.vc_om.get(key);

        Ok(Constraint::equal(cost, LinearExpr::term(erg_yr, rate.value())).into())
    })?;

    problem.add_family(CALC_VC_RAMP, variables.vc_ramp_yr.keys().cloned(), |key| {
        let cost = variables.vc_ramp_yr.require(key, CALC_VC_RAMP)?;
        let ramp_yr = variables.pwr_ramp_yr.require(key, CALC_VC_RAMP)?;
        let rate = params.vc_ramp.get(key);

        Ok(Constraint::equal(cost, LinearExpr::term(ramp_yr, rate.value())).into())
    })?;

    problem.add_family(CALC_FC_OM, variables.fc_om_pp_yr.keys().cloned(), |key| {
        let cost = variables.fc_om_pp_yr.require(key, CALC_FC_OM)?;
        let cap_pwr_tot = variables.cap_pwr_tot.require(key, CALC_FC_OM)?;
        let rate = params.fc_om.get(key);

        Ok(Constraint::equal(cost, LinearExpr::term(cap_pwr_tot, rate.value())).into())
    })?;

    problem.add_family(CALC_FC_CP, variables.fc_cp_pp_yr.keys().cloned(), |key| {
        let cost = variables.fc_cp_pp_yr.require(key, CALC_FC_CP)?;
        let cap_pwr_new = variables.cap_pwr_new.require(key, CALC_FC_CP)?;
        let rate = params.fc_cp_ann.require(key, CALC_FC_CP)?;

        Ok(Constraint::equal(cost, LinearExpr::term(cap_pwr_new, rate.value())).into())
    })
}
