//! The objective: total yearly system cost.
use super::costs::{CALC_FC_CP, CALC_FC_OM, CALC_VC_FL_PP, CALC_VC_OM_PP, CALC_VC_RAMP};
use super::variables::VariableMap;
use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use crate::model::Model;
use crate::plant::PlantCategory;
use crate::problem::{LinearExpr, Problem, QuadraticExpr};
use crate::time_slot::Month;
use crate::units::{MoneyPerEnergy, MoneyPerTonne};
use anyhow::{Result, ensure};
use log::debug;

/// Label used in messages about the marginal-cost terms
const MARGINAL_COST: &str = "objective";

/// Add the objective.
///
/// The objective is the unweighted sum of every cost variable plus, for marginal-cost plants, a
/// quadratic fuel term and a quadratic emission term:
///
/// `sum(weight * price * (factor_lin_0 + 0.5 * factor_lin_1 * pwr) * pwr)`
///
/// where `price` is the fuel price, or `co2_int * price_co2` for the emission term. Monthly prices
/// are used where the (fuel, node) or node has any.
///
/// The cost rules must already have been generated.
pub fn add_objective_rules(
    problem: &mut Problem,
    variables: &VariableMap,
    model: &Model,
) -> Result<()> {
    for name in [
        CALC_VC_FL_PP,
        CALC_VC_OM_PP,
        CALC_VC_RAMP,
        CALC_FC_OM,
        CALC_FC_CP,
    ] {
        ensure!(
            problem.family(name).is_some(),
            "Cost rule '{name}' must be generated before the objective"
        );
    }

    let mut linear = LinearExpr::default();
    for (_, var) in variables.vc_fl_pp_yr.iter() {
        linear.add_term(var, 1.0);
    }
    for family in [
        &variables.vc_om_pp_yr,
        &variables.vc_ramp_yr,
        &variables.fc_om_pp_yr,
        &variables.fc_cp_pp_yr,
    ] {
        for (_, var) in family.iter() {
            linear.add_term(var, 1.0);
        }
    }

    let mut objective = QuadraticExpr::from(linear);
    for (plant, carrier) in model.iter_plant_carriers_in(PlantCategory::MarginalCost) {
        add_marginal_cost_terms(
            &mut objective,
            variables,
            model,
            &plant.id,
            &plant.node,
            carrier,
            &plant.fuel,
        )?;
    }
    debug!(
        "Objective has {} quadratic terms",
        objective.quadratic.len()
    );

    problem.set_objective(objective);

    Ok(())
}

/// The price per unit of energy for a marginal-cost plant in the given month: fuel plus emissions
fn marginal_price(
    model: &Model,
    node: &NodeID,
    fuel: &FuelID,
    month: Month,
) -> Result<MoneyPerEnergy> {
    let params = &model.params;
    let fuel_price = match params.vc_fl_monthly.get(&(fuel.clone(), node.clone())) {
        Some(monthly) => monthly.require(&month, MARGINAL_COST)?,
        None => params
            .vc_fl
            .require(&(fuel.clone(), node.clone()), MARGINAL_COST)?,
    };
    let co2_price: MoneyPerTonne = match params.price_co2_monthly.get(node) {
        Some(monthly) => monthly.require(&month, MARGINAL_COST)?,
        None => params.price_co2.require(node, MARGINAL_COST)?,
    };
    let co2_int = params.co2_int.require(fuel, MARGINAL_COST)?;

    Ok(fuel_price + co2_int * co2_price)
}

fn add_marginal_cost_terms(
    objective: &mut QuadraticExpr,
    variables: &VariableMap,
    model: &Model,
    plant: &PlantID,
    node: &NodeID,
    carrier: &CarrierID,
    fuel: &FuelID,
) -> Result<()> {
    let key = (plant.clone(), carrier.clone());
    let factor_0 = model.params.factor_lin_0.require(&key, MARGINAL_COST)?;
    let factor_1 = model.params.factor_lin_1.require(&key, MARGINAL_COST)?;

    for (slot, data) in model.time_slot_info.iter() {
        let pwr = variables
            .pwr
            .require(&(*slot, plant.clone(), carrier.clone()), MARGINAL_COST)?;
        let price = marginal_price(model, node, fuel, data.month)?;
        let scale = data.weight.value() * price.value();
        objective.linear.add_term(pwr, scale * factor_0.value());
        objective.add_quadratic_term(pwr, pwr, 0.5 * scale * factor_1.value());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, two_node_model};
    use crate::formulation::costs::add_yearly_cost_rules;
    use crate::parameters::ParameterMap;
    use crate::time_slot::TimeSlot;
    use crate::units::{Dimensionless, TonnesPerEnergy};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn build(model: &Model) -> Result<(Problem, VariableMap)> {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, model);
        add_yearly_cost_rules(&mut problem, &variables, model)?;
        add_objective_rules(&mut problem, &variables, model)?;
        Ok((problem, variables))
    }

    fn make_marginal(model: &mut Model) {
        let key: (PlantID, CarrierID) = ("gas_plant".into(), "EL".into());
        model.plants[&key.0].categories = "pp;lin".parse().unwrap();
        let params = &mut model.params;
        params
            .factor_lin_0
            .insert(key.clone(), Dimensionless(2.0))
            .unwrap();
        params.factor_lin_1.insert(key, Dimensionless(0.1)).unwrap();
        params
            .co2_int
            .insert("gas".into(), TonnesPerEnergy(0.5))
            .unwrap();
        params
            .price_co2
            .insert("north".into(), MoneyPerTonne(10.0))
            .unwrap();
    }

    #[rstest]
    fn test_objective_sums_cost_variables(two_node_model: Model) {
        let (problem, variables) = build(&two_node_model).unwrap();
        let objective = problem.objective();
        assert!(objective.is_linear());

        let coefficients = objective.linear.coefficients();
        let expected = variables.vc_fl_pp_yr.len()
            + variables.vc_om_pp_yr.len()
            + variables.vc_ramp_yr.len()
            + variables.fc_om_pp_yr.len()
            + variables.fc_cp_pp_yr.len();
        assert_eq!(coefficients.len(), expected);
        assert!(coefficients.values().all(|coeff| *coeff == 1.0));
    }

    #[rstest]
    fn test_marginal_cost_terms(mut two_node_model: Model) {
        make_marginal(&mut two_node_model);
        let (problem, variables) = build(&two_node_model).unwrap();
        let objective = problem.objective();
        assert!(!objective.is_linear());
        assert_eq!(objective.quadratic.len(), 4);

        // Price is 20 + 0.5 * 10 = 25, weight 1
        let pwr = variables
            .pwr
            .get(&(TimeSlot(2), "gas_plant".into(), "EL".into()))
            .unwrap();
        assert_approx_eq!(f64, objective.linear.coefficient(pwr), 50.0);
        let term = objective
            .quadratic
            .iter()
            .find(|term| term.first == pwr)
            .unwrap();
        assert_eq!(term.second, pwr);
        assert_approx_eq!(f64, term.coeff, 1.25);

        // 50 * pwr + 1.25 * pwr^2 at pwr = 10 in slot 2 only
        let mut values = vec![0.0; problem.num_variables()];
        values[pwr.index()] = 10.0;
        assert_approx_eq!(f64, objective.evaluate(&values), 625.0);
    }

    #[rstest]
    fn test_marginal_cost_monthly_prices(mut two_node_model: Model) {
        make_marginal(&mut two_node_model);
        let params = &mut two_node_model.params;
        for month in [1, 2] {
            params
                .insert_monthly_fuel_price(
                    Month(month),
                    "gas".into(),
                    "north".into(),
                    MoneyPerEnergy(f64::from(month) * 10.0),
                )
                .unwrap();
        }
        params
            .insert_monthly_co2_price(Month(1), "north".into(), MoneyPerTonne(0.0))
            .unwrap();
        params
            .insert_monthly_co2_price(Month(2), "north".into(), MoneyPerTonne(40.0))
            .unwrap();
        let (problem, variables) = build(&two_node_model).unwrap();

        let coefficient = |slot| {
            let pwr = variables
                .pwr
                .get(&(TimeSlot(slot), "gas_plant".into(), "EL".into()))
                .unwrap();
            problem.objective().linear.coefficient(pwr)
        };
        // Month 1: 10 + 0; month 2: 20 + 0.5 * 40
        assert_approx_eq!(f64, coefficient(1), 20.0);
        assert_approx_eq!(f64, coefficient(4), 80.0);
    }

    #[rstest]
    fn test_marginal_cost_missing_factor(mut two_node_model: Model) {
        make_marginal(&mut two_node_model);
        two_node_model.params.factor_lin_1 = ParameterMap::new("factor_lin_1");
        assert_error!(
            build(&two_node_model),
            "Missing parameter 'factor_lin_1' for (gas_plant, EL) required by constraint family \
            'objective'"
        );
    }

    #[rstest]
    fn test_objective_requires_cost_rules(two_node_model: Model) {
        let mut problem = Problem::new();
        let variables = VariableMap::declare(&mut problem, &two_node_model);
        assert_error!(
            add_objective_rules(&mut problem, &variables, &two_node_model),
            "Cost rule 'calc_vc_fl_pp' must be generated before the objective"
        );
    }
}
