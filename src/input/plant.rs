//! Code for reading plants, their output carriers and their carrier conversions.
use super::node::NodeData;
use super::*;
use crate::id::{CarrierID, IDCollection, PlantID};
use crate::model::FuelMap;
use crate::parameters::Parameters;
use crate::plant::{CategorySet, Plant, PlantMap};
use crate::units::{Dimensionless, Hours, MoneyPerEnergy, MoneyPerPower, Power};
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const PLANTS_FILE_NAME: &str = "plants.csv";
const PLANT_CARRIERS_FILE_NAME: &str = "plant_carriers.csv";
const PLANT_INPUTS_FILE_NAME: &str = "plant_inputs.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct PlantRaw {
    plant: String,
    node: String,
    fuel: String,
    categories: String,
}

/// Represents a row of the plant carriers CSV file.
///
/// Only the legacy capacity is required; blank cells mean the parameter does not apply.
#[derive(PartialEq, Debug, Default, Deserialize)]
struct PlantCarrierRaw {
    plant: String,
    carrier: String,
    cap_pwr_leg: f64,
    pp_eff: Option<f64>,
    discharge_duration: Option<f64>,
    st_lss_rt: Option<f64>,
    vc_om: Option<f64>,
    fc_om: Option<f64>,
    fc_cp_ann: Option<f64>,
    vc_ramp: Option<f64>,
    factor_lin_0: Option<f64>,
    factor_lin_1: Option<f64>,
}

impl PlantCarrierRaw {
    fn validate(&self) -> Result<()> {
        check_non_negative(self.cap_pwr_leg, "Legacy capacity")?;
        if let Some(pp_eff) = self.pp_eff {
            ensure!(
                pp_eff > 0.0 && pp_eff <= 1.0,
                "Efficiency must be greater than 0 and at most 1"
            );
        }
        if let Some(duration) = self.discharge_duration {
            ensure!(
                duration.is_finite() && duration > 0.0,
                "Discharge duration must be a finite number greater than zero"
            );
        }
        if let Some(loss_rate) = self.st_lss_rt {
            check_loss_rate(loss_rate, "Storage loss rate")?;
        }
        for (value, what) in [
            (self.vc_om, "Variable O&M cost"),
            (self.fc_om, "Fixed O&M cost"),
            (self.fc_cp_ann, "Annualised capital cost"),
            (self.vc_ramp, "Ramping cost"),
        ] {
            if let Some(value) = value {
                check_non_negative(value, what)?;
            }
        }

        Ok(())
    }
}

#[derive(PartialEq, Debug, Deserialize)]
struct PlantInputRaw {
    plant: String,
    carrier_out: String,
    carrier_in: String,
}

/// Read plants along with their carriers and per-carrier parameters.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `node_data` - Nodes and carriers of the model
/// * `fuels` - Fuels of the model
/// * `params` - Parameters to fill in
///
/// # Returns
///
/// The model's plants
pub fn read_plants(
    model_dir: &Path,
    node_data: &NodeData,
    fuels: &FuelMap,
    params: &mut Parameters,
) -> Result<PlantMap> {
    let file_path = model_dir.join(PLANTS_FILE_NAME);
    let plants_csv = read_csv(&file_path)?;
    let mut plants = read_plants_from_iter(plants_csv, node_data, fuels)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(PLANT_CARRIERS_FILE_NAME);
    let plant_carriers_csv = read_csv(&file_path)?;
    read_plant_carriers_from_iter(plant_carriers_csv, &mut plants, node_data, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(PLANT_INPUTS_FILE_NAME);
    let plant_inputs_csv = read_csv_optional(&file_path)?;
    read_plant_inputs_from_iter(plant_inputs_csv, &mut plants, &node_data.carriers)
        .with_context(|| input_err_msg(&file_path))?;

    for plant in plants.values() {
        plant.validate()?;
    }

    Ok(plants)
}

fn read_plants_from_iter<I>(iter: I, node_data: &NodeData, fuels: &FuelMap) -> Result<PlantMap>
where
    I: Iterator<Item = PlantRaw>,
{
    let mut plants = PlantMap::new();
    for record in iter {
        let id = PlantID::from(record.plant);
        let categories: CategorySet = record.categories.parse()?;
        ensure!(!categories.is_empty(), "Plant {id} has no categories");

        let plant = Plant {
            id: id.clone(),
            node: node_data.nodes.get_id_by_str(&record.node)?,
            fuel: fuels.get_id_by_str(&record.fuel)?,
            categories,
            carriers: IndexSet::new(),
            conversions: Vec::new(),
        };
        ensure!(
            plants.insert(id.clone(), plant).is_none(),
            "Duplicate plant ID found: {id}"
        );
    }

    Ok(plants)
}

fn read_plant_carriers_from_iter<I>(
    iter: I,
    plants: &mut PlantMap,
    node_data: &NodeData,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = PlantCarrierRaw>,
{
    for record in iter {
        record.validate()?;
        let id = plants.get_id_by_str(&record.plant)?;
        let plant = plants
            .get_mut(&id)
            .with_context(|| format!("Plant {id} not found"))?;
        let (_, carrier) = get_node_carrier(
            &node_data.node_carriers,
            &node_data.nodes,
            &node_data.carriers,
            &plant.node.to_string(),
            &record.carrier,
        )?;
        ensure!(
            plant.carriers.insert(carrier.clone()),
            "Duplicate entry for plant {id} and carrier {carrier}"
        );

        let key = (id, carrier);
        params
            .cap_pwr_leg
            .insert(key.clone(), Power(record.cap_pwr_leg))?;
        if let Some(value) = record.pp_eff {
            params.pp_eff.insert(key.clone(), Dimensionless(value))?;
        }
        if let Some(value) = record.discharge_duration {
            params.discharge_duration.insert(key.clone(), Hours(value))?;
        }
        if let Some(value) = record.st_lss_rt {
            params.st_lss_rt.insert(key.clone(), Dimensionless(value))?;
        }
        if let Some(value) = record.vc_om {
            params.vc_om.insert(key.clone(), MoneyPerEnergy(value))?;
        }
        if let Some(value) = record.fc_om {
            params.fc_om.insert(key.clone(), MoneyPerPower(value))?;
        }
        if let Some(value) = record.fc_cp_ann {
            params.fc_cp_ann.insert(key.clone(), MoneyPerPower(value))?;
        }
        if let Some(value) = record.vc_ramp {
            params.vc_ramp.insert(key.clone(), MoneyPerPower(value))?;
        }
        if let Some(value) = record.factor_lin_0 {
            params.factor_lin_0.insert(key.clone(), Dimensionless(value))?;
        }
        if let Some(value) = record.factor_lin_1 {
            params.factor_lin_1.insert(key, Dimensionless(value))?;
        }
    }

    Ok(())
}

fn read_plant_inputs_from_iter<I>(
    iter: I,
    plants: &mut PlantMap,
    carriers: &IndexSet<CarrierID>,
) -> Result<()>
where
    I: Iterator<Item = PlantInputRaw>,
{
    for record in iter {
        let id = plants.get_id_by_str(&record.plant)?;
        let plant = plants
            .get_mut(&id)
            .with_context(|| format!("Plant {id} not found"))?;
        let conversion = (
            carriers.get_id_by_str(&record.carrier_out)?,
            carriers.get_id_by_str(&record.carrier_in)?,
        );
        ensure!(
            !plant.conversions.contains(&conversion),
            "Duplicate conversion from {} to {} for plant {id}",
            conversion.1,
            conversion.0
        );
        plant.conversions.push(conversion);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::model::Fuel;
    use crate::plant::PlantCategory;
    use rstest::{fixture, rstest};

    #[fixture]
    fn node_data() -> NodeData {
        NodeData {
            nodes: ["north".into()].into_iter().collect(),
            carriers: ["EL".into(), "HT".into()].into_iter().collect(),
            node_carriers: [("north".into(), "EL".into()), ("north".into(), "HT".into())]
                .into_iter()
                .collect(),
        }
    }

    #[fixture]
    fn fuels() -> FuelMap {
        ["gas", "electricity"]
            .into_iter()
            .map(|fuel| {
                (
                    fuel.into(),
                    Fuel {
                        id: fuel.into(),
                        constrained: false,
                    },
                )
            })
            .collect()
    }

    fn plant_raw(plant: &str, fuel: &str, categories: &str) -> PlantRaw {
        PlantRaw {
            plant: plant.into(),
            node: "north".into(),
            fuel: fuel.into(),
            categories: categories.into(),
        }
    }

    fn carrier_raw(plant: &str, carrier: &str) -> PlantCarrierRaw {
        PlantCarrierRaw {
            plant: plant.into(),
            carrier: carrier.into(),
            cap_pwr_leg: 100.0,
            pp_eff: Some(0.5),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_read_plants(node_data: NodeData, fuels: FuelMap) {
        let records = [
            plant_raw("gas_plant", "gas", "pp;add"),
            plant_raw("heat_pump", "electricity", "pp"),
        ];
        let mut plants = read_plants_from_iter(records.into_iter(), &node_data, &fuels).unwrap();
        assert!(plants["gas_plant"].is(PlantCategory::Addable));

        let mut params = Parameters::default();
        let records = [carrier_raw("gas_plant", "EL"), carrier_raw("heat_pump", "HT")];
        read_plant_carriers_from_iter(records.into_iter(), &mut plants, &node_data, &mut params)
            .unwrap();
        assert_eq!(
            params
                .cap_pwr_leg
                .get(&("gas_plant".into(), "EL".into())),
            Some(Power(100.0))
        );
        assert!(
            !params
                .discharge_duration
                .contains_key(&("gas_plant".into(), "EL".into()))
        );

        let records = [PlantInputRaw {
            plant: "heat_pump".into(),
            carrier_out: "HT".into(),
            carrier_in: "EL".into(),
        }];
        read_plant_inputs_from_iter(records.into_iter(), &mut plants, &node_data.carriers)
            .unwrap();
        assert_eq!(
            plants["heat_pump"].conversions,
            [(CarrierID::new("HT"), CarrierID::new("EL"))]
        );
        for plant in plants.values() {
            plant.validate().unwrap();
        }
    }

    #[rstest]
    fn test_read_plants_bad_category(node_data: NodeData, fuels: FuelMap) {
        let records = [plant_raw("gas_plant", "gas", "pp;nuclear")];
        assert_error!(
            read_plants_from_iter(records.into_iter(), &node_data, &fuels),
            "Unknown plant category nuclear"
        );
    }

    #[rstest]
    fn test_read_plants_unknown_fuel(node_data: NodeData, fuels: FuelMap) {
        let records = [plant_raw("coal_plant", "coal", "pp")];
        assert_error!(
            read_plants_from_iter(records.into_iter(), &node_data, &fuels),
            "Unknown ID coal found"
        );
    }

    #[rstest]
    #[case(PlantCarrierRaw { pp_eff: Some(0.0), ..carrier_raw("gas_plant", "EL") },
        "Efficiency must be greater than 0 and at most 1")]
    #[case(PlantCarrierRaw { pp_eff: Some(1.5), ..carrier_raw("gas_plant", "EL") },
        "Efficiency must be greater than 0 and at most 1")]
    #[case(PlantCarrierRaw { cap_pwr_leg: -1.0, ..carrier_raw("gas_plant", "EL") },
        "Legacy capacity must be a finite number greater than or equal to zero")]
    #[case(PlantCarrierRaw { st_lss_rt: Some(1.0), ..carrier_raw("gas_plant", "EL") },
        "Storage loss rate must be at least 0 and less than 1")]
    #[case(PlantCarrierRaw { discharge_duration: Some(0.0), ..carrier_raw("gas_plant", "EL") },
        "Discharge duration must be a finite number greater than zero")]
    fn test_plant_carrier_validate(#[case] record: PlantCarrierRaw, #[case] msg: &str) {
        assert_error!(record.validate(), msg);
    }

    #[rstest]
    fn test_read_plant_carriers_duplicate(node_data: NodeData, fuels: FuelMap) {
        let records = [plant_raw("gas_plant", "gas", "pp")];
        let mut plants = read_plants_from_iter(records.into_iter(), &node_data, &fuels).unwrap();
        let mut params = Parameters::default();
        let records = [carrier_raw("gas_plant", "EL"), carrier_raw("gas_plant", "EL")];
        assert_error!(
            read_plant_carriers_from_iter(records.into_iter(), &mut plants, &node_data, &mut params),
            "Duplicate entry for plant gas_plant and carrier EL"
        );
    }
}
