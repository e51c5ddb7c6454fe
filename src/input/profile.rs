//! Code for reading demand and the time-varying profiles.
use super::node::NodeData;
use super::*;
use crate::id::{CarrierID, IDCollection, PlantID};
use crate::model::FuelMap;
use crate::parameters::{ParameterMap, Parameters};
use crate::plant::PlantMap;
use crate::time_slot::{TimeSlot, TimeSlotInfo};
use crate::units::{Dimensionless, MoneyPerEnergy, Power};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";
const AVAILABILITY_FILE_NAME: &str = "availability.csv";
const SUPPLY_PROFILES_FILE_NAME: &str = "supply_profiles.csv";
const CHP_PROFILES_FILE_NAME: &str = "chp_profiles.csv";
const INFLOW_PROFILES_FILE_NAME: &str = "inflow_profiles.csv";
const PRICE_PROFILES_FILE_NAME: &str = "price_profiles.csv";

/// A value per time slot, node and carrier (demand and CHP profiles)
#[derive(PartialEq, Debug, Deserialize)]
struct NodeProfileRaw {
    slot: u32,
    node: String,
    carrier: String,
    value: f64,
}

/// A value per time slot, plant and carrier (supply and inflow profiles)
#[derive(PartialEq, Debug, Deserialize)]
struct PlantProfileRaw {
    slot: u32,
    plant: String,
    carrier: String,
    value: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct AvailabilityRaw {
    month: u32,
    plant: String,
    carrier: String,
    value: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct PriceProfileRaw {
    slot: u32,
    fuel: String,
    node: String,
    carrier: String,
    price: f64,
}

/// Read demand and all optional profile files.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `node_data` - Nodes and carriers of the model
/// * `fuels` - Fuels of the model
/// * `plants` - Plants of the model
/// * `time_slot_info` - Time slots of the model
/// * `params` - Parameters to fill in
pub fn read_profiles(
    model_dir: &Path,
    node_data: &NodeData,
    fuels: &FuelMap,
    plants: &PlantMap,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let demand_csv = read_csv(&file_path)?;
    read_demand_from_iter(demand_csv, node_data, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(AVAILABILITY_FILE_NAME);
    let availability_csv = read_csv_optional(&file_path)?;
    read_availability_from_iter(availability_csv, plants, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(SUPPLY_PROFILES_FILE_NAME);
    let supply_csv = read_csv_optional(&file_path)?;
    read_plant_profiles_from_iter(
        supply_csv,
        plants,
        time_slot_info,
        &mut params.supprof,
        |value| check_proportion(value, "Supply profile value"),
    )
    .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(CHP_PROFILES_FILE_NAME);
    let chp_csv = read_csv_optional(&file_path)?;
    read_chp_profiles_from_iter(chp_csv, node_data, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(INFLOW_PROFILES_FILE_NAME);
    let inflow_csv = read_csv_optional(&file_path)?;
    read_plant_profiles_from_iter(
        inflow_csv,
        plants,
        time_slot_info,
        &mut params.inflowprof,
        |value| check_non_negative(value, "Inflow profile value"),
    )
    .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(PRICE_PROFILES_FILE_NAME);
    let price_csv = read_csv_optional(&file_path)?;
    read_price_profiles_from_iter(price_csv, node_data, fuels, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(())
}

/// Get a plant-carrier pair, where the plant must output the carrier
fn get_plant_carrier(plants: &PlantMap, plant: &str, carrier: &str) -> Result<(PlantID, CarrierID)> {
    let id = plants.get_id_by_str(plant)?;
    let carrier = plants[&id]
        .carriers
        .get_id_by_str(carrier)
        .with_context(|| format!("Plant {id} does not output carrier {carrier}"))?;

    Ok((id, carrier))
}

fn read_demand_from_iter<I>(
    iter: I,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = NodeProfileRaw>,
{
    for record in iter {
        check_non_negative(record.value, "Demand")?;
        let slot = get_time_slot(time_slot_info, record.slot)?;
        let (node, carrier) = get_node_carrier(
            &node_data.node_carriers,
            &node_data.nodes,
            &node_data.carriers,
            &record.node,
            &record.carrier,
        )?;
        params
            .demand
            .insert((slot, node, carrier), Power(record.value))?;
    }

    Ok(())
}

fn read_chp_profiles_from_iter<I>(
    iter: I,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = NodeProfileRaw>,
{
    for record in iter {
        check_proportion(record.value, "CHP profile value")?;
        let slot = get_time_slot(time_slot_info, record.slot)?;
        let (node, carrier) = get_node_carrier(
            &node_data.node_carriers,
            &node_data.nodes,
            &node_data.carriers,
            &record.node,
            &record.carrier,
        )?;
        params
            .chpprof
            .insert((slot, node, carrier), Dimensionless(record.value))?;
    }

    Ok(())
}

fn read_availability_from_iter<I>(
    iter: I,
    plants: &PlantMap,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = AvailabilityRaw>,
{
    for record in iter {
        check_proportion(record.value, "Availability")?;
        let month = get_month(time_slot_info, record.month)?;
        let (plant, carrier) = get_plant_carrier(plants, &record.plant, &record.carrier)?;
        params
            .cap_avlb
            .insert((month, plant, carrier), Dimensionless(record.value))?;
    }

    Ok(())
}

/// Read supply or inflow profiles into `map`, checking each value with `validate`
fn read_plant_profiles_from_iter<I, F>(
    iter: I,
    plants: &PlantMap,
    time_slot_info: &TimeSlotInfo,
    map: &mut ParameterMap<(TimeSlot, PlantID, CarrierID), Dimensionless>,
    validate: F,
) -> Result<()>
where
    I: Iterator<Item = PlantProfileRaw>,
    F: Fn(f64) -> Result<()>,
{
    for record in iter {
        validate(record.value)?;
        let slot = get_time_slot(time_slot_info, record.slot)?;
        let (plant, carrier) = get_plant_carrier(plants, &record.plant, &record.carrier)?;
        map.insert((slot, plant, carrier), Dimensionless(record.value))?;
    }

    Ok(())
}

fn read_price_profiles_from_iter<I>(
    iter: I,
    node_data: &NodeData,
    fuels: &FuelMap,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = PriceProfileRaw>,
{
    for record in iter {
        let slot = get_time_slot(time_slot_info, record.slot)?;
        let fuel = fuels.get_id_by_str(&record.fuel)?;
        let (node, carrier) = get_node_carrier(
            &node_data.node_carriers,
            &node_data.nodes,
            &node_data.carriers,
            &record.node,
            &record.carrier,
        )?;
        let price = MoneyPerEnergy(record.price);
        ensure!(price.is_finite(), "Invalid price for fuel {fuel}");
        params.insert_price_profile_value(slot, fuel, node, carrier, price)?;
    }

    Ok(())
}
