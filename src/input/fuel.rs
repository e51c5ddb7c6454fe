//! Code for reading fuels and their prices and limits.
use super::node::NodeData;
use super::*;
use crate::id::{FuelID, IDCollection};
use crate::model::{Fuel, FuelMap};
use crate::parameters::Parameters;
use crate::time_slot::TimeSlotInfo;
use crate::units::{Energy, MoneyPerEnergy, MoneyPerTonne, TonnesPerEnergy};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const FUELS_FILE_NAME: &str = "fuels.csv";
const FUEL_PRICES_FILE_NAME: &str = "fuel_prices.csv";
const FUEL_ENERGY_FILE_NAME: &str = "fuel_energy.csv";
const CO2_PRICES_FILE_NAME: &str = "co2_prices.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct FuelRaw {
    fuel: String,
    co2_int: f64,
    constrained: bool,
}

/// Represents a row of the fuel prices CSV file. A blank month means a flat price.
#[derive(PartialEq, Debug, Deserialize)]
struct FuelPriceRaw {
    fuel: String,
    node: String,
    month: Option<u32>,
    price: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct FuelEnergyRaw {
    node: String,
    carrier: String,
    fuel: String,
    erg_inp: f64,
}

/// Represents a row of the carbon prices CSV file. A blank month means a flat price.
#[derive(PartialEq, Debug, Deserialize)]
struct CO2PriceRaw {
    node: String,
    month: Option<u32>,
    price: f64,
}

/// Read fuels, fuel prices, fuel input energy and carbon prices.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `node_data` - Nodes and carriers of the model
/// * `time_slot_info` - Time slots of the model
/// * `params` - Parameters to fill in
///
/// # Returns
///
/// The model's fuels
pub fn read_fuels(
    model_dir: &Path,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<FuelMap> {
    let file_path = model_dir.join(FUELS_FILE_NAME);
    let fuels_csv = read_csv(&file_path)?;
    let fuels = read_fuels_from_iter(fuels_csv, params).with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(FUEL_PRICES_FILE_NAME);
    let prices_csv = read_csv_optional(&file_path)?;
    read_fuel_prices_from_iter(prices_csv, &fuels, node_data, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(FUEL_ENERGY_FILE_NAME);
    let energy_csv = read_csv_optional(&file_path)?;
    read_fuel_energy_from_iter(energy_csv, &fuels, node_data, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(CO2_PRICES_FILE_NAME);
    let co2_csv = read_csv_optional(&file_path)?;
    read_co2_prices_from_iter(co2_csv, node_data, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(fuels)
}

fn read_fuels_from_iter<I>(iter: I, params: &mut Parameters) -> Result<FuelMap>
where
    I: Iterator<Item = FuelRaw>,
{
    let mut fuels = FuelMap::new();
    for record in iter {
        check_non_negative(record.co2_int, "CO2 intensity")?;
        let id = FuelID::from(record.fuel);
        let fuel = Fuel {
            id: id.clone(),
            constrained: record.constrained,
        };
        ensure!(
            fuels.insert(id.clone(), fuel).is_none(),
            "Duplicate fuel ID found: {id}"
        );

        params
            .co2_int
            .insert(id, TonnesPerEnergy(record.co2_int))?;
    }

    Ok(fuels)
}

fn read_fuel_prices_from_iter<I>(
    iter: I,
    fuels: &FuelMap,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = FuelPriceRaw>,
{
    for record in iter {
        let fuel = fuels.get_id_by_str(&record.fuel)?;
        let node = node_data.nodes.get_id_by_str(&record.node)?;
        let price = MoneyPerEnergy(record.price);
        ensure!(price.is_finite(), "Invalid price for fuel {fuel}");
        match record.month {
            Some(month) => {
                let month = get_month(time_slot_info, month)?;
                params.insert_monthly_fuel_price(month, fuel, node, price)?;
            }
            None => params.vc_fl.insert((fuel, node), price)?,
        }
    }

    Ok(())
}

fn read_fuel_energy_from_iter<I>(
    iter: I,
    fuels: &FuelMap,
    node_data: &NodeData,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = FuelEnergyRaw>,
{
    for record in iter {
        check_non_negative(record.erg_inp, "Fuel input energy")?;
        let (node, carrier) = get_node_carrier(
            &node_data.node_carriers,
            &node_data.nodes,
            &node_data.carriers,
            &record.node,
            &record.carrier,
        )?;
        let fuel = fuels.get_id_by_str(&record.fuel)?;
        params
            .erg_inp
            .insert((node, carrier, fuel), Energy(record.erg_inp))?;
    }

    Ok(())
}

fn read_co2_prices_from_iter<I>(
    iter: I,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = CO2PriceRaw>,
{
    for record in iter {
        let node = node_data.nodes.get_id_by_str(&record.node)?;
        let price = MoneyPerTonne(record.price);
        ensure!(price.is_finite(), "Invalid carbon price for node {node}");
        match record.month {
            Some(month) => {
                let month = get_month(time_slot_info, month)?;
                params.insert_monthly_co2_price(month, node, price)?;
            }
            None => params.price_co2.insert(node, price)?,
        }
    }

    Ok(())
}
