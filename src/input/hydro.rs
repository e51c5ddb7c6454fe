//! Code for reading hydro reservoir registrations, boundary levels and CHP capacity minimums.
use super::node::NodeData;
use super::*;
use crate::id::{IDCollection, PlantID};
use crate::parameters::Parameters;
use crate::plant::{PlantCategory, PlantMap};
use crate::time_slot::TimeSlotInfo;
use crate::units::{Dimensionless, Power};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const HYDRO_FILE_NAME: &str = "hydro.csv";
const HYDRO_BOUNDARY_FILE_NAME: &str = "hydro_boundary.csv";
const CHP_CAPACITY_FILE_NAME: &str = "chp_capacity.csv";

/// Represents a row of the hydro CSV file. Blank cells leave the plant unregistered for that rule.
#[derive(PartialEq, Debug, Deserialize)]
struct HydroRaw {
    plant: String,
    min_erg_share: Option<f64>,
    max_erg_mt_in_share: Option<f64>,
    min_erg_mt_out_share: Option<f64>,
}

#[derive(PartialEq, Debug, Deserialize)]
struct HydroBoundaryRaw {
    slot: u32,
    plant: String,
    level: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct ChpCapacityRaw {
    node: String,
    cap_pwr_leg: f64,
}

/// Read hydro and CHP capacity data.
///
/// All files are optional.
pub fn read_hydro_data(
    model_dir: &Path,
    node_data: &NodeData,
    plants: &PlantMap,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()> {
    let file_path = model_dir.join(HYDRO_FILE_NAME);
    let hydro_csv = read_csv_optional(&file_path)?;
    read_hydro_from_iter(hydro_csv, plants, params).with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(HYDRO_BOUNDARY_FILE_NAME);
    let boundary_csv = read_csv_optional(&file_path)?;
    read_hydro_boundary_from_iter(boundary_csv, plants, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(CHP_CAPACITY_FILE_NAME);
    let chp_csv = read_csv_optional(&file_path)?;
    read_chp_capacity_from_iter(chp_csv, node_data, params)
        .with_context(|| input_err_msg(&file_path))?;

    Ok(())
}

/// Get the ID of a plant which must be a hydro reservoir
fn get_reservoir(plants: &PlantMap, plant: &str) -> Result<PlantID> {
    let id = plants.get_id_by_str(plant)?;
    ensure!(
        plants[&id].is(PlantCategory::HydroReservoir),
        "Plant {id} is not a hydro reservoir"
    );

    Ok(id)
}

fn read_hydro_from_iter<I>(iter: I, plants: &PlantMap, params: &mut Parameters) -> Result<()>
where
    I: Iterator<Item = HydroRaw>,
{
    for record in iter {
        let id = get_reservoir(plants, &record.plant)?;
        for (value, map) in [
            (record.min_erg_share, &mut params.min_erg_share),
            (record.max_erg_mt_in_share, &mut params.max_erg_mt_in_share),
            (record.min_erg_mt_out_share, &mut params.min_erg_mt_out_share),
        ] {
            if let Some(value) = value {
                check_proportion(value, "Reservoir share")?;
                map.insert(id.clone(), Dimensionless(value))?;
            }
        }
    }

    Ok(())
}

fn read_hydro_boundary_from_iter<I>(
    iter: I,
    plants: &PlantMap,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = HydroBoundaryRaw>,
{
    for record in iter {
        check_proportion(record.level, "Reservoir boundary level")?;
        let slot = get_time_slot(time_slot_info, record.slot)?;
        let id = get_reservoir(plants, &record.plant)?;
        params
            .hyd_erg_bc
            .insert((slot, id), Dimensionless(record.level))?;
    }

    Ok(())
}

fn read_chp_capacity_from_iter<I>(
    iter: I,
    node_data: &NodeData,
    params: &mut Parameters,
) -> Result<()>
where
    I: Iterator<Item = ChpCapacityRaw>,
{
    for record in iter {
        check_non_negative(record.cap_pwr_leg, "CHP capacity")?;
        let node = node_data.nodes.get_id_by_str(&record.node)?;
        params
            .chp_cap_pwr_leg
            .insert(node, Power(record.cap_pwr_leg))?;
    }

    Ok(())
}
