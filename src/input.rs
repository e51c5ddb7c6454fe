//! Common routines for handling input data.
use crate::id::{CarrierID, IDCollection, NodeID};
use crate::model::{Model, ModelParameters};
use crate::parameters::Parameters;
use crate::time_slot::{Month, TimeSlot, TimeSlotInfo};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexSet;
use itertools::Itertools;
use log::info;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

mod fuel;
use fuel::read_fuels;
mod hydro;
use hydro::read_hydro_data;
mod node;
use node::read_node_carriers;
mod plant;
use plant::read_plants;
mod profile;
use profile::read_profiles;
mod time_slot;
use time_slot::read_time_slot_info;
mod transmission;
use transmission::read_transmission;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }
    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file, which may be absent or empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    let vec = read_csv_internal(file_path)?;
    Ok(vec.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check that a value is finite and not negative
fn check_non_negative(value: f64, what: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{what} must be a finite number greater than or equal to zero"
    );

    Ok(())
}

/// Check that a value is between 0 and 1 inclusive
fn check_proportion(value: f64, what: &str) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{what} must be between 0 and 1 inclusive"
    );

    Ok(())
}

/// Check that a loss rate is at least 0 and strictly less than 1
fn check_loss_rate(value: f64, what: &str) -> Result<()> {
    ensure!(
        (0.0..1.0).contains(&value),
        "{what} must be at least 0 and less than 1"
    );

    Ok(())
}

/// Get a time slot which must be part of the horizon
fn get_time_slot(time_slot_info: &TimeSlotInfo, slot: u32) -> Result<TimeSlot> {
    let slot = TimeSlot(slot);
    ensure!(time_slot_info.contains(&slot), "Unknown time slot {slot}");

    Ok(slot)
}

/// Get a month which must contain at least one time slot
fn get_month(time_slot_info: &TimeSlotInfo, month: u32) -> Result<Month> {
    let month = Month(month);
    ensure!(
        time_slot_info.iter_months().contains(&month),
        "Month {month} has no time slots"
    );

    Ok(month)
}

/// Get a node-carrier pair which must have its own balance
fn get_node_carrier(
    node_carriers: &IndexSet<(NodeID, CarrierID)>,
    nodes: &IndexSet<NodeID>,
    carriers: &IndexSet<CarrierID>,
    node: &str,
    carrier: &str,
) -> Result<(NodeID, CarrierID)> {
    let key = (nodes.get_id_by_str(node)?, carriers.get_id_by_str(carrier)?);
    ensure!(
        node_carriers.contains(&key),
        "Carrier {carrier} is not balanced at node {node}"
    );

    Ok(key)
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let time_slot_info = read_time_slot_info(model_dir)?;

    let mut params = Parameters::default();
    let node_data = read_node_carriers(model_dir, &mut params)?;
    let primary_carrier = match &parameters.primary_carrier {
        Some(carrier) => node_data
            .carriers
            .get_id_by_str(carrier)
            .context("Invalid primary_carrier in model.toml")?,
        None => node_data
            .carriers
            .first()
            .cloned()
            .context("No carriers defined")?,
    };

    let fuels = read_fuels(model_dir, &node_data, &time_slot_info, &mut params)?;
    let plants = read_plants(model_dir, &node_data, &fuels, &mut params)?;
    read_profiles(
        model_dir,
        &node_data,
        &fuels,
        &plants,
        &time_slot_info,
        &mut params,
    )?;
    let corridors = read_transmission(model_dir, &node_data, &time_slot_info, &mut params)?;
    read_hydro_data(
        model_dir,
        &node_data,
        &plants,
        &time_slot_info,
        &mut params,
    )?;

    info!(
        "Loaded model with {} time slots, {} nodes and {} plants",
        time_slot_info.len(),
        node_data.nodes.len(),
        plants.len()
    );

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        primary_carrier,
        time_slot_info,
        nodes: node_data.nodes,
        carriers: node_data.carriers,
        fuels,
        node_carriers: node_data.node_carriers,
        plants,
        corridors,
        params,
    })
}
