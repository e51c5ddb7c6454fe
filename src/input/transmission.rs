//! Code for reading transmission corridors and their capacities.
use super::node::NodeData;
use super::*;
use crate::id::{CarrierID, NodeID};
use crate::parameters::Parameters;
use crate::time_slot::TimeSlotInfo;
use crate::units::Power;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const TRANSMISSION_FILE_NAME: &str = "transmission.csv";

/// Represents a row of the transmission CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct TransmissionRaw {
    month: u32,
    node_from: String,
    node_to: String,
    carrier: String,
    cap_export: f64,
    cap_import: f64,
}

/// Read transmission corridors.
///
/// A corridor is defined by the first row mentioning it. Every corridor needs export and import
/// capacities for each month in which it is used; this is checked when the problem is formulated.
///
/// # Returns
///
/// Directed corridors as (node from, node to, carrier)
pub fn read_transmission(
    model_dir: &Path,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<IndexSet<(NodeID, NodeID, CarrierID)>> {
    let file_path = model_dir.join(TRANSMISSION_FILE_NAME);
    let transmission_csv = read_csv_optional(&file_path)?;
    read_transmission_from_iter(transmission_csv, node_data, time_slot_info, params)
        .with_context(|| input_err_msg(&file_path))
}

fn read_transmission_from_iter<I>(
    iter: I,
    node_data: &NodeData,
    time_slot_info: &TimeSlotInfo,
    params: &mut Parameters,
) -> Result<IndexSet<(NodeID, NodeID, CarrierID)>>
where
    I: Iterator<Item = TransmissionRaw>,
{
    let mut corridors = IndexSet::new();
    for record in iter {
        check_non_negative(record.cap_export, "Export capacity")?;
        check_non_negative(record.cap_import, "Import capacity")?;
        ensure!(
            record.node_from != record.node_to,
            "Corridor from {} to itself",
            record.node_from
        );

        let month = get_month(time_slot_info, record.month)?;
        let lookup = |node: &str| {
            get_node_carrier(
                &node_data.node_carriers,
                &node_data.nodes,
                &node_data.carriers,
                node,
                &record.carrier,
            )
        };
        let (from, carrier) = lookup(&record.node_from)?;
        let (to, _) = lookup(&record.node_to)?;

        let key = (month, from.clone(), to.clone(), carrier.clone());
        params
            .cap_trme_leg
            .insert(key.clone(), Power(record.cap_export))?;
        params
            .cap_trmi_leg
            .insert(key, Power(record.cap_import))?;
        corridors.insert((from, to, carrier));
    }

    Ok(corridors)
}
