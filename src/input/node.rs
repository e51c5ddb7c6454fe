//! Code for reading the node-carriers CSV file.
use super::*;
use crate::id::{CarrierID, NodeID};
use crate::parameters::Parameters;
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const NODE_CARRIERS_FILE_NAME: &str = "node_carriers.csv";

/// Represents a row of the node-carriers CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct NodeCarrierRaw {
    node: String,
    carrier: String,
    grid_losses: Option<f64>,
}

/// The nodes and carriers of a model and where each carrier is balanced
#[derive(Debug, Default, PartialEq)]
pub struct NodeData {
    /// All nodes, in order of first appearance
    pub nodes: IndexSet<NodeID>,
    /// All carriers, in order of first appearance
    pub carriers: IndexSet<CarrierID>,
    /// Node-carrier pairs with their own balance
    pub node_carriers: IndexSet<(NodeID, CarrierID)>,
}

/// Read the node-carriers CSV file.
///
/// Nodes and carriers are defined by their appearance in this file. A blank grid loss is taken as
/// zero.
pub fn read_node_carriers(model_dir: &Path, params: &mut Parameters) -> Result<NodeData> {
    let file_path = model_dir.join(NODE_CARRIERS_FILE_NAME);
    let node_carriers_csv = read_csv(&file_path)?;
    read_node_carriers_from_iter(node_carriers_csv, params)
        .with_context(|| input_err_msg(&file_path))
}

fn read_node_carriers_from_iter<I>(iter: I, params: &mut Parameters) -> Result<NodeData>
where
    I: Iterator<Item = NodeCarrierRaw>,
{
    let mut data = NodeData::default();
    for record in iter {
        let grid_losses = record.grid_losses.unwrap_or(0.0);
        check_loss_rate(grid_losses, "Grid losses")?;

        let node = NodeID::from(record.node);
        let carrier = CarrierID::from(record.carrier);
        data.nodes.insert(node.clone());
        data.carriers.insert(carrier.clone());

        let key = (node, carrier);
        ensure!(
            data.node_carriers.insert(key.clone()),
            "Duplicate entry for node {} and carrier {}",
            key.0,
            key.1
        );
        params
            .grid_losses
            .insert(key, Dimensionless(grid_losses))?;
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use itertools::assert_equal;

    fn raw(node: &str, carrier: &str, grid_losses: Option<f64>) -> NodeCarrierRaw {
        NodeCarrierRaw {
            node: node.into(),
            carrier: carrier.into(),
            grid_losses,
        }
    }

    #[test]
    fn test_read_node_carriers_from_iter() {
        let mut params = Parameters::default();
        let records = [
            raw("north", "EL", Some(0.1)),
            raw("north", "HT", None),
            raw("south", "EL", Some(0.0)),
        ];
        let data = read_node_carriers_from_iter(records.into_iter(), &mut params).unwrap();

        assert_equal(data.nodes.iter().map(ToString::to_string), ["north", "south"]);
        assert_equal(data.carriers.iter().map(ToString::to_string), ["EL", "HT"]);
        assert_eq!(data.node_carriers.len(), 3);
        assert_eq!(
            params.grid_losses.get(&("north".into(), "HT".into())),
            Some(Dimensionless(0.0))
        );
    }

    #[test]
    fn test_read_node_carriers_duplicate() {
        let mut params = Parameters::default();
        let records = [raw("north", "EL", None), raw("north", "EL", Some(0.1))];
        assert_error!(
            read_node_carriers_from_iter(records.into_iter(), &mut params),
            "Duplicate entry for node north and carrier EL"
        );
    }

    #[test]
    fn test_read_node_carriers_bad_losses() {
        let mut params = Parameters::default();
        let records = [raw("north", "EL", Some(1.0))];
        assert_error!(
            read_node_carriers_from_iter(records.into_iter(), &mut params),
            "Grid losses must be at least 0 and less than 1"
        );
    }
}
