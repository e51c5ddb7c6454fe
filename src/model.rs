//! The model: index sets, plants and parameters over which the problem is formulated.
use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use crate::parameters::Parameters;
use crate::plant::{Plant, PlantCategory, PlantMap};
use crate::time_slot::TimeSlotInfo;
use indexmap::{IndexMap, IndexSet};
use std::path::PathBuf;

pub mod parameters;
pub use parameters::ModelParameters;

/// A fuel consumed by plants
#[derive(Debug, Clone, PartialEq)]
pub struct Fuel {
    /// Unique identifier for the fuel
    pub id: FuelID,
    /// Whether the yearly use of this fuel is limited by the available input energy
    pub constrained: bool,
}

/// A map of fuels, keyed by ID
pub type FuelMap = IndexMap<FuelID, Fuel>;

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The carrier for which CHP rules apply
    pub primary_carrier: CarrierID,
    /// The time slots of the planning horizon
    pub time_slot_info: TimeSlotInfo,
    /// Balancing areas
    pub nodes: IndexSet<NodeID>,
    /// Energy carriers
    pub carriers: IndexSet<CarrierID>,
    /// Fuels
    pub fuels: FuelMap,
    /// Node-carrier pairs with their own balance
    pub node_carriers: IndexSet<(NodeID, CarrierID)>,
    /// Plants
    pub plants: PlantMap,
    /// Directed transmission corridors as (from, to, carrier)
    pub corridors: IndexSet<(NodeID, NodeID, CarrierID)>,
    /// Numeric parameters
    pub params: Parameters,
}

impl Model {
    /// Iterate over plants holding the given category
    pub fn iter_plants_in(&self, category: PlantCategory) -> impl Iterator<Item = &Plant> {
        self.plants.values().filter(move |plant| plant.is(category))
    }

    /// Iterate over all plant-carrier pairs
    pub fn iter_plant_carriers(&self) -> impl Iterator<Item = (&Plant, &CarrierID)> {
        self.plants
            .values()
            .flat_map(|plant| plant.carriers.iter().map(move |carrier| (plant, carrier)))
    }

    /// Iterate over the plant-carrier pairs of plants holding the given category
    pub fn iter_plant_carriers_in(
        &self,
        category: PlantCategory,
    ) -> impl Iterator<Item = (&Plant, &CarrierID)> {
        self.iter_plant_carriers()
            .filter(move |(plant, _)| plant.is(category))
    }

    /// Iterate over plants at the given node which output the given carrier
    pub fn iter_plants_at<'a>(
        &'a self,
        node: &'a NodeID,
        carrier: &'a CarrierID,
    ) -> impl Iterator<Item = &'a Plant> {
        self.plants
            .values()
            .filter(move |plant| plant.node == *node && plant.carriers.contains(carrier))
    }

    /// Iterate over carrier conversions at the given node which draw the given carrier as input.
    ///
    /// Yields the plant along with the output carrier of the conversion.
    pub fn iter_conversions_drawing<'a>(
        &'a self,
        node: &'a NodeID,
        carrier_in: &'a CarrierID,
    ) -> impl Iterator<Item = (&'a Plant, &'a CarrierID)> {
        self.plants
            .values()
            .filter(move |plant| plant.node == *node)
            .flat_map(move |plant| {
                plant
                    .conversions
                    .iter()
                    .filter(move |(_, input)| input == carrier_in)
                    .map(move |(output, _)| (plant, output))
            })
    }

    /// Iterate over the nodes from which the given node receives the given carrier
    pub fn iter_sources_of<'a>(
        &'a self,
        node: &'a NodeID,
        carrier: &'a CarrierID,
    ) -> impl Iterator<Item = &'a NodeID> {
        self.corridors
            .iter()
            .filter(move |(_, to, ca)| to == node && ca == carrier)
            .map(|(from, _, _)| from)
    }

    /// Iterate over the nodes to which the given node sends the given carrier
    pub fn iter_destinations_of<'a>(
        &'a self,
        node: &'a NodeID,
        carrier: &'a CarrierID,
    ) -> impl Iterator<Item = &'a NodeID> {
        self.corridors
            .iter()
            .filter(move |(from, _, ca)| from == node && ca == carrier)
            .map(|(_, to, _)| to)
    }

    /// The distinct (node, carrier, fuel) combinations used by any plant
    pub fn fuel_tuples(&self) -> IndexSet<(NodeID, CarrierID, FuelID)> {
        self.iter_plant_carriers()
            .map(|(plant, carrier)| (plant.node.clone(), carrier.clone(), plant.fuel.clone()))
            .collect()
    }

    /// Iterate over plants whose (node, carrier, fuel) matches the given tuple
    pub fn iter_plants_using<'a>(
        &'a self,
        node: &'a NodeID,
        carrier: &'a CarrierID,
        fuel: &'a FuelID,
    ) -> impl Iterator<Item = &'a Plant> {
        self.iter_plants_at(node, carrier)
            .filter(move |plant| plant.fuel == *fuel)
    }

    /// Whether the given carrier is the primary one
    pub fn is_primary_carrier(&self, carrier: &CarrierID) -> bool {
        self.primary_carrier == *carrier
    }

    /// Get a plant by ID
    pub fn plant(&self, id: &PlantID) -> Option<&Plant> {
        self.plants.get(id)
    }
}
