//! Fixtures for tests

use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use crate::model::{Fuel, FuelMap, Model, ModelParameters};
use crate::parameters::Parameters;
use crate::plant::{Plant, PlantMap};
use crate::time_slot::{Month, TimeSlot, TimeSlotData, TimeSlotInfo};
use crate::units::{Dimensionless, Energy, Hours, MoneyPerEnergy, Power};
use indexmap::{IndexMap, IndexSet};
use itertools::iproduct;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

fn make_plant(id: &str, node: &str, fuel: &str, tags: &str, carriers: &[&str]) -> Plant {
    Plant {
        id: id.into(),
        node: node.into(),
        fuel: fuel.into(),
        categories: tags.parse().unwrap(),
        carriers: carriers.iter().map(|carrier| CarrierID::new(carrier)).collect(),
        conversions: Vec::new(),
    }
}

fn make_fuels(ids: &[&str]) -> FuelMap {
    ids.iter()
        .map(|id| {
            let id = FuelID::new(id);
            let fuel = Fuel {
                id: id.clone(),
                constrained: false,
            };
            (id, fuel)
        })
        .collect()
}

fn make_model(
    time_slot_info: TimeSlotInfo,
    node_carriers: &[(&str, &str)],
    fuels: FuelMap,
    plants: Vec<Plant>,
) -> Model {
    let node_carriers: IndexSet<(NodeID, CarrierID)> = node_carriers
        .iter()
        .map(|(node, carrier)| (NodeID::new(node), CarrierID::new(carrier)))
        .collect();
    let nodes = node_carriers.iter().map(|(node, _)| node.clone()).collect();
    let carriers: IndexSet<CarrierID> = node_carriers
        .iter()
        .map(|(_, carrier)| carrier.clone())
        .collect();

    Model {
        model_path: PathBuf::new(),
        parameters: ModelParameters::default(),
        primary_carrier: carriers[0].clone(),
        time_slot_info,
        nodes,
        carriers,
        fuels,
        node_carriers,
        plants: plants
            .into_iter()
            .map(|plant| (plant.id.clone(), plant))
            .collect::<PlantMap>(),
        corridors: IndexSet::new(),
        params: Parameters::default(),
    }
}

/// Four one-hour time slots, two in each of two months
#[fixture]
pub fn time_slot_info() -> TimeSlotInfo {
    let slots = (1..=4u32)
        .map(|slot| {
            let data = TimeSlotData {
                month: Month(slot.div_ceil(2)),
                weight: Hours(1.0),
            };
            (TimeSlot(slot), data)
        })
        .collect::<IndexMap<_, _>>();

    TimeSlotInfo::new(slots).unwrap()
}

#[fixture]
pub fn plant() -> Plant {
    make_plant("coal_plant", "north", "coal", "pp", &["EL"])
}

/// Two nodes exchanging electricity, with a heat pump converting electricity to heat in the north
#[fixture]
pub fn two_node_model(time_slot_info: TimeSlotInfo) -> Model {
    let mut heat_pump = make_plant("heat_pump", "north", "electricity", "pp", &["HT"]);
    heat_pump.conversions.push(("HT".into(), "EL".into()));
    let plants = vec![
        make_plant("gas_plant", "north", "gas", "pp", &["EL"]),
        heat_pump,
        make_plant("wind", "south", "wind", "pr", &["EL"]),
    ];
    let mut model = make_model(
        time_slot_info,
        &[("north", "EL"), ("north", "HT"), ("south", "EL")],
        make_fuels(&["gas", "electricity", "wind"]),
        plants,
    );
    model.corridors = [("north", "south"), ("south", "north")]
        .into_iter()
        .map(|(from, to)| (from.into(), to.into(), "EL".into()))
        .collect();

    let slots: Vec<TimeSlot> = model.time_slot_info.iter_ids().copied().collect();
    let months: Vec<Month> = model.time_slot_info.iter_months().copied().collect();
    let params = &mut model.params;
    for ((node, carrier), losses) in [
        (("north", "EL"), 0.1),
        (("north", "HT"), 0.0),
        (("south", "EL"), 0.0),
    ] {
        params
            .grid_losses
            .insert((node.into(), carrier.into()), Dimensionless(losses))
            .unwrap();
    }
    for (plant, carrier, cap, eff) in [
        ("gas_plant", "EL", 100.0, Some(0.5)),
        ("heat_pump", "HT", 30.0, Some(0.9)),
        ("wind", "EL", 40.0, None),
    ] {
        let key: (PlantID, CarrierID) = (plant.into(), carrier.into());
        params.cap_pwr_leg.insert(key.clone(), Power(cap)).unwrap();
        if let Some(eff) = eff {
            params.pp_eff.insert(key, Dimensionless(eff)).unwrap();
        }
    }
    let dispatchable = [("gas_plant", "EL"), ("heat_pump", "HT")];
    for (month, (plant, carrier)) in iproduct!(&months, dispatchable) {
        let availability = if plant == "gas_plant" && *month == Month(2) {
            0.8
        } else {
            1.0
        };
        params
            .cap_avlb
            .insert(
                (*month, plant.into(), carrier.into()),
                Dimensionless(availability),
            )
            .unwrap();
    }
    for (month, (from, to)) in iproduct!(&months, [("north", "south"), ("south", "north")]) {
        let key: (Month, NodeID, NodeID, CarrierID) =
            (*month, from.into(), to.into(), "EL".into());
        params.cap_trme_leg.insert(key.clone(), Power(25.0)).unwrap();
        params.cap_trmi_leg.insert(key, Power(15.0)).unwrap();
    }
    for slot in &slots {
        for ((node, carrier), demand) in [
            (("north", "EL"), 50.0),
            (("north", "HT"), 20.0),
            (("south", "EL"), 10.0),
        ] {
            params
                .demand
                .insert((*slot, node.into(), carrier.into()), Power(demand))
                .unwrap();
        }
        params
            .supprof
            .insert((*slot, "wind".into(), "EL".into()), Dimensionless(0.5))
            .unwrap();
        params
            .chpprof
            .insert((*slot, "north".into(), "EL".into()), Dimensionless(0.3))
            .unwrap();
    }
    params
        .vc_fl
        .insert(("gas".into(), "north".into()), MoneyPerEnergy(20.0))
        .unwrap();
    params
        .vc_fl
        .insert(("electricity".into(), "north".into()), MoneyPerEnergy(0.0))
        .unwrap();

    model
}

/// A gas plant and a battery at a single node
#[fixture]
pub fn storage_model(time_slot_info: TimeSlotInfo) -> Model {
    let plants = vec![
        make_plant("gas_plant", "north", "gas", "pp", &["EL"]),
        make_plant("battery", "north", "electricity", "st", &["EL"]),
    ];
    let mut model = make_model(
        time_slot_info,
        &[("north", "EL")],
        make_fuels(&["gas", "electricity"]),
        plants,
    );

    let slots: Vec<TimeSlot> = model.time_slot_info.iter_ids().copied().collect();
    let months: Vec<Month> = model.time_slot_info.iter_months().copied().collect();
    let params = &mut model.params;
    params
        .grid_losses
        .insert(("north".into(), "EL".into()), Dimensionless(0.0))
        .unwrap();
    for (plant, cap) in [("gas_plant", 100.0), ("battery", 20.0)] {
        let key: (PlantID, CarrierID) = (plant.into(), "EL".into());
        params.cap_pwr_leg.insert(key.clone(), Power(cap)).unwrap();
        params.pp_eff.insert(key, Dimensionless(1.0)).unwrap();
    }
    let battery: (PlantID, CarrierID) = ("battery".into(), "EL".into());
    params
        .st_lss_rt
        .insert(battery.clone(), Dimensionless(0.19))
        .unwrap();
    params
        .discharge_duration
        .insert(battery, Hours(4.0))
        .unwrap();
    for month in months {
        params
            .cap_avlb
            .insert((month, "gas_plant".into(), "EL".into()), Dimensionless(1.0))
            .unwrap();
    }
    for slot in slots {
        params
            .demand
            .insert((slot, "north".into(), "EL".into()), Power(40.0))
            .unwrap();
    }
    params
        .vc_fl
        .insert(("gas".into(), "north".into()), MoneyPerEnergy(20.0))
        .unwrap();

    model
}

/// A hydro reservoir and a run-of-river plant sharing one water input
#[fixture]
pub fn hydro_model(time_slot_info: TimeSlotInfo) -> Model {
    let plants = vec![
        make_plant("reservoir", "north", "water", "hyrs", &["EL"]),
        make_plant("river", "north", "water", "ror", &["EL"]),
    ];
    let mut model = make_model(
        time_slot_info,
        &[("north", "EL")],
        make_fuels(&["water"]),
        plants,
    );

    let slots: Vec<TimeSlot> = model.time_slot_info.iter_ids().copied().collect();
    let params = &mut model.params;
    params
        .grid_losses
        .insert(("north".into(), "EL".into()), Dimensionless(0.0))
        .unwrap();
    for (plant, cap) in [("reservoir", 50.0), ("river", 20.0)] {
        let key: (PlantID, CarrierID) = (plant.into(), "EL".into());
        params.cap_pwr_leg.insert(key.clone(), Power(cap)).unwrap();
        params.pp_eff.insert(key, Dimensionless(1.0)).unwrap();
    }
    params
        .discharge_duration
        .insert(("reservoir".into(), "EL".into()), Hours(100.0))
        .unwrap();
    for (slot, plant) in iproduct!(&slots, ["reservoir", "river"]) {
        params
            .inflowprof
            .insert((*slot, plant.into(), "EL".into()), Dimensionless(0.25))
            .unwrap();
    }
    for slot in &slots {
        params
            .demand
            .insert((*slot, "north".into(), "EL".into()), Power(30.0))
            .unwrap();
    }
    params
        .erg_inp
        .insert(("north".into(), "EL".into(), "water".into()), Energy(400.0))
        .unwrap();
    params
        .hyd_erg_bc
        .insert((TimeSlot(3), "reservoir".into()), Dimensionless(0.5))
        .unwrap();

    let reservoir = PlantID::new("reservoir");
    params
        .min_erg_share
        .insert(reservoir.clone(), Dimensionless(0.1))
        .unwrap();
    params
        .max_erg_mt_in_share
        .insert(reservoir.clone(), Dimensionless(0.6))
        .unwrap();
    params
        .min_erg_mt_out_share
        .insert(reservoir, Dimensionless(0.5))
        .unwrap();

    model
}
