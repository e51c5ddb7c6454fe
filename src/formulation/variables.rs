//! Declaration of the decision variables.
//!
//! Every variable family is declared once, up front, over the index set of the plants or corridors
//! it applies to. Constraint rules look variables up by their full index tuple; a missing variable
//! signals a mismatch between the index sets and is reported as an error naming the family that
//! needed it.
use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use crate::index::IndexKey;
use crate::model::Model;
use crate::plant::{Plant, PlantCategory};
use crate::problem::{Problem, VariableID};
use crate::time_slot::{Month, TimeSlot};
use anyhow::{Result, bail};
use indexmap::IndexMap;
use itertools::iproduct;
use std::hash::Hash;

/// Key for variables defined per time slot, plant and carrier
pub type SlotPlantCarrier = (TimeSlot, PlantID, CarrierID);

/// Key for variables defined per plant and carrier
pub type PlantCarrier = (PlantID, CarrierID);

/// Key for transmission flows: time slot, node from, node to and carrier
pub type SlotCorridor = (TimeSlot, NodeID, NodeID, CarrierID);

/// The domain a variable family is declared with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// `[0, inf)`
    NonNegative,
    /// `(-inf, inf)`
    Free,
}

impl Domain {
    fn bounds(self) -> (f64, f64) {
        match self {
            Domain::NonNegative => (0.0, f64::INFINITY),
            Domain::Free => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

/// A family of decision variables sharing a name and an index structure
#[derive(Debug, Clone)]
pub struct VariableFamily<K: Hash + Eq> {
    name: &'static str,
    vars: IndexMap<K, VariableID>,
}

impl<K> VariableFamily<K>
where
    K: Hash + Eq + IndexKey,
{
    /// Declare one variable per key
    fn declare<I>(problem: &mut Problem, name: &'static str, keys: I, domain: Domain) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let (lower, upper) = domain.bounds();
        let vars = keys
            .into_iter()
            .map(|key| {
                let var = problem.add_variable(name, key.describe(), lower, upper);
                (key, var)
            })
            .collect();

        Self { name, vars }
    }

    /// The name of the family
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the variable for `key`, if declared
    pub fn get(&self, key: &K) -> Option<VariableID> {
        self.vars.get(key).copied()
    }

    /// Get the variable for `key`, which the constraint family `family` cannot do without
    pub fn require(&self, key: &K, family: &str) -> Result<VariableID> {
        match self.vars.get(key) {
            Some(var) => Ok(*var),
            None => bail!(
                "Missing variable '{}' for {} required by constraint family '{family}'",
                self.name,
                key.describe()
            ),
        }
    }

    /// Iterate over the keys the family is declared over
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.vars.keys()
    }

    /// Iterate over keys and variables
    pub fn iter(&self) -> impl Iterator<Item = (&K, VariableID)> {
        self.vars.iter().map(|(key, var)| (key, *var))
    }

    /// Number of variables in the family
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the family is empty
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// All decision variables of the problem
#[derive(Debug, Clone)]
pub struct VariableMap {
    /// Power output
    pub pwr: VariableFamily<SlotPlantCarrier>,
    /// Storage charging power
    pub pwr_st_ch: VariableFamily<SlotPlantCarrier>,
    /// Stored energy at the end of a time slot
    pub erg_st: VariableFamily<SlotPlantCarrier>,
    /// Transmission flow
    pub trm: VariableFamily<SlotCorridor>,
    /// Signed change in power output since the previous time slot
    pub pwr_ramp: VariableFamily<SlotPlantCarrier>,
    /// Absolute change in power output since the previous time slot
    pub pwr_ramp_abs: VariableFamily<SlotPlantCarrier>,
    /// Total power capacity
    pub cap_pwr_tot: VariableFamily<PlantCarrier>,
    /// New power capacity
    pub cap_pwr_new: VariableFamily<PlantCarrier>,
    /// Retired power capacity
    pub cap_pwr_rem: VariableFamily<PlantCarrier>,
    /// Total energy capacity
    pub cap_erg_tot: VariableFamily<PlantCarrier>,
    /// Yearly energy output
    pub erg_yr: VariableFamily<PlantCarrier>,
    /// Monthly energy output
    pub erg_mt: VariableFamily<(Month, PlantID, CarrierID)>,
    /// Yearly fuel consumption
    pub erg_fl_yr: VariableFamily<(PlantID, NodeID, CarrierID, FuelID)>,
    /// Yearly ramping
    pub pwr_ramp_yr: VariableFamily<PlantCarrier>,
    /// Yearly charged energy
    pub erg_ch_yr: VariableFamily<PlantCarrier>,
    /// Yearly fuel cost
    pub vc_fl_pp_yr: VariableFamily<(PlantID, CarrierID, FuelID)>,
    /// Yearly variable O&M cost
    pub vc_om_pp_yr: VariableFamily<PlantCarrier>,
    /// Yearly ramping cost
    pub vc_ramp_yr: VariableFamily<PlantCarrier>,
    /// Yearly fixed O&M cost
    pub fc_om_pp_yr: VariableFamily<PlantCarrier>,
    /// Yearly annualised capital cost
    pub fc_cp_pp_yr: VariableFamily<PlantCarrier>,
}

/// Plant-carrier pairs of plants matching `filter`
fn plant_carriers<'a>(
    model: &'a Model,
    filter: impl Fn(&Plant) -> bool + 'a,
) -> impl Iterator<Item = PlantCarrier> + 'a {
    model
        .iter_plant_carriers()
        .filter(move |(plant, _)| filter(plant))
        .map(|(plant, carrier)| (plant.id.clone(), carrier.clone()))
}

/// Time slot, plant and carrier tuples of plants matching `filter`
fn slot_plant_carriers<'a>(
    model: &'a Model,
    filter: impl Fn(&Plant) -> bool + 'a,
) -> impl Iterator<Item = SlotPlantCarrier> + 'a {
    let pairs: Vec<_> = plant_carriers(model, filter).collect();
    iproduct!(model.time_slot_info.iter_ids(), pairs)
        .map(|(slot, (plant, carrier))| (*slot, plant, carrier))
}

impl VariableMap {
    /// Declare every variable family of the model in `problem`
    pub fn declare(problem: &mut Problem, model: &Model) -> Self {
        use Domain::{Free, NonNegative};
        use PlantCategory::{Addable, HydroReservoir, RampRated, Retirable, Storage};

        let all = |_: &Plant| true;
        let storage = |plant: &Plant| plant.is(Storage);
        let energy_state = |plant: &Plant| plant.has_energy_state();
        let ramp_rated = |plant: &Plant| plant.is(RampRated);
        let addable = |plant: &Plant| plant.is(Addable);
        let retirable = |plant: &Plant| plant.is(Retirable);

        let trm_keys: Vec<_> = iproduct!(model.time_slot_info.iter_ids(), &model.corridors)
            .map(|(slot, (from, to, carrier))| (*slot, from.clone(), to.clone(), carrier.clone()))
            .collect();
        let reservoirs: Vec<_> =
            plant_carriers(model, |plant| plant.is(HydroReservoir)).collect();
        let erg_mt_keys: Vec<_> = iproduct!(model.time_slot_info.iter_months(), reservoirs)
            .map(|(month, (plant, carrier))| (*month, plant, carrier))
            .collect();
        let erg_fl_yr_keys: Vec<_> = model
            .iter_plant_carriers()
            .map(|(plant, carrier)| {
                (
                    plant.id.clone(),
                    plant.node.clone(),
                    carrier.clone(),
                    plant.fuel.clone(),
                )
            })
            .collect();
        let vc_fl_pp_yr_keys: Vec<_> = model
            .iter_plant_carriers()
            .filter(|(plant, _)| plant.has_ordinary_fuel_cost())
            .map(|(plant, carrier)| (plant.id.clone(), carrier.clone(), plant.fuel.clone()))
            .collect();

        let mut declare_spc = |name, filter: &dyn Fn(&Plant) -> bool, domain| {
            VariableFamily::declare(
                problem,
                name,
                slot_plant_carriers(model, filter),
                domain,
            )
        };
        let pwr = declare_spc("pwr", &all, NonNegative);
        let pwr_st_ch = declare_spc("pwr_st_ch", &storage, NonNegative);
        let erg_st = declare_spc("erg_st", &energy_state, NonNegative);
        let pwr_ramp = declare_spc("pwr_ramp", &ramp_rated, Free);
        let pwr_ramp_abs = declare_spc("pwr_ramp_abs", &ramp_rated, NonNegative);

        let mut declare_pc = |name, filter: &dyn Fn(&Plant) -> bool, domain| {
            VariableFamily::declare(problem, name, plant_carriers(model, filter), domain)
        };
        let cap_pwr_tot = declare_pc("cap_pwr_tot", &all, NonNegative);
        let cap_pwr_new = declare_pc("cap_pwr_new", &addable, NonNegative);
        let cap_pwr_rem = declare_pc("cap_pwr_rem", &retirable, NonNegative);
        let cap_erg_tot = declare_pc("cap_erg_tot", &energy_state, NonNegative);
        let erg_yr = declare_pc("erg_yr", &all, NonNegative);
        let pwr_ramp_yr = declare_pc("pwr_ramp_yr", &ramp_rated, NonNegative);
        let erg_ch_yr = declare_pc("erg_ch_yr", &storage, NonNegative);
        let vc_om_pp_yr = declare_pc("vc_om_pp_yr", &all, Free);
        let vc_ramp_yr = declare_pc("vc_ramp_yr", &ramp_rated, Free);
        let fc_om_pp_yr = declare_pc("fc_om_pp_yr", &all, Free);
        let fc_cp_pp_yr = declare_pc("fc_cp_pp_yr", &addable, Free);

        Self {
            pwr,
            pwr_st_ch,
            erg_st,
            trm: VariableFamily::declare(problem, "trm", trm_keys, Free),
            pwr_ramp,
            pwr_ramp_abs,
            cap_pwr_tot,
            cap_pwr_new,
            cap_pwr_rem,
            cap_erg_tot,
            erg_yr,
            erg_mt: VariableFamily::declare(problem, "erg_mt", erg_mt_keys, NonNegative),
            erg_fl_yr: VariableFamily::declare(problem, "erg_fl_yr", erg_fl_yr_keys, NonNegative),
            pwr_ramp_yr,
            erg_ch_yr,
            vc_fl_pp_yr: VariableFamily::declare(problem, "vc_fl_pp_yr", vc_fl_pp_yr_keys, Free),
            vc_om_pp_yr,
            vc_ramp_yr,
            fc_om_pp_yr,
            fc_cp_pp_yr,
        }
    }
}
