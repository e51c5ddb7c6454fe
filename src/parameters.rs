//! Numeric parameters consumed by the formulation.
//!
//! Parameters are sparse. There are two kinds of table, and they must not be confused:
//!
//! * [`ParameterMap`]: absence of a key means the parameter does not apply to that tuple. A
//!   constraint family that needs the value calls [`ParameterMap::require`], which fails with a
//!   description of the missing tuple; a family that can do without it calls
//!   [`ParameterMap::get`] and skips the instance.
//! * [`DefaultedParameterMap`]: absence of a key legitimately means the default value (usually
//!   zero), e.g. a plant with no fixed O&M cost.
use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use crate::index::IndexKey;
use crate::time_slot::{Month, TimeSlot};
use crate::units::{
    Dimensionless, Energy, Hours, MoneyPerEnergy, MoneyPerPower, MoneyPerTonne, Power,
    TonnesPerEnergy,
};
use anyhow::{Result, bail};
use indexmap::IndexMap;
use std::hash::Hash;

/// A sparse parameter, where absence means "structurally inapplicable"
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMap<K: Hash + Eq, V> {
    name: &'static str,
    values: IndexMap<K, V>,
}

impl<K, V> ParameterMap<K, V>
where
    K: Hash + Eq + IndexKey,
    V: Copy,
{
    /// Create a new, empty parameter with the given name
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: IndexMap::new(),
        }
    }

    /// The parameter's name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert a value, failing if one was already present for `key`
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.values.contains_key(&key) {
            bail!(
                "Duplicate value for parameter '{}' at {}",
                self.name,
                key.describe()
            );
        }

        self.values.insert(key, value);
        Ok(())
    }

    /// Get the value for `key`, if present
    pub fn get(&self, key: &K) -> Option<V> {
        self.values.get(key).copied()
    }

    /// Get the value for `key`, which the constraint family `family` cannot do without
    pub fn require(&self, key: &K, family: &str) -> Result<V> {
        match self.values.get(key) {
            Some(value) => Ok(*value),
            None => bail!(
                "Missing parameter '{}' for {} required by constraint family '{family}'",
                self.name,
                key.describe()
            ),
        }
    }

    /// Check whether a value is present for `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over keys and values
    pub fn iter(&self) -> impl Iterator<Item = (&K, V)> {
        self.values.iter().map(|(key, value)| (key, *value))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A sparse parameter, where absence means the default value
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultedParameterMap<K: Hash + Eq, V> {
    values: ParameterMap<K, V>,
    default: V,
}

impl<K, V> DefaultedParameterMap<K, V>
where
    K: Hash + Eq + IndexKey,
    V: Copy,
{
    /// Create a new, empty parameter with the given name and default value
    pub fn new(name: &'static str, default: V) -> Self {
        Self {
            values: ParameterMap::new(name),
            default,
        }
    }

    /// Insert a value, failing if one was already present for `key`
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.values.insert(key, value)
    }

    /// Get the value for `key`, or the default if absent
    pub fn get(&self, key: &K) -> V {
        self.values.get(key).unwrap_or(self.default)
    }
}

/// Key for parameters defined per plant and output carrier
pub type PlantCarrierKey = (PlantID, CarrierID);

/// The price of a fuel at a node for a given carrier, per time slot
pub type PriceProfile = ParameterMap<TimeSlot, MoneyPerEnergy>;

/// All numeric parameters of a model
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Grid losses as a share of demand-side flows, per node and carrier
    pub grid_losses: ParameterMap<(NodeID, CarrierID), Dimensionless>,
    /// Demand per time slot, node and carrier
    pub demand: ParameterMap<(TimeSlot, NodeID, CarrierID), Power>,
    /// Legacy power capacity
    pub cap_pwr_leg: ParameterMap<PlantCarrierKey, Power>,
    /// Conversion efficiency from fuel or input carrier to output
    pub pp_eff: ParameterMap<PlantCarrierKey, Dimensionless>,
    /// Hours of full-power discharge that fit into the energy capacity
    pub discharge_duration: ParameterMap<PlantCarrierKey, Hours>,
    /// Round-trip storage loss
    pub st_lss_rt: ParameterMap<PlantCarrierKey, Dimensionless>,
    /// Variable O&M cost
    pub vc_om: DefaultedParameterMap<PlantCarrierKey, MoneyPerEnergy>,
    /// Fixed O&M cost per unit of total capacity
    pub fc_om: DefaultedParameterMap<PlantCarrierKey, MoneyPerPower>,
    /// Annualised capital cost per unit of new capacity
    pub fc_cp_ann: ParameterMap<PlantCarrierKey, MoneyPerPower>,
    /// Cost per unit of ramped power
    pub vc_ramp: DefaultedParameterMap<PlantCarrierKey, MoneyPerPower>,
    /// Constant coefficient of the marginal cost curve
    pub factor_lin_0: ParameterMap<PlantCarrierKey, Dimensionless>,
    /// Slope of the marginal cost curve, per unit of power
    pub factor_lin_1: ParameterMap<PlantCarrierKey, Dimensionless>,
    /// Monthly availability of dispatchable plants as a share of capacity
    pub cap_avlb: ParameterMap<(Month, PlantID, CarrierID), Dimensionless>,
    /// Normalised supply profiles of profile-driven plants
    pub supprof: ParameterMap<(TimeSlot, PlantID, CarrierID), Dimensionless>,
    /// Normalised CHP output profiles per node and carrier
    pub chpprof: ParameterMap<(TimeSlot, NodeID, CarrierID), Dimensionless>,
    /// Mandated minimum CHP capacity per node
    pub chp_cap_pwr_leg: ParameterMap<NodeID, Power>,
    /// Normalised inflow profiles of hydro plants, as a share of yearly inflow per hour
    pub inflowprof: ParameterMap<(TimeSlot, PlantID, CarrierID), Dimensionless>,
    /// Yearly input energy available per node, carrier and fuel
    pub erg_inp: ParameterMap<(NodeID, CarrierID, FuelID), Energy>,
    /// Reservoir level boundary conditions as a share of energy capacity
    pub hyd_erg_bc: ParameterMap<(TimeSlot, PlantID), Dimensionless>,
    /// Minimum stored energy as a share of energy capacity
    pub min_erg_share: ParameterMap<PlantID, Dimensionless>,
    /// Maximum monthly inflow as a share of yearly inflow
    pub max_erg_mt_in_share: ParameterMap<PlantID, Dimensionless>,
    /// Minimum monthly output as a share of maximum monthly inflow
    pub min_erg_mt_out_share: ParameterMap<PlantID, Dimensionless>,
    /// Flat fuel prices
    pub vc_fl: ParameterMap<(FuelID, NodeID), MoneyPerEnergy>,
    /// Monthly fuel prices, grouped by fuel and node
    pub vc_fl_monthly: IndexMap<(FuelID, NodeID), ParameterMap<Month, MoneyPerEnergy>>,
    /// Fuel price profiles, grouped by fuel, node and carrier
    pub priceprof: IndexMap<(FuelID, NodeID, CarrierID), PriceProfile>,
    /// Emission intensity of fuels
    pub co2_int: ParameterMap<FuelID, TonnesPerEnergy>,
    /// Flat carbon prices
    pub price_co2: ParameterMap<NodeID, MoneyPerTonne>,
    /// Monthly carbon prices, grouped by node
    pub price_co2_monthly: IndexMap<NodeID, ParameterMap<Month, MoneyPerTonne>>,
    /// Export capacity of transmission corridors
    pub cap_trme_leg: ParameterMap<(Month, NodeID, NodeID, CarrierID), Power>,
    /// Import capacity of transmission corridors
    pub cap_trmi_leg: ParameterMap<(Month, NodeID, NodeID, CarrierID), Power>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            grid_losses: ParameterMap::new("grid_losses"),
            demand: ParameterMap::new("dmnd"),
            cap_pwr_leg: ParameterMap::new("cap_pwr_leg"),
            pp_eff: ParameterMap::new("pp_eff"),
            discharge_duration: ParameterMap::new("discharge_duration"),
            st_lss_rt: ParameterMap::new("st_lss_rt"),
            vc_om: DefaultedParameterMap::new("vc_om", MoneyPerEnergy(0.0)),
            fc_om: DefaultedParameterMap::new("fc_om", MoneyPerPower(0.0)),
            fc_cp_ann: ParameterMap::new("fc_cp_ann"),
            vc_ramp: DefaultedParameterMap::new("vc_ramp", MoneyPerPower(0.0)),
            factor_lin_0: ParameterMap::new("factor_lin_0"),
            factor_lin_1: ParameterMap::new("factor_lin_1"),
            cap_avlb: ParameterMap::new("cap_avlb"),
            supprof: ParameterMap::new("supprof"),
            chpprof: ParameterMap::new("chpprof"),
            chp_cap_pwr_leg: ParameterMap::new("chp_cap_pwr_leg"),
            inflowprof: ParameterMap::new("inflowprof"),
            erg_inp: ParameterMap::new("erg_inp"),
            hyd_erg_bc: ParameterMap::new("hyd_erg_bc"),
            min_erg_share: ParameterMap::new("min_erg_share"),
            max_erg_mt_in_share: ParameterMap::new("max_erg_mt_in_share"),
            min_erg_mt_out_share: ParameterMap::new("min_erg_mt_out_share"),
            vc_fl: ParameterMap::new("vc_fl"),
            vc_fl_monthly: IndexMap::new(),
            priceprof: IndexMap::new(),
            co2_int: ParameterMap::new("co2_int"),
            price_co2: ParameterMap::new("price_co2"),
            price_co2_monthly: IndexMap::new(),
            cap_trme_leg: ParameterMap::new("cap_trme_leg"),
            cap_trmi_leg: ParameterMap::new("cap_trmi_leg"),
        }
    }
}

impl Parameters {
    /// Add a monthly fuel price
    pub fn insert_monthly_fuel_price(
        &mut self,
        month: Month,
        fuel: FuelID,
        node: NodeID,
        price: MoneyPerEnergy,
    ) -> Result<()> {
        self.vc_fl_monthly
            .entry((fuel, node))
            .or_insert_with(|| ParameterMap::new("vc_fl"))
            .insert(month, price)
    }

    /// Add one time slot's value of a fuel price profile
    pub fn insert_price_profile_value(
        &mut self,
        slot: TimeSlot,
        fuel: FuelID,
        node: NodeID,
        carrier: CarrierID,
        price: MoneyPerEnergy,
    ) -> Result<()> {
        self.priceprof
            .entry((fuel, node, carrier))
            .or_insert_with(|| ParameterMap::new("priceprof"))
            .insert(slot, price)
    }

    /// Add a monthly carbon price
    pub fn insert_monthly_co2_price(
        &mut self,
        month: Month,
        node: NodeID,
        price: MoneyPerTonne,
    ) -> Result<()> {
        self.price_co2_monthly
            .entry(node)
            .or_insert_with(|| ParameterMap::new("price_co2"))
            .insert(month, price)
    }
}
