//! Plants and the capability tags which decide which constraint families apply to them.
//!
//! A plant may hold several categories at once (e.g. a dispatchable plant that can also be
//! extended and retired). Categories are stored in a [`CategorySet`], which is the single place
//! where membership is decided.
use crate::id::{CarrierID, FuelID, NodeID, PlantID};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

/// A capability tag for a plant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, strum::Display, strum::EnumString)]
pub enum PlantCategory {
    /// Dispatchable plant, limited by time-varying availability
    #[strum(serialize = "pp")]
    Dispatchable,
    /// Plant whose output follows an exogenous profile (e.g. wind, solar)
    #[strum(serialize = "pr")]
    Profile,
    /// Storage plant with charging and discharging
    #[strum(serialize = "st")]
    Storage,
    /// Hydro plant with a reservoir
    #[strum(serialize = "hyrs")]
    HydroReservoir,
    /// Run-of-river hydro plant
    #[strum(serialize = "ror")]
    RunOfRiver,
    /// Plant which sells energy out of the system
    #[strum(serialize = "sll")]
    Selling,
    /// Curtailment of surplus energy
    #[strum(serialize = "curt")]
    Curtailment,
    /// Combined heat and power plant
    #[strum(serialize = "chp")]
    Chp,
    /// Plant whose capacity can be extended
    #[strum(serialize = "add")]
    Addable,
    /// Plant whose capacity can be retired
    #[strum(serialize = "rem")]
    Retirable,
    /// Plant with ramping costs
    #[strum(serialize = "pprp")]
    RampRated,
    /// Plant whose fuel and emission cost is quadratic in its power output
    #[strum(serialize = "lin")]
    MarginalCost,
}

impl PlantCategory {
    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// The set of categories a plant belongs to
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CategorySet(u16);

impl CategorySet {
    /// Check whether the set contains the given category
    pub fn contains(self, category: PlantCategory) -> bool {
        self.0 & category.bit() != 0
    }

    /// Check whether the set contains any of the given categories
    pub fn contains_any(self, categories: &[PlantCategory]) -> bool {
        categories.iter().any(|category| self.contains(*category))
    }

    /// Add a category to the set
    pub fn insert(&mut self, category: PlantCategory) {
        self.0 |= category.bit();
    }

    /// Iterate over the categories in the set
    pub fn iter(self) -> impl Iterator<Item = PlantCategory> {
        PlantCategory::iter().filter(move |category| self.contains(*category))
    }

    /// Whether the set is empty
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<PlantCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = PlantCategory>>(iter: I) -> Self {
        let mut set = Self::default();
        for category in iter {
            set.insert(category);
        }

        set
    }
}

impl FromStr for CategorySet {
    type Err = anyhow::Error;

    /// Parse a semicolon-separated list of category tags, e.g. `pp;add;pprp`
    fn from_str(s: &str) -> Result<Self> {
        s.split(';')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(|tag| {
                PlantCategory::from_str(tag).with_context(|| format!("Unknown plant category {tag}"))
            })
            .try_collect()
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join(";"))
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategorySet({self})")
    }
}

/// A generation, storage or conversion unit located at a single node
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    /// Unique identifier for the plant
    pub id: PlantID,
    /// The node the plant is connected to
    pub node: NodeID,
    /// The fuel consumed by the plant. One fuel per plant.
    pub fuel: FuelID,
    /// Capability tags
    pub categories: CategorySet,
    /// Output carriers
    pub carriers: IndexSet<CarrierID>,
    /// Carrier conversions as (output carrier, input carrier) pairs
    pub conversions: Vec<(CarrierID, CarrierID)>,
}

impl Plant {
    /// Check whether the plant holds the given category
    pub fn is(&self, category: PlantCategory) -> bool {
        self.categories.contains(category)
    }

    /// Whether the plant has a stored-energy state variable
    pub fn has_energy_state(&self) -> bool {
        self.categories
            .contains_any(&[PlantCategory::Storage, PlantCategory::HydroReservoir])
    }

    /// Whether the plant follows the storage-level recurrence
    pub fn has_level_recurrence(&self) -> bool {
        self.categories.contains_any(&[
            PlantCategory::Storage,
            PlantCategory::HydroReservoir,
            PlantCategory::RunOfRiver,
        ])
    }

    /// Whether the plant's output counts negatively towards production in the balance
    pub fn is_net_consumer(&self) -> bool {
        self.categories
            .contains_any(&[PlantCategory::Selling, PlantCategory::Curtailment])
    }

    /// Whether the plant's fuel use is costed with the ordinary (non-quadratic) formula
    pub fn has_ordinary_fuel_cost(&self) -> bool {
        self.categories
            .contains_any(&[PlantCategory::Dispatchable, PlantCategory::Selling])
            && !self.is(PlantCategory::MarginalCost)
    }

    /// Check that the plant's categories are consistent
    pub fn validate(&self) -> Result<()> {
        let state_categories = [
            PlantCategory::Storage,
            PlantCategory::HydroReservoir,
            PlantCategory::RunOfRiver,
        ];
        let count = state_categories
            .iter()
            .filter(|category| self.is(**category))
            .count();
        ensure!(
            count <= 1,
            "Plant {} can only be one of storage, hydro reservoir or run-of-river",
            self.id
        );
        ensure!(
            !self.carriers.is_empty(),
            "Plant {} has no output carriers",
            self.id
        );
        for (carrier_out, _) in &self.conversions {
            ensure!(
                self.carriers.contains(carrier_out),
                "Plant {} converts into carrier {carrier_out}, which it does not output",
                self.id
            );
        }

        Ok(())
    }
}

impl fmt::Display for Plant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A map of plants, keyed by ID
pub type PlantMap = IndexMap<PlantID, Plant>;
