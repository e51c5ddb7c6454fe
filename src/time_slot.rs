//! Code for working with time slots.
//!
//! Time slots partition the planning horizon. They are ordered and cyclic: the predecessor of the
//! first time slot is the last one. Each time slot carries a weight (the number of hours it
//! represents) and belongs to exactly one month.
use crate::units::Hours;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// The ID of a time slot
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub struct TimeSlot(pub u32);

/// A month of the year, used for monthly parameters and aggregates
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub struct Month(pub u32);

/// Data associated with a single time slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSlotData {
    /// The month this time slot belongs to
    pub month: Month,
    /// The duration represented by this time slot
    pub weight: Hours,
}

/// The ordered, cyclic sequence of time slots in the planning horizon
#[derive(Debug, PartialEq)]
pub struct TimeSlotInfo {
    slots: IndexMap<TimeSlot, TimeSlotData>,
    months: IndexSet<Month>,
}

impl TimeSlotInfo {
    /// Create a new [`TimeSlotInfo`] from time slots in horizon order.
    ///
    /// There must be at least one time slot and all weights must be positive.
    pub fn new(slots: IndexMap<TimeSlot, TimeSlotData>) -> Result<Self> {
        ensure!(!slots.is_empty(), "At least one time slot must be provided");
        for (slot, data) in &slots {
            ensure!(
                data.weight.is_finite() && data.weight > Hours(0.0),
                "Weight for time slot {slot} must be a finite number greater than zero"
            );
        }

        let months = slots.values().map(|data| data.month).collect();
        Ok(Self { slots, months })
    }

    /// Number of time slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: a valid [`TimeSlotInfo`] has at least one time slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the given time slot is part of the horizon
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.slots.contains_key(slot)
    }

    /// Iterate over time slot IDs in horizon order
    pub fn iter_ids(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.keys()
    }

    /// Iterate over time slots along with their data
    pub fn iter(&self) -> impl Iterator<Item = (&TimeSlot, &TimeSlotData)> {
        self.slots.iter()
    }

    /// Get the data for the given time slot
    pub fn get(&self, slot: &TimeSlot) -> Result<&TimeSlotData> {
        self.slots
            .get(slot)
            .with_context(|| format!("Unknown time slot {slot}"))
    }

    /// The cyclic predecessor of the given time slot.
    ///
    /// The predecessor of the first time slot is the last one.
    pub fn previous(&self, slot: &TimeSlot) -> Result<&TimeSlot> {
        let index = self
            .slots
            .get_index_of(slot)
            .with_context(|| format!("Unknown time slot {slot}"))?;
        let (previous, _) = self
            .slots
            .get_index((index + self.slots.len() - 1) % self.slots.len())
            .context("Time slot index out of range")?;

        Ok(previous)
    }

    /// Iterate over the months covered by the horizon, in order of first appearance
    pub fn iter_months(&self) -> impl Iterator<Item = &Month> {
        self.months.iter()
    }

    /// Iterate over the time slots belonging to the given month
    pub fn iter_month(&self, month: Month) -> impl Iterator<Item = (&TimeSlot, &TimeSlotData)> {
        self.slots.iter().filter(move |(_, data)| data.month == month)
    }

    /// The total number of hours covered by the horizon
    pub fn total_hours(&self) -> Hours {
        self.slots
            .values()
            .fold(Hours(0.0), |total, data| total + data.weight)
    }
}
