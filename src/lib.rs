//! Formulation of cost-minimising energy system optimisation problems.
//!
//! A model (time slots, nodes, carriers, fuels, plants and their parameters) is loaded from a
//! directory of CSV and TOML files, then turned into a [`problem::Problem`]: decision variables,
//! named constraint families and a cost objective. Linear problems can be handed to HiGHS.
#![warn(missing_docs)]
use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod cli;
pub mod formulation;
pub mod id;
pub mod index;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod parameters;
pub mod plant;
pub mod problem;
pub mod settings;
pub mod solver;
pub mod time_slot;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config directory for the program
pub fn get_esform_config_dir() -> Result<PathBuf> {
    let mut config_dir = dirs::config_dir().context("Could not get path to config dir")?;
    config_dir.push("esform");

    Ok(config_dir)
}
