//! The module responsible for writing output data to disk.
use crate::problem::Problem;
use crate::solver::Solution;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "esform_results";

/// The output file name for the constraint family summary
const CONSTRAINT_FAMILIES_FILE_NAME: &str = "constraint_families.csv";

/// The output file name for variable values
const VARIABLES_FILE_NAME: &str = "variables.csv";

/// The output file name for the objective value
const OBJECTIVE_FILE_NAME: &str = "objective.csv";

/// Get the default output directory for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing directory is only reused if it is empty or `allow_overwrite` is set.
///
/// # Returns
///
/// Whether files in an existing, non-empty directory may be overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        ensure!(
            is_empty || allow_overwrite,
            "Output folder {} already exists and is not empty. Use --overwrite to replace its \
            contents.",
            output_dir.display()
        );
        return Ok(!is_empty);
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Could not create output folder {}", output_dir.display()))?;

    Ok(false)
}

/// Represents a row in the constraint family summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ConstraintFamilyRow {
    family: String,
    instances: usize,
    skipped: usize,
}

/// Represents a row in the variables CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct VariableRow {
    family: String,
    index: String,
    lower: f64,
    upper: f64,
    value: Option<f64>,
}

/// Represents the single row of the objective CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ObjectiveRow {
    objective_value: f64,
}

/// Write the number of instances added and skipped per constraint family
pub fn write_constraint_families(output_path: &Path, problem: &Problem) -> Result<()> {
    let file_path = output_path.join(CONSTRAINT_FAMILIES_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)?;
    for family in problem.iter_families() {
        writer.serialize(ConstraintFamilyRow {
            family: family.name.to_string(),
            instances: family.len(),
            skipped: family.skipped,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write every variable with its bounds and, if available, its value in the solution
pub fn write_variables(
    output_path: &Path,
    problem: &Problem,
    solution: Option<&Solution>,
) -> Result<()> {
    let file_path = output_path.join(VARIABLES_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)?;
    for (var, def) in problem.iter_variables() {
        writer.serialize(VariableRow {
            family: def.family.to_string(),
            index: def.key.clone(),
            lower: def.lower,
            upper: def.upper,
            value: solution.map(|solution| solution.value(var)),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the objective value of a solution
pub fn write_objective(output_path: &Path, solution: &Solution) -> Result<()> {
    let file_path = output_path.join(OBJECTIVE_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)?;
    writer.serialize(ObjectiveRow {
        objective_value: solution.objective_value,
    })?;
    writer.flush()?;

    Ok(())
}
