//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Default)]
pub struct ModelParameters {
    /// Free-text description of the model
    #[serde(default)]
    pub description: String,
    /// The carrier to which CHP profile and capacity rules apply.
    ///
    /// Defaults to the first carrier listed in the node-carriers file.
    pub primary_carrier: Option<String>,
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        if let Some(carrier) = &self.primary_carrier {
            ensure!(!carrier.trim().is_empty(), "primary_carrier cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "description = \"Two nodes\"\nprimary_carrier = \"EL\"").unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.description, "Two nodes");
        assert_eq!(model_params.primary_carrier.as_deref(), Some("EL"));
    }

    #[test]
    fn test_model_params_from_path_defaults() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params, ModelParameters::default());
    }

    #[test]
    fn test_model_params_empty_primary_carrier() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "primary_carrier = \" \"").unwrap();
        }

        assert!(ModelParameters::from_path(dir.path()).is_err());
    }
}
