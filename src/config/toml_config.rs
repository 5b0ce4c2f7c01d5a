use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::model::PackageSpec;
use crate::resolve::exceptions::ExceptionEntry;
use crate::resolve::suggest::SuggestionWeights;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_positive, Validate};

/// Optional per-run settings. Everything has a default, so a run without a
/// config file behaves identically to one with an empty file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub package: PackageSpec,
    pub weights: SuggestionWeights,
    /// One-off resolution overrides; see `resolve::exceptions`.
    pub exceptions: Vec<ExceptionEntry>,
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_positive("package.weight_kg", self.package.weight_kg)?;
        validate_positive("package.length_cm", self.package.length_cm)?;
        validate_positive("package.width_cm", self.package.width_cm)?;
        validate_positive("package.height_cm", self.package.height_cm)?;
        validate_positive("package.declared_value", self.package.declared_value)?;
        for (i, exception) in self.exceptions.iter().enumerate() {
            validate_non_empty_string(&format!("exceptions[{i}].order_id"), &exception.order_id)?;
            validate_non_empty_string(&format!("exceptions[{i}].branch"), &exception.branch)?;
        }
        Ok(())
    }
}
