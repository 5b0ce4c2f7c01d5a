use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};

/// Generate carrier shipping-label files from an e-commerce order export.
#[derive(Parser, Debug, Clone)]
#[command(name = "despacho", version, about)]
pub struct CliConfig {
    /// Order export file (storefront or marketplace CSV)
    pub input: PathBuf,

    /// Postal-code table (code;province;locality)
    #[arg(long)]
    pub postal_file: PathBuf,

    /// Branch directory (name;address;province;locality)
    #[arg(long)]
    pub branch_file: PathBuf,

    /// Directory for the generated carrier files and report
    #[arg(long, default_value = "out")]
    pub output_dir: PathBuf,

    /// Optional TOML run configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// What to do with suggestions still pending at the end of the run
    #[arg(long, value_enum, default_value_t = PendingPolicy::Fail)]
    pub pending: PendingPolicy,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Non-interactive stand-in for the review step.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Accept every pending suggestion
    AcceptAll,
    /// Reject every pending suggestion
    RejectAll,
    /// Abort the run if anything is pending
    Fail,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input.to_string_lossy())?;
        validate_path("postal_file", &self.postal_file.to_string_lossy())?;
        validate_path("branch_file", &self.branch_file.to_string_lossy())?;
        validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        Ok(())
    }
}
