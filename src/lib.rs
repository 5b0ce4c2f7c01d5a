pub mod catalog;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod output;
pub mod resolve;
pub mod review;
pub mod utils;

pub use catalog::FileCatalogSource;
pub use config::{CliConfig, PendingPolicy, RunConfig};
pub use crate::core::{LabelPipeline, RunOutput, RunState};
pub use output::{CarrierSerializer, CsvSink};
pub use utils::error::{LabelError, Result};
