use crate::domain::model::{Branch, OutputLayout, OutputRecord, PostalEntry};
use crate::utils::error::Result;

/// Supplies the run's reference data: the postal-code table and the branch
/// catalog. Implementations load from files in production and from literals
/// in tests.
pub trait CatalogSource {
    fn postal_entries(&self) -> Result<Vec<PostalEntry>>;
    fn branches(&self) -> Result<Vec<Branch>>;
}

/// Receives finished carrier records. Kept behind a trait so the pipeline
/// stays testable without touching the filesystem.
pub trait OutputSink {
    fn write(&self, layout: &OutputLayout, records: &[OutputRecord]) -> Result<()>;
}
