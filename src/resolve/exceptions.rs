//! One-off resolution overrides. Historical oddities (a buyer whose branch
//! is known despite an unmatchable address) live here as data instead of as
//! special cases inside the matching stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One override as it appears in the run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionEntry {
    pub order_id: String,
    pub branch: String,
}

/// Order-id to forced-branch-name table. Empty unless the run configuration
/// populates it.
#[derive(Debug, Clone, Default)]
pub struct ExceptionTable {
    overrides: BTreeMap<String, String>,
}

impl ExceptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ExceptionEntry>) -> Self {
        let overrides = entries
            .into_iter()
            .map(|e| (e.order_id, e.branch))
            .collect();
        Self { overrides }
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn branch_for(&self, order_id: &str) -> Option<&str> {
        self.overrides.get(order_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_by_default() {
        let table = ExceptionTable::new();
        assert!(table.is_empty());
        assert_eq!(table.branch_for("5001"), None);
    }

    #[test]
    fn test_lookup() {
        let table = ExceptionTable::from_entries(vec![ExceptionEntry {
            order_id: "5001".into(),
            branch: "CORDOBA CENTRO".into(),
        }]);
        assert_eq!(table.branch_for("5001"), Some("CORDOBA CENTRO"));
        assert_eq!(table.branch_for("5002"), None);
    }
}
