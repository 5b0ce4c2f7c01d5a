use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::normalize::normalize;

/// Machine-checkable drop reasons. Reports and tests match on these exact
/// strings, so they are constants rather than ad-hoc format strings.
pub mod drop_reason {
    pub const MISSING_ORDER_ID: &str = "missing order id";
    pub const MISSING_RECIPIENT: &str = "missing recipient name";
    pub const MISSING_PROVINCE: &str = "missing province";
    pub const UNKNOWN_PROVINCE: &str = "province not mapped to carrier code";
    pub const UNMAPPED_REGION: &str = "postal/province/locality not mapped to region";
    pub const NOT_PAID: &str = "financial status not paid";
    pub const UNRECOGNIZED_SHIPPING: &str = "unrecognized shipping method";
    pub const SUGGESTION_REJECTED: &str = "suggestion rejected - requires manual processing";
    pub const EMPTY_CATALOG: &str = "branch catalog empty - no suggestion possible";
}

/// Destination address as declared by the buyer, already encoding-repaired
/// but otherwise verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub floor_unit: String,
    pub locality: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

/// Canonical order record. Built once by an ingestion adapter and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub shipping_hint: String,
    pub address: Address,
}

impl Order {
    /// Street and number joined the way the resolution engine compares them.
    pub fn street_line(&self) -> String {
        let line = format!("{} {}", self.address.street, self.address.number);
        line.trim().to_string()
    }

    pub fn shipping_mode(&self) -> ShippingMode {
        ShippingMode::from_hint(&self.shipping_hint)
    }
}

/// What the free-text shipping hint asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingMode {
    HomeDelivery,
    PickupBranch,
    Unknown,
}

impl ShippingMode {
    pub fn from_hint(hint: &str) -> Self {
        let hint = normalize(hint);
        if hint.is_empty() {
            return ShippingMode::Unknown;
        }
        let pickup = ["punto de retiro", "retiro", "sucursal", "pickup", "punto"]
            .iter()
            .any(|kw| hint.contains(kw));
        let home = ["domicilio", "delivery", "envio"]
            .iter()
            .any(|kw| hint.contains(kw));

        match (pickup, home) {
            (true, false) => ShippingMode::PickupBranch,
            (false, true) => ShippingMode::HomeDelivery,
            // "Envío a punto de retiro" style hints mention both; the pickup
            // wording is the more specific signal.
            (true, true) => ShippingMode::PickupBranch,
            (false, false) => ShippingMode::Unknown,
        }
    }
}

/// Run-level package attributes. These come from configuration, not from the
/// order rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSpec {
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub declared_value: f64,
}

impl Default for PackageSpec {
    fn default() -> Self {
        Self {
            weight_kg: 1.0,
            length_cm: 10.0,
            width_cm: 10.0,
            height_cm: 10.0,
            declared_value: 100.0,
        }
    }
}

/// Branch sub-kind, derived from the display-name convention: auxiliary
/// pickup points carry a "PUNTO ... HOP" marker in their name and are matched
/// by address text alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Ordinary,
    PickupPoint,
}

impl BranchKind {
    pub fn from_name(name: &str) -> Self {
        let name = normalize(name);
        if name.contains("punto hop") || name.starts_with("hop ") {
            BranchKind::PickupPoint
        } else {
            BranchKind::Ordinary
        }
    }
}

/// A physical pickup location in the carrier's network. Read-only reference
/// data for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub address: String,
    pub province: String,
    pub locality: String,
    pub kind: BranchKind,
}

impl Branch {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        province: impl Into<String>,
        locality: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let kind = BranchKind::from_name(&name);
        Self {
            name,
            address: address.into(),
            province: province.into(),
            locality: locality.into(),
            kind,
        }
    }
}

/// Postal code mapped to the canonical `"PROVINCE / LOCALITY"` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalEntry {
    pub code: String,
    pub region: String,
}

/// Where a resolved order ships to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Destination {
    HomeDelivery {
        /// Canonical `"PROVINCE / LOCALITY"` string from the postal catalog.
        region: String,
        province_code: char,
    },
    PickupBranch {
        branch: Branch,
        province_code: char,
    },
}

/// Review decision state for a suggested branch. Terminal once decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Pending,
    Accepted,
    Rejected,
}

/// A ranked, non-authoritative branch candidate awaiting human confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub order_id: String,
    pub branch: Branch,
    pub reason: String,
    pub score: u32,
    pub decision: Decision,
}

/// Outcome of branch resolution for a single order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionResult {
    Resolved(Destination),
    Suggested(Suggestion),
    Dropped(String),
}

/// One flat carrier row: ordered field/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub fields: Vec<(String, String)>,
}

impl OutputRecord {
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.push((field.into(), value.into()));
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> Vec<&str> {
        self.fields.iter().map(|(_, v)| v.as_str()).collect()
    }
}

/// Layout descriptor handed to the output sink together with a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    pub name: String,
    pub headers: Vec<String>,
    pub delimiter: u8,
}

/// Summary of a processing run. Always produced, even for clean runs;
/// rendered by the (external) presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub generated_at: DateTime<Utc>,
    pub total_ingested: usize,
    pub resolved: usize,
    pub suggested_pending: usize,
    pub suggested_accepted: usize,
    pub suggested_rejected: usize,
    pub dropped: usize,
    pub skipped_rows: usize,
    /// Order ids whose email was auto-filled with the placeholder.
    pub auto_filled: Vec<String>,
    /// `"<order id>: <reason>"` entries, one per dropped order.
    pub drop_reasons: Vec<String>,
    /// Rejected-suggestion order ids that need manual processing.
    pub manual_processing: Vec<String>,
}

impl ProcessingReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            total_ingested: 0,
            resolved: 0,
            suggested_pending: 0,
            suggested_accepted: 0,
            suggested_rejected: 0,
            dropped: 0,
            skipped_rows: 0,
            auto_filled: Vec::new(),
            drop_reasons: Vec::new(),
            manual_processing: Vec::new(),
        }
    }

    pub fn suggested_total(&self) -> usize {
        self.suggested_pending + self.suggested_accepted + self.suggested_rejected
    }

    /// The primary regression check against silent data loss:
    /// every ingested order must be accounted for exactly once.
    pub fn reconciles(&self) -> bool {
        self.resolved + self.suggested_total() + self.dropped == self.total_ingested
    }
}

impl Default for ProcessingReport {
    fn default() -> Self {
        Self::new()
    }
}
