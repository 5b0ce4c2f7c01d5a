//! Order-export ingestion: schema sniffing plus one adapter per source
//! platform. Both adapters emit the same canonical [`Order`] and the same
//! per-row outcomes, so everything downstream is source-agnostic.

pub mod marketplace;
pub mod storefront;

use tracing::{debug, info};

use crate::domain::model::Order;
use crate::utils::error::{LabelError, Result};
use crate::utils::normalize::{normalize, repair_encoding, trailing_digit_run};

/// Placeholder written into orders that arrive without an email. The report
/// lists these so they can be completed before submission.
pub const EMAIL_PLACEHOLDER: &str = "sin-email@completar.invalid";

/// Which platform produced the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Semicolon-separated storefront export with fixed column positions.
    Storefront,
    /// Comma-separated marketplace export with named columns and one row
    /// per line item.
    Marketplace,
}

/// Outcome of parsing one physical row.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Order {
        order: Order,
        autofilled_email: bool,
    },
    /// Structural row that is not an order (continuation, line item).
    Skip(String),
    /// A real order that cannot be processed.
    Drop { order_id: String, reason: String },
}

/// Everything ingestion produced for one input file.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub schema: SchemaKind,
    pub orders: Vec<Order>,
    /// Ids of orders whose email was auto-filled.
    pub autofilled: Vec<String>,
    pub drops: Vec<(String, String)>,
    pub skipped_rows: usize,
}

impl IngestOutcome {
    /// Real order rows seen, whatever their fate.
    pub fn total_ingested(&self) -> usize {
        self.orders.len() + self.drops.len()
    }
}

/// Detects the export schema from the header line.
pub fn sniff_schema(text: &str) -> Result<SchemaKind> {
    let header = text
        .trim_start_matches('\u{FEFF}')
        .lines()
        .next()
        .unwrap_or("");
    let norm = normalize(header);

    if norm.contains("numero de orden") || norm.contains("medio de envio") {
        return Ok(SchemaKind::Storefront);
    }
    if norm.contains("financial status") || norm.contains("lineitem") {
        return Ok(SchemaKind::Marketplace);
    }

    // Header tokens inconclusive: fall back to delimiter frequency.
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas && norm.contains("email") {
        return Ok(SchemaKind::Storefront);
    }
    if commas > semicolons && norm.contains("shipping") {
        return Ok(SchemaKind::Marketplace);
    }
    Err(LabelError::processing(
        "unrecognized export schema: header matches neither storefront nor marketplace",
    ))
}

/// Parses a full export into orders plus per-row accounting.
pub fn ingest(text: &str) -> Result<IngestOutcome> {
    let text = text.trim_start_matches('\u{FEFF}');
    let schema = sniff_schema(text)?;
    debug!(?schema, "detected export schema");

    let outcomes = match schema {
        SchemaKind::Storefront => storefront::parse(text)?,
        SchemaKind::Marketplace => marketplace::parse(text)?,
    };

    let mut orders = Vec::new();
    let mut autofilled = Vec::new();
    let mut drops = Vec::new();
    let mut skipped_rows = 0;

    for outcome in outcomes {
        match outcome {
            RowOutcome::Order {
                order,
                autofilled_email,
            } => {
                if autofilled_email {
                    autofilled.push(order.id.clone());
                }
                orders.push(order);
            }
            RowOutcome::Skip(reason) => {
                debug!(%reason, "skipped row");
                skipped_rows += 1;
            }
            RowOutcome::Drop { order_id, reason } => {
                debug!(order_id = %order_id, %reason, "dropped order at ingestion");
                drops.push((order_id, reason));
            }
        }
    }

    info!(
        orders = orders.len(),
        dropped = drops.len(),
        skipped = skipped_rows,
        "ingestion finished"
    );
    Ok(IngestOutcome {
        schema,
        orders,
        autofilled,
        drops,
        skipped_rows,
    })
}

/// Accent-, case- and spacing-tolerant header lookup shared by the
/// adapters.
pub(crate) fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    let wanted: Vec<String> = names.iter().map(|n| normalize(n)).collect();
    headers.iter().position(|h| wanted.contains(&normalize(h)))
}

/// Field cleanup every adapter applies: encoding repair plus trimming.
pub(crate) fn clean(field: &str) -> String {
    repair_encoding(field).trim().to_string()
}

/// Street numbers declared as "sin número" in any spelling become "0", the
/// value the carrier expects for unnumbered addresses.
pub(crate) fn repair_street_number(number: &str) -> String {
    let norm = normalize(number);
    if norm.is_empty() || norm == "s n" || norm == "sn" || norm == "sin numero" {
        "0".to_string()
    } else {
        number.trim().to_string()
    }
}

/// Splits a single street line into street and number, taking the trailing
/// digit run as the number.
pub(crate) fn split_street_line(line: &str) -> (String, String) {
    let line = line.trim();
    match trailing_digit_run(line) {
        Some((start, run)) => {
            let street = line[..start].trim_end_matches([' ', ',', '-']).to_string();
            (street, run.to_string())
        }
        None => (line.to_string(), repair_street_number("")),
    }
}

/// Splits a full recipient name into first name and last name at the first
/// space.
pub(crate) fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_schema() {
        assert_eq!(
            sniff_schema("Número de orden;Email;Estado").unwrap(),
            SchemaKind::Storefront
        );
        assert_eq!(
            sniff_schema("Name,Email,Financial Status,Paid at").unwrap(),
            SchemaKind::Marketplace
        );
        assert!(sniff_schema("foo,bar,baz").is_err());
    }

    #[test]
    fn test_sniff_schema_delimiter_fallback() {
        assert_eq!(
            sniff_schema("Orden;Email;Teléfono").unwrap(),
            SchemaKind::Storefront
        );
        assert_eq!(
            sniff_schema("Name,Shipping Street,Shipping City").unwrap(),
            SchemaKind::Marketplace
        );
    }

    #[test]
    fn test_sniff_schema_ignores_bom() {
        assert_eq!(
            sniff_schema("\u{FEFF}Número de orden;Email").unwrap(),
            SchemaKind::Storefront
        );
    }

    #[test]
    fn test_repair_street_number() {
        assert_eq!(repair_street_number("S/N"), "0");
        assert_eq!(repair_street_number("s/n"), "0");
        assert_eq!(repair_street_number(""), "0");
        assert_eq!(repair_street_number("1175"), "1175");
    }

    #[test]
    fn test_split_street_line() {
        assert_eq!(
            split_street_line("Av. San Martín 1175"),
            ("Av. San Martín".to_string(), "1175".to_string())
        );
        assert_eq!(
            split_street_line("Ruta 3 km 695"),
            ("Ruta 3 km".to_string(), "695".to_string())
        );
        assert_eq!(
            split_street_line("Camino de la Costa"),
            ("Camino de la Costa".to_string(), "0".to_string())
        );
        // Leading zeros stay on the number and off the street.
        assert_eq!(
            split_street_line("Güemes 050"),
            ("Güemes".to_string(), "050".to_string())
        );
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Ana María Paz"),
            ("Ana".to_string(), "María Paz".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }
}
