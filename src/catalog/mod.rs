//! Reference data for a run: the postal-code table, the branch catalog and
//! the province letter codes the carrier uses.
//!
//! Branches are indexed once at load time; every later comparison works on
//! the precomputed normalized forms, so the per-order resolution stages never
//! re-normalize catalog text.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::model::{Branch, PostalEntry};
use crate::domain::ports::CatalogSource;
use crate::utils::error::{LabelError, Result};
use crate::utils::normalize::{
    embedded_postal_codes, fold_street_designators, normalize, normalize_upper, numeric_tokens,
};

/// Carrier single-letter province codes (CPA prefix letters).
const PROVINCE_CODES: &[(&str, char)] = &[
    ("SALTA", 'A'),
    ("BUENOS AIRES", 'B'),
    ("CAPITAL FEDERAL", 'C'),
    ("SAN LUIS", 'D'),
    ("ENTRE RIOS", 'E'),
    ("LA RIOJA", 'F'),
    ("SANTIAGO DEL ESTERO", 'G'),
    ("CHACO", 'H'),
    ("SAN JUAN", 'J'),
    ("CATAMARCA", 'K'),
    ("LA PAMPA", 'L'),
    ("MENDOZA", 'M'),
    ("MISIONES", 'N'),
    ("FORMOSA", 'P'),
    ("NEUQUEN", 'Q'),
    ("RIO NEGRO", 'R'),
    ("SANTA FE", 'S'),
    ("TUCUMAN", 'T'),
    ("CHUBUT", 'U'),
    ("TIERRA DEL FUEGO", 'V'),
    ("CORRIENTES", 'W'),
    ("CORDOBA", 'X'),
    ("JUJUY", 'Y'),
    ("SANTA CRUZ", 'Z'),
];

/// Spellings of the federal district that buyers actually type.
const CAPITAL_ALIASES: &[&str] = &[
    "CABA",
    "CAPITAL FEDERAL",
    "CIUDAD AUTONOMA DE BUENOS AIRES",
    "CIUDAD DE BUENOS AIRES",
];

/// The carrier letter for a declared province, alias-tolerant.
pub fn province_code(province: &str) -> Option<char> {
    let p = normalize_upper(province);
    if p.is_empty() {
        return None;
    }
    if CAPITAL_ALIASES.iter().any(|a| p == *a) {
        return Some('C');
    }
    PROVINCE_CODES
        .iter()
        .find(|(name, _)| p == *name)
        .map(|(_, code)| *code)
}

/// Province string used when filtering catalog entries. The federal district
/// and the conurbation both live under "BUENOS AIRES" in the branch catalog.
pub fn search_province(province: &str) -> String {
    let p = normalize_upper(province);
    if CAPITAL_ALIASES.iter().any(|a| p == *a) || p == "GRAN BUENOS AIRES" {
        return "BUENOS AIRES".to_string();
    }
    p
}

/// Postal-code table: four-digit code to canonical `"PROVINCE / LOCALITY"`
/// region string. BTreeMap keeps fallback scans deterministic.
#[derive(Debug, Clone, Default)]
pub struct PostalIndex {
    entries: BTreeMap<String, String>,
}

impl PostalIndex {
    pub fn from_entries(entries: Vec<PostalEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (e.code, normalize_upper(&e.region)))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn region(&self, code: &str) -> Option<&str> {
        self.entries.get(code.trim()).map(String::as_str)
    }

    /// Finds the first region whose text contains both the province and the
    /// locality, in catalog order.
    pub fn find_by_region(&self, province: &str, locality: &str) -> Option<(&str, &str)> {
        let province = search_province(province);
        let locality = normalize_upper(locality);
        if province.is_empty() || locality.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, region)| region.contains(&province) && region.contains(&locality))
            .map(|(code, region)| (code.as_str(), region.as_str()))
    }
}

/// A branch with every comparable form precomputed.
#[derive(Debug, Clone)]
pub struct IndexedBranch {
    pub branch: Branch,
    pub norm_name: String,
    /// Address with street designators folded, the form the exact-match
    /// stage compares against.
    pub match_text: String,
    pub address_tokens: Vec<String>,
    pub numeric: Vec<i64>,
    pub postal_codes: Vec<String>,
    pub norm_province: String,
    pub norm_locality: String,
}

impl IndexedBranch {
    fn build(branch: Branch) -> Self {
        // Pickup points usually embed their street address in the display
        // name after the marker; fold that in so address matching sees it.
        let mut address_text = branch.address.clone();
        if let Some(tail) = pickup_name_tail(&branch.name) {
            address_text.push(' ');
            address_text.push_str(&tail);
        }
        let match_text = fold_street_designators(&address_text);
        let address_tokens = match_text.split_whitespace().map(str::to_string).collect();
        let numeric = numeric_tokens(&match_text);
        let postal_codes = embedded_postal_codes(&branch.address);

        Self {
            norm_name: normalize(&branch.name),
            match_text,
            address_tokens,
            numeric,
            postal_codes,
            norm_province: search_province(&branch.province),
            norm_locality: normalize_upper(&branch.locality),
            branch,
        }
    }

    pub fn is_pickup_point(&self) -> bool {
        self.branch.kind == crate::domain::model::BranchKind::PickupPoint
    }
}

/// Text in a pickup-point name after the "PUNTO HOP" marker, normalized.
fn pickup_name_tail(name: &str) -> Option<String> {
    let norm = normalize(name);
    let idx = norm.find("punto hop")?;
    let tail = norm[idx + "punto hop".len()..].trim().to_string();
    if tail.is_empty() {
        None
    } else {
        Some(tail)
    }
}

/// The branch catalog in load order. Load order is part of the contract:
/// catalog-order tie-breaks depend on it.
#[derive(Debug, Clone, Default)]
pub struct BranchCatalog {
    items: Vec<IndexedBranch>,
}

impl BranchCatalog {
    pub fn from_branches(branches: Vec<Branch>) -> Self {
        let items = branches.into_iter().map(IndexedBranch::build).collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedBranch> {
        self.items.iter()
    }

    pub fn ordinary(&self) -> impl Iterator<Item = &IndexedBranch> {
        self.items.iter().filter(|b| !b.is_pickup_point())
    }

    pub fn first(&self) -> Option<&IndexedBranch> {
        self.items.first()
    }

    /// Lookup by exact display name, used by the exception table.
    pub fn by_name(&self, name: &str) -> Option<&IndexedBranch> {
        let wanted = normalize(name);
        self.items.iter().find(|b| b.norm_name == wanted)
    }
}

/// Loads the postal table from a semicolon-separated file. Accepts either
/// `code;region` or `code;province;locality` rows; a header row is skipped.
pub fn load_postal_entries(path: &Path) -> Result<Vec<PostalEntry>> {
    let text = fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let code = record.get(0).unwrap_or("").trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let region = match (record.get(1), record.get(2)) {
            (Some(province), Some(locality)) if !locality.trim().is_empty() => {
                format!("{} / {}", province.trim(), locality.trim())
            }
            (Some(region), _) => region.trim().to_string(),
            _ => continue,
        };
        entries.push(PostalEntry {
            code: code.to_string(),
            region,
        });
    }

    if entries.is_empty() {
        return Err(LabelError::catalog(format!(
            "postal file {} contains no usable entries",
            path.display()
        )));
    }
    debug!(count = entries.len(), "loaded postal entries");
    Ok(entries)
}

/// Loads branches from a semicolon-separated file with columns
/// `name;address;province;locality`. A header row is skipped.
pub fn load_branches(path: &Path) -> Result<Vec<Branch>> {
    let text = fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut branches = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let name = record.get(0).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        // First row may be a header.
        if i == 0 && normalize(name).starts_with("nombre") {
            continue;
        }
        branches.push(Branch::new(
            name,
            record.get(1).unwrap_or("").trim(),
            record.get(2).unwrap_or("").trim(),
            record.get(3).unwrap_or("").trim(),
        ));
    }

    if branches.is_empty() {
        return Err(LabelError::catalog(format!(
            "branch file {} contains no usable entries",
            path.display()
        )));
    }
    info!(count = branches.len(), "loaded branch catalog");
    Ok(branches)
}

/// File-backed [`CatalogSource`] used by the CLI.
pub struct FileCatalogSource {
    postal_path: PathBuf,
    branch_path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(postal_path: impl Into<PathBuf>, branch_path: impl Into<PathBuf>) -> Self {
        Self {
            postal_path: postal_path.into(),
            branch_path: branch_path.into(),
        }
    }
}

impl CatalogSource for FileCatalogSource {
    fn postal_entries(&self) -> Result<Vec<PostalEntry>> {
        load_postal_entries(&self.postal_path)
    }

    fn branches(&self) -> Result<Vec<Branch>> {
        load_branches(&self.branch_path)
    }
}
