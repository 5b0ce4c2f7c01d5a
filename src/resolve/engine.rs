//! Staged branch resolution. Each stage either produces a branch, narrows
//! the candidate set for the next stage, or falls through; the first usable
//! result wins and later stages never run.

use tracing::{debug, warn};

use crate::catalog::{search_province, BranchCatalog, IndexedBranch};
use crate::domain::model::{Branch, Order, Suggestion};
use crate::resolve::exceptions::ExceptionTable;
use crate::resolve::suggest::{suggest, SuggestionWeights};
use crate::utils::normalize::{
    fold_street_designators, normalize_upper, postal_digits, trailing_number,
};

/// Internal sentinel: the stages ran to completion and found nothing.
/// Distinguishes "no branch" from "empty search input" in logs.
pub const BRANCH_NOT_FOUND: &str = "BRANCH NOT FOUND";

/// What resolution produced for one pickup order.
#[derive(Debug, Clone)]
pub enum BranchResolution {
    /// A stage matched; authoritative, no review needed.
    Matched(Branch),
    /// The stages failed; a ranked suggestion needs review.
    Suggested(Suggestion),
    /// The stages failed and the catalog is empty.
    Unresolvable,
}

pub struct Resolver<'a> {
    catalog: &'a BranchCatalog,
    weights: &'a SuggestionWeights,
    exceptions: &'a ExceptionTable,
}

impl<'a> Resolver<'a> {
    pub fn new(
        catalog: &'a BranchCatalog,
        weights: &'a SuggestionWeights,
        exceptions: &'a ExceptionTable,
    ) -> Self {
        Self {
            catalog,
            weights,
            exceptions,
        }
    }

    pub fn resolve(&self, order: &Order) -> BranchResolution {
        if let Some(name) = self.exceptions.branch_for(&order.id) {
            match self.catalog.by_name(name) {
                Some(branch) => {
                    warn!(order_id = %order.id, branch = %branch.branch.name, "exception override applied");
                    return BranchResolution::Matched(branch.branch.clone());
                }
                None => {
                    warn!(order_id = %order.id, branch = %name, "exception names unknown branch, ignoring");
                }
            }
        }

        let query = fold_street_designators(&order.street_line());
        let number = trailing_number(&query);
        let postal = postal_digits(&order.address.postal_code);

        let exact: Vec<&IndexedBranch> = self
            .catalog
            .iter()
            .filter(|b| exact_address_match(&query, number, b))
            .collect();
        debug!(order_id = %order.id, candidates = exact.len(), %query, "exact address stage");

        // Pickup points validate themselves; their name is their address.
        let pickups: Vec<&IndexedBranch> =
            exact.iter().copied().filter(|b| b.is_pickup_point()).collect();
        if let Some(found) = pick(&pickups, number) {
            return BranchResolution::Matched(found.branch.clone());
        }

        let ordinary: Vec<&IndexedBranch> =
            exact.iter().copied().filter(|b| !b.is_pickup_point()).collect();

        if !ordinary.is_empty() {
            // Postal confirmation, then province/locality confirmation.
            let confirmed: Vec<&IndexedBranch> = ordinary
                .iter()
                .copied()
                .filter(|b| !postal.is_empty() && b.postal_codes.contains(&postal))
                .collect();
            if let Some(found) = pick(&confirmed, number) {
                return BranchResolution::Matched(found.branch.clone());
            }

            let region_confirmed: Vec<&IndexedBranch> = ordinary
                .iter()
                .copied()
                .filter(|b| region_match(order, b))
                .collect();
            if let Some(found) = pick(&region_confirmed, number) {
                return BranchResolution::Matched(found.branch.clone());
            }
        } else if !postal.is_empty() {
            // No exact address match anywhere: postal-code-only sweep.
            let by_postal: Vec<&IndexedBranch> = self
                .catalog
                .ordinary()
                .filter(|b| b.postal_codes.contains(&postal))
                .collect();
            if let Some(found) = pick(&by_postal, number) {
                return BranchResolution::Matched(found.branch.clone());
            }
        }

        debug!(order_id = %order.id, "{BRANCH_NOT_FOUND}, generating suggestion");
        match suggest(order, self.catalog, self.weights) {
            Some(suggestion) => BranchResolution::Suggested(suggestion),
            None => BranchResolution::Unresolvable,
        }
    }
}

/// The exact-address predicate. All three conditions must hold: shared
/// trailing street number, every significant order word present, and
/// contiguous containment of the whole query.
fn exact_address_match(query: &str, number: Option<i64>, candidate: &IndexedBranch) -> bool {
    let Some(number) = number else {
        return false;
    };
    if !candidate.numeric.contains(&number) {
        return false;
    }

    let words_ok = query
        .split_whitespace()
        .filter(|w| w.len() >= 3)
        .all(|w| {
            candidate
                .address_tokens
                .iter()
                .any(|t| t.starts_with(w))
                || candidate.match_text.contains(w)
        });
    if !words_ok {
        return false;
    }

    contains_contiguous(&candidate.match_text, query)
}

/// Containment on token boundaries, so "balcarce 33" does not match inside
/// "balcarce 333".
fn contains_contiguous(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let left_ok = start == 0 || haystack.as_bytes()[start - 1] == b' ';
        let right_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
        if left_ok && right_ok {
            return true;
        }
        from = end;
    }
    false
}

/// Province AND locality textual containment between order and candidate.
/// A locality declared as "CAPITAL" means the province's capital city.
fn region_match(order: &Order, candidate: &IndexedBranch) -> bool {
    let province = search_province(&order.address.province);
    if province.is_empty() || candidate.norm_province != province {
        return false;
    }

    let mut locality = normalize_upper(&order.address.locality);
    if locality.is_empty() {
        locality = normalize_upper(&order.address.city);
    }
    if locality == "CAPITAL" {
        locality = normalize_upper(&order.address.province);
    }
    if locality.is_empty() {
        return false;
    }
    candidate.norm_locality.contains(&locality) || locality.contains(&candidate.norm_locality)
}

/// Candidate selection: single survivor, else numerically closest street
/// number, else first in catalog order.
fn pick<'a>(candidates: &[&'a IndexedBranch], number: Option<i64>) -> Option<&'a IndexedBranch> {
    match candidates {
        [] => None,
        [only] => Some(*only),
        many => {
            let Some(number) = number else {
                return Some(many[0]);
            };
            many.iter()
                .copied()
                .min_by_key(|b| {
                    b.numeric
                        .iter()
                        .map(|n| (n - number).abs())
                        .min()
                        .unwrap_or(i64::MAX)
                })
        }
    }
}
