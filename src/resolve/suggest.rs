//! Ranked branch suggestions for orders the resolution stages could not
//! place. Never authoritative: every suggestion goes through review before
//! it reaches carrier output.

use serde::{Deserialize, Serialize};

use crate::catalog::{search_province, BranchCatalog, IndexedBranch};
use crate::domain::model::{Decision, Order, Suggestion};
use crate::utils::normalize::{fold_street_designators, normalize_upper, postal_digits};

/// Scoring rubric. Every weight is data, not code, so the table can be
/// tuned per run without touching the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionWeights {
    /// Ceiling for the proportional street-word overlap term.
    pub street_overlap_max: u32,
    pub postal_exact: u32,
    pub postal_prefix: u32,
    pub province: u32,
    pub locality: u32,
    pub locality_in_name: u32,
    /// Minimum score a candidate needs to be suggested directly.
    pub keep_threshold: u32,
    /// Fixed score for the same-province low-confidence fallback.
    pub province_fallback: u32,
    /// Fixed score for the first-catalog-branch fallback.
    pub manual_review: u32,
}

impl Default for SuggestionWeights {
    fn default() -> Self {
        Self {
            street_overlap_max: 50,
            postal_exact: 25,
            postal_prefix: 12,
            province: 20,
            locality: 15,
            locality_in_name: 10,
            keep_threshold: 20,
            province_fallback: 25,
            manual_review: 10,
        }
    }
}

struct Scored<'a> {
    candidate: &'a IndexedBranch,
    score: u32,
    fired: Vec<String>,
}

/// Scores every ordinary branch against the order and returns the best
/// candidate. `None` only when the catalog has no ordinary branches.
pub fn suggest(
    order: &Order,
    catalog: &BranchCatalog,
    weights: &SuggestionWeights,
) -> Option<Suggestion> {
    let street = fold_street_designators(&order.street_line());
    let street_words: Vec<&str> = street
        .split_whitespace()
        .filter(|w| w.len() >= 3 && !w.chars().all(|c| c.is_ascii_digit()))
        .collect();
    let postal_core = postal_digits(&order.address.postal_code);
    let province = search_province(&order.address.province);
    let locality = normalize_upper(&order.address.locality);

    let mut best: Option<Scored> = None;
    for candidate in catalog.ordinary() {
        let mut score = 0u32;
        let mut fired = Vec::new();

        if !street_words.is_empty() {
            let hits = street_words
                .iter()
                .filter(|w| candidate.match_text.contains(*w))
                .count();
            if hits > 0 {
                score += (weights.street_overlap_max * hits as u32) / street_words.len() as u32;
                fired.push(format!("street words {hits}/{}", street_words.len()));
            }
        }

        if !postal_core.is_empty() {
            // Digit cores on both sides, so "B8000" and "8000" compare equal.
            if candidate.postal_codes.iter().any(|c| *c == postal_core) {
                score += weights.postal_exact;
                fired.push(format!("postal code {postal_core}"));
            } else if postal_core.len() > 4
                && candidate
                    .postal_codes
                    .iter()
                    .any(|c| c.starts_with(&postal_core[..4]))
            {
                score += weights.postal_prefix;
                fired.push(format!("postal prefix {}", &postal_core[..4]));
            }
        }

        if !province.is_empty() && candidate.norm_province == province {
            score += weights.province;
            fired.push(format!("province {province}"));
        }

        if !locality.is_empty() {
            if candidate.norm_locality == locality
                || candidate.norm_locality.contains(&locality)
                || locality.contains(&candidate.norm_locality)
            {
                score += weights.locality;
                fired.push(format!("locality {locality}"));
            }
            if candidate
                .norm_name
                .to_ascii_uppercase()
                .contains(&locality)
            {
                score += weights.locality_in_name;
                fired.push("locality in branch name".to_string());
            }
        }

        let better = match &best {
            Some(b) => score > b.score,
            None => score > 0,
        };
        if better {
            best = Some(Scored {
                candidate,
                score,
                fired,
            });
        }
    }

    if let Some(best) = best {
        if best.score >= weights.keep_threshold {
            return Some(build(order, best.candidate, best.score, best.fired.join(", ")));
        }
    }

    // Low-confidence fallback: any branch in the declared province.
    if !province.is_empty() {
        if let Some(candidate) = catalog.ordinary().find(|b| b.norm_province == province) {
            return Some(build(
                order,
                candidate,
                weights.province_fallback,
                format!("low confidence: same province {province}"),
            ));
        }
    }

    // Last resort: the head of the catalog, flagged for manual review.
    catalog.ordinary().next().map(|candidate| {
        build(
            order,
            candidate,
            weights.manual_review,
            "requires manual review: no rubric term fired".to_string(),
        )
    })
}

fn build(order: &Order, candidate: &IndexedBranch, score: u32, reason: String) -> Suggestion {
    Suggestion {
        order_id: order.id.clone(),
        branch: candidate.branch.clone(),
        reason,
        score,
        decision: Decision::Pending,
    }
}
