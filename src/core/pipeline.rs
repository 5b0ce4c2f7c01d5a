//! End-to-end run orchestration: ingest, resolve, pause for review, then
//! serialize. The review gate is structural: output can only be produced
//! from a [`RunState`] whose queue has no pending suggestion.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::catalog::{province_code, BranchCatalog, PostalIndex};
use crate::domain::model::{
    drop_reason, Decision, Destination, Order, OutputRecord, PackageSpec, ProcessingReport,
    ResolutionResult, ShippingMode,
};
use crate::domain::ports::CatalogSource;
use crate::ingest;
use crate::output::CarrierSerializer;
use crate::resolve::{BranchResolution, ExceptionTable, Resolver, SuggestionWeights};
use crate::review::ReviewQueue;
use crate::utils::error::{LabelError, Result};
use crate::utils::normalize::{normalize_upper, postal_digits};

pub struct LabelPipeline {
    postal: PostalIndex,
    catalog: BranchCatalog,
    weights: SuggestionWeights,
    exceptions: ExceptionTable,
    package: PackageSpec,
}

impl LabelPipeline {
    pub fn from_source(
        source: &dyn CatalogSource,
        weights: SuggestionWeights,
        exceptions: ExceptionTable,
        package: PackageSpec,
    ) -> Result<Self> {
        let postal = PostalIndex::from_entries(source.postal_entries()?);
        let catalog = BranchCatalog::from_branches(source.branches()?);
        info!(
            postal_entries = postal.len(),
            branches = catalog.len(),
            "catalogs loaded"
        );
        Ok(Self {
            postal,
            catalog,
            weights,
            exceptions,
            package,
        })
    }

    /// Ingests one export and resolves every order. The returned state holds
    /// the review queue; call [`RunState::finish`] once it is complete.
    pub fn run(&self, text: &str) -> Result<RunState> {
        let ingested = ingest::ingest(text)?;
        let total_ingested = ingested.total_ingested();
        let resolver = Resolver::new(&self.catalog, &self.weights, &self.exceptions);

        let mut resolved: Vec<(Order, Destination)> = Vec::new();
        let mut suggested: HashMap<String, Order> = HashMap::new();
        let mut suggestions = Vec::new();
        let mut drops = ingested.drops.clone();

        for order in ingested.orders {
            match self.classify(&resolver, &order) {
                ResolutionResult::Resolved(destination) => resolved.push((order, destination)),
                ResolutionResult::Suggested(suggestion) => {
                    suggested.insert(order.id.clone(), order);
                    suggestions.push(suggestion);
                }
                ResolutionResult::Dropped(reason) => drops.push((order.id, reason)),
            }
        }

        info!(
            total = total_ingested,
            resolved = resolved.len(),
            suggested = suggestions.len(),
            dropped = drops.len(),
            "resolution finished"
        );
        Ok(RunState {
            package: self.package.clone(),
            total_ingested,
            skipped_rows: ingested.skipped_rows,
            auto_filled: ingested.autofilled,
            resolved,
            suggested,
            review: ReviewQueue::new(suggestions),
            drops,
        })
    }

    /// The per-order outcome: a destination, a pending suggestion, or a
    /// reasoned drop.
    fn classify(&self, resolver: &Resolver<'_>, order: &Order) -> ResolutionResult {
        match order.shipping_mode() {
            ShippingMode::Unknown => {
                ResolutionResult::Dropped(drop_reason::UNRECOGNIZED_SHIPPING.into())
            }
            ShippingMode::HomeDelivery => match self.home_destination(order) {
                Ok(destination) => ResolutionResult::Resolved(destination),
                Err(reason) => ResolutionResult::Dropped(reason),
            },
            ShippingMode::PickupBranch => match resolver.resolve(order) {
                BranchResolution::Matched(branch) => match province_code(&branch.province) {
                    Some(code) => ResolutionResult::Resolved(Destination::PickupBranch {
                        branch,
                        province_code: code,
                    }),
                    None => {
                        warn!(order_id = %order.id, province = %branch.province,
                              "matched branch has unmappable province");
                        ResolutionResult::Dropped(drop_reason::UNKNOWN_PROVINCE.into())
                    }
                },
                BranchResolution::Suggested(suggestion) => {
                    ResolutionResult::Suggested(suggestion)
                }
                BranchResolution::Unresolvable => {
                    ResolutionResult::Dropped(drop_reason::EMPTY_CATALOG.into())
                }
            },
        }
    }

    /// Region and province validation for home deliveries. The declared
    /// postal code wins; province + locality is the repair path.
    fn home_destination(&self, order: &Order) -> std::result::Result<Destination, String> {
        let code = province_code(&order.address.province)
            .ok_or_else(|| drop_reason::UNKNOWN_PROVINCE.to_string())?;

        let postal = postal_digits(&order.address.postal_code);
        let region = match self.postal.region(&postal) {
            Some(region) => region.to_string(),
            None => {
                let mut locality = normalize_upper(&order.address.locality);
                if locality.is_empty() {
                    locality = normalize_upper(&order.address.city);
                }
                // "CAPITAL" means the province's capital city.
                if locality == "CAPITAL" {
                    locality = normalize_upper(&order.address.province);
                }
                let (found_code, region) = self
                    .postal
                    .find_by_region(&order.address.province, &locality)
                    .ok_or_else(|| drop_reason::UNMAPPED_REGION.to_string())?;
                debug!(order_id = %order.id, declared = %order.address.postal_code,
                       repaired = %found_code, "postal code repaired from region");
                region.to_string()
            }
        };

        Ok(Destination::HomeDelivery {
            region,
            province_code: code,
        })
    }
}

/// A run paused at the review gate.
pub struct RunState {
    package: PackageSpec,
    total_ingested: usize,
    skipped_rows: usize,
    auto_filled: Vec<String>,
    resolved: Vec<(Order, Destination)>,
    suggested: HashMap<String, Order>,
    pub review: ReviewQueue,
    drops: Vec<(String, String)>,
}

/// Everything a completed run produces.
pub struct RunOutput {
    pub home: Vec<OutputRecord>,
    pub pickup: Vec<OutputRecord>,
    pub report: ProcessingReport,
}

impl RunState {
    /// Merges review decisions and serializes both record sets. Errors while
    /// any suggestion is still pending.
    pub fn finish(mut self) -> Result<RunOutput> {
        if !self.review.is_complete() {
            return Err(LabelError::review(format!(
                "{} suggestion(s) still pending review",
                self.review.list_pending().len()
            )));
        }

        let mut report = ProcessingReport::new();
        report.total_ingested = self.total_ingested;
        report.skipped_rows = self.skipped_rows;
        report.auto_filled = self.auto_filled.clone();
        report.resolved = self.resolved.len();

        let mut accepted: Vec<(Order, Destination)> = Vec::new();
        for suggestion in self.review.iter() {
            let Some(order) = self.suggested.remove(&suggestion.order_id) else {
                continue;
            };
            match suggestion.decision {
                Decision::Accepted => match province_code(&suggestion.branch.province) {
                    Some(code) => {
                        report.suggested_accepted += 1;
                        accepted.push((
                            order,
                            Destination::PickupBranch {
                                branch: suggestion.branch.clone(),
                                province_code: code,
                            },
                        ));
                    }
                    None => {
                        // Accepted but unserviceable; accounted as a drop.
                        self.drops
                            .push((order.id, drop_reason::UNKNOWN_PROVINCE.into()));
                    }
                },
                Decision::Rejected => {
                    report.suggested_rejected += 1;
                    report.manual_processing.push(order.id.clone());
                    self.drops
                        .push((order.id, drop_reason::SUGGESTION_REJECTED.into()));
                }
                // Unreachable after the completeness check; the reconcile
                // check below would catch a leak regardless.
                Decision::Pending => continue,
            }
        }

        // Rejected suggestions sit in both the suggested and dropped columns
        // of the ledger; the invariant counts them once, as suggested.
        report.dropped = self
            .drops
            .iter()
            .filter(|(_, reason)| reason.as_str() != drop_reason::SUGGESTION_REJECTED)
            .count();
        report.drop_reasons = self
            .drops
            .iter()
            .map(|(id, reason)| format!("{id}: {reason}"))
            .collect();

        let serializer = CarrierSerializer::new(self.package.clone());
        let mut home = Vec::new();
        let mut pickup = Vec::new();
        for (order, destination) in self.resolved.iter().chain(accepted.iter()) {
            let record = serializer.record(order, destination);
            match destination {
                Destination::HomeDelivery { .. } => home.push(record),
                Destination::PickupBranch { .. } => pickup.push(record),
            }
        }

        if !report.reconciles() {
            return Err(LabelError::processing(format!(
                "run does not reconcile: {} resolved + {} suggested + {} dropped != {} ingested",
                report.resolved,
                report.suggested_total(),
                report.dropped,
                report.total_ingested
            )));
        }

        info!(
            home = home.len(),
            pickup = pickup.len(),
            dropped = report.dropped,
            "run finished"
        );
        Ok(RunOutput {
            home,
            pickup,
            report,
        })
    }
}
