//! Suggestion review: the only stateful, human-gated step in the pipeline.
//! Each suggestion moves `pending -> accepted | rejected` exactly once;
//! output serialization is blocked until nothing is pending.

use tracing::info;

use crate::domain::model::{Decision, Suggestion};
use crate::utils::error::{LabelError, Result};

#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    items: Vec<Suggestion>,
}

impl ReviewQueue {
    pub fn new(items: Vec<Suggestion>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn list_pending(&self) -> Vec<&Suggestion> {
        self.items
            .iter()
            .filter(|s| s.decision == Decision::Pending)
            .collect()
    }

    /// Records a terminal decision for one order. Unknown order ids and
    /// already-decided suggestions are errors so nothing double-counts.
    pub fn decide(&mut self, order_id: &str, decision: Decision) -> Result<()> {
        if decision == Decision::Pending {
            return Err(LabelError::review("a decision cannot be pending"));
        }
        let item = self
            .items
            .iter_mut()
            .find(|s| s.order_id == order_id)
            .ok_or_else(|| {
                LabelError::review(format!("no suggestion for order {order_id}"))
            })?;
        if item.decision != Decision::Pending {
            return Err(LabelError::review(format!(
                "suggestion for order {order_id} already decided"
            )));
        }
        item.decision = decision;
        info!(order_id = %order_id, ?decision, "suggestion decided");
        Ok(())
    }

    /// Applies one decision to everything still pending.
    pub fn decide_all(&mut self, decision: Decision) -> Result<()> {
        let pending: Vec<String> = self
            .list_pending()
            .iter()
            .map(|s| s.order_id.clone())
            .collect();
        for order_id in pending {
            self.decide(&order_id, decision)?;
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|s| s.decision != Decision::Pending)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.items.iter()
    }

    pub fn into_decisions(self) -> Vec<Suggestion> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Branch, Decision};

    fn suggestion(order_id: &str) -> Suggestion {
        Suggestion {
            order_id: order_id.into(),
            branch: Branch::new("BAHIA BLANCA", "Balcarce 333", "Buenos Aires", "Bahía Blanca"),
            reason: "postal code 8000".into(),
            score: 25,
            decision: Decision::Pending,
        }
    }

    #[test]
    fn test_accept_moves_out_of_pending_once() {
        let mut queue = ReviewQueue::new(vec![suggestion("5001"), suggestion("5002")]);
        assert_eq!(queue.list_pending().len(), 2);
        assert!(!queue.is_complete());

        queue.decide("5001", Decision::Accepted).unwrap();
        assert_eq!(queue.list_pending().len(), 1);

        // Re-deciding must fail, whatever the new decision is.
        assert!(queue.decide("5001", Decision::Accepted).is_err());
        assert!(queue.decide("5001", Decision::Rejected).is_err());
        assert_eq!(queue.list_pending().len(), 1);
    }

    #[test]
    fn test_unknown_order_is_an_error() {
        let mut queue = ReviewQueue::new(vec![suggestion("5001")]);
        assert!(queue.decide("9999", Decision::Accepted).is_err());
    }

    #[test]
    fn test_pending_is_not_a_decision() {
        let mut queue = ReviewQueue::new(vec![suggestion("5001")]);
        assert!(queue.decide("5001", Decision::Pending).is_err());
    }

    #[test]
    fn test_decide_all_completes_the_queue() {
        let mut queue = ReviewQueue::new(vec![suggestion("5001"), suggestion("5002")]);
        queue.decide("5001", Decision::Rejected).unwrap();
        queue.decide_all(Decision::Accepted).unwrap();
        assert!(queue.is_complete());

        let decisions = queue.into_decisions();
        assert_eq!(decisions[0].decision, Decision::Rejected);
        assert_eq!(decisions[1].decision, Decision::Accepted);
    }

    #[test]
    fn test_empty_queue_is_complete() {
        assert!(ReviewQueue::default().is_complete());
    }
}
