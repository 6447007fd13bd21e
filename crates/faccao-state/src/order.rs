//! # Order Aggregate
//!
//! An order with its status and transition log. Status only changes through
//! [`Order::transition`], which defers every decision to the
//! [`TransitionPolicy`].

use chrono::{DateTime, Utc};
use faccao_core::{CompanyId, OrderId, Party, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::policy::{TransitionPolicy, TransitionRequest};
use crate::review::QualityReview;
use crate::status::OrderStatus;
use crate::table::Actor;

/// Everything needed to open an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// The brand placing the order.
    pub brand_id: CompanyId,
    /// The supplier asked to sew it.
    pub supplier_id: CompanyId,
    /// Brand-side reference (style code, collection).
    pub reference: String,
    /// Number of pieces.
    pub quantity: u32,
    /// Price per piece, in centavos.
    pub unit_price_cents: u64,
    /// Set when this order reworks pieces rejected on another order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_order_id: Option<OrderId>,
    /// Free text shown to the supplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderDraft {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyField`] for a blank reference,
    /// [`ValidationError::NotPositive`] for a zero quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reference.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "reference" });
        }
        if self.quantity == 0 {
            return Err(ValidationError::NotPositive { field: "quantity" });
        }
        Ok(())
    }
}

/// One applied status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransitionRecord {
    /// Status before.
    pub from: OrderStatus,
    /// Status after.
    pub to: OrderStatus,
    /// Who moved it.
    pub actor: Actor,
    /// Justification, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When it happened.
    pub at: DateTime<Utc>,
}

/// A manufacturing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// The brand placing the order.
    pub brand_id: CompanyId,
    /// The supplier sewing it.
    pub supplier_id: CompanyId,
    /// Brand-side reference.
    pub reference: String,
    /// Number of pieces.
    pub quantity: u32,
    /// Price per piece, in centavos.
    pub unit_price_cents: u64,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// The order this one reworks, if any.
    pub parent_order_id: Option<OrderId>,
    /// Free text from the draft.
    pub notes: Option<String>,
    /// Quality review submitted with the batch.
    pub review: Option<QualityReview>,
    /// Pieces already handed to rework child orders.
    #[serde(default)]
    pub reworked_quantity: u32,
    /// When the order was opened.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
    /// Ordered log of status changes.
    pub transitions: Vec<OrderTransitionRecord>,
}

impl Order {
    /// Open an order in [`OrderStatus::Created`].
    ///
    /// # Errors
    ///
    /// Whatever [`OrderDraft::validate`] rejects.
    pub fn open(draft: OrderDraft) -> Result<Self, ValidationError> {
        draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            brand_id: draft.brand_id,
            supplier_id: draft.supplier_id,
            reference: draft.reference,
            quantity: draft.quantity,
            unit_price_cents: draft.unit_price_cents,
            status: OrderStatus::Created,
            parent_order_id: draft.parent_order_id,
            notes: draft.notes,
            review: None,
            reworked_quantity: 0,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        })
    }

    /// Which side of this order `company` is on.
    pub fn party_of(&self, company: CompanyId) -> Option<Party> {
        if company == self.brand_id {
            Some(Party::Brand)
        } else if company == self.supplier_id {
            Some(Party::Supplier)
        } else {
            None
        }
    }

    /// Total order value in centavos.
    pub fn total_cents(&self) -> u64 {
        u64::from(self.quantity).saturating_mul(self.unit_price_cents)
    }

    /// Move the order to `target`.
    ///
    /// The policy authorizes the edge; a review carried by a rule that
    /// requires one is validated against the order quantity and stored.
    ///
    /// # Errors
    ///
    /// Any [`TransitionError`] from the policy, or
    /// [`TransitionError::InvalidReview`].
    pub fn transition(
        &mut self,
        policy: &TransitionPolicy,
        target: OrderStatus,
        actor: Actor,
        request: TransitionRequest,
    ) -> Result<OrderTransitionRecord, TransitionError> {
        let rule = policy.authorize(self.status, target, actor, &request)?;
        if rule.requires_review {
            if let Some(review) = &request.review {
                review.validate(self.quantity)?;
            }
            self.review = request.review;
        }

        let now = Utc::now();
        let record = OrderTransitionRecord {
            from: self.status,
            to: target,
            actor,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            at: now,
        };
        tracing::info!(
            order_id = %self.id,
            from = %record.from,
            to = %record.to,
            actor = %actor,
            "order transitioned"
        );
        self.transitions.push(record.clone());
        self.status = target;
        self.updated_at = now;
        Ok(record)
    }

    /// Like [`Order::transition`], but first checks that the order is still
    /// in `expected`. Callers holding a lock over the order use this as a
    /// compare-and-set against stale reads.
    ///
    /// # Errors
    ///
    /// [`TransitionError::StaleStatus`] when the status moved on, otherwise
    /// as [`Order::transition`].
    pub fn transition_from(
        &mut self,
        policy: &TransitionPolicy,
        expected: OrderStatus,
        target: OrderStatus,
        actor: Actor,
        request: TransitionRequest,
    ) -> Result<OrderTransitionRecord, TransitionError> {
        if self.status != expected {
            return Err(TransitionError::StaleStatus {
                expected,
                actual: self.status,
            });
        }
        self.transition(policy, target, actor, request)
    }
}
