//! # Transition Table
//!
//! The single source of truth for legal order status changes. Each entry is
//! a declarative struct literal; adding a status means adding rows here, not
//! adding branches to the evaluator.
//!
//! ## Invariants
//!
//! - Every rule moves strictly forward in lifecycle order (the graph is a DAG).
//! - Terminal statuses have no outgoing rules.
//! - All forward (non-cancelling) rules out of a status share one initiator,
//!   which is who the order is waiting on.
//! - Rework is not an edge: it derives a new order and lives in
//!   [`DERIVED_ACTIONS`].

use faccao_core::Party;
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus::{
    self, Accepted, Approved, Cancelled, Completed, Created, Declined, Delivered, InNegotiation,
    InProduction, MaterialsInTransit, QualityReview, ShippedToBrand,
};

/// Who performs a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    /// A user of the brand company.
    Brand,
    /// A user of the supplier company.
    Supplier,
    /// An automatic process (settlement, scheduled closure).
    System,
}

impl Actor {
    /// The party behind this actor, `None` for [`Actor::System`].
    pub fn party(&self) -> Option<Party> {
        match self {
            Self::Brand => Some(Party::Brand),
            Self::Supplier => Some(Party::Supplier),
            Self::System => None,
        }
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brand => "BRAND",
            Self::Supplier => "SUPPLIER",
            Self::System => "SYSTEM",
        }
    }
}

impl From<Party> for Actor {
    fn from(party: Party) -> Self {
        match party {
            Party::Brand => Self::Brand,
            Party::Supplier => Self::Supplier,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One legal edge of the order lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionRule {
    /// Status the order must currently be in.
    pub from: OrderStatus,
    /// Destination status.
    pub to: OrderStatus,
    /// Who may trigger the move.
    pub initiated_by: Actor,
    /// The actor must explicitly confirm; never inferred.
    pub requires_confirmation: bool,
    /// A free-text justification must accompany the move.
    pub requires_notes: bool,
    /// A quality-review record must be supplied with the move.
    pub requires_review: bool,
    /// Button text.
    pub label: &'static str,
    /// Longer explanation shown next to the button.
    pub description: &'static str,
}

impl TransitionRule {
    const fn edge(
        from: OrderStatus,
        to: OrderStatus,
        initiated_by: Actor,
        label: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            from,
            to,
            initiated_by,
            requires_confirmation: false,
            requires_notes: false,
            requires_review: false,
            label,
            description,
        }
    }

    const fn confirmed(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    const fn with_notes(mut self) -> Self {
        self.requires_notes = true;
        self
    }

    const fn with_review(mut self) -> Self {
        self.requires_review = true;
        self
    }

    /// Whether this edge ends the order without finishing it.
    pub fn is_cancellation(&self) -> bool {
        self.to == OrderStatus::Cancelled
    }
}

/// Every legal status transition, grouped by source status in lifecycle order.
pub static TRANSITION_TABLE: &[TransitionRule] = &[
    // ── CREATED ─────────────────────────────────────────────────────
    TransitionRule::edge(
        Created,
        Accepted,
        Actor::Supplier,
        "Accept order",
        "Accept the price, quantity and deadline proposed by the brand.",
    )
    .confirmed(),
    TransitionRule::edge(
        Created,
        InNegotiation,
        Actor::Supplier,
        "Propose changes",
        "Send a counter-proposal; describe the requested changes in the notes.",
    )
    .with_notes(),
    TransitionRule::edge(
        Created,
        Declined,
        Actor::Supplier,
        "Decline order",
        "Refuse the order; the brand is told why.",
    )
    .confirmed().with_notes(),
    TransitionRule::edge(
        Created,
        Cancelled,
        Actor::Brand,
        "Cancel order",
        "Withdraw the order before the supplier answers.",
    )
    .confirmed().with_notes(),
    // ── IN_NEGOTIATION ──────────────────────────────────────────────
    TransitionRule::edge(
        InNegotiation,
        Accepted,
        Actor::Brand,
        "Accept proposal",
        "Accept the supplier's counter-proposal.",
    )
    .confirmed(),
    TransitionRule::edge(
        InNegotiation,
        Cancelled,
        Actor::Brand,
        "Cancel order",
        "Reject the counter-proposal and withdraw the order.",
    )
    .confirmed().with_notes(),
    // ── ACCEPTED ────────────────────────────────────────────────────
    TransitionRule::edge(
        Accepted,
        MaterialsInTransit,
        Actor::Brand,
        "Ship materials",
        "Send cut fabric and trims to the supplier.",
    )
    .confirmed(),
    TransitionRule::edge(
        Accepted,
        Cancelled,
        Actor::Brand,
        "Cancel order",
        "Withdraw the order before materials are shipped.",
    )
    .confirmed().with_notes(),
    // ── MATERIALS_IN_TRANSIT ────────────────────────────────────────
    TransitionRule::edge(
        MaterialsInTransit,
        InProduction,
        Actor::Supplier,
        "Start production",
        "Confirm receipt of the materials and start sewing.",
    )
    .confirmed(),
    // ── IN_PRODUCTION ───────────────────────────────────────────────
    TransitionRule::edge(
        InProduction,
        QualityReview,
        Actor::Supplier,
        "Submit for review",
        "Submit the finished batch with approved, rejected and second-quality counts.",
    )
    .confirmed().with_review(),
    // ── QUALITY_REVIEW ──────────────────────────────────────────────
    TransitionRule::edge(
        QualityReview,
        Approved,
        Actor::Brand,
        "Approve batch",
        "Accept the reviewed batch for dispatch.",
    )
    .confirmed(),
    TransitionRule::edge(
        QualityReview,
        Cancelled,
        Actor::Brand,
        "Cancel order",
        "Reject the batch outright and close the order.",
    )
    .confirmed().with_notes(),
    // ── APPROVED ────────────────────────────────────────────────────
    TransitionRule::edge(
        Approved,
        ShippedToBrand,
        Actor::Supplier,
        "Dispatch goods",
        "Send the finished goods to the brand.",
    )
    .confirmed(),
    // ── SHIPPED_TO_BRAND ────────────────────────────────────────────
    TransitionRule::edge(
        ShippedToBrand,
        Delivered,
        Actor::Brand,
        "Confirm delivery",
        "Confirm the finished goods arrived.",
    )
    .confirmed(),
    // ── DELIVERED ───────────────────────────────────────────────────
    TransitionRule::edge(
        Delivered,
        Completed,
        Actor::System,
        "Settle",
        "Close the order once settlement is recorded.",
    ),
];

/// What the order is waiting on, per status.
pub static WAITING_LABELS: &[(OrderStatus, &str)] = &[
    (Created, "awaiting supplier response"),
    (InNegotiation, "awaiting brand decision on the counter-proposal"),
    (Accepted, "awaiting brand to ship materials"),
    (MaterialsInTransit, "awaiting supplier confirmation of material receipt"),
    (InProduction, "awaiting supplier to submit the batch for quality review"),
    (QualityReview, "awaiting brand quality approval"),
    (Approved, "awaiting supplier dispatch"),
    (ShippedToBrand, "awaiting brand delivery confirmation"),
    (Delivered, "awaiting automatic settlement"),
    (Completed, "order completed"),
    (Declined, "order declined by the supplier"),
    (Cancelled, "order cancelled"),
];

/// Kind of entity a derived action creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DerivedActionKind {
    /// A child order re-sewing rejected pieces.
    ReworkOrder,
}

/// An action that creates a new linked order instead of moving this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedActionRule {
    /// Status the parent order must be in.
    pub from: OrderStatus,
    /// What gets created.
    pub kind: DerivedActionKind,
    /// Who may trigger it.
    pub initiated_by: Actor,
    /// A free-text justification is mandatory.
    pub requires_notes: bool,
    /// Button text.
    pub label: &'static str,
    /// Longer explanation.
    pub description: &'static str,
}

/// Entity-creating actions, kept apart from status edges.
pub static DERIVED_ACTIONS: &[DerivedActionRule] = &[DerivedActionRule {
    from: QualityReview,
    kind: DerivedActionKind::ReworkOrder,
    initiated_by: Actor::Brand,
    requires_notes: true,
    label: "Request rework",
    description: "Open a linked child order for the rejected pieces; this order keeps its status.",
}];
