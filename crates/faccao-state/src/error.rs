//! # Transition Errors
//!
//! Rejections produced when a requested status change or derived action does
//! not satisfy the transition table. Each variant names the current status,
//! the attempted target and what was missing.

use thiserror::Error;

use crate::status::OrderStatus;
use crate::table::{Actor, DerivedActionKind};

/// Why a quality review was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// All three counts were zero.
    #[error("review must count at least one piece")]
    Empty,

    /// More pieces were reviewed than were ordered.
    #[error("review counts {counted} pieces but the order has {ordered}")]
    ExceedsQuantity {
        /// Sum of approved, rejected and second-quality pieces.
        counted: u64,
        /// Order quantity.
        ordered: u32,
    },
}

/// Errors raised when authorizing or applying an order transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is already finished.
    #[error("order is in terminal status {0}")]
    Terminal(OrderStatus),

    /// No rule exists for this edge.
    #[error("no transition from {from} to {to}")]
    NotAllowed {
        /// Current status.
        from: OrderStatus,
        /// Attempted target.
        to: OrderStatus,
    },

    /// The rule exists but belongs to the other side.
    #[error("{actor} cannot move an order from {from} to {to}; only {expected} can")]
    WrongActor {
        /// Current status.
        from: OrderStatus,
        /// Attempted target.
        to: OrderStatus,
        /// Who asked.
        actor: Actor,
        /// Who the rule names.
        expected: Actor,
    },

    /// The move must be explicitly confirmed.
    #[error("transition {from} -> {to} must be explicitly confirmed")]
    ConfirmationRequired {
        /// Current status.
        from: OrderStatus,
        /// Attempted target.
        to: OrderStatus,
    },

    /// The move needs a justification.
    #[error("transition {from} -> {to} requires notes")]
    NotesRequired {
        /// Current status.
        from: OrderStatus,
        /// Attempted target.
        to: OrderStatus,
    },

    /// The move needs a quality-review record.
    #[error("transition {from} -> {to} requires a quality review")]
    ReviewRequired {
        /// Current status.
        from: OrderStatus,
        /// Attempted target.
        to: OrderStatus,
    },

    /// The supplied quality review is inconsistent.
    #[error("invalid quality review: {0}")]
    InvalidReview(#[from] ReviewError),

    /// The caller expected a different current status (stale read).
    #[error("order status is {actual}, expected {expected}")]
    StaleStatus {
        /// Status the caller based its request on.
        expected: OrderStatus,
        /// Status actually stored.
        actual: OrderStatus,
    },

    /// The derived action is not offered from this status or to this actor.
    #[error("{kind:?} is not available to {actor} from {from}")]
    DerivedActionUnavailable {
        /// Current status.
        from: OrderStatus,
        /// Requested action.
        kind: DerivedActionKind,
        /// Who asked.
        actor: Actor,
    },

    /// The derived action needs a justification.
    #[error("{kind:?} requires notes")]
    DerivedActionNotesRequired {
        /// Requested action.
        kind: DerivedActionKind,
    },

    /// Rework quantity is zero or larger than what was rejected.
    #[error("rework quantity {requested} must be between 1 and {available}")]
    ReworkQuantity {
        /// Pieces asked for.
        requested: u32,
        /// Pieces eligible for rework.
        available: u32,
    },
}
