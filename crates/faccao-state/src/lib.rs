//! # faccao-state
//!
//! The order lifecycle between a fashion brand and a sewing supplier.
//!
//! - [`status`]: the twelve lifecycle statuses.
//! - [`table`]: the declarative transition table, waiting labels and
//!   derived actions.
//! - [`policy`]: evaluation (what can happen next, who we are waiting on)
//!   and authorization of requested moves.
//! - [`order`]: the order aggregate with its transition log.
//! - [`review`]: the quality-review record submitted with a batch.
//! - [`rework`]: derivation of child orders for rejected pieces.
//!
//! Statuses only move forward. Rework never rewinds a parent order; it opens
//! a new one.

pub mod error;
pub mod order;
pub mod policy;
pub mod review;
pub mod rework;
pub mod status;
pub mod table;

pub use error::{ReviewError, TransitionError};
pub use order::{Order, OrderDraft, OrderTransitionRecord};
pub use policy::{
    AvailableTransition, DerivedAction, TransitionPolicy, TransitionRequest, TransitionResponse,
};
pub use review::QualityReview;
pub use rework::{derive_rework, reserve_rework};
pub use status::OrderStatus;
pub use table::{Actor, DerivedActionKind, DerivedActionRule, TransitionRule};
