//! # Order Status
//!
//! The lifecycle stages of a manufacturing order, in lifecycle order.
//!
//! ```text
//! CREATED ──▶ IN_NEGOTIATION ──▶ ACCEPTED ──▶ MATERIALS_IN_TRANSIT
//!    │  └───────────────────────▲                     │
//!    ▼                                                 ▼
//! DECLINED                                       IN_PRODUCTION
//!                                                      │
//!                                                      ▼
//! COMPLETED ◀── DELIVERED ◀── SHIPPED_TO_BRAND ◀── APPROVED ◀── QUALITY_REVIEW
//!
//! CANCELLED is reachable from CREATED, IN_NEGOTIATION, ACCEPTED and QUALITY_REVIEW.
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle stage of an order.
///
/// Declaration order is lifecycle order; [`OrderStatus::stage`] exposes it
/// so the transition table can be checked for backward edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Launched by the brand, awaiting the supplier's answer.
    Created,
    /// Supplier sent a counter-proposal on price or deadline.
    InNegotiation,
    /// Supplier accepted the order.
    Accepted,
    /// Brand shipped cut fabric and trims to the supplier.
    MaterialsInTransit,
    /// Supplier is sewing.
    InProduction,
    /// Batch finished and submitted with a quality-review record.
    QualityReview,
    /// Brand approved the batch.
    Approved,
    /// Finished goods on the way to the brand.
    ShippedToBrand,
    /// Goods received, awaiting automatic settlement.
    Delivered,
    /// Settled and closed. Terminal.
    Completed,
    /// Supplier refused the order. Terminal.
    Declined,
    /// Called off by the brand. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Every status in lifecycle order.
    pub const ALL: [OrderStatus; 12] = [
        Self::Created,
        Self::InNegotiation,
        Self::Accepted,
        Self::MaterialsInTransit,
        Self::InProduction,
        Self::QualityReview,
        Self::Approved,
        Self::ShippedToBrand,
        Self::Delivered,
        Self::Completed,
        Self::Declined,
        Self::Cancelled,
    ];

    /// The canonical persisted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::InNegotiation => "IN_NEGOTIATION",
            Self::Accepted => "ACCEPTED",
            Self::MaterialsInTransit => "MATERIALS_IN_TRANSIT",
            Self::InProduction => "IN_PRODUCTION",
            Self::QualityReview => "QUALITY_REVIEW",
            Self::Approved => "APPROVED",
            Self::ShippedToBrand => "SHIPPED_TO_BRAND",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Declined => "DECLINED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a persisted name. Returns `None` for anything unrecognized.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == name)
    }

    /// Position in the lifecycle, starting at 1.
    pub fn stage(&self) -> u8 {
        *self as u8 + 1
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Declined | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for s in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_name(s.as_str()), Some(s));
        }
        assert_eq!(OrderStatus::from_name("PRODUCING"), None);
        assert_eq!(OrderStatus::from_name("created"), None);
    }

    #[test]
    fn serde_matches_as_str() {
        for s in OrderStatus::ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
        }
    }

    #[test]
    fn stages_follow_declaration_order() {
        assert_eq!(OrderStatus::Created.stage(), 1);
        assert_eq!(OrderStatus::Cancelled.stage(), 12);
        assert!(OrderStatus::InProduction < OrderStatus::QualityReview);
    }

    #[test]
    fn terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![OrderStatus::Completed, OrderStatus::Declined, OrderStatus::Cancelled]
        );
    }
}
