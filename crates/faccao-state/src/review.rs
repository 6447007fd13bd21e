//! # Quality Review
//!
//! The structured record a supplier submits with a finished batch. Counts
//! pieces in three buckets; second-quality pieces are sellable with defects.

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

/// Piece counts for a reviewed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReview {
    /// Pieces that passed inspection.
    pub approved: u32,
    /// Pieces that must be re-sewn or discarded.
    pub rejected: u32,
    /// Pieces with minor defects, sold at a discount.
    #[serde(default)]
    pub second_quality: u32,
    /// Inspector remarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl QualityReview {
    /// Total pieces counted.
    pub fn total(&self) -> u64 {
        u64::from(self.approved) + u64::from(self.rejected) + u64::from(self.second_quality)
    }

    /// Check the counts against the ordered quantity.
    ///
    /// # Errors
    ///
    /// [`ReviewError::Empty`] when nothing was counted,
    /// [`ReviewError::ExceedsQuantity`] when more was counted than ordered.
    pub fn validate(&self, ordered: u32) -> Result<(), ReviewError> {
        let counted = self.total();
        if counted == 0 {
            return Err(ReviewError::Empty);
        }
        if counted > u64::from(ordered) {
            return Err(ReviewError::ExceedsQuantity { counted, ordered });
        }
        Ok(())
    }
}
