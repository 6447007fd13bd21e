//! # Trading Parties
//!
//! The two sides of every order: the brand placing it and the supplier
//! (facção) sewing it.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Party {
    /// Demand side: the apparel brand.
    Brand,
    /// Supply side: the garment manufacturer.
    Supplier,
}

impl Party {
    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brand => "BRAND",
            Self::Supplier => "SUPPLIER",
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Party {
    type Err = ValidationError;

    /// Case-insensitive; accepts the Portuguese `marca`/`faccao` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brand" | "marca" => Ok(Self::Brand),
            "supplier" | "faccao" => Ok(Self::Supplier),
            _ => Err(ValidationError::UnknownParty(s.to_string())),
        }
    }
}
