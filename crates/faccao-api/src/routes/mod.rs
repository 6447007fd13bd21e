//! # API Route Modules
//!
//! - `companies` - brand and supplier onboarding with CNPJ validation.
//! - `documents` - stateless CNPJ check for form feedback.
//! - `orders` - order lifecycle: creation, transition evaluation, status
//!   changes and rework derivation.

pub mod companies;
pub mod documents;
pub mod orders;
