//! # faccao-core - Foundational Types
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on: the CNPJ document validator, identifier newtypes, the two
//! trading parties, and field validation errors.
//!
//! ## Key Design Principles
//!
//! 1. **Validated newtypes.** [`Cnpj`] can only be constructed from a number
//!    whose check digits verify. `CompanyId` and `OrderId` are distinct UUID
//!    wrappers so one cannot be passed where the other is expected.
//!
//! 2. **The raw validator never fails loudly.** [`cnpj::is_valid`] returns a
//!    boolean for any input. Only the field-validation layer
//!    ([`cnpj::validate_optional`], [`Cnpj::new`]) turns a failed check into a
//!    [`ValidationError`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `faccao-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod cnpj;
pub mod error;
pub mod identity;
pub mod party;

pub use cnpj::Cnpj;
pub use error::ValidationError;
pub use identity::{CompanyId, OrderId};
pub use party::Party;
