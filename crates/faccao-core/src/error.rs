//! # Validation Errors
//!
//! Field-level error type built with `thiserror`. Variants carry the
//! offending input or field name.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// CNPJ is present but its length or check digits do not verify.
    ///
    /// The display text is user-facing: it is returned verbatim in the
    /// validation payload of the onboarding form.
    #[error("invalid document, verify the number")]
    InvalidCnpj(String),

    /// A party name did not match `brand` or `supplier`.
    #[error("unknown party: \"{0}\" (expected brand or supplier)")]
    UnknownParty(String),

    /// A required text field was empty.
    #[error("{field} must not be empty")]
    EmptyField {
        /// The field that was empty.
        field: &'static str,
    },

    /// A quantity or amount was zero.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// The field that was zero.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_cnpj_message_is_user_facing() {
        let err = ValidationError::InvalidCnpj("123".to_string());
        assert_eq!(err.to_string(), "invalid document, verify the number");
    }

    #[test]
    fn field_errors_name_the_field() {
        assert_eq!(
            ValidationError::EmptyField { field: "reference" }.to_string(),
            "reference must not be empty"
        );
        assert_eq!(
            ValidationError::NotPositive { field: "quantity" }.to_string(),
            "quantity must be greater than zero"
        );
    }

    #[test]
    fn unknown_party_names_input() {
        let err = ValidationError::UnknownParty("carrier".to_string());
        assert!(err.to_string().contains("carrier"));
    }
}
