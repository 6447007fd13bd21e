//! # CNPJ Document Validator
//!
//! Validates the Brazilian national registry number for legal entities.
//! A CNPJ has 14 digits: an 8-digit root, a 4-digit establishment order and
//! two trailing check digits computed with a modulo-11 scheme.
//!
//! ## Algorithm
//!
//! ```text
//! digits  d0 .. d11 | d12 | d13
//! DV1 = rule(sum(d0..d11  * [5,4,3,2,9,8,7,6,5,4,3,2]))
//! DV2 = rule(sum(d0..d12  * [6,5,4,3,2,9,8,7,6,5,4,3,2]))
//! rule(s) = if s % 11 < 2 { 0 } else { 11 - s % 11 }
//! ```
//!
//! Input may carry any punctuation (`11.222.333/0001-81`); every non-digit
//! character is discarded before the checks run. A number made of one
//! repeated digit satisfies the checksum for some digits but is a known
//! placeholder, so it is rejected explicitly.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of digits in a normalized CNPJ.
pub const CNPJ_LENGTH: usize = 14;

/// Number of digits that precede the check digits.
pub const BASE_LENGTH: usize = 12;

const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip everything except ASCII digits.
pub fn normalize(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

fn digits(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Whether `input` is a structurally valid CNPJ.
///
/// Never panics and never errors: malformed input of any shape is simply
/// `false`.
pub fn is_valid(input: &str) -> bool {
    let d = digits(input);
    if d.len() != CNPJ_LENGTH {
        return false;
    }
    if d.iter().all(|x| *x == d[0]) {
        return false;
    }
    if check_digit(&d[..12], &FIRST_WEIGHTS) != d[12] {
        return false;
    }
    check_digit(&d[..13], &SECOND_WEIGHTS) == d[13]
}

/// Compute both check digits for a 12-digit base (root + establishment).
///
/// Returns `None` when the base does not normalize to exactly 12 digits.
pub fn check_digits(base: &str) -> Option<[u8; 2]> {
    let mut d = digits(base);
    if d.len() != BASE_LENGTH {
        return None;
    }
    let first = check_digit(&d, &FIRST_WEIGHTS);
    d.push(first);
    let second = check_digit(&d, &SECOND_WEIGHTS);
    // Both values are in 0..=9 by construction of the remainder rule.
    Some([first as u8, second as u8])
}

/// Field-level validator with optional-field semantics.
///
/// An absent, empty or whitespace-only value passes: required-ness is the
/// job of a separate non-null check. A present value must pass
/// [`is_valid`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCnpj`] for a present value that fails.
pub fn validate_optional(value: Option<&str>) -> Result<(), ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(()),
        Some(v) if is_valid(v) => Ok(()),
        Some(v) => Err(ValidationError::InvalidCnpj(v.to_string())),
    }
}

/// A CNPJ whose check digits have been verified.
///
/// Stored in canonical 14-digit form. Accepts both `"11222333000181"` and
/// `"11.222.333/0001-81"` at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cnpj(String);

impl<'de> Deserialize<'de> for Cnpj {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl Cnpj {
    /// Create a CNPJ, validating length, placeholder digits and check digits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCnpj`] if the number does not verify.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        if !is_valid(&raw) {
            return Err(ValidationError::InvalidCnpj(raw));
        }
        Ok(Self(normalize(&raw)))
    }

    /// The canonical 14-digit form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 8-digit root shared by every establishment of the company.
    pub fn root(&self) -> &str {
        &self.0[..8]
    }

    /// The 4-digit establishment order (`0001` is the head office).
    pub fn branch(&self) -> &str {
        &self.0[8..12]
    }

    /// Whether this number identifies the head office.
    pub fn is_head_office(&self) -> bool {
        self.branch() == "0001"
    }

    /// Render as `XX.XXX.XXX/XXXX-XX`.
    pub fn formatted(&self) -> String {
        format!(
            "{}.{}.{}/{}-{}",
            &self.0[..2],
            &self.0[2..5],
            &self.0[5..8],
            &self.0[8..12],
            &self.0[12..]
        )
    }
}

impl std::fmt::Display for Cnpj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl std::str::FromStr for Cnpj {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GOLDEN: &str = "11.222.333/0001-81";
    const GOLDEN_DIGITS: &str = "11222333000181";
    const SECOND_FIXTURE: &str = "11.444.777/0001-61";

    #[test]
    fn golden_fixture_is_valid() {
        assert!(is_valid(GOLDEN));
        assert!(is_valid(GOLDEN_DIGITS));
        assert!(is_valid(SECOND_FIXTURE));
    }

    #[test]
    fn flipping_first_check_digit_fails() {
        assert!(!is_valid("11222333000191"));
        assert!(!is_valid("11.222.333/0001-01"));
    }

    #[test]
    fn flipping_second_check_digit_fails() {
        assert!(!is_valid("11222333000182"));
        assert!(!is_valid("11.222.333/0001-80"));
    }

    #[test]
    fn repeated_digits_are_rejected() {
        for d in 0..=9 {
            let s = d.to_string().repeat(CNPJ_LENGTH);
            assert!(!is_valid(&s), "{s} should be rejected");
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(!is_valid(""));
        assert!(!is_valid("1122233300018"));
        assert!(!is_valid("112223330001811"));
        assert!(!is_valid("abc"));
    }

    #[test]
    fn letters_are_stripped_not_counted() {
        assert!(is_valid("CNPJ 11.222.333/0001-81"));
    }

    #[test]
    fn non_ascii_digits_are_not_digits() {
        // Arabic-Indic digits must not count towards the length.
        assert!(!is_valid("١١٢٢٢٣٣٣٠٠٠١٨١"));
    }

    #[test]
    fn check_digits_match_golden() {
        assert_eq!(check_digits("112223330001"), Some([8, 1]));
        assert_eq!(check_digits("11.444.777/0001"), Some([6, 1]));
    }

    #[test]
    fn check_digits_rejects_wrong_base_length() {
        assert_eq!(check_digits("11222333000"), None);
        assert_eq!(check_digits("1122233300018"), None);
    }

    #[test]
    fn optional_absent_or_blank_passes() {
        assert!(validate_optional(None).is_ok());
        assert!(validate_optional(Some("")).is_ok());
        assert!(validate_optional(Some("   ")).is_ok());
    }

    #[test]
    fn optional_present_must_verify() {
        assert!(validate_optional(Some(GOLDEN)).is_ok());
        let err = validate_optional(Some("11.222.333/0001-82")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidCnpj("11.222.333/0001-82".to_string()));
        assert_eq!(err.to_string(), "invalid document, verify the number");
    }

    #[test]
    fn newtype_stores_canonical_form() {
        let cnpj = Cnpj::new(GOLDEN).unwrap();
        assert_eq!(cnpj.as_str(), GOLDEN_DIGITS);
        assert_eq!(cnpj.formatted(), GOLDEN);
        assert_eq!(cnpj.to_string(), GOLDEN);
        assert_eq!(cnpj.root(), "11222333");
        assert_eq!(cnpj.branch(), "0001");
        assert!(cnpj.is_head_office());
    }

    #[test]
    fn newtype_rejects_invalid() {
        assert!(Cnpj::new("11111111111111").is_err());
        assert!("11222333000182".parse::<Cnpj>().is_err());
    }

    #[test]
    fn serde_rejects_invalid_at_boundary() {
        let ok: Cnpj = serde_json::from_str(&format!("\"{GOLDEN}\"")).unwrap();
        assert_eq!(serde_json::to_string(&ok).unwrap(), format!("\"{GOLDEN_DIGITS}\""));
        let bad: Result<Cnpj, _> = serde_json::from_str("\"00000000000000\"");
        assert!(bad.is_err());
    }

    fn with_check_digits(base: &str) -> String {
        let [a, b] = check_digits(base).unwrap();
        format!("{base}{a}{b}")
    }

    proptest! {
        /// A base completed with its computed check digits always verifies,
        /// except for the single-repeated-digit placeholders.
        #[test]
        fn computed_check_digits_verify(base in "[0-9]{12}") {
            let full = with_check_digits(&base);
            let first = full.as_bytes()[0];
            prop_assume!(!full.bytes().all(|b| b == first));
            prop_assert!(is_valid(&full));
        }

        /// Separators never change the verdict.
        #[test]
        fn formatting_insensitive(
            digits in "[0-9]{14}",
            seps in prop::collection::vec(prop::sample::select(vec!["", ".", "/", "-"]), 14)
        ) {
            let formatted: String = digits
                .chars()
                .zip(seps.iter())
                .map(|(c, s)| format!("{c}{s}"))
                .collect();
            prop_assert_eq!(is_valid(&formatted), is_valid(&normalize(&formatted)));
            prop_assert_eq!(is_valid(&formatted), is_valid(&digits));
        }

        /// Anything that does not normalize to 14 digits fails.
        #[test]
        fn non_fourteen_digit_length_fails(s in "[0-9./-]{0,40}") {
            prop_assume!(normalize(&s).len() != CNPJ_LENGTH);
            prop_assert!(!is_valid(&s));
        }

        /// Changing a single check digit always breaks validity.
        #[test]
        fn tampered_check_digit_fails(base in "[0-9]{12}", pos in 12usize..14, delta in 1u32..10) {
            let full = with_check_digits(&base);
            let mut d: Vec<u32> = full.chars().filter_map(|c| c.to_digit(10)).collect();
            d[pos] = (d[pos] + delta) % 10;
            let tampered: String = d.iter().map(|x| char::from_digit(*x, 10).unwrap()).collect();
            prop_assert!(!is_valid(&tampered));
        }
    }
}
