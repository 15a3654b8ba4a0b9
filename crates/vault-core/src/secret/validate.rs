//! Structural validation of plaintext secrets and account input
//!
//! Runs before anything is encrypted or stored, so a failure here never has a
//! side effect.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Card period layout: two-digit month, dot, four-digit year
pub const PERIOD_LAYOUT: &str = "MM.YYYY";

/// Minimum account password length
pub const MIN_PASSWORD_LEN: usize = 8;

const CARD_NUMBER_LEN: usize = 16;
const CVV_LEN: usize = 3;
const MIN_FULL_NAME_LEN: usize = 4;

static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])\.\d{4}$").expect("valid period regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Types that can check their own structure
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Luhn checksum over a string of ASCII digits
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Exactly 16 digits passing the Luhn checksum
pub fn validate_card_number(number: &str) -> Result<(), ValidationError> {
    if number.len() != CARD_NUMBER_LEN || !luhn_valid(number) {
        return Err(ValidationError::InvalidNumber);
    }
    Ok(())
}

/// Period in [`PERIOD_LAYOUT`], month 01 through 12
pub fn validate_period(period: &str) -> Result<(), ValidationError> {
    if !PERIOD_RE.is_match(period) {
        return Err(ValidationError::InvalidPeriod);
    }
    Ok(())
}

/// Exactly three ASCII digits (which also rules out signs such as "-12")
pub fn validate_cvv(cvv: &str) -> Result<(), ValidationError> {
    if cvv.len() != CVV_LEN || !cvv.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidCvv);
    }
    Ok(())
}

/// At least four characters
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.chars().count() < MIN_FULL_NAME_LEN {
        return Err(ValidationError::InvalidFullName);
    }
    Ok(())
}

/// Validate all card fields; the period is checked first
pub fn validate_card(
    number: &str,
    period: &str,
    cvv: &str,
    full_name: &str,
) -> Result<(), ValidationError> {
    validate_period(period)?;
    validate_card_number(number)?;
    validate_cvv(cvv)?;
    validate_full_name(full_name)
}

/// Login and password must both be present
pub fn validate_login_pair(login: &str, password: &str) -> Result<(), ValidationError> {
    if login.is_empty() {
        return Err(ValidationError::EmptyField("login"));
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

pub fn validate_meta_key(meta_key: &str) -> Result<(), ValidationError> {
    if meta_key.trim().is_empty() {
        return Err(ValidationError::EmptyMetaKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_card_accepted() {
        assert_eq!(
            validate_card("4648289760410976", "10.2030", "111", "Test Test"),
            Ok(())
        );
    }

    #[test]
    fn test_short_number_rejected() {
        assert_eq!(
            validate_card("464289760410976", "10.2030", "111", "Test Test"),
            Err(ValidationError::InvalidNumber)
        );
    }

    #[test]
    fn test_luhn_failure_rejected() {
        assert_eq!(
            validate_card_number("4648289760410977"),
            Err(ValidationError::InvalidNumber)
        );
        assert_eq!(
            validate_card_number("46482897604109a6"),
            Err(ValidationError::InvalidNumber)
        );
    }

    #[test]
    fn test_bad_period_rejected() {
        assert_eq!(
            validate_card("4648289760410976", "102030", "111", "Test Test"),
            Err(ValidationError::InvalidPeriod)
        );
        for period in ["13.2030", "00.2030", "1.2030", "10.30", "10.2030 ", ""] {
            assert_eq!(validate_period(period), Err(ValidationError::InvalidPeriod), "{:?}", period);
        }
    }

    #[test]
    fn test_negative_cvv_rejected() {
        assert_eq!(
            validate_card("4648289760410976", "10.2030", "-12", "Test Test"),
            Err(ValidationError::InvalidCvv)
        );
        assert_eq!(validate_cvv("12"), Err(ValidationError::InvalidCvv));
        assert_eq!(validate_cvv("1234"), Err(ValidationError::InvalidCvv));
        assert_eq!(validate_cvv("１２３"), Err(ValidationError::InvalidCvv));
    }

    #[test]
    fn test_short_full_name_rejected() {
        assert_eq!(
            validate_card("4648289760410976", "10.2030", "111", "T"),
            Err(ValidationError::InvalidFullName)
        );
        assert_eq!(validate_full_name("Józe"), Ok(()));
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4648289760410976"));
        assert!(luhn_valid("79927398713"));
        assert!(!luhn_valid("79927398710"));
        assert!(!luhn_valid(""));
    }

    #[test]
    fn test_login_pair() {
        assert_eq!(validate_login_pair("user", "pass"), Ok(()));
        assert_eq!(
            validate_login_pair("", "pass"),
            Err(ValidationError::EmptyField("login"))
        );
        assert_eq!(
            validate_login_pair("user", ""),
            Err(ValidationError::EmptyField("password"))
        );
    }

    #[test]
    fn test_email_and_password() {
        assert_eq!(validate_email("a@b.com"), Ok(()));
        assert_eq!(validate_email("a@b"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("no-at.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_password("12345678"), Ok(()));
        assert_eq!(
            validate_password("short"),
            Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN))
        );
    }

    #[test]
    fn test_meta_key() {
        assert_eq!(validate_meta_key("visa"), Ok(()));
        assert_eq!(validate_meta_key("  "), Err(ValidationError::EmptyMetaKey));
    }
}
