//! Input validation helpers shared by request types.
//!
//! Each helper pushes a [`FieldViolation`] instead of returning early so callers
//! can report every offending field at once.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::FieldViolation;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

/// Whether `value` looks like a deliverable email address (`local@domain.tld`).
pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

pub fn require_non_empty(out: &mut Vec<FieldViolation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        out.push(FieldViolation::new(field, "must not be empty"));
    }
}

pub fn require_email(out: &mut Vec<FieldViolation>, field: &'static str, value: &str) {
    if !is_email(value) {
        out.push(FieldViolation::new(field, "must be a valid email address"));
    }
}

/// Most decimal places a stored amount keeps.
pub const MONEY_SCALE: u32 = 2;

/// Whole-unit digits a stored amount may have (`NUMERIC(16, 2)`).
pub const MONEY_INTEGER_DIGITS: u32 = 14;

/// A price or sale amount: positive, at most two decimal places, and below
/// `10^14` so it fits the stored column unchanged.
pub fn require_money(out: &mut Vec<FieldViolation>, field: &'static str, value: Decimal) {
    if value <= Decimal::ZERO {
        out.push(FieldViolation::new(field, "must be a positive number"));
    } else if value.normalize().scale() > MONEY_SCALE {
        out.push(FieldViolation::new(
            field,
            format!("must have at most {MONEY_SCALE} decimal places"),
        ));
    } else if value >= Decimal::from(10i64.pow(MONEY_INTEGER_DIGITS)) {
        out.push(FieldViolation::new(
            field,
            format!("must be less than 10^{MONEY_INTEGER_DIGITS}"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_email("sales@jajiautos.ng"));
        assert!(is_email("first.last+tag@example.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "plain", "a@", "@b.com", "a@b", "a b@c.com", "a@b..com"] {
            assert!(!is_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn money_fits_two_decimal_places_and_fourteen_digits() {
        let rejected = |value: Decimal| {
            let mut out = Vec::new();
            require_money(&mut out, "amount", value);
            !out.is_empty()
        };

        assert!(!rejected(Decimal::new(150050, 2)));
        assert!(!rejected(Decimal::new(1_000_000, 3)), "trailing zeros are fine");
        assert!(!rejected(Decimal::new(9_999_999_999_999_999, 2)));

        assert!(rejected(Decimal::ZERO));
        assert!(rejected(Decimal::new(1, 3)));
        assert!(rejected(Decimal::new(100_000_000_000_000, 0)));
    }

    #[test]
    fn collects_all_violations() {
        let mut out = Vec::new();
        require_non_empty(&mut out, "customerName", "  ");
        require_email(&mut out, "customerEmail", "nope");
        require_money(&mut out, "amount", Decimal::new(-50, 0));
        let fields: Vec<_> = out.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["customerName", "customerEmail", "amount"]);
    }
}
