//! Resource quantities such as `10Gi`, `500m` or `1e3`.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use once_cell::sync::Lazy;
use regex::Regex;

use super::field::{ErrorList, FieldError, FieldPath};

const QUANTITY_PATTERN: &str =
    r"^([+-]?)([0-9]+(?:\.[0-9]*)?|\.[0-9]+)(Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E|[eE][+-]?[0-9]+)?$";

static QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(QUANTITY_PATTERN).expect("quantity pattern is a valid regex"));

const INVALID_QUANTITY: &str =
    "quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'";

/// Parse a quantity into its (approximate) value in base units.
///
/// Non-zero values too small for an `f64` are rounded up to `1n`, the
/// smallest unit a quantity can hold.
pub fn parse(quantity: &str) -> Option<f64> {
    let captures = QUANTITY.captures(quantity)?;
    let number: f64 = captures[2].parse().ok()?;
    let scale = match captures.get(3).map(|m| m.as_str()) {
        None => 1.0,
        Some("Ki") => 2f64.powi(10),
        Some("Mi") => 2f64.powi(20),
        Some("Gi") => 2f64.powi(30),
        Some("Ti") => 2f64.powi(40),
        Some("Pi") => 2f64.powi(50),
        Some("Ei") => 2f64.powi(60),
        Some("n") => 1e-9,
        Some("u") => 1e-6,
        Some("m") => 1e-3,
        Some("k") => 1e3,
        Some("M") => 1e6,
        Some("G") => 1e9,
        Some("T") => 1e12,
        Some("P") => 1e15,
        Some("E") => 1e18,
        Some(exponent) => 10f64.powi(exponent[1..].parse().ok()?),
    };
    let mut value = number * scale;
    if value == 0.0 && captures[2].bytes().any(|b| matches!(b, b'1'..=b'9')) {
        value = 1e-9;
    }
    Some(if &captures[1] == "-" { -value } else { value })
}

/// Require `quantity` to be at least zero.
pub fn validate_non_negative(quantity: &Quantity, path: &FieldPath) -> ErrorList {
    validate(quantity, path, |v| v >= 0.0, "must be greater than or equal to 0")
}

/// Require `quantity` to be greater than zero.
pub fn validate_positive(quantity: &Quantity, path: &FieldPath) -> ErrorList {
    validate(quantity, path, |v| v > 0.0, "must be greater than zero")
}

fn validate(quantity: &Quantity, path: &FieldPath, ok: impl Fn(f64) -> bool, detail: &str) -> ErrorList {
    let mut errs = ErrorList::new();
    match parse(&quantity.0) {
        None => errs.push(FieldError::invalid(path, &quantity.0, INVALID_QUANTITY)),
        Some(value) if !ok(value) => errs.push(FieldError::invalid(path, &quantity.0, detail)),
        Some(_) => {}
    }
    errs
}
