//! Request size limits.
//!
//! Body ceilings are written in config as human sizes ("10M", "4T") and
//! compiled into byte counts when a tenant pipeline is built. Units are
//! binary multiples, case-insensitive, with an optional trailing `B`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid byte size {0:?} (expected e.g. \"512K\", \"10M\", \"4T\")")]
pub struct ByteSizeError(pub String);

/// Parse a size such as `"10M"` or `"4TB"` into bytes.
pub fn parse_byte_size(value: &str) -> Result<usize, ByteSizeError> {
    let err = || ByteSizeError(value.to_string());
    let trimmed = value.trim();

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(err());
    }

    let unit = unit.trim().to_ascii_uppercase();
    let shift = match unit.strip_suffix('B').unwrap_or(&unit) {
        "" => 0,
        "K" => 10,
        "M" => 20,
        "G" => 30,
        "T" => 40,
        "P" => 50,
        _ => return Err(err()),
    };

    let count: u64 = digits.parse().map_err(|_| err())?;
    let bytes = count.checked_mul(1u64 << shift).ok_or_else(err)?;
    usize::try_from(bytes).map_err(|_| err())
}
