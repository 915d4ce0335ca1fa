//! Conversions between human-decimal amounts and the fixed-point integer
//! representation chains actually settle in.
//!
//! The value path never goes through a float: amounts are parsed as decimal
//! strings and scaled with integer arithmetic, so anything representable
//! within the currency's decimal grid converts exactly.

use anyhow::{Context, Result, bail};

fn pow10(decimals: u8) -> Result<u128> {
    10u128
        .checked_pow(u32::from(decimals))
        .with_context(|| format!("decimals out of range: {decimals}"))
}

/// Parses a non-negative decimal string into base units scaled by
/// `10^decimals`. Digits below the decimal grid are truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<u128> {
    let amount = amount.trim();
    if amount.is_empty() {
        bail!("empty amount");
    }
    if amount.starts_with('-') {
        bail!("negative amount: {amount}");
    }
    let amount = amount.strip_prefix('+').unwrap_or(amount);

    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("malformed amount: {amount}");
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        bail!("malformed amount: {amount}");
    }

    let scale = pow10(decimals)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .with_context(|| format!("amount too large: {amount}"))?
            .checked_mul(scale)
            .with_context(|| format!("amount overflows base units: {amount}"))?
    };

    let frac = &frac[..frac.len().min(usize::from(decimals))];
    let frac_units = if frac.is_empty() {
        0
    } else {
        let digits = frac
            .parse::<u128>()
            .with_context(|| format!("malformed amount: {amount}"))?;
        digits * pow10(decimals - frac.len() as u8)?
    };

    whole_units
        .checked_add(frac_units)
        .with_context(|| format!("amount overflows base units: {amount}"))
}

/// Encodes a decimal amount as a hex-prefixed fixed-point quantity.
pub fn to_fixed_point_hex(amount: &str, decimals: u8) -> Result<String> {
    Ok(format!("{:#x}", parse_units(amount, decimals)?))
}

/// Converts base units back to a decimal value for balance comparisons.
/// Lossy for more than ~15 significant digits, which is fine for the
/// greater-than checks it backs; the dispatch path stays integer-exact.
pub fn to_decimal(value: u128, decimals: u8) -> f64 {
    value as f64 / 10f64.powi(i32::from(decimals))
}

/// Decodes an RPC quantity, hex-prefixed or plain decimal.
pub fn from_quantity(value: &str) -> Result<u128> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return u128::from_str_radix(hex, 16).with_context(|| format!("bad hex quantity: {value}"));
    }
    value
        .parse::<u128>()
        .with_context(|| format!("bad quantity: {value}"))
}
