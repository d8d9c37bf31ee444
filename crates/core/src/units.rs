use alloy::primitives::utils::{format_units, parse_ether};
use alloy::primitives::U256;

use crate::error::{Error, Result};

/// Decimals of the native base currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Converts a decimal base-currency amount into its smallest denomination.
///
/// Fractional digits beyond the 18th are dropped (truncation toward zero),
/// everything else is exact.
pub fn to_smallest_unit(amount: &str) -> Result<U256> {
    let normalized = normalize_decimal(amount)?;
    parse_ether(&normalized).map_err(|err| Error::InvalidAmount(format!("{amount}: {err}")))
}

/// Renders a smallest-denomination value in base-currency units.
pub fn to_display_unit(value: U256) -> String {
    to_display_unit_with(value, NATIVE_DECIMALS)
}

pub fn to_display_unit_with(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(raw) => trim_fraction(raw),
        Err(_) => value.to_string(),
    }
}

/// Gas prices are easier to read in gwei.
pub fn gwei(wei: u128) -> String {
    to_display_unit_with(U256::from(wei), 9)
}

fn normalize_decimal(amount: &str) -> Result<String> {
    let trimmed = amount.trim();
    let invalid = || Error::InvalidAmount(amount.to_string());

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = &frac_part[..frac_part.len().min(NATIVE_DECIMALS as usize)];
    if frac_part.is_empty() {
        Ok(int_part.to_string())
    } else {
        Ok(format!("{int_part}.{frac_part}"))
    }
}

fn trim_fraction(raw: String) -> String {
    let Some((int_part, frac_part)) = raw.split_once('.') else {
        return raw;
    };
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        format!("{int_part}.0")
    } else {
        format!("{int_part}.{frac_part}")
    }
}
