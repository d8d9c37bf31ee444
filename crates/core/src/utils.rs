use alloy::primitives::Address;
use anyhow::anyhow;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub fn now_secs() -> u64 {
    now_ms() / 1_000
}

/// Accepts checksummed or all-lowercase hex, with or without `0x`.
pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    let trimmed = s.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    // mixed-case input must carry a valid checksum
    if body.chars().any(|c| c.is_ascii_uppercase()) && body.chars().any(|c| c.is_ascii_lowercase())
    {
        return Address::parse_checksummed(format!("0x{body}"), None)
            .map_err(|e| anyhow!("invalid address {s}: {e}"));
    }
    Address::from_str(body).map_err(|e| anyhow!("invalid address {s}: {e}"))
}
