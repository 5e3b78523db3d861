//! Amount handling for the wallet pilot.
//!
//! Intents carry display-unit decimal strings; everything that compares or
//! signs amounts works in integer base units. Conversion happens once, in
//! the plan builder, and the integers travel as strings from then on.

use alloy_primitives::{utils::parse_units, U256};
use thiserror::Error;

/// Errors from display-to-base-unit conversion.
#[derive(Debug, Error)]
pub enum AmountError {
	#[error("invalid amount '{0}'")]
	Invalid(String),
	#[error("negative amount '{0}'")]
	Negative(String),
}

/// Symbol assumed when an intent names no input asset.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Symbol treated as the chain's native asset.
///
/// Native transfers move value directly; everything else goes through a
/// token contract.
pub fn is_native_asset(symbol: &str) -> bool {
	symbol.eq_ignore_ascii_case(NATIVE_SYMBOL)
}

/// Display decimals for a token symbol. Unknown symbols default to 18.
pub fn decimals_for(symbol: &str) -> u8 {
	match symbol.to_ascii_uppercase().as_str() {
		"USDC" | "USDT" => 6,
		"WBTC" => 8,
		"ETH" | "WETH" | "DAI" => 18,
		_ => 18,
	}
}

/// Converts a display-unit decimal string into integer base units.
///
/// Rejects negatives, empty input, and values with more fractional digits
/// than the token has decimals.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
	let trimmed = amount.trim();
	if trimmed.is_empty() {
		return Err(AmountError::Invalid(amount.to_string()));
	}
	if trimmed.starts_with('-') {
		return Err(AmountError::Negative(amount.to_string()));
	}
	if trimmed.starts_with('+') {
		return Err(AmountError::Invalid(amount.to_string()));
	}

	let parsed =
		parse_units(trimmed, decimals).map_err(|_| AmountError::Invalid(amount.to_string()))?;
	Ok(parsed.get_absolute())
}

/// Whether a string is a plain base-10 integer (no sign, no decimal point).
///
/// Sufficiency checks only engage on integer strings; decimal-valued
/// requirements are left uncompared.
pub fn is_integer_string(value: &str) -> bool {
	!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parses an integer string into a U256, refusing anything
/// `is_integer_string` would.
pub fn parse_base_units(value: &str) -> Option<U256> {
	if !is_integer_string(value) {
		return None;
	}
	U256::from_str_radix(value, 10).ok()
}
