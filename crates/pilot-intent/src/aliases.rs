//! Canonicalization of captured slot values.
//!
//! Slot-local aliases from the template apply first, then the built-in
//! asset table, then the chain table. Unknown assets fall back to
//! uppercase, unknown chains to lowercase, so templates can mention
//! tokens and networks the tables have never heard of.

use crate::templates::{SlotSpec, SlotType};
use serde_json::Value;

/// Canonical symbol for a known asset spelling, if any.
pub fn asset_alias(value: &str) -> Option<&'static str> {
	match value.to_lowercase().as_str() {
		"eth" | "ether" => Some("ETH"),
		"usdc" => Some("USDC"),
		"usdt" => Some("USDT"),
		"dai" => Some("DAI"),
		_ => None,
	}
}

/// Canonical chain identifier for a known chain spelling, if any.
pub fn chain_alias(value: &str) -> Option<&'static str> {
	match value.to_lowercase().as_str() {
		"eth" | "ethereum" | "evm" | "mainnet" => Some("evm"),
		"sepolia" => Some("sepolia"),
		"arbitrum" | "arb" => Some("arbitrum"),
		"polygon" | "matic" => Some("polygon"),
		_ => None,
	}
}

/// Resolves one captured surface form through the alias chain.
fn resolve_alias(raw: &str, slot_aliases: &std::collections::HashMap<String, String>) -> String {
	let key = raw.trim().to_lowercase();
	if let Some(canonical) = slot_aliases.get(&key) {
		return canonical.clone();
	}
	if let Some(canonical) = asset_alias(&key) {
		return canonical.to_string();
	}
	if let Some(canonical) = chain_alias(&key) {
		return canonical.to_string();
	}
	raw.trim().to_string()
}

/// Normalizes one captured value according to its slot type.
///
/// Amounts stay decimal strings, addresses lowercase, and slippage turns
/// into a JSON number with any percent sign stripped. Chain values run
/// through the chain table a second time because the alias chain may have
/// already rewritten them (an "eth" chain resolves to the asset "ETH"
/// first, then back down to "evm").
pub fn normalize_slot(slot: &SlotSpec, raw: &str) -> Value {
	let resolved = resolve_alias(raw, &slot.aliases);

	match slot.slot_type {
		SlotType::Amount => Value::String(resolved.replace(',', "")),
		SlotType::Asset => Value::String(resolved.to_uppercase()),
		SlotType::Address => Value::String(resolved.to_lowercase()),
		SlotType::Chain => {
			let lowered = resolved.trim().to_lowercase();
			let canonical = chain_alias(&lowered)
				.map(str::to_string)
				.unwrap_or(lowered);
			Value::String(canonical)
		}
		SlotType::Slippage => {
			let stripped = resolved.replace('%', "");
			match stripped
				.parse::<f64>()
				.ok()
				.and_then(serde_json::Number::from_f64)
			{
				Some(number) => Value::Number(number),
				None => Value::String(stripped),
			}
		}
		SlotType::Text => Value::String(resolved),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn slot(slot_type: SlotType) -> SlotSpec {
		SlotSpec {
			slot_type,
			aliases: HashMap::new(),
		}
	}

	#[test]
	fn test_asset_aliases_resolve_case_insensitively() {
		assert_eq!(asset_alias("Ether"), Some("ETH"));
		assert_eq!(asset_alias("USDC"), Some("USDC"));
		assert_eq!(asset_alias("wbtc"), None);
	}

	#[test]
	fn test_chain_aliases_cover_common_spellings() {
		assert_eq!(chain_alias("Ethereum"), Some("evm"));
		assert_eq!(chain_alias("mainnet"), Some("evm"));
		assert_eq!(chain_alias("arb"), Some("arbitrum"));
		assert_eq!(chain_alias("matic"), Some("polygon"));
		assert_eq!(chain_alias("base"), None);
	}

	#[test]
	fn test_amount_normalization_strips_commas() {
		let value = normalize_slot(&slot(SlotType::Amount), "1,000.5");
		assert_eq!(value, Value::String("1000.5".to_string()));
	}

	#[test]
	fn test_unknown_asset_uppercases() {
		let value = normalize_slot(&slot(SlotType::Asset), "wEth");
		assert_eq!(value, Value::String("WETH".to_string()));
	}

	#[test]
	fn test_address_lowercases() {
		let value = normalize_slot(
			&slot(SlotType::Address),
			"0xABCDEF0123456789abcdef0123456789ABCDEF01",
		);
		assert_eq!(
			value,
			Value::String("0xabcdef0123456789abcdef0123456789abcdef01".to_string())
		);
	}

	#[test]
	fn test_chain_slot_survives_asset_table_detour() {
		// "eth" hits the asset table first and becomes "ETH"; the chain
		// arm lowers it and maps it back to "evm".
		let value = normalize_slot(&slot(SlotType::Chain), "eth");
		assert_eq!(value, Value::String("evm".to_string()));
	}

	#[test]
	fn test_slippage_strips_percent_and_parses() {
		assert_eq!(
			normalize_slot(&slot(SlotType::Slippage), "0.5%"),
			Value::from(0.5)
		);
		assert_eq!(normalize_slot(&slot(SlotType::Slippage), "2"), Value::from(2.0));
	}

	#[test]
	fn test_slot_local_alias_wins_over_built_in() {
		let mut aliases = HashMap::new();
		aliases.insert("eth".to_string(), "WETH".to_string());
		let spec = SlotSpec {
			slot_type: SlotType::Asset,
			aliases,
		};
		assert_eq!(normalize_slot(&spec, "ETH"), Value::String("WETH".to_string()));
	}
}
