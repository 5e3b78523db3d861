//! Wallet profile: the injected configuration the plan builder works from.
//!
//! Everything environment-specific about planning lives here — the wallet
//! being operated, the swap spender, token address overrides — so the
//! builder itself stays a pure function and two builders with different
//! profiles cannot interfere.

use alloy_primitives::Address;
use pilot_types::decimals_for;
use std::collections::HashMap;

use crate::calldata::derive_token_address;
use crate::PlanError;

/// Configuration for one wallet the pilot plans on behalf of.
#[derive(Debug, Clone)]
pub struct WalletProfile {
	/// Address whose balances are read and whose transactions are built.
	pub wallet_address: String,
	/// The fixed contract approvals are granted to and swaps routed through.
	pub swap_spender: String,
	/// Token contract addresses by uppercase symbol. Symbols not listed
	/// get a deterministic derived placeholder.
	pub token_addresses: HashMap<String, String>,
	/// Display-decimal overrides by uppercase symbol.
	pub decimal_overrides: HashMap<String, u8>,
}

impl WalletProfile {
	/// Demo profile with synthetic addresses; pairs with the stub tools.
	pub fn stub() -> Self {
		let mut token_addresses = HashMap::new();
		token_addresses.insert(
			"USDC".to_string(),
			"0x0000000000000000000000000000000000003003".to_string(),
		);
		token_addresses.insert(
			"USDT".to_string(),
			"0x0000000000000000000000000000000000003004".to_string(),
		);
		token_addresses.insert(
			"DAI".to_string(),
			"0x0000000000000000000000000000000000003005".to_string(),
		);
		token_addresses.insert(
			"WETH".to_string(),
			"0x0000000000000000000000000000000000003006".to_string(),
		);

		Self {
			wallet_address: "0x0000000000000000000000000000000000001001".to_string(),
			swap_spender: "0x0000000000000000000000000000000000002002".to_string(),
			token_addresses,
			decimal_overrides: HashMap::new(),
		}
	}

	/// Display decimals for a symbol, override first, table second.
	pub fn decimals(&self, symbol: &str) -> u8 {
		let upper = symbol.to_ascii_uppercase();
		self.decimal_overrides
			.get(&upper)
			.copied()
			.unwrap_or_else(|| decimals_for(symbol))
	}

	/// Contract address for a token symbol.
	pub fn token_address(&self, symbol: &str) -> Result<Address, PlanError> {
		let upper = symbol.to_ascii_uppercase();
		match self.token_addresses.get(&upper) {
			Some(address) => address.parse::<Address>().map_err(|e| {
				PlanError::InvalidProfile(format!(
					"token address for '{}' is malformed: {}",
					upper, e
				))
			}),
			None => Ok(derive_token_address(&upper)),
		}
	}

	/// The swap spender as a parsed address.
	pub fn spender_address(&self) -> Result<Address, PlanError> {
		self.swap_spender.parse::<Address>().map_err(|e| {
			PlanError::InvalidProfile(format!("swap spender address is malformed: {}", e))
		})
	}
}

impl Default for WalletProfile {
	fn default() -> Self {
		Self::stub()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decimal_overrides_win() {
		let mut profile = WalletProfile::stub();
		profile.decimal_overrides.insert("USDC".to_string(), 8);
		assert_eq!(profile.decimals("USDC"), 8);
		assert_eq!(profile.decimals("USDT"), 6);
	}

	#[test]
	fn test_unknown_token_gets_derived_address() {
		let profile = WalletProfile::stub();
		let first = profile.token_address("FOO").unwrap();
		let second = profile.token_address("foo").unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn test_malformed_registry_entry_is_an_error() {
		let mut profile = WalletProfile::stub();
		profile
			.token_addresses
			.insert("BAD".to_string(), "not-an-address".to_string());
		assert!(profile.token_address("BAD").is_err());
	}
}
