//! ERC-20 calldata assembly.
//!
//! Token movements ride in calldata, not in the value field, so the plan
//! builder encodes real `approve`/`transfer` calls even while the rest of
//! the pipeline is stubbed.

use alloy_primitives::{keccak256, Address, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
	interface IERC20 {
		function approve(address spender, uint256 amount) external returns (bool);
		function transfer(address to, uint256 amount) external returns (bool);
	}
}

/// Hex-encoded `approve(spender, amount)` calldata.
pub fn approve_calldata(spender: Address, amount: U256) -> String {
	let call = IERC20::approveCall { spender, amount };
	format!("0x{}", hex::encode(call.abi_encode()))
}

/// Hex-encoded `transfer(to, amount)` calldata.
pub fn transfer_calldata(to: Address, amount: U256) -> String {
	let call = IERC20::transferCall { to, amount };
	format!("0x{}", hex::encode(call.abi_encode()))
}

/// Deterministic placeholder address for a token symbol absent from the
/// profile registry. Same symbol, same address, across processes.
pub fn derive_token_address(symbol: &str) -> Address {
	let digest = keccak256(symbol.to_ascii_uppercase().as_bytes());
	Address::from_slice(&digest[12..])
}
