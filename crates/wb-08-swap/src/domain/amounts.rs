//! Slippage math and ERC-20 calldata.

use primitive_types::U256;

const BPS: u64 = 10_000;

/// `approve(address,uint256)`
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// `allowance(address,address)`
const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// Percent slippage in basis points, rounded and clamped to 0..=100%.
pub fn slippage_bps(percent: f64) -> u64 {
    if !percent.is_finite() || percent <= 0.0 {
        return 0;
    }
    ((percent * 100.0).round() as u64).min(BPS)
}

/// `amount * (1 ± bps/10000)`, rounded down.
pub fn apply_slippage(amount: U256, bps: u64, increase: bool) -> U256 {
    let factor = if increase {
        BPS + bps
    } else {
        BPS.saturating_sub(bps)
    };
    amount.saturating_mul(U256::from(factor)) / U256::from(BPS)
}

/// Left-padded ABI word for a 20-byte hex address.
fn address_word(address: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(address.strip_prefix("0x").unwrap_or(address)).ok()?;
    if bytes.len() != 20 {
        return None;
    }
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Some(word)
}

/// ABI-encoded `approve(spender, amount)`. `None` if `spender` is not a
/// 20-byte hex address.
pub fn approve_calldata(spender: &str, amount: U256) -> Option<String> {
    let spender = address_word(spender)?;
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&APPROVE_SELECTOR);
    data.extend_from_slice(&spender);
    let mut word = [0u8; 32];
    amount.to_big_endian(&mut word);
    data.extend_from_slice(&word);
    Some(format!("0x{}", hex::encode(data)))
}

/// ABI-encoded `allowance(owner, spender)`.
pub fn allowance_calldata(owner: &str, spender: &str) -> Option<String> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&ALLOWANCE_SELECTOR);
    data.extend_from_slice(&address_word(owner)?);
    data.extend_from_slice(&address_word(spender)?);
    Some(format!("0x{}", hex::encode(data)))
}
