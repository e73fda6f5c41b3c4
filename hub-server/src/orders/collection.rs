//! 自提码 - collection code generation and hashing
//!
//! Codes are 6 digits. Only a SHA-256 digest bound to the order id is
//! stored, so a code leaked for one order never verifies another.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Exclusive upper bound; leading zeros are kept
pub const CODE_SPACE: u32 = 1_000_000;

/// Random 6-digit code, `000000` to `999999`
pub fn generate_code() -> String {
    format_code(rand::thread_rng().gen_range(0..CODE_SPACE))
}

fn format_code(code: u32) -> String {
    format!("{code:06}")
}

/// Hex digest of `order_id:code`
pub fn hash_code(order_id: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(order_id.as_bytes());
    hasher.update(b":");
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}
