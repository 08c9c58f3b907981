//! Short unique identifiers.
//!
//! A v4 UUID re-encoded in base57 (no look-alike characters), always 22
//! characters long. Used for both request IDs and correlation IDs.

use uuid::Uuid;

const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const ENCODED_LEN: usize = 22;

/// Generate a fresh short identifier.
pub fn short_id() -> String {
    encode(Uuid::new_v4().as_u128())
}

fn encode(mut value: u128) -> String {
    let base = ALPHABET.len() as u128;
    let mut out = [ALPHABET[0]; ENCODED_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value % base) as usize];
        value /= base;
    }
    out.iter().map(|&b| b as char).collect()
}
