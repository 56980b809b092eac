//! Deterministic reveal randomness.
//!
//! HMAC-SHA256 keyed by the oracle's secret: the same request always yields
//! the same output, yet nobody without the secret can predict it.

use anyhow::Result;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use solana_sdk::pubkey::Pubkey;

type HmacSha256 = Hmac<Sha256>;

/// Compute the 32-byte reveal seed for an episode's randomness request.
///
/// ```text
/// output = HMAC-SHA256(secret, episode || seed || request_slot_le || request_id_le)
/// ```
///
/// Binding the episode address keeps two episodes that happen to share a
/// request seed from receiving the same output.
pub fn compute_randomness(
    hmac_secret: &[u8],
    episode: &Pubkey,
    seed: &[u8; 32],
    request_slot: u64,
    request_id: u64,
) -> Result<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(hmac_secret)
        .map_err(|e| anyhow::anyhow!("invalid HMAC key: {e}"))?;

    mac.update(episode.as_ref());
    mac.update(seed);
    mac.update(&request_slot.to_le_bytes());
    mac.update(&request_id.to_le_bytes());

    Ok(mac.finalize().into_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn episode() -> Pubkey {
        Pubkey::new_from_array([9; 32])
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let r1 = compute_randomness(SECRET, &episode(), &[1; 32], 100, 1).unwrap();
        let r2 = compute_randomness(SECRET, &episode(), &[1; 32], 100, 1).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn bound_to_every_input() {
        let base = compute_randomness(SECRET, &episode(), &[1; 32], 100, 1).unwrap();
        let other_episode = Pubkey::new_from_array([8; 32]);
        assert_ne!(
            base,
            compute_randomness(SECRET, &other_episode, &[1; 32], 100, 1).unwrap()
        );
        assert_ne!(
            base,
            compute_randomness(SECRET, &episode(), &[2; 32], 100, 1).unwrap()
        );
        assert_ne!(
            base,
            compute_randomness(SECRET, &episode(), &[1; 32], 101, 1).unwrap()
        );
        assert_ne!(
            base,
            compute_randomness(SECRET, &episode(), &[1; 32], 100, 2).unwrap()
        );
        assert_ne!(
            base,
            compute_randomness(b"other-secret", &episode(), &[1; 32], 100, 1).unwrap()
        );
    }
}
