use anchor_lang::prelude::*;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::errors::EpisodeError;
use crate::state::labels::Hash;

const FEISTEL_ROUNDS: u8 = 4;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub enum RevealStatus {
    #[default]
    Idle,
    Requesting,
    Fulfilled,
}

/// Single-use randomness request driving the metadata reveal.
///
/// Lifecycle: `Idle -> Requesting -> Fulfilled`. There is no way back to
/// `Idle`; a request that is never fulfilled keeps the episode in
/// `Requesting` for good.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct Reveal {
    pub status: RevealStatus,
    /// Number of requests issued so far; ids start at 1.
    pub request_counter: u64,
    /// Id of the outstanding or fulfilled request, 0 when idle.
    pub request_id: u64,
    /// Slot at which the request was issued.
    pub request_slot: u64,
    /// VRF input handed to the oracle.
    pub request_seed: [u8; 32],
    /// VRF output, set once fulfilled.
    pub seed: [u8; 32],
}

impl Reveal {
    /// Issue a new request. Returns its id.
    pub fn request(&mut self, episode: &Pubkey, slot: u64) -> Result<u64> {
        match self.status {
            RevealStatus::Requesting => return err!(EpisodeError::CurrentlyFulfilling),
            RevealStatus::Fulfilled => return err!(EpisodeError::AlreadyRevealed),
            RevealStatus::Idle => {}
        }
        let request_id = self
            .request_counter
            .checked_add(1)
            .ok_or(EpisodeError::ArithmeticOverflow)?;

        self.request_counter = request_id;
        self.request_id = request_id;
        self.request_slot = slot;
        self.request_seed = request_seed(episode, request_id, slot);
        self.status = RevealStatus::Requesting;
        Ok(request_id)
    }

    /// Accept the VRF output for the outstanding request.
    pub fn fulfill(&mut self, request_id: u64, randomness: Hash) -> Result<()> {
        require!(
            self.status == RevealStatus::Requesting,
            EpisodeError::NoOutstandingRequest
        );
        require!(
            self.request_id == request_id,
            EpisodeError::RequestIdMismatch
        );
        self.seed = randomness;
        self.status = RevealStatus::Fulfilled;
        Ok(())
    }

    pub fn requested_id(&self) -> Option<u64> {
        (self.status == RevealStatus::Requesting).then_some(self.request_id)
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status == RevealStatus::Fulfilled
    }

    pub fn seed(&self) -> Option<&Hash> {
        self.is_fulfilled().then_some(&self.seed)
    }
}

/// VRF input: `keccak256(episode || request_id LE || slot LE)`.
pub fn request_seed(episode: &Pubkey, request_id: u64, slot: u64) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(episode.as_ref());
    hasher.update(request_id.to_le_bytes());
    hasher.update(slot.to_le_bytes());
    hasher.finalize().into()
}

/// Metadata id revealed for `token_id` in a collection of `supply` tokens.
///
/// A keyed Feistel network permutes the smallest even-width bit domain
/// covering `supply`; values falling outside `[0, supply)` are walked
/// through the permutation again until they land inside. The result is a
/// bijection on `[0, supply)` that only needs `(token_id, seed)` to recompute.
pub fn metadata_id(token_id: u64, supply: u64, seed: &Hash) -> u64 {
    if supply <= 1 {
        return token_id;
    }
    let needed = 64 - (supply - 1).leading_zeros();
    let bits = needed.max(2).next_multiple_of(2);
    let half = bits / 2;

    let mut value = token_id;
    loop {
        value = feistel(value, half, seed);
        if value < supply {
            return value;
        }
    }
}

fn feistel(value: u64, half: u32, seed: &Hash) -> u64 {
    let mask = (1u64 << half) - 1;
    let mut left = value >> half;
    let mut right = value & mask;
    for round in 0..FEISTEL_ROUNDS {
        let next = left ^ (round_function(right, round, seed) & mask);
        left = right;
        right = next;
    }
    (left << half) | right
}

fn round_function(input: u64, round: u8, seed: &Hash) -> u64 {
    let digest = Sha256::new()
        .chain_update(seed)
        .chain_update([round])
        .chain_update(input.to_le_bytes())
        .finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(word)
}
