//! Sorted-pair keccak Merkle verification for whitelist allocations.
//!
//! A leaf commits to `(account, limit, chapter)` using the same 96-byte
//! layout as `solidityKeccak256(["address","uint256","bytes32"], ..)` with
//! the account widened to 32 bytes. Siblings are hashed in ascending byte
//! order, so proofs carry no left/right flags.

use anchor_lang::prelude::*;
use sha3::{Digest, Keccak256};

use crate::state::labels::Hash;

/// Longest proof accepted by the mint and query instructions (2^24 leaves).
pub const MAX_PROOF_LEN: usize = 24;

/// Leaf for a whitelist record.
pub fn leaf_hash(account: &Pubkey, limit: u64, chapter: &Hash) -> Hash {
    let mut limit_word = [0u8; 32];
    limit_word[24..].copy_from_slice(&limit.to_be_bytes());

    let mut hasher = Keccak256::new();
    hasher.update(account.as_ref());
    hasher.update(limit_word);
    hasher.update(chapter);
    hasher.finalize().into()
}

/// Parent of two nodes, independent of their order.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Fold `proof` over `leaf` and compare with `root`.
pub fn verify_proof(root: &Hash, leaf: Hash, proof: &[Hash]) -> bool {
    let computed = proof.iter().fold(leaf, |node, sibling| hash_pair(&node, sibling));
    computed == *root
}

/// Whether `(account, limit, chapter)` is committed to by `root`.
pub fn is_whitelisted(
    root: &Hash,
    account: &Pubkey,
    limit: u64,
    chapter: &Hash,
    proof: &[Hash],
) -> bool {
    proof.len() <= MAX_PROOF_LEN && verify_proof(root, leaf_hash(account, limit, chapter), proof)
}
