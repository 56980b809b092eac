//! Off-chain whitelist tree builder.
//!
//! Leaves are `keccak256(account || limit as 32-byte big-endian || chapter)`,
//! parents hash the sorted pair, and an unpaired node moves up unchanged.
//! This is the layout the program verifies proofs against.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use crate::instructions::hash_label;

pub type Hash = [u8; 32];

/// One allocation: `account` may mint up to `limit` tokens as a member of
/// the chapter labelled `chapter`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub account: String,
    pub limit: u64,
    pub chapter: String,
}

/// Published output of `whitelist build`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WhitelistProofs {
    pub root: String,
    pub entries: Vec<ProofEntry>,
}

/// What a minter passes to `mint_whitelisted`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofEntry {
    pub account: String,
    pub limit: u64,
    pub chapter: String,
    pub group: String,
    pub proof: Vec<String>,
}

pub fn leaf_hash(account: &Pubkey, limit: u64, chapter: &Hash) -> Hash {
    let mut limit_word = [0u8; 32];
    limit_word[24..].copy_from_slice(&limit.to_be_bytes());

    let mut hasher = Keccak256::new();
    hasher.update(account.as_ref());
    hasher.update(limit_word);
    hasher.update(chapter);
    hasher.finalize().into()
}

pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

#[cfg(test)]
fn verify(root: &Hash, leaf: Hash, proof: &[Hash]) -> bool {
    proof.iter().fold(leaf, |node, sibling| hash_pair(&node, sibling)) == *root
}

/// Levels of a sorted-pair Merkle tree, leaves first.
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            bail!("cannot build a whitelist without allocations");
        }
        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let parents = level
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    [a] => *a,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(parents);
        }
        Ok(Self { levels })
    }

    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn proof(&self, mut index: usize) -> Vec<Hash> {
        let mut proof = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(index ^ 1) {
                proof.push(*sibling);
            }
            index /= 2;
        }
        proof
    }
}

/// Build the tree and every proof. Duplicate `(account, chapter)` pairs are
/// rejected since only one of them could ever be honored per mint record.
pub fn build(allocations: &[Allocation]) -> Result<WhitelistProofs> {
    let mut seen = HashSet::new();
    let mut leaves = Vec::with_capacity(allocations.len());
    for allocation in allocations {
        let account = Pubkey::from_str(&allocation.account)
            .with_context(|| format!("invalid account {}", allocation.account))?;
        if !seen.insert((account, allocation.chapter.clone())) {
            bail!(
                "duplicate allocation for {} in {}",
                allocation.account,
                allocation.chapter
            );
        }
        leaves.push(leaf_hash(&account, allocation.limit, &hash_label(&allocation.chapter)));
    }

    let tree = MerkleTree::new(leaves)?;
    let entries = allocations
        .iter()
        .enumerate()
        .map(|(index, allocation)| ProofEntry {
            account: allocation.account.clone(),
            limit: allocation.limit,
            chapter: allocation.chapter.clone(),
            group: hex::encode(hash_label(&allocation.chapter)),
            proof: tree.proof(index).iter().map(hex::encode).collect(),
        })
        .collect();

    Ok(WhitelistProofs {
        root: hex::encode(tree.root()),
        entries,
    })
}

/// Read allocations from JSON (array of objects) or CSV (`account,limit,chapter`).
pub fn load_allocations(path: &Path) -> Result<Vec<Allocation>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => parse_csv(&raw),
        _ => serde_json::from_str(&raw)
            .with_context(|| format!("invalid allocation list in {}", path.display())),
    }
}

fn parse_csv(raw: &str) -> Result<Vec<Allocation>> {
    raw.lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .filter(|(n, line)| !(*n == 1 && line.starts_with("account")))
        .map(|(n, line)| {
            let mut fields = line.splitn(3, ',').map(str::trim);
            let (Some(account), Some(limit), Some(chapter)) =
                (fields.next(), fields.next(), fields.next())
            else {
                bail!("line {n}: expected account,limit,chapter");
            };
            Ok(Allocation {
                account: account.to_string(),
                limit: limit
                    .parse()
                    .with_context(|| format!("line {n}: invalid limit {limit}"))?,
                chapter: chapter.to_string(),
            })
        })
        .collect()
}

/// Parse a `0x`-prefixed or bare hex root.
pub fn parse_root(value: &str) -> Result<Hash> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .with_context(|| format!("invalid hex root {value}"))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("root must be 32 bytes, got {}", bytes.len()))
}
