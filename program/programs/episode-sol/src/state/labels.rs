use anchor_lang::prelude::*;
use sha3::{Digest, Keccak256};

use crate::errors::EpisodeError;

/// 32-byte keccak-256 digest used as chapter, event and group identifier.
pub type Hash = [u8; 32];

/// Sentinel meaning "no state" / "no symbol".
pub const ZERO_HASH: Hash = [0u8; 32];

/// Longest label accepted by configuration instructions.
pub const MAX_LABEL_LEN: usize = 64;

/// keccak-256 over the UTF-8 bytes of `label`.
///
/// Matches `solidityKeccak256(["string"], [label])`, so hashes produced by
/// existing tooling for the same labels can be reused as-is.
pub fn hash_label(label: &str) -> Hash {
    Keccak256::digest(label.as_bytes()).into()
}

/// Hash a label received from a client, rejecting empty and oversized ones.
pub fn checked_label_hash(label: &str) -> Result<Hash> {
    require!(
        !label.is_empty() && label.len() <= MAX_LABEL_LEN,
        EpisodeError::LabelTooLong
    );
    Ok(hash_label(label))
}

/// Events the program itself feeds into the automaton.
///
/// Only `ProgressedOnlife` may also be emitted by the owner; the other
/// variants are reserved and fire as a side effect of minting, sealing and
/// revealing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    ProgressedOnlife,
    ChapterMinted,
    EpisodeMinted,
    MintingSealed,
    EpisodeRevealed,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 5] = [
        LifecycleEvent::ProgressedOnlife,
        LifecycleEvent::ChapterMinted,
        LifecycleEvent::EpisodeMinted,
        LifecycleEvent::MintingSealed,
        LifecycleEvent::EpisodeRevealed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LifecycleEvent::ProgressedOnlife => "EpisodeProgressedOnlife",
            LifecycleEvent::ChapterMinted => "ChapterMinted",
            LifecycleEvent::EpisodeMinted => "EpisodeMinted",
            LifecycleEvent::MintingSealed => "MintingSealed",
            LifecycleEvent::EpisodeRevealed => "EpisodeRevealed",
        }
    }

    pub fn hash(self) -> Hash {
        hash_label(self.label())
    }

    pub fn from_hash(hash: &Hash) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.hash() == *hash)
    }

    pub fn is_reserved(self) -> bool {
        self != LifecycleEvent::ProgressedOnlife
    }
}

#[cfg(test)]
pub(crate) fn hex32(s: &str) -> Hash {
    let s = s.trim_start_matches("0x");
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_label_is_keccak_of_nothing() {
        assert_eq!(
            hash_label(""),
            hex32("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn chapter_labels_match_published_hashes() {
        assert_eq!(
            hash_label("Introduction: The Big Bang"),
            hex32("0xf7557b1a7545ca9a1730dba009cddef7e4c1b08a16a141bb5664bbb7b76d5861")
        );
        assert_eq!(
            hash_label("Chapter I: The Arch Builders"),
            hex32("0x9c73a005c8a24c96d44198313e479234c6b601b1f309e4a18c5c0a3a38150c66")
        );
        assert_eq!(
            hash_label("Chapter II: The Chosen Ones"),
            hex32("0x4a4c10af8de97324f726ee2cbf52ae641d18201ac5f0f77ec4e239388d49e000")
        );
    }

    #[test]
    fn lifecycle_hashes() {
        assert_eq!(
            LifecycleEvent::ProgressedOnlife.hash(),
            hex32("18c54955bcf796be375340f7732ec4af84ee7f98b5a963177c729cf6ae134129")
        );
        assert_eq!(
            LifecycleEvent::EpisodeRevealed.hash(),
            hex32("acf678fa5846c9bc1cd7d9ce3f4458ec0ced94963d69294eed2ceadc2256e278")
        );
        for event in LifecycleEvent::ALL {
            assert_eq!(LifecycleEvent::from_hash(&event.hash()), Some(event));
        }
        assert_eq!(LifecycleEvent::from_hash(&hash_label("Custom")), None);
        assert_eq!(checked_label_hash("MintingSealed").unwrap(), LifecycleEvent::MintingSealed.hash());
        assert!(checked_label_hash("").is_err());
        assert!(checked_label_hash(&"x".repeat(MAX_LABEL_LEN + 1)).is_err());
        assert!(!LifecycleEvent::ProgressedOnlife.is_reserved());
        assert!(LifecycleEvent::MintingSealed.is_reserved());
    }
}
