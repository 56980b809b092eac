use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::state::automaton::{Automaton, Step};
use crate::state::chapter::{
    Chapter, ChapterConfig, MintGroupRule, MintGroupRules, MAX_CHAPTERS, MAX_MINT_GROUPS,
};
use crate::state::labels::{Hash, LifecycleEvent};
use crate::state::reveal::{metadata_id, Reveal};
use crate::state::whitelist::is_whitelisted;

pub const MAX_URI_LEN: usize = 128;

/// A staged sale driven by an automaton over its chapters.
///
/// Seeds: `["episode", creator, keccak256(name)]`
///
/// The fixed-size fields come first so off-chain readers can filter and
/// decode them at constant offsets (see `Episode::REVEAL_STATUS_OFFSET`).
/// Every automaton state has a matching entry in `chapters`.
#[account]
#[derive(InitSpace)]
pub struct Episode {
    /// Key allowed to configure, progress and reveal the episode.
    pub owner: Pubkey,
    /// Ed25519 key of the off-chain oracle that signs reveal randomness.
    pub vrf_authority: Pubkey,
    /// Receives mint payments.
    pub treasury: Pubkey,
    /// keccak-256 of the episode name.
    pub name_hash: [u8; 32],
    /// Upper bound for every chapter limit.
    pub max_supply: u64,
    /// Tokens minted across all chapters. Token ids are `0..total_supply`.
    pub total_supply: u64,
    /// Merkle root over `(account, limit, chapter)` whitelist leaves.
    pub whitelist_root: [u8; 32],
    pub reveal: Reveal,
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
    pub automaton: Automaton,
    #[max_len(16)]
    pub chapters: Vec<Chapter>,
    #[max_len(32)]
    pub mint_groups: Vec<MintGroupRule>,
    /// Shared metadata URI shown for every token before the reveal.
    #[max_len(128)]
    pub veil_uri: String,
    /// Prefix of revealed metadata URIs.
    #[max_len(128)]
    pub base_uri: String,
}

impl Episode {
    pub const SEED_PREFIX: &'static [u8] = b"episode";

    /// Byte offset of `reveal.status` in the raw account data (discriminator included).
    pub const REVEAL_STATUS_OFFSET: usize = 8 + 32 * 3 + 32 + 8 + 8 + 32;

    /// Populate a freshly created account. The initial chapter becomes the
    /// configuration window.
    #[allow(clippy::too_many_arguments)]
    pub fn setup(
        &mut self,
        owner: Pubkey,
        vrf_authority: Pubkey,
        treasury: Pubkey,
        name_hash: Hash,
        max_supply: u64,
        initial_chapter: Hash,
        initial_config: ChapterConfig,
        bump: u8,
    ) -> Result<()> {
        require!(max_supply > 0, EpisodeError::InvalidMaxSupply);
        require!(
            vrf_authority != Pubkey::default() && treasury != Pubkey::default(),
            EpisodeError::ZeroAddressNotAllowed
        );
        self.owner = owner;
        self.vrf_authority = vrf_authority;
        self.treasury = treasury;
        self.name_hash = name_hash;
        self.max_supply = max_supply;
        self.total_supply = 0;
        self.whitelist_root = [0u8; 32];
        self.reveal = Reveal::default();
        self.bump = bump;
        self.automaton = Automaton::new(initial_chapter)?;
        self.chapters = Vec::new();
        self.mint_groups = Vec::new();
        self.write_chapter(initial_chapter, initial_config)
    }

    pub fn set_uris(&mut self, veil_uri: Option<String>, base_uri: Option<String>) -> Result<()> {
        if let Some(uri) = veil_uri {
            require!(uri.len() <= MAX_URI_LEN, EpisodeError::UriTooLong);
            self.veil_uri = uri;
        }
        if let Some(uri) = base_uri {
            require!(uri.len() <= MAX_URI_LEN, EpisodeError::UriTooLong);
            self.base_uri = uri;
        }
        Ok(())
    }

    // Chapters

    pub fn chapter(&self, id: &Hash) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == *id)
    }

    fn chapter_mut(&mut self, id: &Hash) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == *id)
    }

    pub fn current_chapter_id(&self) -> &Hash {
        self.automaton.current()
    }

    pub fn current_chapter(&self) -> Result<&Chapter> {
        self.chapter(self.automaton.current())
            .ok_or_else(|| error!(EpisodeError::ChapterNonExistent))
    }

    pub fn in_configuration(&self) -> bool {
        self.automaton.in_initial_state()
    }

    fn ensure_configurable(&self) -> Result<()> {
        require!(self.in_configuration(), EpisodeError::UpdatesForbidden);
        Ok(())
    }

    /// Create or overwrite a chapter. Overwriting keeps its transitions.
    ///
    /// A chapter that stops minting also loses every mint group rule that
    /// refers to it.
    pub fn write_chapter(&mut self, id: Hash, config: ChapterConfig) -> Result<()> {
        self.ensure_configurable()?;
        config.validate(self.max_supply)?;

        match self.chapter_mut(&id) {
            Some(chapter) => chapter.config = config,
            None => {
                require!(
                    self.chapters.len() < MAX_CHAPTERS,
                    EpisodeError::CapacityExceeded
                );
                self.automaton.create_state(id)?;
                self.chapters.push(Chapter { id, config });
            }
        }
        self.automaton.set_accepting(&id, config.is_conclusion)?;
        if !config.mints() {
            self.mint_groups.retain(|rule| !rule.references(&id));
        }
        Ok(())
    }

    /// Remove a non-initial chapter with its transitions and mint group rules.
    pub fn remove_chapter(&mut self, id: &Hash) -> Result<()> {
        self.ensure_configurable()?;
        require!(
            id != self.automaton.initial(),
            EpisodeError::InitialChapterRemoval
        );
        require!(self.chapter(id).is_some(), EpisodeError::ChapterNonExistent);

        self.automaton.remove_state(id)?;
        self.chapters.retain(|c| c.id != *id);
        self.mint_groups.retain(|rule| !rule.references(id));
        Ok(())
    }

    // Mint groups

    pub fn mint_group(&self, chapter: &Hash, group: &Hash) -> Option<&MintGroupRule> {
        self.mint_groups
            .iter()
            .find(|rule| rule.chapter == *chapter && rule.group == *group)
    }

    pub fn write_mint_group(
        &mut self,
        chapter: Hash,
        group: Hash,
        rules: MintGroupRules,
    ) -> Result<()> {
        self.ensure_configurable()?;
        require!(chapter != group, EpisodeError::InvalidMintGroup);
        for id in [&chapter, &group] {
            let target = self.chapter(id).ok_or(EpisodeError::ChapterNonExistent)?;
            require!(target.config.mints(), EpisodeError::InvalidMintGroup);
        }

        if let Some(rule) = self
            .mint_groups
            .iter_mut()
            .find(|rule| rule.chapter == chapter && rule.group == group)
        {
            rule.rules = rules;
            return Ok(());
        }
        require!(
            self.mint_groups.len() < MAX_MINT_GROUPS,
            EpisodeError::CapacityExceeded
        );
        self.mint_groups.push(MintGroupRule {
            chapter,
            group,
            rules,
        });
        Ok(())
    }

    pub fn remove_mint_group(&mut self, chapter: &Hash, group: &Hash) -> Result<()> {
        self.ensure_configurable()?;
        let position = self
            .mint_groups
            .iter()
            .position(|rule| rule.chapter == *chapter && rule.group == *group)
            .ok_or(EpisodeError::MintGroupNonExistent)?;
        self.mint_groups.remove(position);
        Ok(())
    }

    // Transitions

    pub fn write_transition(&mut self, from: &Hash, to: &Hash, event: Hash) -> Result<()> {
        self.ensure_configurable()?;
        self.automaton.add_transition(from, to, event)
    }

    /// Allowed at any time so an operator can cut a loop back into a
    /// chapter that already ran.
    pub fn remove_transition(&mut self, from: &Hash, event: &Hash) -> Result<()> {
        self.automaton.remove_transition(from, event)
    }

    /// Owner-driven progression. Built-in lifecycle labels other than
    /// `EpisodeProgressedOnlife` cannot be emitted this way.
    pub fn emit_onlife_event(&mut self, event: &Hash) -> Result<Option<Step>> {
        if let Some(lifecycle) = LifecycleEvent::from_hash(event) {
            require!(!lifecycle.is_reserved(), EpisodeError::ReservedEvent);
        }
        self.automaton.transition(event)
    }

    /// Feed a program-fired lifecycle event. An episode that never wired the
    /// event keeps its current chapter.
    pub(crate) fn fire(&mut self, event: LifecycleEvent) -> Result<Option<Step>> {
        if !self.automaton.knows_symbol(&event.hash()) {
            return Ok(None);
        }
        self.automaton.transition(&event.hash())
    }

    pub fn is_final(&self) -> bool {
        self.automaton.is_final()
    }

    // Whitelist

    pub fn set_whitelist_root(&mut self, root: Hash) -> Result<()> {
        require!(
            self.current_chapter()?.config.whitelisting,
            EpisodeError::WhitelistingNotAllowed
        );
        self.whitelist_root = root;
        Ok(())
    }

    /// Whether `(account, limit, chapter)` is in the current whitelist.
    /// Only the account itself or the owner may ask.
    pub fn is_account_whitelisted(
        &self,
        caller: &Pubkey,
        account: &Pubkey,
        limit: u64,
        chapter: &Hash,
        proof: &[Hash],
    ) -> Result<bool> {
        require!(
            caller == account || *caller == self.owner,
            EpisodeError::NotAllowedToCheckOthers
        );
        Ok(is_whitelisted(
            &self.whitelist_root,
            account,
            limit,
            chapter,
            proof,
        ))
    }

    // Reveal

    /// Issue the randomness request. Returns the request id.
    pub fn request_reveal(&mut self, episode: &Pubkey, slot: u64) -> Result<u64> {
        require!(
            self.current_chapter()?.config.revealing,
            EpisodeError::RevealNotAllowed
        );
        self.reveal.request(episode, slot)
    }

    /// Store the oracle output and fire `EpisodeRevealed`.
    pub fn fulfill_reveal(&mut self, request_id: u64, randomness: Hash) -> Result<Option<Step>> {
        self.reveal.fulfill(request_id, randomness)?;
        self.fire(LifecycleEvent::EpisodeRevealed)
    }

    pub fn token_uri(&self, token_id: u64) -> Result<String> {
        require!(token_id < self.total_supply, EpisodeError::NonExistentToken);
        Ok(match self.reveal.seed() {
            None => self.veil_uri.clone(),
            Some(seed) => format!(
                "{}{}",
                self.base_uri,
                metadata_id(token_id, self.total_supply, seed)
            ),
        })
    }
}
