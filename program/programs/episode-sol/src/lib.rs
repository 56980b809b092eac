use anchor_lang::prelude::*;

pub mod ed25519;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;

use instructions::*;
use state::{ChapterConfig, MintGroupRules};

declare_id!("BnpvWuENw75KoRowXN6ekVN5fbjDiyZGcmzM77MiEb8Y");

/// Staged episode sale.
///
/// An episode is a deterministic automaton over chapters. Each chapter
/// carries its own whitelisting, minting and revealing policy; events fed
/// into the automaton (owner progression, chapter capacity reached, minting
/// sealed, randomness delivered) move the episode from chapter to chapter.
///
/// ## Lifecycle
///
/// 1. **Configure**: while in its initial chapter the owner writes
///    chapters, mint group rules and transitions, and may publish a
///    whitelist root.
/// 2. **Mint**: minting chapters accept public mints (open chapters) and
///    Merkle-proven whitelist mints at an exact price. Filling a chapter
///    fires `ChapterMinted` / `EpisodeMinted` into the automaton.
/// 3. **Reveal**: in a revealing chapter the owner requests randomness; the
///    off-chain oracle answers with an Ed25519-proven value that seeds a
///    bijective token to metadata mapping and fires `EpisodeRevealed`.
#[program]
pub mod episode_sol {
    use super::*;

    /// Create an episode PDA sitting in its initial chapter.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        ctx: Context<InitializeEpisode>,
        name: String,
        initial_chapter: String,
        initial_config: ChapterConfig,
        max_supply: u64,
        veil_uri: String,
        base_uri: String,
    ) -> Result<()> {
        instructions::initialize::handler(
            ctx,
            name,
            initial_chapter,
            initial_config,
            max_supply,
            veil_uri,
            base_uri,
        )
    }

    /// Create or overwrite a chapter (configuration only).
    pub fn write_chapter(
        ctx: Context<OwnerAction>,
        label: String,
        config: ChapterConfig,
    ) -> Result<()> {
        instructions::write_chapter::handler(ctx, label, config)
    }

    /// Remove a non-initial chapter (configuration only).
    pub fn remove_chapter(ctx: Context<OwnerAction>, chapter: [u8; 32]) -> Result<()> {
        instructions::remove_chapter::handler(ctx, chapter)
    }

    /// Admit a foreign whitelist group into a chapter (configuration only).
    pub fn write_mint_group(
        ctx: Context<OwnerAction>,
        chapter_label: String,
        group_label: String,
        rules: MintGroupRules,
    ) -> Result<()> {
        instructions::write_mint_group::handler(ctx, chapter_label, group_label, rules)
    }

    pub fn remove_mint_group(
        ctx: Context<OwnerAction>,
        chapter: [u8; 32],
        group: [u8; 32],
    ) -> Result<()> {
        instructions::remove_mint_group::handler(ctx, chapter, group)
    }

    /// Add a `(from, event) -> to` transition (configuration only).
    pub fn write_transition(
        ctx: Context<OwnerAction>,
        from_label: String,
        to_label: String,
        event_label: String,
    ) -> Result<()> {
        instructions::write_transition::handler(ctx, from_label, to_label, event_label)
    }

    /// Remove a transition. Allowed in any chapter.
    pub fn remove_transition(
        ctx: Context<OwnerAction>,
        from: [u8; 32],
        event: [u8; 32],
    ) -> Result<()> {
        instructions::remove_transition::handler(ctx, from, event)
    }

    /// Replace the whitelist Merkle root (whitelisting chapters only).
    pub fn set_whitelist_root(ctx: Context<OwnerAction>, root: [u8; 32]) -> Result<()> {
        instructions::set_whitelist_root::handler(ctx, root)
    }

    /// Check a whitelist allocation. Callable by the account itself or the owner.
    pub fn is_account_whitelisted(
        ctx: Context<WhitelistQuery>,
        account: Pubkey,
        limit: u64,
        chapter: [u8; 32],
        proof: Vec<[u8; 32]>,
    ) -> Result<bool> {
        instructions::is_account_whitelisted::handler(ctx, account, limit, chapter, proof)
    }

    /// Owner-driven progression on `label` (default `EpisodeProgressedOnlife`).
    pub fn emit_onlife_event(ctx: Context<OwnerAction>, label: Option<String>) -> Result<()> {
        instructions::emit_onlife_event::handler(ctx, label)
    }

    /// End the current minting chapter early.
    pub fn seal_minting(ctx: Context<OwnerAction>) -> Result<()> {
        instructions::seal_minting::handler(ctx)
    }

    /// Public mint in an open chapter. `offer` must equal `price * quantity`.
    pub fn mint(ctx: Context<MintTokens>, quantity: u64, offer: u64) -> Result<()> {
        instructions::mint::handler(ctx, quantity, offer)
    }

    /// Mint against a whitelist allocation proven by `proof`.
    pub fn mint_whitelisted(
        ctx: Context<MintWhitelisted>,
        quantity: u64,
        offer: u64,
        limit: u64,
        group: [u8; 32],
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        instructions::mint_whitelisted::handler(ctx, quantity, offer, limit, group, proof)
    }

    /// Request reveal randomness (revealing chapters only, once).
    pub fn reveal(ctx: Context<OwnerAction>) -> Result<()> {
        instructions::reveal::handler(ctx)
    }

    /// Deliver reveal randomness with an Ed25519 proof.
    ///
    /// Only callable by the configured `vrf_authority`. Requires a preceding
    /// Ed25519 signature-verify instruction in the same transaction.
    pub fn fulfill_randomness(
        ctx: Context<FulfillRandomness>,
        request_id: u64,
        randomness: [u8; 32],
    ) -> Result<()> {
        instructions::fulfill::handler(ctx, request_id, randomness)
    }

    /// Update episode settings (owner-only).
    pub fn update_config(
        ctx: Context<OwnerAction>,
        new_vrf_authority: Option<Pubkey>,
        new_treasury: Option<Pubkey>,
        new_owner: Option<Pubkey>,
        new_veil_uri: Option<String>,
        new_base_uri: Option<String>,
    ) -> Result<()> {
        instructions::update_config::handler(
            ctx,
            new_vrf_authority,
            new_treasury,
            new_owner,
            new_veil_uri,
            new_base_uri,
        )
    }

    pub fn token_uri(ctx: Context<EpisodeView>, token_id: u64) -> Result<String> {
        instructions::views::token_uri(ctx, token_id)
    }

    pub fn current_default_price(ctx: Context<EpisodeView>) -> Result<u64> {
        instructions::views::current_default_price(ctx)
    }

    pub fn current_group_price(ctx: Context<EpisodeView>, group: [u8; 32]) -> Result<u64> {
        instructions::views::current_group_price(ctx, group)
    }

    pub fn offer_matches_group_price(
        ctx: Context<EpisodeView>,
        group: [u8; 32],
        quantity: u64,
        offer: u64,
    ) -> Result<bool> {
        instructions::views::offer_matches_group_price(ctx, group, quantity, offer)
    }

    pub fn group_rule(
        ctx: Context<EpisodeView>,
        group: [u8; 32],
    ) -> Result<Option<MintGroupRules>> {
        instructions::views::group_rule(ctx, group)
    }

    pub fn is_final(ctx: Context<EpisodeView>) -> Result<bool> {
        instructions::views::is_final(ctx)
    }
}
