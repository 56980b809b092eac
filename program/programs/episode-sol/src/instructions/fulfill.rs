use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;

use crate::ed25519::verify_ed25519_instruction;
use crate::errors::EpisodeError;
use crate::events::{emit_lifecycle, RandomnessFulfilled};
use crate::state::{Episode, LifecycleEvent};

/// Accounts required to fulfill the outstanding reveal request.
///
/// The transaction **must** include a native Ed25519 signature-verify
/// instruction at index 0 that proves the `vrf_authority` signed the message
/// `episode (32) || request_id (8 LE) || randomness (32)`. This is validated
/// on-chain by inspecting the Instructions sysvar.
#[derive(Accounts)]
pub struct FulfillRandomness<'info> {
    /// Oracle authority that signs fulfillment proofs. Must match `episode.vrf_authority`.
    #[account(mut)]
    pub vrf_authority: Signer<'info>,

    #[account(
        mut,
        has_one = vrf_authority @ EpisodeError::Unauthorized,
    )]
    pub episode: Account<'info, Episode>,

    /// Native Instructions sysvar used to introspect the Ed25519 instruction.
    /// CHECK: Validated by the address constraint.
    #[account(address = sysvar_instructions::ID)]
    pub instructions_sysvar: UncheckedAccount<'info>,
}

/// Fulfill the reveal request.
///
/// 1. Verifies the Ed25519 signature proof in the preceding instruction.
/// 2. Stores the randomness as the reveal seed (status `Fulfilled`).
/// 3. Emits [`RandomnessFulfilled`] and fires `EpisodeRevealed`.
pub fn handler(
    ctx: Context<FulfillRandomness>,
    request_id: u64,
    randomness: [u8; 32],
) -> Result<()> {
    let episode_key = ctx.accounts.episode.key();
    verify_ed25519_instruction(
        &ctx.accounts.instructions_sysvar,
        &ctx.accounts.episode.vrf_authority,
        &episode_key,
        request_id,
        &randomness,
    )?;

    let episode = &mut ctx.accounts.episode;
    let step = episode.fulfill_reveal(request_id, randomness)?;

    emit!(RandomnessFulfilled {
        episode: episode_key,
        request_id,
        randomness,
    });
    if let Some(step) = step {
        emit_lifecycle(episode_key, LifecycleEvent::EpisodeRevealed, step);
    }
    Ok(())
}
