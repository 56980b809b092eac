use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::errors::EpisodeError;
use crate::events::{emit_lifecycle, TokensMinted};
use crate::state::{Allowance, Episode, MintQuote, MintRecord};

/// Accounts required for a public mint in an open chapter.
///
/// The mint record is keyed by the public allowance and the current chapter,
/// so the public cap applies per chapter.
#[derive(Accounts)]
pub struct MintTokens<'info> {
    /// The minting account; pays the offer and the record rent.
    #[account(mut)]
    pub minter: Signer<'info>,

    #[account(
        mut,
        has_one = treasury @ EpisodeError::TreasuryMismatch,
    )]
    pub episode: Account<'info, Episode>,

    /// Seeds: `["mint-record", episode, minter, "public", current_chapter]`.
    #[account(
        init_if_needed,
        payer = minter,
        space = 8 + MintRecord::INIT_SPACE,
        seeds = [
            MintRecord::SEED_PREFIX,
            episode.key().as_ref(),
            minter.key().as_ref(),
            Allowance::Public.seed(),
            episode.current_chapter_id().as_ref(),
        ],
        bump,
    )]
    pub mint_record: Account<'info, MintRecord>,

    /// Payment recipient; must match `episode.treasury`.
    /// CHECK: Validated by the `has_one` constraint on `episode`.
    #[account(mut)]
    pub treasury: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

/// Mint `quantity` tokens at the current chapter price.
pub fn handler(ctx: Context<MintTokens>, quantity: u64, offer: u64) -> Result<()> {
    let accounts = &mut *ctx.accounts;
    let minter = accounts.minter.key();
    let group = *accounts.episode.current_chapter_id();
    accounts
        .mint_record
        .bind(
            accounts.episode.key(),
            minter,
            Allowance::Public,
            group,
            ctx.bumps.mint_record,
        );

    let quote = accounts.episode.quote_mint(
        &minter,
        quantity,
        offer,
        None,
        accounts.mint_record.minted,
    )?;
    settle_mint(
        &mut accounts.episode,
        &mut accounts.mint_record,
        &accounts.minter,
        &accounts.treasury,
        &accounts.system_program,
        &quote,
    )
}

/// Collect payment and book a validated mint.
///
/// 1. Transfers `quote.cost` lamports from `minter` to `treasury` (skipped if zero).
/// 2. Increments episode supply and the minter's record.
/// 3. Emits [`TokensMinted`] and, when the chapter filled up, the capacity event.
pub(crate) fn settle_mint<'info>(
    episode: &mut Account<'info, Episode>,
    record: &mut Account<'info, MintRecord>,
    minter: &Signer<'info>,
    treasury: &UncheckedAccount<'info>,
    system: &Program<'info, System>,
    quote: &MintQuote,
) -> Result<()> {
    if quote.cost > 0 {
        system_program::transfer(
            CpiContext::new(
                system.to_account_info(),
                system_program::Transfer {
                    from: minter.to_account_info(),
                    to: treasury.to_account_info(),
                },
            ),
            quote.cost,
        )?;
    }

    let first_token_id = episode.total_supply;
    let reached = episode.apply_mint(quote)?;
    record.record(quote.quantity)?;

    emit!(TokensMinted {
        episode: episode.key(),
        minter: minter.key(),
        group: quote.group,
        first_token_id,
        quantity: quote.quantity,
        cost: quote.cost,
    });

    if let Some(reached) = reached {
        msg!("Chapter limit reached, firing {}", reached.event.label());
        if let Some(step) = reached.step {
            emit_lifecycle(episode.key(), reached.event, step);
        }
    }
    Ok(())
}
