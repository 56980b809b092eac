use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::state::Episode;

/// Accounts shared by every owner-only episode mutation.
#[derive(Accounts)]
pub struct OwnerAction<'info> {
    /// Current episode owner; must sign.
    pub owner: Signer<'info>,

    /// Episode to mutate.
    #[account(
        mut,
        has_one = owner @ EpisodeError::Unauthorized,
    )]
    pub episode: Account<'info, Episode>,
}
