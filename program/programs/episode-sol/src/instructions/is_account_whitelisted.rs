use anchor_lang::prelude::*;

use crate::state::Episode;

#[derive(Accounts)]
pub struct WhitelistQuery<'info> {
    /// Must be the queried account or the episode owner.
    pub caller: Signer<'info>,

    pub episode: Account<'info, Episode>,
}

pub fn handler(
    ctx: Context<WhitelistQuery>,
    account: Pubkey,
    limit: u64,
    chapter: [u8; 32],
    proof: Vec<[u8; 32]>,
) -> Result<bool> {
    ctx.accounts.episode.is_account_whitelisted(
        &ctx.accounts.caller.key(),
        &account,
        limit,
        &chapter,
        &proof,
    )
}
