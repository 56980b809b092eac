use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::events::ConfigUpdated;
use crate::instructions::owner_action::OwnerAction;

/// Update one or more episode settings.
///
/// All parameters are optional; only provided fields are updated.
/// Zero-address values are rejected.
pub fn handler(
    ctx: Context<OwnerAction>,
    new_vrf_authority: Option<Pubkey>,
    new_treasury: Option<Pubkey>,
    new_owner: Option<Pubkey>,
    new_veil_uri: Option<String>,
    new_base_uri: Option<String>,
) -> Result<()> {
    let episode = &mut ctx.accounts.episode;

    for key in [new_vrf_authority, new_treasury, new_owner].into_iter().flatten() {
        require!(key != Pubkey::default(), EpisodeError::ZeroAddressNotAllowed);
    }
    if let Some(authority) = new_vrf_authority {
        episode.vrf_authority = authority;
    }
    if let Some(treasury) = new_treasury {
        episode.treasury = treasury;
    }
    if let Some(owner) = new_owner {
        episode.owner = owner;
    }
    episode.set_uris(new_veil_uri, new_base_uri)?;

    emit!(ConfigUpdated {
        episode: episode.key(),
        owner: episode.owner,
        vrf_authority: episode.vrf_authority,
        treasury: episode.treasury,
    });
    Ok(())
}
