use anchor_lang::prelude::*;

use crate::events::TransitionWritten;
use crate::instructions::owner_action::OwnerAction;
use crate::state::checked_label_hash;

/// Add the `(from, event) -> to` edge. Both chapters must already exist.
pub fn handler(
    ctx: Context<OwnerAction>,
    from_label: String,
    to_label: String,
    event_label: String,
) -> Result<()> {
    let from = checked_label_hash(&from_label)?;
    let to = checked_label_hash(&to_label)?;
    let event = checked_label_hash(&event_label)?;
    let episode = &mut ctx.accounts.episode;
    episode.write_transition(&from, &to, event)?;

    emit!(TransitionWritten {
        episode: episode.key(),
        from_label,
        to_label,
        event_label,
    });
    Ok(())
}
