use anchor_lang::prelude::*;

use crate::events::{emit_lifecycle, OnlifeEventEmitted};
use crate::instructions::owner_action::OwnerAction;
use crate::state::{checked_label_hash, LifecycleEvent};

/// Move the episode forward on an owner-chosen event.
///
/// `label` defaults to `EpisodeProgressedOnlife`. An event known to the
/// automaton but without an edge from the current chapter changes nothing.
pub fn handler(ctx: Context<OwnerAction>, label: Option<String>) -> Result<()> {
    let event = match label.as_deref() {
        Some(label) => checked_label_hash(label)?,
        None => LifecycleEvent::ProgressedOnlife.hash(),
    };
    let episode = &mut ctx.accounts.episode;
    let Some(step) = episode.emit_onlife_event(&event)? else {
        msg!("No transition from the current chapter, episode unchanged");
        return Ok(());
    };

    match label {
        Some(label) if event != LifecycleEvent::ProgressedOnlife.hash() => {
            emit!(OnlifeEventEmitted {
                episode: episode.key(),
                event: label,
                from: step.from,
                to: step.to,
            });
        }
        _ => emit_lifecycle(episode.key(), LifecycleEvent::ProgressedOnlife, step),
    }
    Ok(())
}
