#![allow(ambiguous_glob_reexports)]

pub mod owner_action;
pub mod initialize;
pub mod write_chapter;
pub mod remove_chapter;
pub mod write_mint_group;
pub mod remove_mint_group;
pub mod write_transition;
pub mod remove_transition;
pub mod set_whitelist_root;
pub mod is_account_whitelisted;
pub mod emit_onlife_event;
pub mod seal_minting;
pub mod mint;
pub mod mint_whitelisted;
pub mod reveal;
pub mod fulfill;
pub mod update_config;
pub mod views;

pub use owner_action::*;
pub use initialize::*;
pub use write_chapter::*;
pub use remove_chapter::*;
pub use write_mint_group::*;
pub use remove_mint_group::*;
pub use write_transition::*;
pub use remove_transition::*;
pub use set_whitelist_root::*;
pub use is_account_whitelisted::*;
pub use emit_onlife_event::*;
pub use seal_minting::*;
pub use mint::*;
pub use mint_whitelisted::*;
pub use reveal::*;
pub use fulfill::*;
pub use update_config::*;
pub use views::*;
