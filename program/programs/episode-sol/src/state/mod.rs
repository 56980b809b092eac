pub mod automaton;
pub mod chapter;
pub mod episode;
pub mod labels;
pub mod mint_record;
pub mod minting;
pub mod reveal;
pub mod whitelist;

pub use automaton::*;
pub use chapter::*;
pub use episode::*;
pub use labels::*;
pub use mint_record::*;
pub use minting::*;
pub use reveal::*;
pub use whitelist::*;
