use anchor_lang::prelude::*;

/// Error codes for the episode program.
///
/// Anchor encodes these as `6000 + variant index` in on-chain error responses,
/// so new variants are only ever appended.
#[error_code]
pub enum EpisodeError {
    /// Signer does not have permission for this action (wrong owner or VRF authority).
    #[msg("Unauthorized")]
    Unauthorized,
    /// A public key argument was the zero address (`11111111111111111111111111111111`).
    #[msg("Zero address not allowed")]
    ZeroAddressNotAllowed,
    /// Configuration writes are only accepted while the episode sits in its initial chapter.
    #[msg("Updates forbidden outside configuration")]
    UpdatesForbidden,
    /// A chapter may not enable revealing and minting at the same time.
    #[msg("Invalid chapter")]
    InvalidChapter,
    /// A chapter minting limit may not exceed the episode's max supply.
    #[msg("Chapter limit exceeds max supply")]
    ChapterLimitExceedsSupply,
    /// The referenced chapter was never written.
    #[msg("Chapter non existent")]
    ChapterNonExistent,
    /// The initial (configuration) chapter cannot be removed.
    #[msg("Initial chapter removal")]
    InitialChapterRemoval,
    /// Mint group rules need two distinct chapters that both enable minting.
    #[msg("Invalid mint group")]
    InvalidMintGroup,
    /// No rule exists for the (chapter, group) pair.
    #[msg("Mint group non existent")]
    MintGroupNonExistent,
    /// A transition endpoint is zero or not a registered state.
    #[msg("DFA: state invalid")]
    InvalidState,
    /// Transition symbols may not be the zero hash.
    #[msg("DFA: symbol invalid")]
    InvalidSymbol,
    /// A transition for this (from, event) pair already exists.
    #[msg("DFA: transition already exists")]
    DuplicateTransition,
    /// No transition exists for this (from, event) pair.
    #[msg("DFA: transition non existent")]
    NoSuchTransition,
    /// The episode account has no room left for another chapter, event, transition or rule.
    #[msg("Episode capacity exceeded")]
    CapacityExceeded,
    /// The event symbol was never registered in any transition.
    #[msg("Event non existent")]
    EventNonExistent,
    /// Built-in lifecycle events are fired by the program and cannot be emitted by hand.
    #[msg("Event reserved")]
    ReservedEvent,
    /// Labels must be non-empty and at most `MAX_LABEL_LEN` bytes.
    #[msg("Label too long")]
    LabelTooLong,
    /// The current chapter does not enable whitelisting.
    #[msg("Whitelisting not allowed")]
    WhitelistingNotAllowed,
    /// Only the account itself or the owner may query whitelist status.
    #[msg("Not allowed to check other users")]
    NotAllowedToCheckOthers,
    /// The current chapter does not enable minting.
    #[msg("No mint chapter")]
    NoMintChapter,
    /// The supplied proof does not match the whitelist root, or the chapter is closed.
    #[msg("Sender not whitelisted")]
    SenderNotWhitelisted,
    /// The proven group has no enabled rule in the current chapter.
    #[msg("Group not allowed")]
    GroupNotAllowed,
    /// The offer is not exactly `price * quantity`.
    #[msg("Offer unmatched")]
    OfferUnmatched,
    /// The quantity is zero or would exceed the per-account allocation.
    #[msg("Quantity not allowed")]
    QuantityNotAllowed,
    /// The current chapter has already reached its minting limit.
    #[msg("Chapter minted out")]
    ChapterMintedOut,
    /// Sealing requires a minting chapter whose limit has not been reached.
    #[msg("Sealing not allowed")]
    SealingNotAllowed,
    /// A supply, price or counter computation would overflow u64.
    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
    /// The current chapter does not enable revealing.
    #[msg("Reveal not allowed")]
    RevealNotAllowed,
    /// A randomness request is already outstanding.
    #[msg("Currently fulfilling")]
    CurrentlyFulfilling,
    /// The episode was already revealed; re-reveal is not supported.
    #[msg("Already revealed")]
    AlreadyRevealed,
    /// Fulfillment arrived while no randomness request is outstanding.
    #[msg("No outstanding request")]
    NoOutstandingRequest,
    /// Fulfillment carries a request id other than the outstanding one.
    #[msg("Request id mismatch")]
    RequestIdMismatch,
    /// The token id is not below the current total supply.
    #[msg("Non existent token")]
    NonExistentToken,
    /// The provided treasury account does not match the episode's treasury.
    #[msg("Treasury does not match episode")]
    TreasuryMismatch,
    /// Veil and base URIs are capped at `MAX_URI_LEN` bytes.
    #[msg("URI too long")]
    UriTooLong,
    /// Max supply must be non-zero.
    #[msg("Invalid max supply")]
    InvalidMaxSupply,
    /// The Ed25519 instruction at index 0 could not be loaded or is malformed.
    #[msg("Invalid Ed25519 instruction")]
    InvalidEd25519Instruction,
    /// The instruction at index 0 does not target the native Ed25519 program.
    #[msg("Invalid Ed25519 program")]
    InvalidEd25519Program,
    /// Expected exactly one signature in the Ed25519 instruction.
    #[msg("Invalid signature count")]
    InvalidSignatureCount,
    /// The public key in the Ed25519 instruction does not match `episode.vrf_authority`.
    #[msg("Invalid Ed25519 pubkey")]
    InvalidEd25519Pubkey,
    /// The signed message does not match `episode || request_id || randomness`.
    #[msg("Invalid Ed25519 message")]
    InvalidEd25519Message,
    /// Ed25519 instruction offset indices must be self-referencing (0xFFFF).
    #[msg("Invalid Ed25519 instruction index references")]
    InvalidEd25519InstructionIndex,
}

/// Coarse classification used by clients to decide whether a failed
/// transaction is worth resubmitting with different input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-window configuration. Fix the input first.
    Configuration,
    /// Wrong signer, proof or group. Retry only with other credentials.
    Authorization,
    /// Payment or quantity mismatch. Retry with corrected amounts.
    Economic,
    /// Not valid in the current chapter or reveal state.
    Lifecycle,
    /// Malformed fulfillment proof.
    Integrity,
}

impl EpisodeError {
    pub fn kind(&self) -> ErrorKind {
        use EpisodeError::*;
        match self {
            UpdatesForbidden | InvalidChapter | ChapterLimitExceedsSupply | ChapterNonExistent
            | InitialChapterRemoval | InvalidMintGroup | MintGroupNonExistent | InvalidState
            | InvalidSymbol | DuplicateTransition | NoSuchTransition | CapacityExceeded
            | LabelTooLong | UriTooLong | InvalidMaxSupply | ZeroAddressNotAllowed => {
                ErrorKind::Configuration
            }
            Unauthorized | NotAllowedToCheckOthers | SenderNotWhitelisted | GroupNotAllowed
            | TreasuryMismatch => ErrorKind::Authorization,
            OfferUnmatched | QuantityNotAllowed | ChapterMintedOut | ArithmeticOverflow => {
                ErrorKind::Economic
            }
            EventNonExistent | ReservedEvent | WhitelistingNotAllowed | NoMintChapter
            | SealingNotAllowed | RevealNotAllowed | CurrentlyFulfilling | AlreadyRevealed
            | NoOutstandingRequest | RequestIdMismatch | NonExistentToken => ErrorKind::Lifecycle,
            InvalidEd25519Instruction | InvalidEd25519Program | InvalidSignatureCount
            | InvalidEd25519Pubkey | InvalidEd25519Message | InvalidEd25519InstructionIndex => {
                ErrorKind::Integrity
            }
        }
    }

    /// Whether resubmitting with corrected input can succeed in the same chapter.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Economic | ErrorKind::Authorization)
    }
}
