use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions as sysvar_instructions;
use solana_sdk_ids::ed25519_program;

use crate::errors::EpisodeError;

/// Length of the message the oracle signs: `episode (32) || request_id (8 LE) || randomness (32)`.
pub const FULFILLMENT_MESSAGE_LEN: usize = 72;

/// Message the VRF authority signs for a reveal fulfillment.
pub fn fulfillment_message(
    episode: &Pubkey,
    request_id: u64,
    randomness: &[u8; 32],
) -> [u8; FULFILLMENT_MESSAGE_LEN] {
    let mut message = [0u8; FULFILLMENT_MESSAGE_LEN];
    message[..32].copy_from_slice(episode.as_ref());
    message[32..40].copy_from_slice(&request_id.to_le_bytes());
    message[40..].copy_from_slice(randomness);
    message
}

/// Introspect the Instructions sysvar to verify that instruction at index 0 is
/// a valid Ed25519 signature verification with the expected authority and message.
pub fn verify_ed25519_instruction(
    instructions_sysvar: &UncheckedAccount,
    expected_pubkey: &Pubkey,
    episode: &Pubkey,
    request_id: u64,
    randomness: &[u8; 32],
) -> Result<()> {
    let ix = sysvar_instructions::load_instruction_at_checked(
        0,
        &instructions_sysvar.to_account_info(),
    )
    .map_err(|_| EpisodeError::InvalidEd25519Instruction)?;

    require_keys_eq!(ix.program_id, ed25519_program::ID, EpisodeError::InvalidEd25519Program);

    let (pubkey, message) = parse_ed25519_payload(&ix.data)?;
    require!(
        pubkey == expected_pubkey.to_bytes().as_slice(),
        EpisodeError::InvalidEd25519Pubkey
    );
    require!(
        message == fulfillment_message(episode, request_id, randomness).as_slice(),
        EpisodeError::InvalidEd25519Message
    );
    Ok(())
}

/// Extract the public key and message embedded in Ed25519 precompile data.
///
/// ## Ed25519 instruction data layout
///
/// ```text
/// [0]       num_signatures (u8): must be 1
/// [1]       padding (u8)
/// [2..16]   Ed25519SignatureOffsets (7 x u16 LE):
///             signature_offset, signature_instruction_index,
///             public_key_offset, public_key_instruction_index,
///             message_data_offset, message_data_size,
///             message_instruction_index
/// [16..]    payload: public_key (32) + signature (64) + message (variable)
/// ```
///
/// All `*_instruction_index` fields must be `0xFFFF` (self-referencing), so the
/// signature checked by the runtime is the one over the returned bytes.
pub fn parse_ed25519_payload(data: &[u8]) -> Result<(&[u8], &[u8])> {
    require!(data.len() >= 16, EpisodeError::InvalidEd25519Instruction);
    require!(data[0] == 1, EpisodeError::InvalidSignatureCount);

    let read = |at: usize| u16::from_le_bytes([data[at], data[at + 1]]);
    let sig_ix_index = read(4);
    let pubkey_offset = read(6) as usize;
    let pubkey_ix_index = read(8);
    let msg_offset = read(10) as usize;
    let msg_size = read(12) as usize;
    let msg_ix_index = read(14);

    for index in [sig_ix_index, pubkey_ix_index, msg_ix_index] {
        require!(index == u16::MAX, EpisodeError::InvalidEd25519InstructionIndex);
    }

    let pubkey = data
        .get(pubkey_offset..pubkey_offset + 32)
        .ok_or(EpisodeError::InvalidEd25519Instruction)?;
    let message = data
        .get(msg_offset..msg_offset + msg_size)
        .ok_or(EpisodeError::InvalidEd25519Instruction)?;
    Ok((pubkey, message))
}
