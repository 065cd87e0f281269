// ==============================
// src/pda.rs (canonical seeds)
// ==============================
#![forbid(unsafe_code)]

use solana_program::pubkey::Pubkey;

use crate::error::StakelockError;

pub const SEED_SIGNER: &[u8] = b"signer";

/// One signer PDA per program deployment. Its signing power is the seeds,
/// not a stored key.
pub fn derive_signer_pda(program_id: &Pubkey) -> Result<(Pubkey, u8), StakelockError> {
    Pubkey::try_find_program_address(&[SEED_SIGNER], program_id)
        .ok_or(StakelockError::NoValidBump)
}

/// One locked balance record per (owner, mint). The signer PDA sits between
/// the two pubkeys in the seed order.
pub fn derive_locked_pda(
    program_id: &Pubkey,
    owner: &Pubkey,
    signer_pda: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, u8), StakelockError> {
    Pubkey::try_find_program_address(
        &[owner.as_ref(), signer_pda.as_ref(), mint.as_ref()],
        program_id,
    )
    .ok_or(StakelockError::NoValidBump)
}

/// The escrow for a mint is the signer PDA's associated token account.
pub fn derive_escrow_address(signer_pda: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(signer_pda, mint)
}
