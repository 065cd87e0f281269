// ==============================
// src/instruction.rs
// ==============================
#![forbid(unsafe_code)]

use borsh::{BorshDeserialize, BorshSerialize};

#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum StakelockInstruction {
    /// initialize_signer(bump)
    /// Creates the program signer PDA that authorizes escrow withdrawals.
    InitializeSigner { bump: u8 },

    /// initialize_escrow()
    /// Creates the per-mint escrow token account (ATA of the signer PDA).
    InitializeEscrow,

    /// initialize_locked()
    /// Creates the caller's locked balance record for one mint, amount = 0.
    InitializeLocked,

    /// stake(amount: u64)
    Stake { amount: u64 },

    /// unstake(amount: u64)
    /// amount must not exceed the caller's locked balance.
    Unstake { amount: u64 },
}
