// ==============================
// src/state.rs (byte-exact layout)
// ==============================
#![forbid(unsafe_code)]

use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::error::StakelockError;

pub const SIGNER_STATE_SIZE: usize = 8;
pub const LOCKED_STATE_SIZE: usize = 80;

pub const STATE_VERSION: u8 = 1;

/// Program signer account. Holds only the bump needed to reproduce its own
/// address; never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerState {
    pub version: u8,               // 0
    pub bump: u8,                  // 1
    pub reserved_padding: [u8; 6], // 2..8
}

impl SignerState {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        if input.len() != SIGNER_STATE_SIZE {
            return Err(StakelockError::InvalidAccountSize.into());
        }
        let version = input[0];
        if version != STATE_VERSION {
            return Err(StakelockError::InvalidStateVersion.into());
        }
        let bump = input[1];
        let reserved_padding: [u8; 6] = input[2..8]
            .try_into()
            .map_err(|_| StakelockError::InvalidAccountSize)?;

        Ok(Self { version, bump, reserved_padding })
    }

    pub fn pack(&self, output: &mut [u8]) -> Result<(), ProgramError> {
        if output.len() != SIGNER_STATE_SIZE {
            return Err(StakelockError::InvalidAccountSize.into());
        }
        if self.version != STATE_VERSION {
            return Err(StakelockError::InvalidStateVersion.into());
        }

        output[0] = self.version;
        output[1] = self.bump;
        output[2..8].copy_from_slice(&self.reserved_padding);
        Ok(())
    }
}

/// Locked balance record, one per (owner, mint). Created with amount = 0,
/// mutated only through stake/unstake signed by the owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockedState {
    pub version: u8,               // 0
    pub bump: u8,                  // 1
    pub owner: Pubkey,             // 2..34
    pub mint: Pubkey,              // 34..66
    pub amount: u64,               // 66..74
    pub reserved_padding: [u8; 6], // 74..80
}

impl LockedState {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        if input.len() != LOCKED_STATE_SIZE {
            return Err(StakelockError::InvalidAccountSize.into());
        }
        let version = input[0];
        if version != STATE_VERSION {
            return Err(StakelockError::InvalidStateVersion.into());
        }
        let bump = input[1];

        let owner = Pubkey::new_from_array(
            input[2..34].try_into().map_err(|_| StakelockError::InvalidAccountSize)?,
        );
        let mint = Pubkey::new_from_array(
            input[34..66].try_into().map_err(|_| StakelockError::InvalidAccountSize)?,
        );

        let amount = u64::from_le_bytes(
            input[66..74].try_into().map_err(|_| StakelockError::InvalidAccountSize)?,
        );
        let reserved_padding: [u8; 6] = input[74..80]
            .try_into()
            .map_err(|_| StakelockError::InvalidAccountSize)?;

        Ok(Self { version, bump, owner, mint, amount, reserved_padding })
    }

    pub fn pack(&self, output: &mut [u8]) -> Result<(), ProgramError> {
        if output.len() != LOCKED_STATE_SIZE {
            return Err(StakelockError::InvalidAccountSize.into());
        }
        if self.version != STATE_VERSION {
            return Err(StakelockError::InvalidStateVersion.into());
        }

        output[0] = self.version;
        output[1] = self.bump;

        output[2..34].copy_from_slice(self.owner.as_ref());
        output[34..66].copy_from_slice(self.mint.as_ref());

        output[66..74].copy_from_slice(&self.amount.to_le_bytes());
        output[74..80].copy_from_slice(&self.reserved_padding);
        Ok(())
    }
}
