// ==============================
// src/error.rs
// ==============================
#![forbid(unsafe_code)]

use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[repr(u32)]
pub enum StakelockError {
    // 0–9: Instruction
    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    // 10–19: Lifecycle
    #[error("Account already initialized")]
    AlreadyInitialized = 10,
    #[error("Program signer not initialized")]
    SignerNotInitialized = 11,

    // 20–29: Derivation / authorization
    #[error("Supplied bump does not derive the supplied address")]
    InvalidBump = 20,
    #[error("Account does not match its canonical derivation")]
    InvalidDerivation = 21,
    #[error("Signer is not the record owner")]
    Unauthorized = 22,
    #[error("No valid bump for seeds")]
    NoValidBump = 23,

    // 30–39: Token accounts
    #[error("Invalid token program")]
    InvalidTokenProgram = 30,
    #[error("Invalid mint")]
    InvalidMint = 31,
    #[error("Invalid authority")]
    InvalidAuthority = 32,
    #[error("Insufficient token balance")]
    InsufficientFunds = 33,

    // 40–49: Amounts / math
    #[error("Amount must be greater than zero")]
    InvalidAmount = 40,
    #[error("Arithmetic overflow")]
    Overflow = 41,
    #[error("Arithmetic underflow")]
    Underflow = 42,
    #[error("User can't unstake amount more than locked balance")]
    AmountTooLarge = 43,

    // 50–59: Layout
    #[error("Invalid state version")]
    InvalidStateVersion = 50,
    #[error("Invalid account size")]
    InvalidAccountSize = 51,
}

impl From<StakelockError> for ProgramError {
    fn from(e: StakelockError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
