// ==============================
// src/processor.rs (dispatch + handlers)
// ==============================
#![forbid(unsafe_code)]

use borsh::BorshDeserialize;

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use spl_token::state::{Account as TokenAccount, Mint};

use crate::{
    error::StakelockError,
    instruction::StakelockInstruction,
    pda,
    state::{LockedState, SignerState, LOCKED_STATE_SIZE, SIGNER_STATE_SIZE, STATE_VERSION},
};

pub struct Processor;

impl Processor {
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], ix_data: &[u8]) -> ProgramResult {
        let ix = StakelockInstruction::try_from_slice(ix_data)
            .map_err(|_| StakelockError::InvalidInstruction)?;
        match ix {
            StakelockInstruction::InitializeSigner { bump } => {
                Self::initialize_signer(program_id, accounts, bump)
            }
            StakelockInstruction::InitializeEscrow => Self::initialize_escrow(program_id, accounts),
            StakelockInstruction::InitializeLocked => Self::initialize_locked(program_id, accounts),
            StakelockInstruction::Stake { amount } => Self::stake(program_id, accounts, amount),
            StakelockInstruction::Unstake { amount } => Self::unstake(program_id, accounts, amount),
        }
    }

    // ---------------------------------------------------------------------
    // initialize_signer(bump)
    // Accounts:
    // 0 [signer, writable] payer
    // 1 [writable]         signer_state (PDA ["signer"])
    // 2 []                 system_program
    // ---------------------------------------------------------------------
    fn initialize_signer(program_id: &Pubkey, accounts: &[AccountInfo], bump: u8) -> ProgramResult {
        let acc_iter = &mut accounts.iter();
        let payer_ai = next_account_info(acc_iter)?;
        let signer_ai = next_account_info(acc_iter)?;
        let system_program_ai = next_account_info(acc_iter)?;

        if !payer_ai.is_signer {
            return Err(StakelockError::Unauthorized.into());
        }
        if system_program_ai.key != &system_program::ID {
            return Err(StakelockError::InvalidInstruction.into());
        }

        // The caller-supplied bump must reproduce the caller-supplied address.
        let expected = Pubkey::create_program_address(&[pda::SEED_SIGNER, &[bump]], program_id)
            .map_err(|_| StakelockError::InvalidBump)?;
        if signer_ai.key != &expected {
            return Err(StakelockError::InvalidBump.into());
        }

        // must be uninitialized before create_account
        if signer_ai.owner != &system_program::ID || signer_ai.data_len() != 0 {
            return Err(StakelockError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        let lamports = rent.minimum_balance(SIGNER_STATE_SIZE);

        invoke_signed(
            &system_instruction::create_account(
                payer_ai.key,
                signer_ai.key,
                lamports,
                SIGNER_STATE_SIZE as u64,
                program_id,
            ),
            &[payer_ai.clone(), signer_ai.clone(), system_program_ai.clone()],
            &[&[pda::SEED_SIGNER, &[bump]]],
        )?;

        let signer_state = SignerState {
            version: STATE_VERSION,
            bump,
            reserved_padding: [0u8; 6],
        };
        signer_state.pack(&mut signer_ai.try_borrow_mut_data()?)?;

        msg!("program signer initialized: {}", signer_ai.key);

        Ok(())
    }

    // ---------------------------------------------------------------------
    // initialize_escrow()
    // Accounts:
    // 0 [signer, writable] payer
    // 1 []                 signer_state (PDA)
    // 2 [writable]         escrow (ATA of signer PDA for mint)
    // 3 []                 mint
    // 4 []                 system_program
    // 5 []                 token_program
    // 6 []                 associated_token_program
    // ---------------------------------------------------------------------
    fn initialize_escrow(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let acc_iter = &mut accounts.iter();
        let payer_ai = next_account_info(acc_iter)?;
        let signer_ai = next_account_info(acc_iter)?;
        let escrow_ai = next_account_info(acc_iter)?;
        let mint_ai = next_account_info(acc_iter)?;
        let system_program_ai = next_account_info(acc_iter)?;
        let token_program_ai = next_account_info(acc_iter)?;
        let ata_program_ai = next_account_info(acc_iter)?;

        if !payer_ai.is_signer {
            return Err(StakelockError::Unauthorized.into());
        }
        if system_program_ai.key != &system_program::ID {
            return Err(StakelockError::InvalidInstruction.into());
        }
        Self::validate_token_program(token_program_ai)?;
        if ata_program_ai.key != &spl_associated_token_account::id() {
            return Err(StakelockError::InvalidTokenProgram.into());
        }

        let _signer_state = Self::load_signer(program_id, signer_ai)?;

        let expected_escrow = pda::derive_escrow_address(signer_ai.key, mint_ai.key);
        if escrow_ai.key != &expected_escrow {
            return Err(StakelockError::InvalidDerivation.into());
        }

        // at most one escrow per mint
        if escrow_ai.owner != &system_program::ID || escrow_ai.data_len() != 0 {
            return Err(StakelockError::AlreadyInitialized.into());
        }

        // The ATA program creates the token account with authority = signer
        // PDA; no program signature is needed, the payer funds it.
        invoke(
            &spl_associated_token_account::instruction::create_associated_token_account(
                payer_ai.key,
                signer_ai.key,
                mint_ai.key,
                token_program_ai.key,
            ),
            &[
                payer_ai.clone(),
                escrow_ai.clone(),
                signer_ai.clone(),
                mint_ai.clone(),
                system_program_ai.clone(),
                token_program_ai.clone(),
                ata_program_ai.clone(),
            ],
        )?;

        msg!("escrow initialized for mint {}: {}", mint_ai.key, escrow_ai.key);

        Ok(())
    }

    // ---------------------------------------------------------------------
    // initialize_locked()
    // Accounts:
    // 0 [signer, writable] user (payer for the record)
    // 1 []                 signer_state (PDA)
    // 2 [writable]         locked_state (PDA [user, signer, mint])
    // 3 []                 mint
    // 4 []                 system_program
    // ---------------------------------------------------------------------
    fn initialize_locked(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let acc_iter = &mut accounts.iter();
        let user_ai = next_account_info(acc_iter)?;
        let signer_ai = next_account_info(acc_iter)?;
        let locked_ai = next_account_info(acc_iter)?;
        let mint_ai = next_account_info(acc_iter)?;
        let system_program_ai = next_account_info(acc_iter)?;

        if !user_ai.is_signer {
            return Err(StakelockError::Unauthorized.into());
        }
        if system_program_ai.key != &system_program::ID {
            return Err(StakelockError::InvalidInstruction.into());
        }

        let _signer_state = Self::load_signer(program_id, signer_ai)?;

        let (locked_pda, bump) =
            pda::derive_locked_pda(program_id, user_ai.key, signer_ai.key, mint_ai.key)?;
        if locked_ai.key != &locked_pda {
            return Err(StakelockError::InvalidDerivation.into());
        }

        // one record per (user, mint)
        if locked_ai.owner != &system_program::ID || locked_ai.data_len() != 0 {
            return Err(StakelockError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        let lamports = rent.minimum_balance(LOCKED_STATE_SIZE);

        invoke_signed(
            &system_instruction::create_account(
                user_ai.key,
                locked_ai.key,
                lamports,
                LOCKED_STATE_SIZE as u64,
                program_id,
            ),
            &[user_ai.clone(), locked_ai.clone(), system_program_ai.clone()],
            &[&[
                user_ai.key.as_ref(),
                signer_ai.key.as_ref(),
                mint_ai.key.as_ref(),
                &[bump],
            ]],
        )?;

        let locked = LockedState {
            version: STATE_VERSION,
            bump,
            owner: *user_ai.key,
            mint: *mint_ai.key,
            amount: 0,
            reserved_padding: [0u8; 6],
        };
        locked.pack(&mut locked_ai.try_borrow_mut_data()?)?;

        msg!("locked balance record initialized: {}", locked_ai.key);

        Ok(())
    }

    // ---------------------------------------------------------------------
    // stake(amount)
    // Accounts:
    // 0 [signer]   user
    // 1 []         signer_state (PDA)
    // 2 [writable] locked_state (PDA)
    // 3 [writable] user_token (source)
    // 4 [writable] escrow (ATA of signer PDA)
    // 5 []         mint
    // 6 []         token_program
    // ---------------------------------------------------------------------
    fn stake(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        if amount == 0 {
            return Err(StakelockError::InvalidAmount.into());
        }

        let acc_iter = &mut accounts.iter();
        let user_ai = next_account_info(acc_iter)?;
        let signer_ai = next_account_info(acc_iter)?;
        let locked_ai = next_account_info(acc_iter)?;
        let user_token_ai = next_account_info(acc_iter)?;
        let escrow_ai = next_account_info(acc_iter)?;
        let mint_ai = next_account_info(acc_iter)?;
        let token_program_ai = next_account_info(acc_iter)?;

        if !user_ai.is_signer {
            return Err(StakelockError::Unauthorized.into());
        }
        Self::validate_token_program(token_program_ai)?;

        let _signer_state = Self::load_signer(program_id, signer_ai)?;
        let mut locked =
            Self::load_locked(program_id, locked_ai, user_ai.key, signer_ai.key, mint_ai.key)?;

        Self::validate_escrow(escrow_ai, signer_ai.key, mint_ai.key)?;
        Self::validate_token_account_mint(user_token_ai, mint_ai.key)?;

        let user_token = TokenAccount::unpack(&user_token_ai.try_borrow_data()?)?;
        if user_token.amount < amount {
            return Err(StakelockError::InsufficientFunds.into());
        }

        // state mutation before CPI transfer
        locked.amount = locked
            .amount
            .checked_add(amount)
            .ok_or(StakelockError::Overflow)?;
        locked.pack(&mut locked_ai.try_borrow_mut_data()?)?;

        // CPI transfer user_token -> escrow (user signs)
        Self::token_transfer(
            token_program_ai,
            user_token_ai,
            mint_ai,
            escrow_ai,
            user_ai,
            &[],
            amount,
        )?;

        msg!("staked {}: locked balance {}", amount, locked.amount);

        Ok(())
    }

    // ---------------------------------------------------------------------
    // unstake(amount)
    // Accounts:
    // 0 [signer]   user
    // 1 []         signer_state (PDA)
    // 2 [writable] locked_state (PDA)
    // 3 [writable] escrow (source, ATA of signer PDA)
    // 4 [writable] user_token (destination)
    // 5 []         mint
    // 6 []         token_program
    // ---------------------------------------------------------------------
    fn unstake(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        if amount == 0 {
            return Err(StakelockError::InvalidAmount.into());
        }

        let acc_iter = &mut accounts.iter();
        let user_ai = next_account_info(acc_iter)?;
        let signer_ai = next_account_info(acc_iter)?;
        let locked_ai = next_account_info(acc_iter)?;
        let escrow_ai = next_account_info(acc_iter)?;
        let user_token_ai = next_account_info(acc_iter)?;
        let mint_ai = next_account_info(acc_iter)?;
        let token_program_ai = next_account_info(acc_iter)?;

        if !user_ai.is_signer {
            return Err(StakelockError::Unauthorized.into());
        }
        Self::validate_token_program(token_program_ai)?;

        let signer_state = Self::load_signer(program_id, signer_ai)?;
        let mut locked =
            Self::load_locked(program_id, locked_ai, user_ai.key, signer_ai.key, mint_ai.key)?;

        Self::validate_escrow(escrow_ai, signer_ai.key, mint_ai.key)?;
        Self::validate_token_account_mint(user_token_ai, mint_ai.key)?;

        // The central safety check: strictly before any transfer.
        if amount > locked.amount {
            return Err(StakelockError::AmountTooLarge.into());
        }

        locked.amount = locked
            .amount
            .checked_sub(amount)
            .ok_or(StakelockError::Underflow)?;
        locked.pack(&mut locked_ai.try_borrow_mut_data()?)?;

        // CPI transfer escrow -> user_token; the signer PDA authorizes by
        // re-supplying its creation seeds, not a stored key.
        let bump_seed = [signer_state.bump];
        let seeds: &[&[u8]] = &[pda::SEED_SIGNER, &bump_seed];
        let signer_seeds: &[&[&[u8]]] = &[seeds];

        Self::token_transfer(
            token_program_ai,
            escrow_ai,
            mint_ai,
            user_token_ai,
            signer_ai,
            signer_seeds,
            amount,
        )?;

        msg!("unstaked {}: locked balance {}", amount, locked.amount);

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Signer account must exist, be program-owned, and re-derive its own
    /// address from the stored bump.
    fn load_signer(
        program_id: &Pubkey,
        signer_ai: &AccountInfo,
    ) -> Result<SignerState, ProgramError> {
        if signer_ai.owner != program_id {
            return Err(StakelockError::SignerNotInitialized.into());
        }
        let signer_state = SignerState::unpack(&signer_ai.try_borrow_data()?)?;

        let expected =
            Pubkey::create_program_address(&[pda::SEED_SIGNER, &[signer_state.bump]], program_id)
                .map_err(|_| StakelockError::InvalidDerivation)?;
        if signer_ai.key != &expected {
            return Err(StakelockError::InvalidDerivation.into());
        }
        Ok(signer_state)
    }

    /// Locked record must be program-owned, bound to the signing user and the
    /// given mint, and re-derive its own address from the stored bump.
    /// Ownership is checked before derivation so signing for someone else's
    /// record surfaces as Unauthorized rather than a derivation mismatch.
    fn load_locked(
        program_id: &Pubkey,
        locked_ai: &AccountInfo,
        user: &Pubkey,
        signer_pda: &Pubkey,
        mint: &Pubkey,
    ) -> Result<LockedState, ProgramError> {
        if locked_ai.owner != program_id {
            return Err(StakelockError::InvalidDerivation.into());
        }
        let locked = LockedState::unpack(&locked_ai.try_borrow_data()?)?;

        if &locked.owner != user {
            return Err(StakelockError::Unauthorized.into());
        }
        if &locked.mint != mint {
            return Err(StakelockError::InvalidMint.into());
        }

        let expected = Pubkey::create_program_address(
            &[
                locked.owner.as_ref(),
                signer_pda.as_ref(),
                locked.mint.as_ref(),
                &[locked.bump],
            ],
            program_id,
        )
        .map_err(|_| StakelockError::InvalidDerivation)?;
        if locked_ai.key != &expected {
            return Err(StakelockError::InvalidDerivation.into());
        }
        Ok(locked)
    }

    /// Escrow must sit at the canonical ATA address for (signer PDA, mint),
    /// hold the expected mint, and have the signer PDA as its authority.
    fn validate_escrow(
        escrow_ai: &AccountInfo,
        signer_pda: &Pubkey,
        mint: &Pubkey,
    ) -> ProgramResult {
        let expected = pda::derive_escrow_address(signer_pda, mint);
        if escrow_ai.key != &expected {
            return Err(StakelockError::InvalidDerivation.into());
        }
        Self::validate_token_account_mint(escrow_ai, mint)?;
        Self::validate_token_account_authority(escrow_ai, signer_pda)?;
        Ok(())
    }

    fn validate_token_program(token_program_ai: &AccountInfo) -> ProgramResult {
        if token_program_ai.key != &spl_token::id() {
            return Err(StakelockError::InvalidTokenProgram.into());
        }
        Ok(())
    }

    fn validate_token_account_mint(token_ai: &AccountInfo, expected_mint: &Pubkey) -> ProgramResult {
        let ta = TokenAccount::unpack(&token_ai.try_borrow_data()?)?;
        if &ta.mint != expected_mint {
            return Err(StakelockError::InvalidMint.into());
        }
        Ok(())
    }

    fn validate_token_account_authority(
        token_ai: &AccountInfo,
        expected_authority: &Pubkey,
    ) -> ProgramResult {
        let ta = TokenAccount::unpack(&token_ai.try_borrow_data()?)?;
        // SPL token account "owner" field = authority
        if &ta.owner != expected_authority {
            return Err(StakelockError::InvalidAuthority.into());
        }
        Ok(())
    }

    fn token_transfer<'a>(
        token_program_ai: &AccountInfo<'a>,
        source_ai: &AccountInfo<'a>,
        mint_ai: &AccountInfo<'a>,
        dest_ai: &AccountInfo<'a>,
        authority_ai: &AccountInfo<'a>,
        signer_seeds: &[&[&[u8]]], // invoke_signed seeds if PDA
        amount: u64,
    ) -> ProgramResult {
        let mint = Mint::unpack(&mint_ai.try_borrow_data()?)?;

        let ix = spl_token::instruction::transfer_checked(
            token_program_ai.key,
            source_ai.key,
            mint_ai.key,
            dest_ai.key,
            authority_ai.key,
            &[] as &[&Pubkey],
            amount,
            mint.decimals,
        )?;

        let infos = [
            source_ai.clone(),
            mint_ai.clone(),
            dest_ai.clone(),
            authority_ai.clone(),
            token_program_ai.clone(),
        ];

        if signer_seeds.is_empty() {
            invoke(&ix, &infos)?;
        } else {
            invoke_signed(&ix, &infos, signer_seeds)?;
        }

        Ok(())
    }
}
