// tests/006_initialize_locked_twice_rejected_pt.rs
#![forbid(unsafe_code)]

use borsh::BorshSerialize;
use solana_program::program_pack::Pack;
use solana_program_test::*;
use solana_sdk::{
    instruction::{AccountMeta, Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction, system_program,
    transaction::{Transaction, TransactionError},
};
use spl_token::state::Mint;

use stakelock::{
    error::StakelockError,
    instruction::StakelockInstruction,
    pda,
    state::LockedState,
};

async fn send_tx(ctx: &mut ProgramTestContext, ixs: Vec<Instruction>, extra_signers: &[&Keypair]) {
    let payer_pk = ctx.payer.pubkey();
    let mut tx = Transaction::new_with_payer(&ixs, Some(&payer_pk));
    let bh = ctx.banks_client.get_latest_blockhash().await.unwrap();

    let mut signers: Vec<&Keypair> = Vec::with_capacity(1 + extra_signers.len());
    signers.push(&ctx.payer);
    signers.extend_from_slice(extra_signers);

    tx.sign(&signers, bh);
    ctx.banks_client.process_transaction(tx).await.unwrap();
}

async fn send_expect_custom_err(
    ctx: &mut ProgramTestContext,
    ixs: Vec<Instruction>,
    extra_signers: &[&Keypair],
    expected_code: u32,
) {
    let payer_pk = ctx.payer.pubkey();
    let mut tx = Transaction::new_with_payer(&ixs, Some(&payer_pk));
    let bh = ctx.banks_client.get_latest_blockhash().await.unwrap();

    let mut signers: Vec<&Keypair> = Vec::with_capacity(1 + extra_signers.len());
    signers.push(&ctx.payer);
    signers.extend_from_slice(extra_signers);

    tx.sign(&signers, bh);
    let err = ctx.banks_client.process_transaction(tx).await.unwrap_err();
    match err {
        BanksClientError::TransactionError(TransactionError::InstructionError(
            _,
            InstructionError::Custom(code),
        )) => {
            assert_eq!(code, expected_code, "wrong custom error code");
        }
        _ => panic!("unexpected error: {:?}", err),
    }
}

// advance to a fresh bank so a repeated message gets a new blockhash
async fn advance_slot(ctx: &mut ProgramTestContext) {
    let c: solana_sdk::sysvar::clock::Clock = ctx.banks_client.get_sysvar().await.unwrap();
    ctx.warp_to_slot(c.slot + 2).unwrap();
}

async fn create_mint(ctx: &mut ProgramTestContext, mint_kp: &Keypair, mint_authority: &Pubkey) {
    let rent = ctx.banks_client.get_rent().await.unwrap();
    let space = Mint::LEN;
    let lamports = rent.minimum_balance(space);

    let create = system_instruction::create_account(
        &ctx.payer.pubkey(),
        &mint_kp.pubkey(),
        lamports,
        space as u64,
        &spl_token::id(),
    );

    let init = spl_token::instruction::initialize_mint(
        &spl_token::id(),
        &mint_kp.pubkey(),
        mint_authority,
        None,
        0,
    )
    .unwrap();

    send_tx(ctx, vec![create, init], &[mint_kp]).await;
}

fn mk_ix(program_id: Pubkey, data: Vec<u8>, metas: Vec<AccountMeta>) -> Instruction {
    Instruction { program_id, accounts: metas, data }
}

fn init_locked_ix(
    program_id: Pubkey,
    user: Pubkey,
    signer_pda: Pubkey,
    locked_pda: Pubkey,
    mint: Pubkey,
) -> Instruction {
    mk_ix(
        program_id,
        StakelockInstruction::InitializeLocked.try_to_vec().unwrap(),
        vec![
            AccountMeta::new(user, true),
            AccountMeta::new_readonly(signer_pda, false),
            AccountMeta::new(locked_pda, false),
            AccountMeta::new_readonly(mint, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

#[tokio::test]
async fn initialize_locked_twice_rejected() {
    let program_id = stakelock::id();

    let pt = ProgramTest::new(
        "stakelock",
        program_id,
        processor!(stakelock::entrypoint::process_instruction),
    );

    let mut ctx = pt.start_with_context().await;
    let user_pk = ctx.payer.pubkey();

    let (signer_pda, signer_bump) = pda::derive_signer_pda(&program_id).unwrap();

    let init_signer_ix = mk_ix(
        program_id,
        StakelockInstruction::InitializeSigner { bump: signer_bump }
            .try_to_vec()
            .unwrap(),
        vec![
            AccountMeta::new(user_pk, true),
            AccountMeta::new(signer_pda, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    );
    send_tx(&mut ctx, vec![init_signer_ix], &[]).await;

    let mint_kp = Keypair::new();
    let mint_auth = Keypair::new();
    create_mint(&mut ctx, &mint_kp, &mint_auth.pubkey()).await;

    let (locked_pda, _lb) =
        pda::derive_locked_pda(&program_id, &user_pk, &signer_pda, &mint_kp.pubkey()).unwrap();

    send_tx(
        &mut ctx,
        vec![init_locked_ix(program_id, user_pk, signer_pda, locked_pda, mint_kp.pubkey())],
        &[],
    )
    .await;

    let state_before = {
        let acc = ctx.banks_client.get_account(locked_pda).await.unwrap().unwrap();
        LockedState::unpack(&acc.data).unwrap()
    };
    assert_eq!(state_before.amount, 0);
    assert_eq!(state_before.owner, user_pk);
    assert_eq!(state_before.mint, mint_kp.pubkey());

    // same user, same record, new blockhash
    advance_slot(&mut ctx).await;

    send_expect_custom_err(
        &mut ctx,
        vec![init_locked_ix(program_id, user_pk, signer_pda, locked_pda, mint_kp.pubkey())],
        &[],
        StakelockError::AlreadyInitialized as u32,
    )
    .await;

    let state_after = {
        let acc = ctx.banks_client.get_account(locked_pda).await.unwrap().unwrap();
        LockedState::unpack(&acc.data).unwrap()
    };
    assert_eq!(state_after, state_before);
}
