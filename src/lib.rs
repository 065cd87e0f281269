// ==============================
// src/lib.rs
// ==============================
#![deny(warnings)]
#![allow(unexpected_cfgs)]
#![forbid(unsafe_code)]

pub mod entrypoint;
pub mod error;
pub mod instruction;
pub mod pda;
pub mod processor;
pub mod state;

solana_program::declare_id!("82X9jUhf5wT8n3RvnDDhh7wYtPJPwTqFLUWTgaGLWkts");
