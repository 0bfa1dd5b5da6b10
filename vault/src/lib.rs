//! Client library for the Coffer vault protocol and its integrated
//! programs (lending, swap, staking, voting).
//!
//! Everything here is a pure, synchronous transformation over
//! caller-supplied buffers and account lists: instruction payload records
//! and account snapshots share one discriminator-tagged wire codec
//! (`coffer-common`), builders assemble ordered [`AccountMeta`] lists, and
//! the [`proxy::InstructionProxy`] rewrites an integration instruction into
//! the vault program's calling convention with vault-derived accounts.
//!
//! [`AccountMeta`]: solana_program::instruction::AccountMeta

pub mod address;
pub mod error;
pub mod instruction;
pub mod integrations;
pub mod proxy;
pub mod state;
