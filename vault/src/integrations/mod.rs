//! Clients for the programs the vault integrates with. Each module
//! carries the integration's instruction records, direct builders, and a
//! pre-validated [`crate::proxy::InstructionProxy`] that reroutes the
//! instruction through the vault program with vault-derived accounts.

pub mod lending;
pub mod staking;
pub mod swap;
pub mod voting;
