use coffer_common::codec::CodecError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use solana_program::program_error::ProgramError;
use std::convert::TryFrom;
use thiserror::Error;

use crate::proxy::ProxyError;

pub type CofferResult<T = ()> = Result<T, CofferError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CofferError {
    #[error(transparent)]
    ProgramError(#[from] ProgramError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    #[error("{0}")]
    ErrorCode(#[from] CofferErrorCode),
    #[error("{0}")]
    LendingErrorCode(#[from] LendingErrorCode),
    /// The code is outside every protocol-assigned range this client
    /// knows. Deliberately loud: a silent default would hide a protocol
    /// upgrade.
    #[error("unrecognized program error code {0}")]
    UnknownErrorCode(u32),
    /// Builder stub for an operation this client does not implement yet.
    /// Distinct from data errors so callers never mistake "not
    /// implemented" for "malformed".
    #[error("operation not supported by this client: {0}")]
    Unsupported(&'static str),
}

/// Error codes reported by the vault program itself.
#[derive(Error, Debug, IntoPrimitive, TryFromPrimitive, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CofferErrorCode {
    #[error("vault is paused")]
    VaultPaused = 6000,
    #[error("deposit exceeds vault capacity")]
    DepositCapExceeded,
    #[error("withdrawal amount exceeds redeemable shares")]
    InsufficientShares,
    #[error("signer is not the vault manager or delegate")]
    UnauthorizedSigner,
    #[error("asset is not in the vault allowlist")]
    AssetNotAllowed,
    #[error("share mint does not match vault state")]
    ShareMintMismatch,
    #[error("vault name exceeds the maximum length")]
    NameTooLong,
    #[error("arithmetic overflow in share math")]
    MathOverflow,
    #[error("escrow has not reached its release time")]
    EscrowNotReleasable,
    #[error("claim proof does not verify against the rewards root")]
    InvalidClaimProof,
}

impl CofferErrorCode {
    /// Total over the protocol-fixed code set; anything else is a hard
    /// failure, never a default variant.
    pub fn classify(code: u32) -> CofferResult<Self> {
        Self::try_from(code).map_err(|_| CofferError::UnknownErrorCode(code))
    }
}

/// Error codes reported by the integrated lending program. The protocol
/// assigns them in the 48000–52003 range.
#[derive(Error, Debug, IntoPrimitive, TryFromPrimitive, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LendingErrorCode {
    #[error("lending market is paused")]
    MarketPaused = 48000,
    #[error("reserve state is stale; refresh before use")]
    ReserveStale,
    #[error("deposit would exceed the reserve supply cap")]
    SupplyCapExceeded,
    #[error("withdrawal exceeds the available liquidity")]
    InsufficientLiquidity,
    #[error("collateral ratio below the liquidation threshold")]
    ObligationUnhealthy = 52000,
    #[error("borrow would exceed the obligation borrow limit")]
    BorrowLimitExceeded,
    #[error("repay amount exceeds the outstanding debt")]
    RepayTooLarge,
    #[error("liquidation would seize more collateral than allowed")]
    LiquidationTooLarge = 52003,
}

impl LendingErrorCode {
    pub fn classify(code: u32) -> CofferResult<Self> {
        Self::try_from(code).map_err(|_| CofferError::UnknownErrorCode(code))
    }
}
