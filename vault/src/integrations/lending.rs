//! Client for the integrated lending program.

use borsh::{BorshDeserialize, BorshSerialize};
use coffer_common::codec::{self, CodecResult};
use coffer_common::record::Record;
use serde::{Deserialize, Serialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use static_assertions::const_assert_eq;

use crate::address::{VaultContext, VaultRole};
use crate::error::CofferResult;
use crate::instruction::token_program;
use crate::proxy::{DynamicAccount, InstructionProxy, ProxyError, StaticAccount};

/// Vault program discriminators for the proxied lending operations.
pub const PROXY_DEPOSIT_DISCRIMINATOR: &[u8] = &[0x83, 0x2c, 0x91, 0x07, 0x6e, 0xd4, 0x4b, 0xf8];
pub const PROXY_WITHDRAW_DISCRIMINATOR: &[u8] = &[0x1f, 0xb0, 0x58, 0xe3, 0xa2, 0x97, 0x0c, 0x64];

const_assert_eq!(DepositLiquidity::DISCRIMINATOR.len(), 8);
const_assert_eq!(WithdrawLiquidity::DISCRIMINATOR.len(), 8);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DepositLiquidity {
    pub amount: u64,
}

impl Record for DepositLiquidity {
    const DISCRIMINATOR: &'static [u8] = &[0xc9, 0x61, 0x1d, 0x88, 0x36, 0xfa, 0x4e, 0x70];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 8)?;
        Ok(DepositLiquidity {
            amount: codec::read_u64(data, offset),
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        codec::write_u64(data, offset, self.amount)
    }

    fn fields_len(&self) -> usize {
        8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct WithdrawLiquidity {
    pub amount: u64,
}

impl Record for WithdrawLiquidity {
    const DISCRIMINATOR: &'static [u8] = &[0x24, 0xd5, 0x73, 0x0f, 0x9a, 0x42, 0xbe, 0x11];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 8)?;
        Ok(WithdrawLiquidity {
            amount: codec::read_u64(data, offset),
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        codec::write_u64(data, offset, self.amount)
    }

    fn fields_len(&self) -> usize {
        8
    }
}

/// Lending obligation snapshot, read-only from this client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ObligationAccount {
    pub market: Pubkey,
    pub owner: Pubkey,
    pub deposited_amount: u64,
    pub borrowed_amount: u64,
}

impl Record for ObligationAccount {
    const DISCRIMINATOR: &'static [u8] = &[0x6b, 0xe2, 0x40, 0x97, 0x08, 0x5d, 0xc3, 0x2a];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 2 * codec::PUBKEY_LEN + 16)?;
        let mut off = offset;
        let market = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let owner = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let deposited_amount = codec::read_u64(data, off);
        let borrowed_amount = codec::read_u64(data, off + 8);
        Ok(ObligationAccount {
            market,
            owner,
            deposited_amount,
            borrowed_amount,
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_pubkey(data, offset, &self.market);
        off += codec::write_pubkey(data, off, &self.owner);
        off += codec::write_u64(data, off, self.deposited_amount);
        off += codec::write_u64(data, off, self.borrowed_amount);
        off - offset
    }

    fn fields_len(&self) -> usize {
        2 * codec::PUBKEY_LEN + 16
    }
}

/// Direct deposit into a lending reserve.
///
/// 0. `[]` lending market
/// 1. `[writable]` reserve
/// 2. `[writable]` reserve liquidity vault
/// 3. `[writable]` source token account
/// 4. `[signer]` transfer authority
/// 5. `[]` spl token program
pub fn deposit_liquidity(
    program_id: &Pubkey,
    market: &Pubkey,
    reserve: &Pubkey,
    reserve_liquidity_vault: &Pubkey,
    source_token: &Pubkey,
    transfer_authority: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let accounts = vec![
        AccountMeta::new_readonly(*market, false),
        AccountMeta::new(*reserve, false),
        AccountMeta::new(*reserve_liquidity_vault, false),
        AccountMeta::new(*source_token, false),
        AccountMeta::new_readonly(*transfer_authority, true),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: DepositLiquidity { amount }.pack(),
    })
}

/// Direct withdrawal from a lending reserve. Some markets require extra
/// price-oracle accounts; pass them in `remaining` and they are appended
/// after the declared list.
pub fn withdraw_liquidity(
    program_id: &Pubkey,
    market: &Pubkey,
    reserve: &Pubkey,
    reserve_liquidity_vault: &Pubkey,
    destination_token: &Pubkey,
    withdraw_authority: &Pubkey,
    amount: u64,
    remaining: &[AccountMeta],
) -> CofferResult<Instruction> {
    let mut accounts = vec![
        AccountMeta::new_readonly(*market, false),
        AccountMeta::new(*reserve, false),
        AccountMeta::new(*reserve_liquidity_vault, false),
        AccountMeta::new(*destination_token, false),
        AccountMeta::new_readonly(*withdraw_authority, true),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    accounts.extend(remaining.iter().cloned());
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: WithdrawLiquidity { amount }.pack(),
    })
}

/// Proxy that reroutes a direct lending deposit through the vault
/// program. Outer layout: vault, vault authority, lending program, then
/// the forwarded lending accounts; the user-side transfer authority is
/// dropped (the vault authority signs via CPI).
pub fn deposit_proxy(
    vault_program: &Pubkey,
    lending_program: &Pubkey,
) -> Result<InstructionProxy, ProxyError> {
    InstructionProxy::new(
        *vault_program,
        DepositLiquidity::DISCRIMINATOR,
        PROXY_DEPOSIT_DISCRIMINATOR,
        vec![
            DynamicAccount {
                role: VaultRole::Vault,
                target: 0,
                writable: true,
            },
            DynamicAccount {
                role: VaultRole::Authority,
                target: 1,
                writable: false,
            },
        ],
        vec![StaticAccount {
            target: 2,
            meta: AccountMeta::new_readonly(*lending_program, false),
        }],
        vec![Some(3), Some(4), Some(5), Some(6), None, Some(7)],
    )
}

pub fn withdraw_proxy(
    vault_program: &Pubkey,
    lending_program: &Pubkey,
) -> Result<InstructionProxy, ProxyError> {
    InstructionProxy::new(
        *vault_program,
        WithdrawLiquidity::DISCRIMINATOR,
        PROXY_WITHDRAW_DISCRIMINATOR,
        vec![
            DynamicAccount {
                role: VaultRole::Vault,
                target: 0,
                writable: true,
            },
            DynamicAccount {
                role: VaultRole::Authority,
                target: 1,
                writable: false,
            },
        ],
        vec![StaticAccount {
            target: 2,
            meta: AccountMeta::new_readonly(*lending_program, false),
        }],
        vec![Some(3), Some(4), Some(5), Some(6), None, Some(7)],
    )
}

/// Deposit vault-held liquidity into a lending reserve, issued by the
/// vault program on the vault's behalf.
pub fn proxied_deposit_liquidity(
    vault_program: &Pubkey,
    lending_program: &Pubkey,
    ctx: &VaultContext,
    market: &Pubkey,
    reserve: &Pubkey,
    reserve_liquidity_vault: &Pubkey,
    asset_mint: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let (source_token, _) = ctx.asset_token(asset_mint);
    let inner = deposit_liquidity(
        lending_program,
        market,
        reserve,
        reserve_liquidity_vault,
        &source_token,
        &ctx.authority,
        amount,
    )?;
    let proxy = deposit_proxy(vault_program, lending_program)?;
    Ok(proxy.remap(&inner, ctx))
}

pub fn proxied_withdraw_liquidity(
    vault_program: &Pubkey,
    lending_program: &Pubkey,
    ctx: &VaultContext,
    market: &Pubkey,
    reserve: &Pubkey,
    reserve_liquidity_vault: &Pubkey,
    asset_mint: &Pubkey,
    amount: u64,
    remaining: &[AccountMeta],
) -> CofferResult<Instruction> {
    let (destination_token, _) = ctx.asset_token(asset_mint);
    let inner = withdraw_liquidity(
        lending_program,
        market,
        reserve,
        reserve_liquidity_vault,
        &destination_token,
        &ctx.authority,
        amount,
        remaining,
    )?;
    let proxy = withdraw_proxy(vault_program, lending_program)?;
    Ok(proxy.remap(&inner, ctx))
}
