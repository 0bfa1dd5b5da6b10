//! Client for the integrated staking program.

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

pub const PROXY_STAKE_DISCRIMINATOR: &[u8] = &[0x72, 0x18, 0xd0, 0x4b, 0x3e, 0xa9, 0x65, 0xcf];
pub const PROXY_UNSTAKE_DISCRIMINATOR: &[u8] = &[0x0c, 0xe4, 0x8b, 0x52, 0xf7, 0x31, 0x9a, 0x06];

const_assert_eq!(Stake::DISCRIMINATOR.len(), 8);
const_assert_eq!(Unstake::DISCRIMINATOR.len(), 8);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Stake {
    pub amount: u64,
}

impl Record for Stake {
    const DISCRIMINATOR: &'static [u8] = &[0xe1, 0x4a, 0x92, 0x07, 0x5b, 0xc8, 0x3d, 0x66];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 8)?;
        Ok(Stake {
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
pub struct Unstake {
    pub amount: u64,
}

impl Record for Unstake {
    const DISCRIMINATOR: &'static [u8] = &[0x39, 0xbc, 0x07, 0xd1, 0x60, 0x2f, 0x58, 0xe4];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 8)?;
        Ok(Unstake {
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

/// Direct stake into a pool.
///
/// 0. `[writable]` stake pool
/// 1. `[writable]` pool token vault
/// 2. `[writable]` user token account
/// 3. `[signer]` user authority
/// 4. `[]` spl token program
pub fn stake(
    program_id: &Pubkey,
    stake_pool: &Pubkey,
    pool_token_vault: &Pubkey,
    user_token: &Pubkey,
    user_authority: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*stake_pool, false),
        AccountMeta::new(*pool_token_vault, false),
        AccountMeta::new(*user_token, false),
        AccountMeta::new_readonly(*user_authority, true),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: Stake { amount }.pack(),
    })
}

pub fn unstake(
    program_id: &Pubkey,
    stake_pool: &Pubkey,
    pool_token_vault: &Pubkey,
    user_token: &Pubkey,
    user_authority: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*stake_pool, false),
        AccountMeta::new(*pool_token_vault, false),
        AccountMeta::new(*user_token, false),
        AccountMeta::new_readonly(*user_authority, true),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: Unstake { amount }.pack(),
    })
}

/// Outer layout: vault, vault authority, staking program, stake pool,
/// pool token vault, vault asset token, spl token program. Both user-side
/// accounts of the direct instruction are dropped; the vault-owned token
/// account for `asset_mint` takes the user token slot.
fn staking_proxy(
    vault_program: &Pubkey,
    staking_program: &Pubkey,
    asset_mint: &Pubkey,
    inner_discriminator: &'static [u8],
    outer_discriminator: &'static [u8],
) -> Result<InstructionProxy, ProxyError> {
    InstructionProxy::new(
        *vault_program,
        inner_discriminator,
        outer_discriminator,
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
            DynamicAccount {
                role: VaultRole::AssetToken(*asset_mint),
                target: 5,
                writable: true,
            },
        ],
        vec![StaticAccount {
            target: 2,
            meta: AccountMeta::new_readonly(*staking_program, false),
        }],
        vec![Some(3), Some(4), None, None, Some(6)],
    )
}

pub fn stake_proxy(
    vault_program: &Pubkey,
    staking_program: &Pubkey,
    asset_mint: &Pubkey,
) -> Result<InstructionProxy, ProxyError> {
    staking_proxy(
        vault_program,
        staking_program,
        asset_mint,
        Stake::DISCRIMINATOR,
        PROXY_STAKE_DISCRIMINATOR,
    )
}

pub fn unstake_proxy(
    vault_program: &Pubkey,
    staking_program: &Pubkey,
    asset_mint: &Pubkey,
) -> Result<InstructionProxy, ProxyError> {
    staking_proxy(
        vault_program,
        staking_program,
        asset_mint,
        Unstake::DISCRIMINATOR,
        PROXY_UNSTAKE_DISCRIMINATOR,
    )
}

pub fn proxied_stake(
    vault_program: &Pubkey,
    staking_program: &Pubkey,
    ctx: &VaultContext,
    stake_pool: &Pubkey,
    pool_token_vault: &Pubkey,
    asset_mint: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let inner = stake(
        staking_program,
        stake_pool,
        pool_token_vault,
        &ctx.asset_token(asset_mint).0,
        &ctx.authority,
        amount,
    )?;
    let proxy = stake_proxy(vault_program, staking_program, asset_mint)?;
    Ok(proxy.remap(&inner, ctx))
}

pub fn proxied_unstake(
    vault_program: &Pubkey,
    staking_program: &Pubkey,
    ctx: &VaultContext,
    stake_pool: &Pubkey,
    pool_token_vault: &Pubkey,
    asset_mint: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let inner = unstake(
        staking_program,
        stake_pool,
        pool_token_vault,
        &ctx.asset_token(asset_mint).0,
        &ctx.authority,
        amount,
    )?;
    let proxy = unstake_proxy(vault_program, staking_program, asset_mint)?;
    Ok(proxy.remap(&inner, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxied_stake_resolves_the_per_asset_token_slot() {
        let vault_program = Pubkey::new_unique();
        let staking_program = Pubkey::new_unique();
        let ctx = VaultContext::derive(&vault_program, &Pubkey::new_unique());
        let stake_pool = Pubkey::new_unique();
        let pool_token_vault = Pubkey::new_unique();
        let asset_mint = Pubkey::new_unique();

        let ix = proxied_stake(
            &vault_program,
            &staking_program,
            &ctx,
            &stake_pool,
            &pool_token_vault,
            &asset_mint,
            777,
        )
        .unwrap();

        // 3 dynamic + 1 static + 3 forwarded of the 5 inner accounts.
        assert_eq!(ix.accounts.len(), 7);
        assert_eq!(ix.accounts[0].pubkey, ctx.vault);
        assert_eq!(ix.accounts[1].pubkey, ctx.authority);
        assert_eq!(ix.accounts[2].pubkey, staking_program);
        assert_eq!(ix.accounts[3].pubkey, stake_pool);
        assert_eq!(ix.accounts[4].pubkey, pool_token_vault);
        assert_eq!(ix.accounts[5].pubkey, ctx.asset_token(&asset_mint).0);
        assert!(ix.accounts[5].is_writable);
        assert_eq!(ix.accounts[6].pubkey, token_program::ID);

        assert_eq!(&ix.data[..8], PROXY_STAKE_DISCRIMINATOR);
        assert_eq!(&ix.data[8..], &777u64.to_le_bytes());
    }

    #[test]
    fn stake_and_unstake_discriminators_stay_distinct() {
        let bytes = Stake { amount: 3 }.pack();
        assert!(Unstake::read(&bytes, 0).is_err());
        assert_eq!(Stake::read(&bytes, 0).unwrap(), Some(Stake { amount: 3 }));
    }
}
