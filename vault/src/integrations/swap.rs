//! Client for the integrated swap program. The swap program is a legacy
//! native program with single-byte instruction tags; the proxy widens the
//! discriminator to the vault program's 8 bytes without re-encoding any
//! field.

use borsh::{BorshDeserialize, BorshSerialize};
use coffer_common::codec::{self, CodecResult};
use coffer_common::record::Record;
use serde::{Deserialize, Serialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;

use crate::address::{VaultContext, VaultRole};
use crate::error::CofferResult;
use crate::instruction::token_program;
use crate::proxy::{DynamicAccount, InstructionProxy, ProxyError, StaticAccount};

pub const PROXY_SWAP_DISCRIMINATOR: &[u8] = &[0x4d, 0x9f, 0x26, 0xc1, 0x88, 0x0a, 0xe7, 0x32];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SwapExactIn {
    pub amount_in: u64,
    pub minimum_amount_out: u64,
}

impl Record for SwapExactIn {
    const DISCRIMINATOR: &'static [u8] = &[0x01];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 16)?;
        Ok(SwapExactIn {
            amount_in: codec::read_u64(data, offset),
            minimum_amount_out: codec::read_u64(data, offset + 8),
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_u64(data, offset, self.amount_in);
        off += codec::write_u64(data, off, self.minimum_amount_out);
        off - offset
    }

    fn fields_len(&self) -> usize {
        16
    }
}

/// Direct exact-in swap.
///
/// 0. `[]` swap pool
/// 1. `[]` pool authority
/// 2. `[signer]` user transfer authority
/// 3. `[writable]` user source token
/// 4. `[writable]` user destination token
/// 5. `[writable]` pool source vault
/// 6. `[writable]` pool destination vault
/// 7. `[]` spl token program
pub fn swap_exact_in(
    program_id: &Pubkey,
    pool: &Pubkey,
    pool_authority: &Pubkey,
    user_transfer_authority: &Pubkey,
    user_source: &Pubkey,
    user_destination: &Pubkey,
    pool_source_vault: &Pubkey,
    pool_destination_vault: &Pubkey,
    amount_in: u64,
    minimum_amount_out: u64,
) -> CofferResult<Instruction> {
    let accounts = vec![
        AccountMeta::new_readonly(*pool, false),
        AccountMeta::new_readonly(*pool_authority, false),
        AccountMeta::new_readonly(*user_transfer_authority, true),
        AccountMeta::new(*user_source, false),
        AccountMeta::new(*user_destination, false),
        AccountMeta::new(*pool_source_vault, false),
        AccountMeta::new(*pool_destination_vault, false),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: SwapExactIn {
            amount_in,
            minimum_amount_out,
        }
        .pack(),
    })
}

/// Outer layout: vault, vault authority, swap program, then the forwarded
/// swap accounts with the user-side transfer authority dropped.
pub fn swap_proxy(
    vault_program: &Pubkey,
    swap_program: &Pubkey,
) -> Result<InstructionProxy, ProxyError> {
    InstructionProxy::new(
        *vault_program,
        SwapExactIn::DISCRIMINATOR,
        PROXY_SWAP_DISCRIMINATOR,
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
            meta: AccountMeta::new_readonly(*swap_program, false),
        }],
        vec![
            Some(3),
            Some(4),
            None,
            Some(5),
            Some(6),
            Some(7),
            Some(8),
            Some(9),
        ],
    )
}

/// Swap between two vault-held assets, issued by the vault program on the
/// vault's behalf.
pub fn proxied_swap_exact_in(
    vault_program: &Pubkey,
    swap_program: &Pubkey,
    ctx: &VaultContext,
    pool: &Pubkey,
    pool_authority: &Pubkey,
    pool_source_vault: &Pubkey,
    pool_destination_vault: &Pubkey,
    source_mint: &Pubkey,
    destination_mint: &Pubkey,
    amount_in: u64,
    minimum_amount_out: u64,
) -> CofferResult<Instruction> {
    let inner = swap_exact_in(
        swap_program,
        pool,
        pool_authority,
        &ctx.authority,
        &ctx.asset_token(source_mint).0,
        &ctx.asset_token(destination_mint).0,
        pool_source_vault,
        pool_destination_vault,
        amount_in,
        minimum_amount_out,
    )?;
    let proxy = swap_proxy(vault_program, swap_program)?;
    Ok(proxy.remap(&inner, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_to_wide_discriminator_grows_payload_by_the_difference() {
        let vault_program = Pubkey::new_unique();
        let swap_program = Pubkey::new_unique();
        let ctx = VaultContext::derive(&vault_program, &Pubkey::new_unique());

        let inner = swap_exact_in(
            &swap_program,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &ctx.authority,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            1_000,
            990,
        )
        .unwrap();
        assert_eq!(inner.data.len(), 1 + 16);

        let outer = swap_proxy(&vault_program, &swap_program)
            .unwrap()
            .remap(&inner, &ctx);
        assert_eq!(outer.data.len(), inner.data.len() + (8 - 1));
        assert_eq!(&outer.data[..8], PROXY_SWAP_DISCRIMINATOR);
        assert_eq!(&outer.data[8..], &inner.data[1..]);
    }

    #[test]
    fn proxied_swap_account_layout() {
        let vault_program = Pubkey::new_unique();
        let swap_program = Pubkey::new_unique();
        let ctx = VaultContext::derive(&vault_program, &Pubkey::new_unique());
        let pool = Pubkey::new_unique();
        let pool_authority = Pubkey::new_unique();
        let source_mint = Pubkey::new_unique();
        let destination_mint = Pubkey::new_unique();

        let ix = proxied_swap_exact_in(
            &vault_program,
            &swap_program,
            &ctx,
            &pool,
            &pool_authority,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &source_mint,
            &destination_mint,
            10,
            9,
        )
        .unwrap();

        // 2 dynamic + 1 static + 7 forwarded of the 8 inner accounts.
        assert_eq!(ix.accounts.len(), 10);
        assert_eq!(ix.accounts[0].pubkey, ctx.vault);
        assert_eq!(ix.accounts[1].pubkey, ctx.authority);
        assert_eq!(ix.accounts[2].pubkey, swap_program);
        assert_eq!(ix.accounts[3].pubkey, pool);
        assert_eq!(ix.accounts[4].pubkey, pool_authority);
        assert_eq!(ix.accounts[5].pubkey, ctx.asset_token(&source_mint).0);
        assert_eq!(ix.accounts[6].pubkey, ctx.asset_token(&destination_mint).0);
        assert_eq!(ix.accounts[9].pubkey, token_program::ID);
    }

    #[test]
    fn swap_record_round_trips() {
        let swap = SwapExactIn {
            amount_in: u64::MAX,
            minimum_amount_out: 1,
        };
        let bytes = swap.pack();
        assert_eq!(bytes.len(), swap.len());
        assert_eq!(bytes[0], 0x01);
        assert_eq!(SwapExactIn::read(&bytes, 0).unwrap(), Some(swap));
    }
}
