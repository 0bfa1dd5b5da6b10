//! Client for the integrated governance/voting program.

use borsh::{BorshDeserialize, BorshSerialize};
use coffer_common::codec::{self, CodecError, CodecResult};
use coffer_common::record::Record;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use static_assertions::const_assert_eq;
use std::convert::TryFrom;

use crate::address::{VaultContext, VaultRole};
use crate::error::CofferResult;
use crate::proxy::{DynamicAccount, InstructionProxy, ProxyError, StaticAccount};

pub const PROXY_CAST_VOTE_DISCRIMINATOR: &[u8] = &[0xba, 0x5e, 0x13, 0x7d, 0x40, 0x96, 0x2c, 0xe8];

const_assert_eq!(CastVote::DISCRIMINATOR.len(), 8);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum VoteSide {
    Approve = 0,
    Reject = 1,
    Abstain = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CastVote {
    pub side: VoteSide,
    pub weight: u64,
}

impl Record for CastVote {
    const DISCRIMINATOR: &'static [u8] = &[0x20, 0xc7, 0x6f, 0x09, 0xd4, 0x81, 0x3a, 0x52];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 1 + 8)?;
        let raw = codec::read_u8(data, offset);
        let side = VoteSide::try_from(raw).map_err(|_| CodecError::InvalidFieldValue {
            field: "side",
            value: raw as u64,
        })?;
        let weight = codec::read_u64(data, offset + 1);
        Ok(CastVote { side, weight })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        // The side index is declared one byte wide; the cast masks it.
        let mut off = offset + codec::write_u8(data, offset, self.side as u8);
        off += codec::write_u64(data, off, self.weight);
        off - offset
    }

    fn fields_len(&self) -> usize {
        1 + 8
    }
}

/// Direct vote on a proposal.
///
/// 0. `[writable]` proposal
/// 1. `[writable]` vote record
/// 2. `[signer]` voter
/// 3. `[]` governance config
pub fn cast_vote(
    program_id: &Pubkey,
    proposal: &Pubkey,
    vote_record: &Pubkey,
    voter: &Pubkey,
    governance_config: &Pubkey,
    side: VoteSide,
    weight: u64,
) -> CofferResult<Instruction> {
    let accounts = vec![
        AccountMeta::new(*proposal, false),
        AccountMeta::new(*vote_record, false),
        AccountMeta::new_readonly(*voter, true),
        AccountMeta::new_readonly(*governance_config, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: CastVote { side, weight }.pack(),
    })
}

/// Outer layout: vault, vault authority, governance program, then the
/// forwarded proposal accounts with the user-side voter dropped.
pub fn cast_vote_proxy(
    vault_program: &Pubkey,
    governance_program: &Pubkey,
) -> Result<InstructionProxy, ProxyError> {
    InstructionProxy::new(
        *vault_program,
        CastVote::DISCRIMINATOR,
        PROXY_CAST_VOTE_DISCRIMINATOR,
        vec![
            DynamicAccount {
                role: VaultRole::Vault,
                target: 0,
                writable: false,
            },
            DynamicAccount {
                role: VaultRole::Authority,
                target: 1,
                writable: false,
            },
        ],
        vec![StaticAccount {
            target: 2,
            meta: AccountMeta::new_readonly(*governance_program, false),
        }],
        vec![Some(3), Some(4), None, Some(5)],
    )
}

/// Vote with the vault's governance power, issued by the vault program on
/// the vault's behalf.
pub fn proxied_cast_vote(
    vault_program: &Pubkey,
    governance_program: &Pubkey,
    ctx: &VaultContext,
    proposal: &Pubkey,
    vote_record: &Pubkey,
    governance_config: &Pubkey,
    side: VoteSide,
    weight: u64,
) -> CofferResult<Instruction> {
    let inner = cast_vote(
        governance_program,
        proposal,
        vote_record,
        &ctx.authority,
        governance_config,
        side,
        weight,
    )?;
    let proxy = cast_vote_proxy(vault_program, governance_program)?;
    Ok(proxy.remap(&inner, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_vote_round_trips_each_side() {
        for side in [VoteSide::Approve, VoteSide::Reject, VoteSide::Abstain] {
            let vote = CastVote { side, weight: 12 };
            let bytes = vote.pack();
            assert_eq!(bytes.len(), vote.len());
            assert_eq!(bytes[8], side as u8);
            assert_eq!(CastVote::read(&bytes, 0).unwrap(), Some(vote));
        }
    }

    #[test]
    fn out_of_range_side_is_a_field_error() {
        let mut bytes = CastVote {
            side: VoteSide::Approve,
            weight: 1,
        }
        .pack();
        bytes[8] = 9;
        assert_eq!(
            CastVote::read(&bytes, 0),
            Err(CodecError::InvalidFieldValue {
                field: "side",
                value: 9,
            }),
        );
    }

    #[test]
    fn proxied_vote_account_layout() {
        let vault_program = Pubkey::new_unique();
        let governance_program = Pubkey::new_unique();
        let ctx = VaultContext::derive(&vault_program, &Pubkey::new_unique());
        let proposal = Pubkey::new_unique();
        let vote_record = Pubkey::new_unique();
        let config = Pubkey::new_unique();

        let ix = proxied_cast_vote(
            &vault_program,
            &governance_program,
            &ctx,
            &proposal,
            &vote_record,
            &config,
            VoteSide::Reject,
            3,
        )
        .unwrap();

        // 2 dynamic + 1 static + 3 forwarded of the 4 inner accounts.
        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[0].pubkey, ctx.vault);
        assert_eq!(ix.accounts[1].pubkey, ctx.authority);
        assert_eq!(ix.accounts[2].pubkey, governance_program);
        assert_eq!(ix.accounts[3].pubkey, proposal);
        assert_eq!(ix.accounts[4].pubkey, vote_record);
        assert_eq!(ix.accounts[5].pubkey, config);
        assert_eq!(&ix.data[..8], PROXY_CAST_VOTE_DISCRIMINATOR);
        assert_eq!(ix.data[8], VoteSide::Reject as u8);
    }
}
