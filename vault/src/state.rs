//! Account snapshot layouts for the vault program and the registry that
//! classifies a raw account blob by its discriminator.

use borsh::{BorshDeserialize, BorshSerialize};
use coffer_common::codec::{self, CodecResult};
use coffer_common::record::{peek_discriminator, Record};
use coffer_common::CodecError;
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use static_assertions::const_assert_eq;

pub const ACCOUNT_DISCRIMINATOR_WIDTH: usize = VaultAccount::DISCRIMINATOR.len();

const_assert_eq!(VaultAccount::DISCRIMINATOR.len(), 8);
const_assert_eq!(EscrowAccount::DISCRIMINATOR.len(), ACCOUNT_DISCRIMINATOR_WIDTH);
const_assert_eq!(
    StakeReceiptAccount::DISCRIMINATOR.len(),
    ACCOUNT_DISCRIMINATOR_WIDTH
);

/// One asset the vault holds: its mint and the vault-owned token account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetConfig {
    pub mint: Pubkey,
    pub token_account: Pubkey,
}

impl AssetConfig {
    pub const LEN: usize = 2 * codec::PUBKEY_LEN;

    fn read(data: &[u8], offset: usize) -> CodecResult<(Self, usize)> {
        codec::ensure(data, offset, Self::LEN)?;
        let mint = codec::read_pubkey(data, offset);
        let token_account = codec::read_pubkey(data, offset + codec::PUBKEY_LEN);
        Ok((
            AssetConfig {
                mint,
                token_account,
            },
            Self::LEN,
        ))
    }

    fn write(data: &mut [u8], offset: usize, value: &Self) -> usize {
        let mut off = offset + codec::write_pubkey(data, offset, &value.mint);
        off += codec::write_pubkey(data, off, &value.token_account);
        off - offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VaultAccount {
    pub manager: Pubkey,
    pub share_mint: Pubkey,
    pub name: String,
    pub management_fee_bps: u16,
    pub assets: Vec<AssetConfig>,
    pub delegate: Option<Pubkey>,
    pub paused: bool,
    pub authority_bump: u8,
}

impl Record for VaultAccount {
    const DISCRIMINATOR: &'static [u8] = &[0xd8, 0x10, 0x5f, 0xba, 0x26, 0x43, 0x99, 0x0e];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        let mut off = offset;
        codec::ensure(data, off, 2 * codec::PUBKEY_LEN)?;
        let manager = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let share_mint = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let (name, used) = codec::read_string(data, off)?;
        off += used;
        codec::ensure(data, off, 2)?;
        let management_fee_bps = codec::read_u16(data, off);
        off += 2;
        let (assets, used) = codec::read_vec(data, off, AssetConfig::read)?;
        off += used;
        let (delegate, used) = codec::read_option(data, off, codec::read_pubkey_elem)?;
        off += used;
        codec::ensure(data, off, 2)?;
        let paused = codec::read_bool(data, off);
        let authority_bump = codec::read_u8(data, off + 1);
        Ok(VaultAccount {
            manager,
            share_mint,
            name,
            management_fee_bps,
            assets,
            delegate,
            paused,
            authority_bump,
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_pubkey(data, offset, &self.manager);
        off += codec::write_pubkey(data, off, &self.share_mint);
        off += codec::write_string(data, off, &self.name);
        off += codec::write_u16(data, off, self.management_fee_bps);
        off += codec::write_vec(data, off, &self.assets, |d, o, v| AssetConfig::write(d, o, v));
        off += codec::write_option(data, off, self.delegate.as_ref(), |d, o, v| {
            codec::write_pubkey(d, o, v)
        });
        off += codec::write_bool(data, off, self.paused);
        off += codec::write_u8(data, off, self.authority_bump);
        off - offset
    }

    fn fields_len(&self) -> usize {
        2 * codec::PUBKEY_LEN
            + codec::len_string(&self.name)
            + 2
            + codec::len_vec(&self.assets, |_| AssetConfig::LEN)
            + codec::len_option(self.delegate.as_ref(), |_| codec::PUBKEY_LEN)
            + 1
            + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct EscrowAccount {
    pub vault: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub release_ts: i64,
    pub bump: u8,
}

impl Record for EscrowAccount {
    const DISCRIMINATOR: &'static [u8] = &[0x41, 0xc7, 0x2d, 0x68, 0xf0, 0x1b, 0x84, 0x35];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 2 * codec::PUBKEY_LEN + 8 + 8 + 1)?;
        let mut off = offset;
        let vault = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let beneficiary = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let amount = codec::read_u64(data, off);
        off += 8;
        let release_ts = codec::read_i64(data, off);
        off += 8;
        let bump = codec::read_u8(data, off);
        Ok(EscrowAccount {
            vault,
            beneficiary,
            amount,
            release_ts,
            bump,
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_pubkey(data, offset, &self.vault);
        off += codec::write_pubkey(data, off, &self.beneficiary);
        off += codec::write_u64(data, off, self.amount);
        off += codec::write_i64(data, off, self.release_ts);
        off += codec::write_u8(data, off, self.bump);
        off - offset
    }

    fn fields_len(&self) -> usize {
        2 * codec::PUBKEY_LEN + 8 + 8 + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeReceiptAccount {
    pub vault: Pubkey,
    pub stake_pool: Pubkey,
    pub staked_amount: u64,
    pub last_claim_ts: i64,
    pub bump: u8,
}

impl Record for StakeReceiptAccount {
    const DISCRIMINATOR: &'static [u8] = &[0x7a, 0x03, 0xe9, 0x50, 0xc2, 0x8e, 0x16, 0xbd];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 2 * codec::PUBKEY_LEN + 8 + 8 + 1)?;
        let mut off = offset;
        let vault = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let stake_pool = codec::read_pubkey(data, off);
        off += codec::PUBKEY_LEN;
        let staked_amount = codec::read_u64(data, off);
        off += 8;
        let last_claim_ts = codec::read_i64(data, off);
        off += 8;
        let bump = codec::read_u8(data, off);
        Ok(StakeReceiptAccount {
            vault,
            stake_pool,
            staked_amount,
            last_claim_ts,
            bump,
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_pubkey(data, offset, &self.vault);
        off += codec::write_pubkey(data, off, &self.stake_pool);
        off += codec::write_u64(data, off, self.staked_amount);
        off += codec::write_i64(data, off, self.last_claim_ts);
        off += codec::write_u8(data, off, self.bump);
        off - offset
    }

    fn fields_len(&self) -> usize {
        2 * codec::PUBKEY_LEN + 8 + 8 + 1
    }
}

/// Classification of a raw vault program account by its discriminator.
/// The set is closed; an unknown tag is an error, never a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountData {
    Vault(VaultAccount),
    Escrow(EscrowAccount),
    StakeReceipt(StakeReceiptAccount),
}

impl AccountData {
    pub fn read(data: &[u8]) -> CodecResult<Option<Self>> {
        let tag = match peek_discriminator(data, 0, ACCOUNT_DISCRIMINATOR_WIDTH)? {
            None => return Ok(None),
            Some(tag) => tag,
        };
        let off = ACCOUNT_DISCRIMINATOR_WIDTH;
        Ok(Some(match tag {
            t if t == VaultAccount::DISCRIMINATOR => {
                AccountData::Vault(VaultAccount::read_fields(data, off)?)
            }
            t if t == EscrowAccount::DISCRIMINATOR => {
                AccountData::Escrow(EscrowAccount::read_fields(data, off)?)
            }
            t if t == StakeReceiptAccount::DISCRIMINATOR => {
                AccountData::StakeReceipt(StakeReceiptAccount::read_fields(data, off)?)
            }
            t => return Err(CodecError::UnknownDiscriminator(t.to_vec())),
        }))
    }
}
