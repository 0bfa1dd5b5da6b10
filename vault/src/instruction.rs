//! Instruction payload records and builders for the vault program.
//!
//! Every payload is a [`Record`]: an 8-byte protocol-assigned
//! discriminator followed by fields in declaration order. Builders return
//! a fully formed [`Instruction`] with the ordered account list; account
//! position, not name, is the program's ABI.

use borsh::{BorshDeserialize, BorshSerialize};
use coffer_common::codec::{self, CodecResult};
use coffer_common::record::{peek_discriminator, Record};
use coffer_common::CodecError;
use serde::{Deserialize, Serialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::system_program;
use solana_program::sysvar::rent;
use static_assertions::const_assert_eq;

use crate::error::{CofferError, CofferResult};

pub mod token_program {
    use solana_program::declare_id;
    declare_id!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
}

/// Width shared by every vault program discriminator. Always read the
/// width from a record's `DISCRIMINATOR.len()`; this constant exists only
/// for the dispatch in [`VaultInstruction::unpack`].
pub const DISCRIMINATOR_WIDTH: usize = InitializeVault::DISCRIMINATOR.len();

const_assert_eq!(InitializeVault::DISCRIMINATOR.len(), 8);
const_assert_eq!(Deposit::DISCRIMINATOR.len(), DISCRIMINATOR_WIDTH);
const_assert_eq!(Withdraw::DISCRIMINATOR.len(), DISCRIMINATOR_WIDTH);
const_assert_eq!(SetDelegate::DISCRIMINATOR.len(), DISCRIMINATOR_WIDTH);
const_assert_eq!(UpdateWhitelist::DISCRIMINATOR.len(), DISCRIMINATOR_WIDTH);
const_assert_eq!(ClaimRewards::DISCRIMINATOR.len(), DISCRIMINATOR_WIDTH);
const_assert_eq!(CLOSE_VAULT_DISCRIMINATOR.len(), DISCRIMINATOR_WIDTH);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct InitializeVault {
    pub name: String,
    pub management_fee_bps: u16,
}

impl Record for InitializeVault {
    const DISCRIMINATOR: &'static [u8] = &[0x30, 0x9d, 0x61, 0xf2, 0x4e, 0xb1, 0x8a, 0x27];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        let mut off = offset;
        let (name, used) = codec::read_string(data, off)?;
        off += used;
        codec::ensure(data, off, 2)?;
        let management_fee_bps = codec::read_u16(data, off);
        Ok(InitializeVault {
            name,
            management_fee_bps,
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_string(data, offset, &self.name);
        off += codec::write_u16(data, off, self.management_fee_bps);
        off - offset
    }

    fn fields_len(&self) -> usize {
        codec::len_string(&self.name) + 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Deposit {
    pub amount: u64,
}

impl Record for Deposit {
    const DISCRIMINATOR: &'static [u8] = &[0xf2, 0x23, 0xc6, 0x89, 0x52, 0xe1, 0xf2, 0xb6];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 8)?;
        Ok(Deposit {
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
pub struct Withdraw {
    pub shares: u64,
}

impl Record for Withdraw {
    const DISCRIMINATOR: &'static [u8] = &[0xb7, 0x12, 0x46, 0x9c, 0x94, 0x6d, 0xa1, 0x22];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        codec::ensure(data, offset, 8)?;
        Ok(Withdraw {
            shares: codec::read_u64(data, offset),
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        codec::write_u64(data, offset, self.shares)
    }

    fn fields_len(&self) -> usize {
        8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SetDelegate {
    pub delegate: Option<Pubkey>,
}

impl Record for SetDelegate {
    const DISCRIMINATOR: &'static [u8] = &[0x55, 0x0e, 0x27, 0x8b, 0x3f, 0xc4, 0x19, 0xd0];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        let (delegate, _) = codec::read_option(data, offset, codec::read_pubkey_elem)?;
        Ok(SetDelegate { delegate })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        codec::write_option(data, offset, self.delegate.as_ref(), |d, o, v| {
            codec::write_pubkey(d, o, v)
        })
    }

    fn fields_len(&self) -> usize {
        codec::len_option(self.delegate.as_ref(), |_| codec::PUBKEY_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UpdateWhitelist {
    pub keys: Vec<Pubkey>,
}

impl Record for UpdateWhitelist {
    const DISCRIMINATOR: &'static [u8] = &[0x01, 0x77, 0xae, 0x5d, 0xcb, 0x09, 0x64, 0x93];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        let (keys, _) = codec::read_vec(data, offset, codec::read_pubkey_elem)?;
        Ok(UpdateWhitelist { keys })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        codec::write_vec(data, offset, &self.keys, |d, o, v| {
            codec::write_pubkey(d, o, v)
        })
    }

    fn fields_len(&self) -> usize {
        codec::len_vec(&self.keys, |_| codec::PUBKEY_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ClaimRewards {
    pub index: u32,
    pub amount: u64,
    /// Merkle proof nodes, leaf to root.
    pub proof: Vec<[u8; 32]>,
}

impl Record for ClaimRewards {
    const DISCRIMINATOR: &'static [u8] = &[0x9e, 0x5a, 0x0b, 0xf4, 0x71, 0x3d, 0xd8, 0x46];

    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self> {
        let mut off = offset;
        codec::ensure(data, off, 4 + 8)?;
        let index = codec::read_u32(data, off);
        off += 4;
        let amount = codec::read_u64(data, off);
        off += 8;
        let (proof, _) = codec::read_vec(data, off, codec::read_array32_elem)?;
        Ok(ClaimRewards {
            index,
            amount,
            proof,
        })
    }

    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_u32(data, offset, self.index);
        off += codec::write_u64(data, off, self.amount);
        off += codec::write_vec(data, off, &self.proof, |d, o, v| codec::write_bytes(d, o, v));
        off - offset
    }

    fn fields_len(&self) -> usize {
        4 + 8 + codec::len_vec(&self.proof, |_| 32)
    }
}

pub const CLOSE_VAULT_DISCRIMINATOR: &[u8] = &[0xe6, 0x8c, 0x35, 0x1a, 0x02, 0xbf, 0x7c, 0x59];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultInstruction {
    /// 0. `[writable]` vault
    /// 1. `[signer, writable]` manager (pays rent)
    /// 2. `[writable]` share mint
    /// 3. `[]` system program
    /// 4. `[]` rent sysvar
    InitializeVault(InitializeVault),
    /// 0. `[writable]` vault
    /// 1. `[writable]` share mint
    /// 2. `[writable]` depositor asset token
    /// 3. `[writable]` vault asset token
    /// 4. `[writable]` depositor share token
    /// 5. `[signer]` depositor
    /// 6. `[]` spl token program
    Deposit(Deposit),
    /// Same account list as `Deposit`, with the token flow reversed.
    Withdraw(Withdraw),
    /// 0. `[writable]` vault
    /// 1. `[signer]` manager
    SetDelegate(SetDelegate),
    /// 0. `[writable]` vault
    /// 1. `[signer]` manager
    UpdateWhitelist(UpdateWhitelist),
    /// 0. `[writable]` vault
    /// 1. `[writable]` escrow
    /// 2. `[]` rewards distributor
    /// 3. `[]` vault authority
    ClaimRewards(ClaimRewards),
    /// 0. `[writable]` vault
    /// 1. `[signer]` manager
    /// 2. `[writable]` rent receiver
    CloseVault,
}

impl VaultInstruction {
    pub fn pack(&self) -> Vec<u8> {
        match self {
            VaultInstruction::InitializeVault(ix) => ix.pack(),
            VaultInstruction::Deposit(ix) => ix.pack(),
            VaultInstruction::Withdraw(ix) => ix.pack(),
            VaultInstruction::SetDelegate(ix) => ix.pack(),
            VaultInstruction::UpdateWhitelist(ix) => ix.pack(),
            VaultInstruction::ClaimRewards(ix) => ix.pack(),
            VaultInstruction::CloseVault => CLOSE_VAULT_DISCRIMINATOR.to_vec(),
        }
    }

    /// Three-valued: `Ok(None)` on empty input, `Err` on a truncated
    /// buffer or a discriminator no vault instruction carries.
    pub fn unpack(data: &[u8]) -> CodecResult<Option<Self>> {
        let tag = match peek_discriminator(data, 0, DISCRIMINATOR_WIDTH)? {
            None => return Ok(None),
            Some(tag) => tag,
        };
        let off = DISCRIMINATOR_WIDTH;
        Ok(Some(match tag {
            t if t == InitializeVault::DISCRIMINATOR => {
                VaultInstruction::InitializeVault(InitializeVault::read_fields(data, off)?)
            }
            t if t == Deposit::DISCRIMINATOR => {
                VaultInstruction::Deposit(Deposit::read_fields(data, off)?)
            }
            t if t == Withdraw::DISCRIMINATOR => {
                VaultInstruction::Withdraw(Withdraw::read_fields(data, off)?)
            }
            t if t == SetDelegate::DISCRIMINATOR => {
                VaultInstruction::SetDelegate(SetDelegate::read_fields(data, off)?)
            }
            t if t == UpdateWhitelist::DISCRIMINATOR => {
                VaultInstruction::UpdateWhitelist(UpdateWhitelist::read_fields(data, off)?)
            }
            t if t == ClaimRewards::DISCRIMINATOR => {
                VaultInstruction::ClaimRewards(ClaimRewards::read_fields(data, off)?)
            }
            t if t == CLOSE_VAULT_DISCRIMINATOR => VaultInstruction::CloseVault,
            t => return Err(CodecError::UnknownDiscriminator(t.to_vec())),
        }))
    }
}

pub fn initialize_vault(
    program_id: &Pubkey,
    vault: &Pubkey,
    manager: &Pubkey,
    share_mint: &Pubkey,
    name: String,
    management_fee_bps: u16,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::InitializeVault(InitializeVault {
        name,
        management_fee_bps,
    })
    .pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new(*manager, true),
        AccountMeta::new(*share_mint, false),
        AccountMeta::new_readonly(system_program::ID, false),
        AccountMeta::new_readonly(rent::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn deposit(
    program_id: &Pubkey,
    vault: &Pubkey,
    share_mint: &Pubkey,
    depositor_asset_token: &Pubkey,
    vault_asset_token: &Pubkey,
    depositor_share_token: &Pubkey,
    depositor: &Pubkey,
    amount: u64,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::Deposit(Deposit { amount }).pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new(*share_mint, false),
        AccountMeta::new(*depositor_asset_token, false),
        AccountMeta::new(*vault_asset_token, false),
        AccountMeta::new(*depositor_share_token, false),
        AccountMeta::new_readonly(*depositor, true),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn withdraw(
    program_id: &Pubkey,
    vault: &Pubkey,
    share_mint: &Pubkey,
    depositor_asset_token: &Pubkey,
    vault_asset_token: &Pubkey,
    depositor_share_token: &Pubkey,
    depositor: &Pubkey,
    shares: u64,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::Withdraw(Withdraw { shares }).pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new(*share_mint, false),
        AccountMeta::new(*depositor_asset_token, false),
        AccountMeta::new(*vault_asset_token, false),
        AccountMeta::new(*depositor_share_token, false),
        AccountMeta::new_readonly(*depositor, true),
        AccountMeta::new_readonly(token_program::ID, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn set_delegate(
    program_id: &Pubkey,
    vault: &Pubkey,
    manager: &Pubkey,
    delegate: Option<Pubkey>,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::SetDelegate(SetDelegate { delegate }).pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new_readonly(*manager, true),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn update_whitelist(
    program_id: &Pubkey,
    vault: &Pubkey,
    manager: &Pubkey,
    keys: Vec<Pubkey>,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::UpdateWhitelist(UpdateWhitelist { keys }).pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new_readonly(*manager, true),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn claim_rewards(
    program_id: &Pubkey,
    vault: &Pubkey,
    escrow: &Pubkey,
    distributor: &Pubkey,
    vault_authority: &Pubkey,
    index: u32,
    amount: u64,
    proof: Vec<[u8; 32]>,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::ClaimRewards(ClaimRewards {
        index,
        amount,
        proof,
    })
    .pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new(*escrow, false),
        AccountMeta::new_readonly(*distributor, false),
        AccountMeta::new_readonly(*vault_authority, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn close_vault(
    program_id: &Pubkey,
    vault: &Pubkey,
    manager: &Pubkey,
    rent_receiver: &Pubkey,
) -> CofferResult<Instruction> {
    let data = VaultInstruction::CloseVault.pack();
    let accounts = vec![
        AccountMeta::new(*vault, false),
        AccountMeta::new_readonly(*manager, true),
        AccountMeta::new(*rent_receiver, false),
    ];
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Migration of a vault to a new program version. Not wired up in this
/// client yet; the on-chain handler shipped behind a feature gate and the
/// account layout is still settling.
pub fn emergency_migrate(
    _program_id: &Pubkey,
    _vault: &Pubkey,
    _manager: &Pubkey,
) -> CofferResult<Instruction> {
    Err(CofferError::Unsupported("emergency_migrate"))
}
