//! Derivation of protocol-owned addresses. Pure functions over
//! `find_program_address`; no network round-trips.

use solana_program::pubkey::Pubkey;

/// Logical role a proxy slot resolves against the current vault context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultRole {
    /// The vault state account.
    Vault,
    /// The vault's signing authority PDA.
    Authority,
    /// The vault's escrow account.
    Escrow,
    /// The vault's metadata account.
    Metadata,
    /// The vault-owned token account for the given mint.
    AssetToken(Pubkey),
}

/// Addresses derived once per vault and reused across every builder and
/// remap call. Immutable after `derive`; safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultContext {
    pub program_id: Pubkey,
    /// The key the vault was created from; first seed of every derivation.
    pub base: Pubkey,
    pub vault: Pubkey,
    pub vault_bump: u8,
    pub authority: Pubkey,
    pub authority_bump: u8,
    pub escrow: Pubkey,
    pub escrow_bump: u8,
    pub metadata: Pubkey,
    pub metadata_bump: u8,
}

impl VaultContext {
    pub fn derive(program_id: &Pubkey, base: &Pubkey) -> Self {
        let (vault, vault_bump) =
            Pubkey::find_program_address(&[b"vault", base.as_ref()], program_id);
        let (authority, authority_bump) =
            Pubkey::find_program_address(&[b"authority", vault.as_ref()], program_id);
        let (escrow, escrow_bump) =
            Pubkey::find_program_address(&[b"escrow", vault.as_ref()], program_id);
        let (metadata, metadata_bump) =
            Pubkey::find_program_address(&[b"metadata", vault.as_ref()], program_id);
        VaultContext {
            program_id: *program_id,
            base: *base,
            vault,
            vault_bump,
            authority,
            authority_bump,
            escrow,
            escrow_bump,
            metadata,
            metadata_bump,
        }
    }

    /// The vault-owned token account for `mint`, with its bump nonce.
    pub fn asset_token(&self, mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[b"asset", self.vault.as_ref(), mint.as_ref()],
            &self.program_id,
        )
    }

    pub fn resolve(&self, role: &VaultRole) -> Pubkey {
        match role {
            VaultRole::Vault => self.vault,
            VaultRole::Authority => self.authority,
            VaultRole::Escrow => self.escrow,
            VaultRole::Metadata => self.metadata,
            VaultRole::AssetToken(mint) => self.asset_token(mint).0,
        }
    }
}
