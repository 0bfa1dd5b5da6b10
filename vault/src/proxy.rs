//! Rewrites an instruction built for an integrated program into the vault
//! program's calling convention: the discriminator is replaced, a fixed set
//! of slots is filled with vault-derived or constant accounts, the rest of
//! the inner account list is forwarded positionally, and trailing extras
//! are appended unchanged.
//!
//! A proxy is configuration-as-data: plain immutable descriptor lists,
//! validated once at construction and reused across many remap calls. The
//! remap itself is pure byte/array manipulation and cannot fail.

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use thiserror::Error;

use crate::address::{VaultContext, VaultRole};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("outer slot {0} assigned more than once")]
    DuplicateTargetSlot(usize),
    #[error("outer slot {slot} out of range; fixed outer account list has {len} slots")]
    TargetSlotOutOfRange { slot: usize, len: usize },
    #[error("outer slot {0} never assigned by any descriptor or index-map entry")]
    UnassignedSlot(usize),
    #[error("discriminator must not be empty")]
    EmptyDiscriminator,
}

/// "Slot `target` of the outer account list is filled by resolving `role`
/// against the vault context, marked writable as configured."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicAccount {
    pub role: VaultRole,
    pub target: usize,
    pub writable: bool,
}

/// A constant account reference bound to an outer slot, e.g. the wrapped
/// program itself or a sysvar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAccount {
    pub target: usize,
    pub meta: AccountMeta,
}

#[derive(Debug, Clone)]
pub struct InstructionProxy {
    outer_program: Pubkey,
    inner_discriminator: &'static [u8],
    outer_discriminator: &'static [u8],
    dynamic: Vec<DynamicAccount>,
    fixed: Vec<StaticAccount>,
    /// Inner slot -> outer slot. `None` drops the inner account. Inner
    /// accounts beyond this map's length are forwarded to the tail of the
    /// outer list in their original order.
    index_map: Vec<Option<usize>>,
}

impl InstructionProxy {
    /// Validates the configuration eagerly: every slot of the fixed outer
    /// region must be assigned exactly once across the dynamic
    /// descriptors, static descriptors and non-dropped index-map entries.
    /// Misconfiguration is a programming error caught here, never at remap
    /// time.
    pub fn new(
        outer_program: Pubkey,
        inner_discriminator: &'static [u8],
        outer_discriminator: &'static [u8],
        dynamic: Vec<DynamicAccount>,
        fixed: Vec<StaticAccount>,
        index_map: Vec<Option<usize>>,
    ) -> Result<Self, ProxyError> {
        if inner_discriminator.is_empty() || outer_discriminator.is_empty() {
            return Err(ProxyError::EmptyDiscriminator);
        }
        let forwarded = index_map.iter().flatten().count();
        let fixed_len = dynamic.len() + fixed.len() + forwarded;
        let mut assigned = vec![false; fixed_len];
        let targets = dynamic
            .iter()
            .map(|d| d.target)
            .chain(fixed.iter().map(|s| s.target))
            .chain(index_map.iter().flatten().copied());
        for slot in targets {
            if slot >= fixed_len {
                return Err(ProxyError::TargetSlotOutOfRange {
                    slot,
                    len: fixed_len,
                });
            }
            if assigned[slot] {
                return Err(ProxyError::DuplicateTargetSlot(slot));
            }
            assigned[slot] = true;
        }
        if let Some(slot) = assigned.iter().position(|used| !used) {
            return Err(ProxyError::UnassignedSlot(slot));
        }
        Ok(InstructionProxy {
            outer_program,
            inner_discriminator,
            outer_discriminator,
            dynamic,
            fixed,
            index_map,
        })
    }

    /// Outer account-list length for an inner instruction carrying
    /// `inner_accounts` accounts.
    pub fn outer_len(&self, inner_accounts: usize) -> usize {
        let forwarded = self.index_map.iter().flatten().count();
        let extras = inner_accounts.saturating_sub(self.index_map.len());
        self.dynamic.len() + self.fixed.len() + forwarded + extras
    }

    /// Produces the outer instruction. Pure and allocation-fresh per call;
    /// concurrent remaps never interfere.
    ///
    /// The inner instruction must carry at least `index_map.len()`
    /// accounts and begin with the configured inner discriminator; both
    /// are guaranteed by the generated builders and asserted here.
    pub fn remap(&self, inner: &Instruction, ctx: &VaultContext) -> Instruction {
        assert!(
            inner.accounts.len() >= self.index_map.len(),
            "inner instruction carries fewer accounts than the proxy index map",
        );
        debug_assert_eq!(
            &inner.data[..self.inner_discriminator.len()],
            self.inner_discriminator,
        );

        let forwarded = self.index_map.iter().flatten().count();
        let fixed_len = self.dynamic.len() + self.fixed.len() + forwarded;

        let mut slots: Vec<Option<AccountMeta>> = vec![None; fixed_len];
        for desc in &self.dynamic {
            let key = ctx.resolve(&desc.role);
            slots[desc.target] = Some(if desc.writable {
                AccountMeta::new(key, false)
            } else {
                AccountMeta::new_readonly(key, false)
            });
        }
        for desc in &self.fixed {
            slots[desc.target] = Some(desc.meta.clone());
        }
        // Forwarded accounts keep whatever signer/writable flags the inner
        // builder assigned; only identity and position are remapped.
        for (inner_slot, target) in self.index_map.iter().enumerate() {
            if let Some(outer_slot) = target {
                slots[*outer_slot] = Some(inner.accounts[inner_slot].clone());
            }
        }

        let extras = &inner.accounts[self.index_map.len()..];
        let mut accounts = Vec::with_capacity(fixed_len + extras.len());
        accounts.extend(
            slots
                .into_iter()
                .map(|slot| slot.expect("validated proxy left a slot unassigned")),
        );
        accounts.extend(extras.iter().cloned());

        // Field bytes are copied unchanged; only the discriminator is
        // rewritten. This works generically over payloads the proxy does
        // not understand, for equal and unequal discriminator widths.
        let fields = &inner.data[self.inner_discriminator.len()..];
        let mut data = Vec::with_capacity(self.outer_discriminator.len() + fields.len());
        data.extend_from_slice(self.outer_discriminator);
        data.extend_from_slice(fields);

        Instruction {
            program_id: self.outer_program,
            accounts,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INNER_DISC: &[u8] = &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    const OUTER_DISC: &[u8] = &[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04];
    const NARROW_DISC: &[u8] = &[0x07];

    fn ctx() -> VaultContext {
        VaultContext::derive(&Pubkey::new_unique(), &Pubkey::new_unique())
    }

    fn inner_instruction(n_accounts: usize, disc: &[u8]) -> Instruction {
        let accounts = (0..n_accounts)
            .map(|i| {
                // Alternate flags so forwarding can be checked bit for bit.
                let key = Pubkey::new_unique();
                match i % 3 {
                    0 => AccountMeta::new(key, false),
                    1 => AccountMeta::new_readonly(key, true),
                    _ => AccountMeta::new_readonly(key, false),
                }
            })
            .collect();
        let mut data = disc.to_vec();
        data.extend_from_slice(&[0xab; 13]);
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts,
            data,
        }
    }

    /// 2 dynamic slots, 1 static slot, index map of length 6 with one
    /// dropped entry.
    fn example_proxy(outer_program: Pubkey) -> InstructionProxy {
        InstructionProxy::new(
            outer_program,
            INNER_DISC,
            OUTER_DISC,
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
                meta: AccountMeta::new_readonly(Pubkey::new_unique(), false),
            }],
            vec![Some(3), Some(4), Some(5), None, Some(6), Some(7)],
        )
        .unwrap()
    }

    #[test]
    fn remap_account_count_and_order() {
        let outer_program = Pubkey::new_unique();
        let proxy = example_proxy(outer_program);
        let ctx = ctx();
        let inner = inner_instruction(6, INNER_DISC);

        let outer = proxy.remap(&inner, &ctx);
        assert_eq!(outer.program_id, outer_program);
        assert_eq!(outer.accounts.len(), 2 + 1 + 5);
        assert_eq!(outer.accounts.len(), proxy.outer_len(inner.accounts.len()));

        // Dynamic slots resolved against the vault context.
        assert_eq!(outer.accounts[0].pubkey, ctx.vault);
        assert!(outer.accounts[0].is_writable);
        assert_eq!(outer.accounts[1].pubkey, ctx.authority);
        assert!(!outer.accounts[1].is_writable);

        // Forwarded accounts in original relative order, flags intact.
        let forwarded: Vec<_> = [0usize, 1, 2, 4, 5]
            .iter()
            .map(|&i| inner.accounts[i].clone())
            .collect();
        assert_eq!(&outer.accounts[3..8], forwarded.as_slice());
        // The dropped inner account appears nowhere.
        assert!(outer
            .accounts
            .iter()
            .all(|meta| meta.pubkey != inner.accounts[3].pubkey));
    }

    #[test]
    fn trailing_extra_accounts_are_appended_in_order() {
        let proxy = example_proxy(Pubkey::new_unique());
        let inner = inner_instruction(9, INNER_DISC);
        let outer = proxy.remap(&inner, &ctx());

        assert_eq!(outer.accounts.len(), 8 + 3);
        assert_eq!(&outer.accounts[8..], &inner.accounts[6..]);
    }

    #[test]
    fn equal_width_discriminators_preserve_payload_length() {
        let proxy = example_proxy(Pubkey::new_unique());
        let inner = inner_instruction(6, INNER_DISC);
        let outer = proxy.remap(&inner, &ctx());

        assert_eq!(outer.data.len(), inner.data.len());
        assert_eq!(&outer.data[..8], OUTER_DISC);
        assert_eq!(&outer.data[8..], &inner.data[8..]);
    }

    #[test]
    fn unequal_width_discriminators_resize_by_the_difference() {
        let proxy = InstructionProxy::new(
            Pubkey::new_unique(),
            NARROW_DISC,
            OUTER_DISC,
            vec![DynamicAccount {
                role: VaultRole::Authority,
                target: 0,
                writable: false,
            }],
            vec![],
            vec![Some(1), Some(2)],
        )
        .unwrap();
        let inner = inner_instruction(2, NARROW_DISC);
        let outer = proxy.remap(&inner, &ctx());

        assert_eq!(outer.data.len(), inner.data.len() + (8 - 1));
        assert_eq!(&outer.data[..8], OUTER_DISC);
        assert_eq!(&outer.data[8..], &inner.data[1..]);
    }

    #[test]
    fn duplicate_target_slot_is_rejected_at_construction() {
        let err = InstructionProxy::new(
            Pubkey::new_unique(),
            INNER_DISC,
            OUTER_DISC,
            vec![
                DynamicAccount {
                    role: VaultRole::Vault,
                    target: 0,
                    writable: true,
                },
                DynamicAccount {
                    role: VaultRole::Authority,
                    target: 0,
                    writable: false,
                },
            ],
            vec![],
            vec![Some(1)],
        )
        .unwrap_err();
        assert_eq!(err, ProxyError::DuplicateTargetSlot(0));
    }

    #[test]
    fn out_of_range_target_is_rejected_at_construction() {
        let err = InstructionProxy::new(
            Pubkey::new_unique(),
            INNER_DISC,
            OUTER_DISC,
            vec![DynamicAccount {
                role: VaultRole::Vault,
                target: 2,
                writable: true,
            }],
            vec![],
            vec![Some(0)],
        )
        .unwrap_err();
        assert_eq!(err, ProxyError::TargetSlotOutOfRange { slot: 2, len: 2 });
    }

    #[test]
    fn empty_discriminator_is_rejected() {
        let err = InstructionProxy::new(
            Pubkey::new_unique(),
            &[],
            OUTER_DISC,
            vec![],
            vec![],
            vec![Some(0)],
        )
        .unwrap_err();
        assert_eq!(err, ProxyError::EmptyDiscriminator);
    }

    #[test]
    #[should_panic(expected = "fewer accounts than the proxy index map")]
    fn inner_shorter_than_index_map_panics() {
        let proxy = example_proxy(Pubkey::new_unique());
        let inner = inner_instruction(4, INNER_DISC);
        proxy.remap(&inner, &ctx());
    }
}
