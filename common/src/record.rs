//! The variant record contract shared by every instruction payload and
//! account snapshot: a protocol-assigned discriminator followed by fields
//! encoded strictly in declaration order.

use crate::codec::{self, CodecError, CodecResult};

/// A discriminator-tagged record with a deterministic binary length.
///
/// Implementors provide the field-level pieces (`read_fields`,
/// `write_fields`, `fields_len`); the discriminator plumbing is shared.
/// Field order is part of the wire contract and is never reordered.
pub trait Record: Sized {
    /// Protocol-assigned tag written before any field data. Its width is
    /// always taken from `DISCRIMINATOR.len()`, never hard-coded at call
    /// sites, so a protocol revision with a different width stays
    /// compatible.
    const DISCRIMINATOR: &'static [u8];

    /// Decodes the fields starting at `offset`, which points just past the
    /// discriminator.
    fn read_fields(data: &[u8], offset: usize) -> CodecResult<Self>;

    /// Encodes the fields at `offset`. The destination is pre-sized; an
    /// overrun panics (caller bug).
    fn write_fields(&self, data: &mut [u8], offset: usize) -> usize;

    /// Exact encoded length of the fields, excluding the discriminator.
    fn fields_len(&self) -> usize;

    /// Total encoded length: discriminator plus fields. `write` produces
    /// exactly this many bytes.
    fn len(&self) -> usize {
        Self::DISCRIMINATOR.len() + self.fields_len()
    }

    /// Three-valued read: `Ok(None)` when there is nothing to read at
    /// `offset` (the defined "no value" case, not an error), `Err` on a
    /// truncated buffer or a foreign discriminator, `Ok(Some(_))` on a
    /// valid record.
    fn read(data: &[u8], offset: usize) -> CodecResult<Option<Self>> {
        let width = Self::DISCRIMINATOR.len();
        let tag = match peek_discriminator(data, offset, width)? {
            None => return Ok(None),
            Some(tag) => tag,
        };
        if tag != Self::DISCRIMINATOR {
            return Err(CodecError::UnknownDiscriminator(tag.to_vec()));
        }
        Self::read_fields(data, offset + width).map(Some)
    }

    /// Writes the discriminator then the fields; returns bytes written,
    /// which always equals `len()`.
    fn write(&self, data: &mut [u8], offset: usize) -> usize {
        let mut off = offset + codec::write_bytes(data, offset, Self::DISCRIMINATOR);
        off += self.write_fields(data, off);
        off - offset
    }

    /// Encodes into a freshly allocated buffer of exactly `len()` bytes.
    fn pack(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.len()];
        let written = self.write(&mut buf, 0);
        debug_assert_eq!(written, buf.len());
        buf
    }
}

/// Reads the `width`-byte discriminator at `offset` without consuming it.
///
/// `Ok(None)` when the buffer ends at `offset` (absent input); a buffer
/// that starts but cannot complete a discriminator is malformed.
pub fn peek_discriminator(data: &[u8], offset: usize, width: usize) -> CodecResult<Option<&[u8]>> {
    if data.len() <= offset {
        return Ok(None);
    }
    codec::ensure(data, offset, width)?;
    Ok(Some(&data[offset..offset + width]))
}
