//! Offset-based binary codec shared by every Coffer instruction payload and
//! account snapshot.
//!
//! All multi-byte integers are little-endian with no padding. Buffers are
//! pre-sized by callers (see [`crate::record::Record::len`]); an
//! out-of-bounds write is a pre-sizing bug and panics rather than returning
//! an error. Reads of variable-length data go through [`ensure`] so that a
//! truncated buffer surfaces as a [`CodecError`] instead of a panic.

use arrayref::array_ref;
use solana_program::pubkey::Pubkey;
use thiserror::Error;

pub const PUBKEY_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too short: need {needed} bytes at offset {offset}, have {have}")]
    ShortBuffer {
        offset: usize,
        needed: usize,
        have: usize,
    },
    #[error("unknown discriminator {0:02x?}")]
    UnknownDiscriminator(Vec<u8>),
    #[error("string field is not valid utf-8")]
    InvalidUtf8,
    #[error("invalid presence flag {0:#04x}")]
    InvalidPresenceFlag(u8),
    #[error("invalid value {value} for field `{field}`")]
    InvalidFieldValue { field: &'static str, value: u64 },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Checks that `needed` bytes are readable at `offset`.
pub fn ensure(src: &[u8], offset: usize, needed: usize) -> CodecResult<()> {
    let have = src.len().saturating_sub(offset);
    if have < needed {
        return Err(CodecError::ShortBuffer {
            offset,
            needed,
            have,
        });
    }
    Ok(())
}

pub fn write_u8(dst: &mut [u8], offset: usize, value: u8) -> usize {
    dst[offset] = value;
    1
}

pub fn read_u8(src: &[u8], offset: usize) -> u8 {
    src[offset]
}

pub fn write_u16(dst: &mut [u8], offset: usize, value: u16) -> usize {
    dst[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    2
}

pub fn read_u16(src: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(*array_ref![src, offset, 2])
}

pub fn write_u32(dst: &mut [u8], offset: usize, value: u32) -> usize {
    dst[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    4
}

pub fn read_u32(src: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(*array_ref![src, offset, 4])
}

pub fn write_u64(dst: &mut [u8], offset: usize, value: u64) -> usize {
    dst[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    8
}

pub fn read_u64(src: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(*array_ref![src, offset, 8])
}

pub fn write_i64(dst: &mut [u8], offset: usize, value: i64) -> usize {
    dst[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    8
}

pub fn read_i64(src: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(*array_ref![src, offset, 8])
}

pub fn write_bool(dst: &mut [u8], offset: usize, value: bool) -> usize {
    write_u8(dst, offset, value as u8)
}

pub fn read_bool(src: &[u8], offset: usize) -> bool {
    read_u8(src, offset) != 0
}

/// Copies a fixed-size byte run verbatim. No length prefix.
pub fn write_bytes(dst: &mut [u8], offset: usize, src: &[u8]) -> usize {
    dst[offset..offset + src.len()].copy_from_slice(src);
    src.len()
}

pub fn write_pubkey(dst: &mut [u8], offset: usize, key: &Pubkey) -> usize {
    write_bytes(dst, offset, key.as_ref())
}

pub fn read_pubkey(src: &[u8], offset: usize) -> Pubkey {
    Pubkey::new_from_array(*array_ref![src, offset, 32])
}

pub fn read_array32(src: &[u8], offset: usize) -> [u8; 32] {
    *array_ref![src, offset, 32]
}

/// Strings are a 4-byte unsigned length prefix followed by raw utf-8.
pub fn write_string(dst: &mut [u8], offset: usize, value: &str) -> usize {
    let mut off = offset + write_u32(dst, offset, value.len() as u32);
    off += write_bytes(dst, off, value.as_bytes());
    off - offset
}

pub fn read_string(src: &[u8], offset: usize) -> CodecResult<(String, usize)> {
    ensure(src, offset, 4)?;
    let n = read_u32(src, offset) as usize;
    ensure(src, offset + 4, n)?;
    let s = std::str::from_utf8(&src[offset + 4..offset + 4 + n])
        .map_err(|_| CodecError::InvalidUtf8)?;
    Ok((s.to_owned(), 4 + n))
}

pub fn len_string(value: &str) -> usize {
    4 + value.len()
}

/// Optionals are a 1-byte presence flag, then the payload iff present.
pub fn write_option<T>(
    dst: &mut [u8],
    offset: usize,
    value: Option<&T>,
    write_elem: impl Fn(&mut [u8], usize, &T) -> usize,
) -> usize {
    match value {
        None => write_u8(dst, offset, 0),
        Some(v) => {
            let mut off = offset + write_u8(dst, offset, 1);
            off += write_elem(dst, off, v);
            off - offset
        }
    }
}

pub fn read_option<T>(
    src: &[u8],
    offset: usize,
    read_elem: impl Fn(&[u8], usize) -> CodecResult<(T, usize)>,
) -> CodecResult<(Option<T>, usize)> {
    ensure(src, offset, 1)?;
    match read_u8(src, offset) {
        0 => Ok((None, 1)),
        1 => {
            let (value, used) = read_elem(src, offset + 1)?;
            Ok((Some(value), 1 + used))
        }
        flag => Err(CodecError::InvalidPresenceFlag(flag)),
    }
}

pub fn len_option<T>(value: Option<&T>, len_elem: impl Fn(&T) -> usize) -> usize {
    1 + value.map_or(0, len_elem)
}

/// Vectors are a 4-byte unsigned length prefix followed by that many
/// elements, each encoded per its own element codec. Fixed arrays omit the
/// prefix; see [`write_bytes`].
pub fn write_vec<T>(
    dst: &mut [u8],
    offset: usize,
    items: &[T],
    write_elem: impl Fn(&mut [u8], usize, &T) -> usize,
) -> usize {
    let mut off = offset + write_u32(dst, offset, items.len() as u32);
    for item in items {
        off += write_elem(dst, off, item);
    }
    off - offset
}

pub fn read_vec<T>(
    src: &[u8],
    offset: usize,
    read_elem: impl Fn(&[u8], usize) -> CodecResult<(T, usize)>,
) -> CodecResult<(Vec<T>, usize)> {
    ensure(src, offset, 4)?;
    let n = read_u32(src, offset) as usize;
    let mut off = offset + 4;
    let mut items = Vec::new();
    for _ in 0..n {
        let (value, used) = read_elem(src, off)?;
        items.push(value);
        off += used;
    }
    Ok((items, off - offset))
}

pub fn len_vec<T>(items: &[T], len_elem: impl Fn(&T) -> usize) -> usize {
    4 + items.iter().map(len_elem).sum::<usize>()
}

// Fallible element readers for use with `read_option`/`read_vec`.

pub fn read_u64_elem(src: &[u8], offset: usize) -> CodecResult<(u64, usize)> {
    ensure(src, offset, 8)?;
    Ok((read_u64(src, offset), 8))
}

pub fn read_u32_elem(src: &[u8], offset: usize) -> CodecResult<(u32, usize)> {
    ensure(src, offset, 4)?;
    Ok((read_u32(src, offset), 4))
}

pub fn read_pubkey_elem(src: &[u8], offset: usize) -> CodecResult<(Pubkey, usize)> {
    ensure(src, offset, PUBKEY_LEN)?;
    Ok((read_pubkey(src, offset), PUBKEY_LEN))
}

pub fn read_array32_elem(src: &[u8], offset: usize) -> CodecResult<([u8; 32], usize)> {
    ensure(src, offset, 32)?;
    Ok((read_array32(src, offset), 32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn optional_u32_absent_is_one_zero_byte() {
        let value: Option<u32> = None;
        let mut buf = vec![0u8; len_option(value.as_ref(), |_| 4)];
        let written = write_option(&mut buf, 0, value.as_ref(), |d, o, v| write_u32(d, o, *v));
        assert_eq!(written, 1);
        assert_eq!(buf, vec![0x00]);
    }

    #[test]
    fn optional_u32_present_is_flag_then_le_payload() {
        let value = Some(7u32);
        let mut buf = vec![0u8; len_option(value.as_ref(), |_| 4)];
        let written = write_option(&mut buf, 0, value.as_ref(), |d, o, v| write_u32(d, o, *v));
        assert_eq!(written, 5);
        assert_eq!(buf, vec![0x01, 0x07, 0x00, 0x00, 0x00]);

        let (read_back, used) = read_option(&buf, 0, read_u32_elem).unwrap();
        assert_eq!(read_back, Some(7));
        assert_eq!(used, 5);
    }

    #[test]
    fn optional_read_never_touches_payload_when_flag_is_zero() {
        // One byte only; a decoder that peeked past the flag would error.
        let buf = [0u8];
        let (value, used) = read_option(&buf, 0, read_u32_elem).unwrap();
        assert_eq!(value, None::<u32>);
        assert_eq!(used, 1);
    }

    #[test]
    fn optional_rejects_garbage_presence_flag() {
        let buf = [0x02, 0x07, 0x00, 0x00, 0x00];
        assert_eq!(
            read_option(&buf, 0, read_u32_elem),
            Err(CodecError::InvalidPresenceFlag(2)),
        );
    }

    #[test]
    fn vector_of_two_proof_nodes() {
        let nodes = vec![[0xaau8; 32], [0xbbu8; 32]];
        let mut buf = vec![0u8; len_vec(&nodes, |_| 32)];
        let written = write_vec(&mut buf, 0, &nodes, |d, o, v| write_bytes(d, o, v));
        assert_eq!(written, 4 + 64);
        assert_eq!(&buf[..4], &[0x02, 0x00, 0x00, 0x00]);
        assert_eq!(&buf[4..36], &[0xaa; 32]);
        assert_eq!(&buf[36..68], &[0xbb; 32]);

        let (read_back, used) = read_vec(&buf, 0, read_array32_elem).unwrap();
        assert_eq!(read_back, nodes);
        assert_eq!(used, 68);
    }

    #[test]
    fn empty_vector_is_just_the_prefix() {
        let items: Vec<u64> = vec![];
        let mut buf = vec![0u8; len_vec(&items, |_| 8)];
        assert_eq!(write_vec(&mut buf, 0, &items, |d, o, v| write_u64(d, o, *v)), 4);
        assert_eq!(buf, vec![0, 0, 0, 0]);
    }

    #[test]
    fn truncated_vector_is_a_short_buffer_error() {
        // Prefix says two u64s but only one is present.
        let mut buf = vec![0u8; 12];
        write_u32(&mut buf, 0, 2);
        write_u64(&mut buf, 4, 42);
        assert!(matches!(
            read_vec(&buf, 0, read_u64_elem),
            Err(CodecError::ShortBuffer { .. }),
        ));
    }

    #[test]
    fn string_round_trip() {
        let s = "Coffer Growth Fund";
        let mut buf = vec![0u8; len_string(s)];
        let written = write_string(&mut buf, 0, s);
        assert_eq!(written, 4 + s.len());
        assert_eq!(&buf[..4], &(s.len() as u32).to_le_bytes());
        let (read_back, used) = read_string(&buf, 0).unwrap();
        assert_eq!(read_back, s);
        assert_eq!(used, written);
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let mut buf = vec![0u8; 6];
        write_u32(&mut buf, 0, 2);
        buf[4] = 0xff;
        buf[5] = 0xfe;
        assert_eq!(read_string(&buf, 0), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn integers_are_little_endian_at_arbitrary_offsets() {
        let mut buf = vec![0u8; 16];
        write_u16(&mut buf, 1, 0x1234);
        assert_eq!(&buf[1..3], &[0x34, 0x12]);
        assert_eq!(read_u16(&buf, 1), 0x1234);

        write_u64(&mut buf, 3, 0x0807_0605_0403_0201);
        assert_eq!(&buf[3..11], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(read_u64(&buf, 3), 0x0807_0605_0403_0201);
    }

    proptest! {
        #[test]
        fn u64_round_trip(value: u64, pad in 0usize..16) {
            let mut buf = vec![0u8; pad + 8];
            prop_assert_eq!(write_u64(&mut buf, pad, value), 8);
            prop_assert_eq!(read_u64(&buf, pad), value);
        }

        #[test]
        fn i64_round_trip(value: i64) {
            let mut buf = vec![0u8; 8];
            write_i64(&mut buf, 0, value);
            prop_assert_eq!(read_i64(&buf, 0), value);
        }

        #[test]
        fn string_prop_round_trip(s in "\\PC{0,64}") {
            let mut buf = vec![0u8; len_string(&s)];
            let written = write_string(&mut buf, 0, &s);
            prop_assert_eq!(written, buf.len());
            let (read_back, used) = read_string(&buf, 0).unwrap();
            prop_assert_eq!(read_back, s);
            prop_assert_eq!(used, written);
        }

        #[test]
        fn vec_u64_round_trip(items in proptest::collection::vec(any::<u64>(), 0..32)) {
            let mut buf = vec![0u8; len_vec(&items, |_| 8)];
            let written = write_vec(&mut buf, 0, &items, |d, o, v| write_u64(d, o, *v));
            prop_assert_eq!(written, buf.len());
            let (read_back, used) = read_vec(&buf, 0, read_u64_elem).unwrap();
            prop_assert_eq!(read_back, items);
            prop_assert_eq!(used, written);
        }
    }
}
