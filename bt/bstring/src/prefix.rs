//! Length prefix of the byte string token, `<digits>:`.
//!
//! The prefix is a fixed binary protocol element: its digits and separator are always single-byte
//! ASCII, whatever text encoding the byte string carries.

pub(crate) const SEPARATOR: u8 = b':';

// Enough for `usize::MAX` on 64-bit targets.
pub(crate) const LENGTH_PREFIX_BUF_SIZE: usize = 20;

pub(crate) type LengthPrefixBuf = [u8; LENGTH_PREFIX_BUF_SIZE + 1];

/// Formats `len` followed by the separator into the tail of `buf`.
pub(crate) fn format(buf: &mut LengthPrefixBuf, mut len: usize) -> &[u8] {
    let mut i = buf.len() - 1;
    buf[i] = SEPARATOR;
    loop {
        i -= 1;
        buf[i] = b'0' + (len % 10) as u8;
        len /= 10;
        if len == 0 {
            break;
        }
    }
    &buf[i..]
}

/// Returns the size of the token that encodes `len` bytes.
pub(crate) fn encoded_len(len: usize) -> usize {
    let num_digits = len.checked_ilog10().map_or(1, |n| n as usize + 1);
    num_digits + 1 + len
}
