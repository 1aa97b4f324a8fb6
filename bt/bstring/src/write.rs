use std::io;

use bytes::{BufMut, BytesMut};
use snafu::prelude::*;

use crate::error::io::{Error as IoError, IoSnafu};
use crate::prefix::{self, LengthPrefixBuf};

pub(crate) fn put_byte_string<B>(buf: &mut B, bytes: &[u8])
where
    B: BufMut,
{
    let mut prefix = LengthPrefixBuf::default();
    buf.put_slice(prefix::format(&mut prefix, bytes.len()));
    buf.put_slice(bytes);
}

/// Writes the whole token in one `write_all` call.
///
/// `io::Write` cannot promise atomicity: when the writer fails, part of the token may already have
/// been written.
pub(crate) fn write_byte_string<W>(writer: &mut W, bytes: &[u8]) -> Result<(), IoError>
where
    W: io::Write,
{
    let mut token = BytesMut::with_capacity(prefix::encoded_len(bytes.len()));
    put_byte_string(&mut token, bytes);
    writer.write_all(&token).context(IoSnafu)
}
