//! Reads the byte string token, `<length>:<bytes>`, and materializes it as a `BString`.
//!
//! This covers only the byte string token; dispatching on the other value kinds is the job of a
//! full Bencode decoder, which calls into the functions here once it sees a leading digit.

use std::io::{self, ErrorKind};

use bytes::{Buf, Bytes};
use snafu::prelude::*;

use crate::bstring::BString;
use crate::error::io::{self as io_error, Error as IoError};
use crate::error::{
    ByteStringSizeExceededSnafu, Error, IncompleteSnafu, LengthPrefixOverflowSnafu,
    LengthPrefixSnafu, StrictLengthPrefixSnafu,
};
use crate::prefix::{LENGTH_PREFIX_BUF_SIZE, SEPARATOR};

pub fn from_buf<B>(buf: B) -> Result<BString, Error>
where
    B: Buf,
{
    read_byte_string::<_, _, NonStrict>(buf).map(BString::from_bytes)
}

pub fn from_buf_strict<B>(buf: B) -> Result<BString, Error>
where
    B: Buf,
{
    read_byte_string::<_, _, Strict>(buf).map(BString::from_bytes)
}

/// Reads one token and advances `slice` past it.
pub fn from_slice(slice: &mut &[u8]) -> Result<BString, Error> {
    from_buf(slice)
}

pub fn from_slice_strict(slice: &mut &[u8]) -> Result<BString, Error> {
    from_buf_strict(slice)
}

/// Reads one token, or returns `None` at the end of the stream.
pub fn from_reader<R>(reader: R) -> Result<Option<BString>, IoError>
where
    R: io::Read,
{
    check_eof(read_byte_string::<_, _, NonStrict>(reader))
}

pub fn from_reader_strict<R>(reader: R) -> Result<Option<BString>, IoError>
where
    R: io::Read,
{
    check_eof(read_byte_string::<_, _, Strict>(reader))
}

fn check_eof(result: Result<Bytes, IoError>) -> Result<Option<BString>, IoError> {
    match result {
        Ok(bytes) => Ok(Some(BString::from_bytes(bytes))),
        Err(error) if error.is_eof() => Ok(None),
        Err(error) => Err(error),
    }
}

fn read_byte_string<R, E, S>(mut reader: R) -> Result<Bytes, E>
where
    R: Read<E>,
    E: From<Error>,
    S: Strictness,
{
    let mut buf = [0u8; LENGTH_PREFIX_BUF_SIZE];
    let mut b = reader.read_first_u8()?.ok_or(Error::Eof)?;
    let mut n = 0;
    while b != SEPARATOR {
        ensure!(
            b.is_ascii_digit(),
            LengthPrefixSnafu {
                prefix: [&buf[..n], &[b]].concat(),
            },
        );
        ensure!(
            n < buf.len(),
            LengthPrefixOverflowSnafu {
                prefix: Bytes::copy_from_slice(&buf),
            },
        );
        buf[n] = b;
        n += 1;
        b = reader.read_u8()?;
    }
    let size = S::parse_length_prefix(&buf[..n])?;
    let bytes = reader.read_bytes(size)?;
    tracing::trace!(size, "read byte string");
    Ok(bytes)
}

pub(crate) trait Read<E> {
    /// Returns `None` when the input is empty.
    fn read_first_u8(&mut self) -> Result<Option<u8>, E>;

    fn read_u8(&mut self) -> Result<u8, E>;

    fn read_bytes(&mut self, size: usize) -> Result<Bytes, E>;
}

impl<B> Read<Error> for B
where
    B: Buf,
{
    fn read_first_u8(&mut self) -> Result<Option<u8>, Error> {
        Ok(self.has_remaining().then(|| self.get_u8()))
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        self.try_get_u8().map_err(|_| Error::Incomplete)
    }

    fn read_bytes(&mut self, size: usize) -> Result<Bytes, Error> {
        // It is important to do the check before actually allocating the buffer.
        ensure!(size <= self.remaining(), IncompleteSnafu);
        Ok(self.copy_to_bytes(size))
    }
}

// TODO: Let callers configure this once a full decoder exposes its own limits.
const BYTE_STRING_SIZE_LIMIT: usize = 64 * 1024 * 1024; // 64 MB

impl<R> Read<IoError> for R
where
    R: io::Read,
{
    fn read_first_u8(&mut self) -> Result<Option<u8>, IoError> {
        let mut buf = [0u8];
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(error) => return Err(io_error::from_io_error(error)),
            }
        }
    }

    fn read_u8(&mut self) -> Result<u8, IoError> {
        let mut buf = [0u8];
        self.read_exact(&mut buf).map_err(io_error::from_io_error)?;
        Ok(buf[0])
    }

    fn read_bytes(&mut self, size: usize) -> Result<Bytes, IoError> {
        if size > BYTE_STRING_SIZE_LIMIT {
            tracing::warn!(size, limit = BYTE_STRING_SIZE_LIMIT, "byte string too large");
            return Err(ByteStringSizeExceededSnafu { size }.build().into());
        }
        let mut buf = vec![0; size];
        self.read_exact(buf.as_mut_slice()).map_err(io_error::from_io_error)?;
        Ok(buf.into())
    }
}

pub(crate) trait Strictness {
    fn ensure_length_prefix(prefix: &[u8]) -> Result<(), Error>;

    fn parse_length_prefix(prefix: &[u8]) -> Result<usize, Error> {
        Self::ensure_length_prefix(prefix)?;
        // `ensure_length_prefix` accepts only ASCII digits, so this can fail only on overflow.
        std::str::from_utf8(prefix)
            .ok()
            .and_then(|prefix| prefix.parse().ok())
            .context(LengthPrefixOverflowSnafu {
                prefix: Bytes::copy_from_slice(prefix),
            })
    }
}

pub(crate) struct Strict;

impl Strictness for Strict {
    fn ensure_length_prefix(prefix: &[u8]) -> Result<(), Error> {
        NonStrict::ensure_length_prefix(prefix)?;
        ensure!(
            lazy_regex::regex_is_match!(r"(?x-u) ^ (?: 0 | [1-9] \d* ) $ "B, prefix),
            StrictLengthPrefixSnafu {
                prefix: Bytes::copy_from_slice(prefix),
            },
        );
        Ok(())
    }
}

pub(crate) struct NonStrict;

impl Strictness for NonStrict {
    fn ensure_length_prefix(prefix: &[u8]) -> Result<(), Error> {
        ensure!(
            lazy_regex::regex_is_match!(r"(?x-u) ^ \d+ $ "B, prefix),
            LengthPrefixSnafu {
                prefix: Bytes::copy_from_slice(prefix),
            },
        );
        Ok(())
    }
}
