pub mod io;

use std::fmt;

use bytes::Bytes;
use snafu::prelude::*;

use crate::encoding::Encoding;

#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    //
    // Construction and text errors.
    //
    #[snafu(display("invalid argument: {name} is absent"))]
    InvalidArgument { name: &'static str },
    #[snafu(display("byte string is not valid {encoding} at offset {offset}"))]
    EncodingMismatch { encoding: Encoding, offset: usize },
    #[snafu(display("unknown encoding: {label:?}"))]
    UnknownEncoding { label: String },

    //
    // Byte string token errors.
    //

    // `Eof` (empty input) is a special case of `Incomplete` (partial input).
    #[snafu(display("end of file"))]
    Eof,
    #[snafu(display("incomplete byte string"))]
    Incomplete,

    #[snafu(display("invalid length prefix: {prefix:?}"))]
    LengthPrefix { prefix: Bytes },
    #[snafu(display("length prefix overflow: {prefix:?}"))]
    LengthPrefixOverflow { prefix: Bytes },
    #[snafu(display("byte string size limit exceeded: {size}"))]
    ByteStringSizeExceeded { size: usize },

    #[snafu(display("expect strict length prefix: {prefix:?}"))]
    StrictLengthPrefix { prefix: Bytes },

    //
    // `de` and `ser` errors.
    //
    #[snafu(display("{message}"))]
    Custom { message: String },
}

impl Error {
    pub fn is_eof(&self) -> bool {
        self == &Error::Eof
    }

    pub fn is_incomplete(&self) -> bool {
        self == &Error::Incomplete
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Error::StrictLengthPrefix { .. })
    }
}

impl serde::de::Error for Error {
    fn custom<T>(message: T) -> Self
    where
        T: fmt::Display,
    {
        Error::Custom {
            message: message.to_string(),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(message: T) -> Self
    where
        T: fmt::Display,
    {
        Error::Custom {
            message: message.to_string(),
        }
    }
}
