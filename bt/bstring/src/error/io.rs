use std::fmt;
use std::io;

use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("bstring error: {source}"))]
    Bencode { source: super::Error },
    #[snafu(display("bstring io error: {source}"))]
    Io { source: io::Error },
}

impl From<super::Error> for Error {
    fn from(source: super::Error) -> Self {
        Self::Bencode { source }
    }
}

impl serde::de::Error for Error {
    fn custom<T>(message: T) -> Self
    where
        T: fmt::Display,
    {
        Error::Bencode {
            source: super::Error::custom(message),
        }
    }
}

impl Error {
    pub fn is_eof(&self) -> bool {
        self.to_bencode().is_some_and(super::Error::is_eof)
    }

    pub fn is_incomplete(&self) -> bool {
        self.to_bencode().is_some_and(super::Error::is_incomplete)
    }

    pub fn is_strict(&self) -> bool {
        self.to_bencode().is_some_and(super::Error::is_strict)
    }

    pub fn to_bencode(&self) -> Option<&super::Error> {
        match self {
            Self::Bencode { source } => Some(source),
            _ => None,
        }
    }
}

// Maps a short read to `Incomplete` so that callers see the same error for truncated streams and
// truncated buffers.
pub(crate) fn from_io_error(source: io::Error) -> Error {
    if source.kind() == io::ErrorKind::UnexpectedEof {
        Error::Bencode {
            source: super::Error::Incomplete,
        }
    } else {
        Error::Io { source }
    }
}
