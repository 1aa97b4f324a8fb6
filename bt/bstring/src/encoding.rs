use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{EncodingMismatchSnafu, Error, UnknownEncodingSnafu};

/// Text encoding attached to a byte string.
///
/// It is used only to convert between bytes and text; it is never part of a byte string's
/// identity.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    /// ISO-8859-1.
    Latin1,
    Utf16Le,
    Utf16Be,
}

// Substitutes for characters outside an encoding's repertoire.
const REPLACEMENT: u8 = b'?';

impl Encoding {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "us-ascii",
            Self::Latin1 => "iso-8859-1",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Encodes `text`.
    ///
    /// This never fails: a character that `Ascii` or `Latin1` cannot represent is replaced with
    /// `?`.
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(text.as_bytes()),
            Self::Ascii if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            Self::Ascii => Cow::Owned(self.encode_single_byte(text, 0x7f)),
            Self::Latin1 => Cow::Owned(self.encode_single_byte(text, 0xff)),
            Self::Utf16Le => Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            Self::Utf16Be => Cow::Owned(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        }
    }

    fn encode_single_byte(self, text: &str, max: u32) -> Vec<u8> {
        let mut num_replaced = 0usize;
        let bytes = text
            .chars()
            .map(|c| match u8::try_from(u32::from(c)) {
                Ok(b) if u32::from(b) <= max => b,
                _ => {
                    num_replaced += 1;
                    REPLACEMENT
                }
            })
            .collect();
        if num_replaced > 0 {
            tracing::debug!(encoding = %self, num_replaced, "encode: replace unrepresentable");
        }
        bytes
    }

    /// Decodes `bytes`.
    ///
    /// Unlike `encode`, this is strict and returns `EncodingMismatch` at the first offset where
    /// `bytes` is not valid under this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String, Error> {
        match self {
            Self::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(text.to_string()),
                Err(error) => self.mismatch(error.valid_up_to()),
            },
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => self.mismatch(offset),
                None => Ok(bytes.iter().copied().map(char::from).collect()),
            },
            Self::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            Self::Utf16Le => self.decode_utf16(bytes, u16::from_le_bytes),
            Self::Utf16Be => self.decode_utf16(bytes, u16::from_be_bytes),
        }
    }

    fn decode_utf16(self, bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Result<String, Error> {
        let units = bytes.chunks_exact(2);
        let remainder = units.remainder();
        let mut text = String::with_capacity(bytes.len() / 2);
        let mut num_units = 0;
        for c in char::decode_utf16(units.map(|unit| from_bytes([unit[0], unit[1]]))) {
            match c {
                Ok(c) => {
                    text.push(c);
                    num_units += c.len_utf16();
                }
                Err(_) => return self.mismatch(num_units * 2),
            }
        }
        if !remainder.is_empty() {
            return self.mismatch(bytes.len() - remainder.len());
        }
        Ok(text)
    }

    fn mismatch<T>(self, offset: usize) -> Result<T, Error> {
        EncodingMismatchSnafu {
            encoding: self,
            offset,
        }
        .fail()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Ok(match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Self::Utf8,
            "us-ascii" | "ascii" => Self::Ascii,
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Self::Latin1,
            "utf-16le" | "utf-16" | "unicode" => Self::Utf16Le,
            "utf-16be" | "unicodefffe" => Self::Utf16Be,
            _ => {
                return UnknownEncodingSnafu {
                    label: label.to_string(),
                }
                .fail();
            }
        })
    }
}
