//! Bencode byte string.

pub mod encoding;
pub mod error;
pub mod read;

mod bstring;
mod prefix;
mod serde_impl;
mod write;

//
// Implementer's Notes:
//
// * Bencode is specified in BEP 3.  A byte string token is `<length>:<bytes>`, where `<length>` is
//   the ASCII decimal byte count (not the character count).
//
// * `BString` carries a text encoding, but the encoding is only a rendering hint.  Equality,
//   ordering, and hashing are byte-only, so two byte strings built from the same text under
//   different encodings are unequal exactly when the encodings produce different bytes.
//
// * As in the rest of our Bencode code, the interface is divided into pure-memory and I/O
//   functions, with one error type for each group.
//

pub use crate::bstring::BString;
pub use crate::encoding::Encoding;
pub use crate::error::Error;
pub use crate::read::{
    from_buf, from_buf_strict, from_reader, from_reader_strict, from_slice, from_slice_strict,
};
