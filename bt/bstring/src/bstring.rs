use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use snafu::prelude::*;

use crate::encoding::Encoding;
use crate::error::io::Error as IoError;
use crate::error::{Error, InvalidArgumentSnafu};
use crate::prefix;
use crate::write;

/// Bencode byte string.
///
/// `BString` owns an immutable byte buffer and the text encoding used to interpret it as text.
/// The bytes are authoritative: equality, ordering, and hashing are defined over the bytes alone,
/// and two byte strings carrying different encodings are equal whenever their bytes are.
#[derive(Clone, Default)]
pub struct BString {
    bytes: Bytes,
    encoding: Encoding,
}

impl BString {
    //
    // Constructors.
    //

    /// Encodes `text` in UTF-8.
    pub fn from_text<T>(text: T) -> Self
    where
        T: AsRef<str>,
    {
        Self::from_text_with(text, Encoding::default())
    }

    pub fn from_text_with<T>(text: T, encoding: Encoding) -> Self
    where
        T: AsRef<str>,
    {
        Self {
            bytes: Bytes::copy_from_slice(&encoding.encode(text.as_ref())),
            encoding,
        }
    }

    /// Like `from_text_with`, but for text that may be absent.
    pub fn try_from_text(text: Option<&str>, encoding: Encoding) -> Result<Self, Error> {
        text.map(|text| Self::from_text_with(text, encoding))
            .context(InvalidArgumentSnafu { name: "text" })
    }

    /// Stores `bytes` verbatim and attaches the default encoding (UTF-8).
    ///
    /// Any byte sequence is accepted, including ones that are not valid UTF-8.
    pub fn from_bytes<B>(bytes: B) -> Self
    where
        B: Into<Bytes>,
    {
        Self::from_bytes_with(bytes, Encoding::default())
    }

    pub fn from_bytes_with<B>(bytes: B, encoding: Encoding) -> Self
    where
        B: Into<Bytes>,
    {
        Self {
            bytes: bytes.into(),
            encoding,
        }
    }

    pub fn try_from_bytes<B>(bytes: Option<B>, encoding: Encoding) -> Result<Self, Error>
    where
        B: Into<Bytes>,
    {
        bytes
            .map(|bytes| Self::from_bytes_with(bytes, encoding))
            .context(InvalidArgumentSnafu { name: "bytes" })
    }

    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Bytes::from_static(bytes),
            encoding: Encoding::Utf8,
        }
    }

    //
    // Accessors.
    //

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Attaches a different encoding without touching the bytes.
    pub fn with_encoding(self, encoding: Encoding) -> Self {
        Self {
            bytes: self.bytes,
            encoding,
        }
    }

    /// Returns the number of bytes (not characters).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    //
    // Text rendering.
    //

    pub fn to_text(&self) -> Result<String, Error> {
        self.to_text_with(self.encoding)
    }

    pub fn to_text_with(&self, encoding: Encoding) -> Result<String, Error> {
        encoding.decode(&self.bytes)
    }

    //
    // Bencode.
    //

    /// Returns the Bencode token as text, `"<length>:<text>"`.
    ///
    /// The length is always the byte count, which differs from the character count of `<text>`
    /// under a multi-byte encoding.
    pub fn encode_to_text(&self) -> Result<String, Error> {
        self.encode_to_text_with(self.encoding)
    }

    pub fn encode_to_text_with(&self, encoding: Encoding) -> Result<String, Error> {
        let text = self.to_text_with(encoding)?;
        Ok(std::format!("{}:{}", self.len(), text))
    }

    /// Writes the Bencode token in a single `write_all` call; the bytes are emitted verbatim.
    ///
    /// If the writer fails, part of the token may already have been written.
    pub fn encode_to<W>(&self, mut writer: W) -> Result<(), IoError>
    where
        W: io::Write,
    {
        write::write_byte_string(&mut writer, &self.bytes)?;
        tracing::trace!(size = self.len(), "write byte string");
        Ok(())
    }

    pub fn encode_to_buf<B>(&self, mut buf: B)
    where
        B: BufMut,
    {
        write::put_byte_string(&mut buf, &self.bytes);
    }

    pub fn to_bencode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_to_buf(&mut buf);
        buf.freeze()
    }

    /// Returns the size of the Bencode token.
    pub fn encoded_len(&self) -> usize {
        prefix::encoded_len(self.len())
    }
}

//
// Conversions.
//

impl From<&str> for BString {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for BString {
    fn from(text: String) -> Self {
        Self::from_bytes(text.into_bytes())
    }
}

impl From<&[u8]> for BString {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for BString {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Bytes> for BString {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<BString> for Bytes {
    fn from(bstring: BString) -> Self {
        bstring.bytes
    }
}

impl AsRef<[u8]> for BString {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// `Hash` below is consistent with `[u8]`, which makes this sound.
impl Borrow<[u8]> for BString {
    fn borrow(&self) -> &[u8] {
        &self.bytes
    }
}

//
// Equality, ordering, and hashing.  None of these looks at `encoding`.
//

impl PartialEq for BString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for BString {}

impl PartialOrd for BString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for BString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl PartialEq<[u8]> for BString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

// Text is compared after encoding it in the byte string's own encoding.
impl PartialEq<str> for BString {
    fn eq(&self, other: &str) -> bool {
        *self.encoding.encode(other) == *self.as_bytes()
    }
}

impl PartialEq<&str> for BString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for BString {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl PartialEq<BString> for str {
    fn eq(&self, other: &BString) -> bool {
        other == self
    }
}

impl PartialEq<BString> for &str {
    fn eq(&self, other: &BString) -> bool {
        other == *self
    }
}

impl PartialEq<BString> for String {
    fn eq(&self, other: &BString) -> bool {
        other == self.as_str()
    }
}

//
// Formatting.
//

impl fmt::Debug for BString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BString")
            .field("bytes", &self.bytes)
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Renders the bytes in the byte string's own encoding, falling back to escaped ASCII when they are
/// not valid under it.
impl fmt::Display for BString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.bytes.escape_ascii()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::hash::{BuildHasher, RandomState};

    use super::*;

    const NORDIC: &str = "æøå äö èéê ñ";

    #[test]
    fn from_text() {
        let bstring = BString::from_text("foo");
        assert_eq!(bstring.as_bytes(), b"foo");
        assert_eq!(bstring.encoding(), Encoding::Utf8);

        let bstring = BString::from_text_with("ø", Encoding::Latin1);
        assert_eq!(bstring.as_bytes(), b"\xf8");
        assert_eq!(bstring.encoding(), Encoding::Latin1);

        let bstring = BString::from_text("");
        assert!(bstring.is_empty());
        assert_eq!(bstring.len(), 0);
    }

    #[test]
    fn try_from_text() {
        assert_eq!(
            BString::try_from_text(None, Encoding::Utf8),
            Err(Error::InvalidArgument { name: "text" }),
        );
        assert_eq!(
            BString::try_from_text(Some("spam"), Encoding::Ascii),
            Ok(BString::from_text("spam")),
        );
    }

    #[test]
    fn from_bytes() {
        for testdata in [
            b"".as_slice(),
            b"spam",
            b"\x00\x01\x02",
            b"\xff\xfe",
            b"\r\n\t\x1b",
        ] {
            assert_eq!(BString::from_bytes(testdata).as_bytes(), testdata);
            assert_eq!(
                BString::from_bytes_with(testdata, Encoding::Ascii).as_bytes(),
                testdata,
            );
        }

        assert_eq!(
            BString::try_from_bytes(None::<Vec<u8>>, Encoding::Utf8),
            Err(Error::InvalidArgument { name: "bytes" }),
        );
        assert_eq!(
            BString::try_from_bytes(Some(vec![1, 2]), Encoding::Utf8),
            Ok(BString::from_bytes(vec![1, 2])),
        );
        assert_eq!(BString::from_static(b"spam"), BString::from_text("spam"));
    }

    #[test]
    fn eq() {
        for (testdata1, testdata2) in [
            ("hello world", "hello world"),
            ("a", "a"),
            (" ", " "),
            ("", ""),
        ] {
            let bstring1 = BString::from_text(testdata1);
            let bstring2 = BString::from_text(testdata2);
            assert_eq!(bstring1, bstring2);
            assert_eq!(bstring2, bstring1);
            assert!(bstring1 == testdata2);
            assert!(testdata2 == bstring1);
            assert!(bstring1 == testdata2.to_string());
        }

        for (testdata1, testdata2) in [("hello", "world"), (" ", ""), ("1", "2")] {
            let bstring1 = BString::from_text(testdata1);
            let bstring2 = BString::from_text(testdata2);
            assert_ne!(bstring1, bstring2);
            assert_ne!(bstring2, bstring1);
            assert!(bstring1 != testdata2);
            assert!(testdata2 != bstring1);
        }
    }

    #[test]
    fn eq_different_encoding() {
        let bstring1 = BString::from_text("ø");
        let bstring2 = BString::from_text_with("ø", Encoding::Ascii);
        assert_ne!(bstring1, bstring2);
        assert_ne!(bstring2, bstring1);

        let bstring2 = BString::from_text_with("ø", Encoding::Latin1);
        assert_ne!(bstring1, bstring2);
    }

    // Equality is byte-only.  Byte strings carrying different encodings but the same bytes are
    // equal, and they must stay equal.
    #[test]
    fn eq_ignores_encoding() {
        let bstring1 = BString::from_bytes_with(b"spam".as_slice(), Encoding::Utf8);
        let bstring2 = BString::from_bytes_with(b"spam".as_slice(), Encoding::Latin1);
        assert_eq!(bstring1, bstring2);
        assert_eq!(hash(&bstring1), hash(&bstring2));

        let bstring1 = BString::from_text_with("ø", Encoding::Latin1);
        let bstring2 = BString::from_bytes(b"\xf8".as_slice());
        assert_eq!(bstring1, bstring2);

        let bstring = BString::from_text("spam").with_encoding(Encoding::Utf16Le);
        assert_eq!(bstring, BString::from_text("spam"));
        assert_eq!(bstring.encoding(), Encoding::Utf16Le);
    }

    #[test]
    fn eq_text_uses_own_encoding() {
        let bstring = BString::from_text_with(NORDIC, Encoding::Latin1);
        assert!(bstring == NORDIC);
        assert!(BString::from_text(NORDIC) == NORDIC);
        assert!(bstring.clone().with_encoding(Encoding::Utf8) != NORDIC);

        assert!(BString::from_text("spam") == *b"spam".as_slice());
    }

    fn hash(bstring: &BString) -> u64 {
        static STATE: std::sync::LazyLock<RandomState> = std::sync::LazyLock::new(RandomState::new);
        STATE.hash_one(bstring)
    }

    #[test]
    fn hash_eq() {
        for (testdata1, testdata2) in [("test", "test"), ("TEST", "TEST")] {
            assert_eq!(
                hash(&BString::from_text(testdata1)),
                hash(&BString::from_text(testdata2)),
            );
        }
    }

    #[test]
    fn hash_ne() {
        let expect = hash(&BString::from_text("Test String"));
        for testdata in [
            "Test Strin",
            "Test Strin ",
            "Test String ",
            "Test String2",
            "Test StrinG",
            "test string",
            "TestString",
            "teststring",
        ] {
            assert_ne!(hash(&BString::from_text(testdata)), expect);
        }
    }

    #[test]
    fn collections() {
        let mut set = HashSet::new();
        assert!(set.insert(BString::from_text("spam")));
        assert!(!set.insert(BString::from_bytes_with(b"spam".as_slice(), Encoding::Latin1)));
        assert!(set.contains(b"spam".as_slice()));

        let map = HashMap::from([(BString::from_text("x"), 1)]);
        assert_eq!(map.get(b"x".as_slice()), Some(&1));

        // Dictionary keys sort by raw bytes.
        let map = BTreeMap::from([
            (BString::from_bytes(b"\xff".as_slice()), 0),
            (BString::from_text("b"), 1),
            (BString::from_text("aa"), 2),
        ]);
        assert_eq!(
            map.keys().map(BString::as_bytes).collect::<Vec<_>>(),
            [b"aa".as_slice(), b"b", b"\xff"],
        );
    }

    #[test]
    fn to_text() {
        let bstring = BString::from_text_with(NORDIC, Encoding::Utf8);
        assert_eq!(bstring.to_text(), Ok(NORDIC.to_string()));

        let bstring = BString::from_text_with(NORDIC, Encoding::Latin1);
        assert_eq!(bstring.to_text_with(Encoding::Latin1), Ok(NORDIC.to_string()));
        assert_eq!(bstring.to_text(), Ok(NORDIC.to_string()));
        assert_eq!(
            bstring.to_text_with(Encoding::Utf8),
            Err(Error::EncodingMismatch {
                encoding: Encoding::Utf8,
                offset: 0,
            }),
        );
    }

    #[test]
    fn round_trip() {
        for (text, encoding) in [
            ("hello world", Encoding::Utf8),
            (NORDIC, Encoding::Utf8),
            (NORDIC, Encoding::Latin1),
            (NORDIC, Encoding::Utf16Le),
            ("123:?!#{}'|<>", Encoding::Ascii),
            ("\u{1f980}", Encoding::Utf16Be),
        ] {
            assert_eq!(
                BString::from_text_with(text, encoding).to_text_with(encoding),
                Ok(text.to_string()),
            );
        }
    }

    #[test]
    fn encode_to_text() {
        for (testdata, len) in [
            ("some string", 11),
            ("spam", 4),
            ("1234567890", 10),
            ("hello world", 11),
            ("123:?!#{}'|<>", 13),
        ] {
            assert_eq!(
                BString::from_text(testdata).encode_to_text(),
                Ok(std::format!("{len}:{testdata}")),
            );
        }

        assert_eq!(BString::from_text("").encode_to_text(), Ok("0:".to_string()));
    }

    #[test]
    fn encode_to_text_byte_count() {
        let bstring = BString::from_text_with(NORDIC, Encoding::Utf8);
        assert_eq!(bstring.encode_to_text(), Ok(std::format!("21:{NORDIC}")));

        let bstring = BString::from_text_with(NORDIC, Encoding::Latin1);
        assert_eq!(
            bstring.encode_to_text_with(Encoding::Latin1),
            Ok(std::format!("12:{NORDIC}")),
        );

        // Bytes captured under Latin-1 but carrying the default encoding.
        let bstring = BString::from_bytes(Encoding::Latin1.encode(NORDIC).into_owned());
        assert_eq!(bstring.encoding(), Encoding::Utf8);
        assert_eq!(
            bstring.encode_to_text_with(Encoding::Latin1),
            Ok(std::format!("12:{NORDIC}")),
        );
        assert!(matches!(
            bstring.encode_to_text(),
            Err(Error::EncodingMismatch { .. }),
        ));

        let bstring = BString::from_text_with("ab", Encoding::Utf16Le);
        assert_eq!(bstring.encode_to_text(), Ok("4:ab".to_string()));
    }

    #[test]
    fn encode_to() {
        let bstring = BString::from_text("hello world");
        let mut stream = io::Cursor::new(Vec::new());
        bstring.encode_to(&mut stream).unwrap();
        let stream = stream.into_inner();
        assert_eq!(stream.len(), 14);
        assert_eq!(stream.escape_ascii().to_string(), "11:hello world");

        // Bytes are emitted verbatim, whatever the encoding is.
        let bstring = BString::from_bytes_with(b"\x00\xff:".as_slice(), Encoding::Ascii);
        let mut stream = Vec::new();
        bstring.encode_to(&mut stream).unwrap();
        assert_eq!(stream, b"3:\x00\xff:");

        let mut stream = Vec::new();
        BString::default().encode_to(&mut stream).unwrap();
        assert_eq!(stream, b"0:");
    }

    #[test]
    fn to_bencode() {
        let bstring = BString::from_text_with(NORDIC, Encoding::Utf16Be);
        let bencode = bstring.to_bencode();
        assert_eq!(bencode.len(), bstring.encoded_len());
        assert_eq!(&bencode[..3], b"24:");
        assert_eq!(&bencode[3..], bstring.as_bytes());

        let mut buf = BytesMut::new();
        BString::from_text("spam").encode_to_buf(&mut buf);
        BString::from_text("eggs").encode_to_buf(&mut buf);
        assert_eq!(buf, b"4:spam4:eggs".as_slice());
    }

    #[test]
    fn fmt() {
        let bstring = BString::from_text_with(NORDIC, Encoding::Latin1);
        assert_eq!(bstring.to_string(), NORDIC);

        let bstring = BString::from_bytes(b"a\xffb".as_slice());
        assert_eq!(bstring.to_string(), "a\\xffb");

        assert_eq!(
            std::format!("{:?}", BString::from_text("spam")),
            "BString { bytes: b\"spam\", encoding: Utf8 }",
        );
    }
}
