// Percent-encoding helpers
//
// Decoding never fails: invalid triplets are kept literally and the result
// is decoded as UTF-8 lossily. Validity of the encoding itself is judged by
// the percent-encoding automaton in the classifier, not here.

use std::borrow::Cow;

/// A valid `%XX` triplet found in a raw string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedByte {
    /// Byte offset of the `%`
    pub offset: usize,

    /// Decoded value
    pub byte: u8,
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn triplet_at(bytes: &[u8], i: usize) -> Option<u8> {
    if bytes.get(i) != Some(&b'%') {
        return None;
    }
    let hi = hex_value(*bytes.get(i + 1)?)?;
    let lo = hex_value(*bytes.get(i + 2)?)?;
    Some(hi << 4 | lo)
}

/// Iterate over the valid `%XX` triplets of `raw`
pub fn encoded_bytes(raw: &str) -> impl Iterator<Item = EncodedByte> + '_ {
    let bytes = raw.as_bytes();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < bytes.len() {
            if let Some(byte) = triplet_at(bytes, i) {
                let found = EncodedByte { offset: i, byte };
                i += 3;
                return Some(found);
            }
            i += 1;
        }
        None
    })
}

/// True if `s` contains at least one valid `%XX` triplet
pub fn has_encoded_byte(s: &str) -> bool {
    encoded_bytes(s).next().is_some()
}

/// Decode valid `%XX` triplets into bytes
pub fn percent_decode_bytes(raw: &str) -> Cow<'_, [u8]> {
    if !has_encoded_byte(raw) {
        return Cow::Borrowed(raw.as_bytes());
    }
    urlencoding::decode_binary(raw.as_bytes())
}

/// Decode valid `%XX` triplets, then decode UTF-8 lossily
pub fn percent_decode(raw: &str) -> Cow<'_, str> {
    match percent_decode_bytes(raw) {
        Cow::Borrowed(_) => Cow::Borrowed(raw),
        Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// ASCII lowercase without allocating when already lowercase
pub fn ascii_lowercase(s: Cow<'_, str>) -> Cow<'_, str> {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(s.to_ascii_lowercase())
    } else {
        s
    }
}
