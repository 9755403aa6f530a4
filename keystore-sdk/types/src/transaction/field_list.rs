use alloy_rlp::{Decodable, Encodable, Header};

use crate::primitives::CodecError;

/// An ordered RLP list schema. The implementing struct's field order is the
/// wire order (enforced by the `RlpEncodable`/`RlpDecodable` derives), and
/// [`FieldList::FIELDS`] names each position so that encode and decode share
/// one table.
pub trait FieldList: Encodable + Decodable + Sized {
    const FIELDS: &'static [&'static str];

    fn encode_fields(&self) -> Vec<u8> {
        let mut out = Vec::<u8>::with_capacity(self.length());
        self.encode(&mut out);
        out
    }

    /// Decodes a list from the front of `buf`, advancing it. The number of
    /// list items must match [`FieldList::FIELDS`].
    fn decode_fields(buf: &mut &[u8]) -> Result<Self, CodecError> {
        let got = count_list_items(buf)?;
        if got != Self::FIELDS.len() {
            return Err(CodecError::FieldCount {
                expected: Self::FIELDS.len(),
                got,
            });
        }
        Ok(Self::decode(buf)?)
    }

    /// Same as [`FieldList::decode_fields`] but rejects trailing bytes.
    fn decode_exact(mut buf: &[u8]) -> Result<Self, CodecError> {
        let decoded = Self::decode_fields(&mut buf)?;
        if !buf.is_empty() {
            return Err(CodecError::TrailingBytes(buf.len()));
        }
        Ok(decoded)
    }
}

/// Counts the top-level items of the RLP list at the front of `buf` without
/// advancing it.
pub fn count_list_items(buf: &[u8]) -> Result<usize, CodecError> {
    let mut cursor = buf;
    let header = Header::decode(&mut cursor)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString.into());
    }
    if cursor.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }

    let mut payload = &cursor[..header.payload_length];
    let mut count = 0;
    while !payload.is_empty() {
        let item = Header::decode(&mut payload)?;
        if payload.len() < item.payload_length {
            return Err(alloy_rlp::Error::InputTooShort.into());
        }
        // single-byte items are not consumed by `Header::decode`
        payload = &payload[item.payload_length..];
        count += 1;
    }
    Ok(count)
}
