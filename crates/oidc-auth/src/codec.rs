//! Binary encoding of the persisted AuthState
//!
//! Length-prefixed record with an explicit presence tag per optional field,
//! so absent fields round-trip as absent rather than as empty strings.
//!
//! Layout:
//! ```text
//! byte 0        format version (0x01)
//! then 4 fields access_token, access_token_expiration_time,
//!               id_token, refresh_token
//!   per field   presence byte (0x00 absent | 0x01 present)
//!   if present  strings -> u32 LE byte length + UTF-8 bytes
//!               expiry  -> u64 LE (epoch milliseconds)
//! ```
//!
//! The format is private to this SDK and not meant for external tooling.
//! Decoding is strict: truncation, unknown tags or versions, non-UTF-8
//! string bytes, and trailing bytes all fail with
//! `StorageError::DecodeFailed`.

use crate::error::StorageError;
use crate::state::AuthState;

/// Format version written as the first byte of every record.
const FORMAT_VERSION: u8 = 1;

const TAG_ABSENT: u8 = 0;
const TAG_PRESENT: u8 = 1;

/// Encode an AuthState into its binary record.
pub fn encode(state: &AuthState) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.push(FORMAT_VERSION);
    put_string(&mut out, state.access_token.as_deref());
    put_u64(&mut out, state.access_token_expiration_time);
    put_string(&mut out, state.id_token.as_deref());
    put_string(&mut out, state.refresh_token.as_deref());
    out
}

/// Decode a binary record back into an AuthState.
pub fn decode(bytes: &[u8]) -> Result<AuthState, StorageError> {
    let mut cursor = Cursor::new(bytes);

    let version = cursor.take_u8()?;
    if version != FORMAT_VERSION {
        return Err(StorageError::DecodeFailed(format!(
            "unsupported format version {version}"
        )));
    }

    let access_token = take_string(&mut cursor)?;
    let access_token_expiration_time = take_u64(&mut cursor)?;
    let id_token = take_string(&mut cursor)?;
    let refresh_token = take_string(&mut cursor)?;

    let trailing = cursor.remaining();
    if trailing != 0 {
        return Err(StorageError::DecodeFailed(format!(
            "{trailing} trailing bytes after record"
        )));
    }

    Ok(AuthState {
        access_token,
        access_token_expiration_time,
        id_token,
        refresh_token,
    })
}

fn put_string(out: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(s) => {
            out.push(TAG_PRESENT);
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        None => out.push(TAG_ABSENT),
    }
}

fn put_u64(out: &mut Vec<u8>, value: Option<u64>) {
    match value {
        Some(v) => {
            out.push(TAG_PRESENT);
            out.extend_from_slice(&v.to_le_bytes());
        }
        None => out.push(TAG_ABSENT),
    }
}

fn take_string(cursor: &mut Cursor<'_>) -> Result<Option<String>, StorageError> {
    if !cursor.take_tag()? {
        return Ok(None);
    }
    let len = cursor.take_u32()? as usize;
    let bytes = cursor.take_exact(len)?;
    let s = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::DecodeFailed(format!("invalid UTF-8 in string field: {e}")))?;
    Ok(Some(s.to_owned()))
}

fn take_u64(cursor: &mut Cursor<'_>) -> Result<Option<u64>, StorageError> {
    if !cursor.take_tag()? {
        return Ok(None);
    }
    let bytes = cursor.take_exact(8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(Some(u64::from_le_bytes(buf)))
}

/// Bounds-checked reader over the raw record.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take_exact(&mut self, n: usize) -> Result<&'a [u8], StorageError> {
        if self.remaining() < n {
            return Err(StorageError::DecodeFailed(format!(
                "unexpected end of input: need {n} bytes at offset {}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, StorageError> {
        Ok(self.take_exact(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32, StorageError> {
        let bytes = self.take_exact(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    fn take_tag(&mut self) -> Result<bool, StorageError> {
        match self.take_u8()? {
            TAG_ABSENT => Ok(false),
            TAG_PRESENT => Ok(true),
            other => Err(StorageError::DecodeFailed(format!(
                "invalid presence tag {other:#04x} at offset {}",
                self.pos - 1
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_state() -> AuthState {
        AuthState {
            access_token: Some("AT1".into()),
            access_token_expiration_time: Some(1_735_500_000_000),
            id_token: Some("IT1".into()),
            refresh_token: Some("RT1".into()),
        }
    }

    #[test]
    fn roundtrip_all_fields_present() {
        let state = full_state();
        assert_eq!(decode(&encode(&state)).unwrap(), state);
    }

    #[test]
    fn roundtrip_all_fields_absent() {
        let state = AuthState::default();
        assert_eq!(decode(&encode(&state)).unwrap(), state);
    }

    #[test]
    fn roundtrip_every_single_field_subset() {
        // Each of the 16 presence combinations must round-trip exactly
        for mask in 0u8..16 {
            let state = AuthState {
                access_token: (mask & 1 != 0).then(|| "at".into()),
                access_token_expiration_time: (mask & 2 != 0).then_some(42),
                id_token: (mask & 4 != 0).then(|| "it".into()),
                refresh_token: (mask & 8 != 0).then(|| "rt".into()),
            };
            assert_eq!(decode(&encode(&state)).unwrap(), state, "mask {mask:#06b}");
        }
    }

    #[test]
    fn absent_string_stays_absent_not_empty() {
        let state = AuthState {
            access_token: Some(String::new()),
            ..Default::default()
        };
        let decoded = decode(&encode(&state)).unwrap();
        // Present-but-empty and absent are distinct values
        assert_eq!(decoded.access_token, Some(String::new()));
        assert_eq!(decoded.refresh_token, None);
    }

    #[test]
    fn empty_input_fails_decode() {
        assert!(matches!(decode(&[]), Err(StorageError::DecodeFailed(_))));
    }

    #[test]
    fn unknown_version_fails_decode() {
        let mut bytes = encode(&full_state());
        bytes[0] = 9;
        assert!(matches!(
            decode(&bytes),
            Err(StorageError::DecodeFailed(_))
        ));
    }

    #[test]
    fn every_truncation_fails_decode() {
        let bytes = encode(&full_state());
        for cut in 0..bytes.len() {
            let result = decode(&bytes[..cut]);
            assert!(
                matches!(result, Err(StorageError::DecodeFailed(_))),
                "truncation at {cut} must fail with DecodeFailed"
            );
        }
    }

    #[test]
    fn invalid_presence_tag_fails_decode() {
        // Version byte followed by a bogus tag for the first field
        assert!(matches!(
            decode(&[FORMAT_VERSION, 0x7f]),
            Err(StorageError::DecodeFailed(_))
        ));
    }

    #[test]
    fn trailing_bytes_fail_decode() {
        let mut bytes = encode(&full_state());
        bytes.push(0x00);
        assert!(matches!(
            decode(&bytes),
            Err(StorageError::DecodeFailed(_))
        ));
    }

    #[test]
    fn invalid_utf8_fails_decode() {
        let mut bytes = vec![FORMAT_VERSION];
        bytes.push(1); // access_token present
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]); // not UTF-8
        bytes.extend_from_slice(&[0, 0, 0]); // remaining fields absent
        assert!(matches!(
            decode(&bytes),
            Err(StorageError::DecodeFailed(_))
        ));
    }

    #[test]
    fn oversized_length_prefix_fails_decode() {
        let mut bytes = vec![FORMAT_VERSION];
        bytes.push(1);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(StorageError::DecodeFailed(_))
        ));
    }
}
