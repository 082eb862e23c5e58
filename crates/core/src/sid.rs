//! Security identifier (SID) codec.
//!
//! Decodes the binary SID layout into its canonical `S-R-A-S1-S2-...` text
//! form:
//!
//! | bytes        | field                                   |
//! |--------------|-----------------------------------------|
//! | `0`          | revision                                |
//! | `1`          | sub-authority count `N`                 |
//! | `2..8`       | identifier authority, 48-bit big-endian |
//! | `8..8+4N`    | `N` sub-authorities, 32-bit little-endian |
//!
//! Authorities that do not fit in 32 bits are rendered in hexadecimal
//! (`0x...`). Malformed input never escapes as an error: the public
//! `decode*` helpers return `None`.

use std::fmt;

use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::errors::SidError;

const HEADER_LEN: usize = 8;

/// A decoded security identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sid {
    pub revision: u8,
    pub authority: u64,
    pub sub_authorities: Vec<u32>,
}

impl Sid {
    /// Parse the binary SID layout. Bytes past the declared sub-authority
    /// chain are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidError> {
        if bytes.is_empty() {
            return Err(SidError::Empty);
        }
        if bytes.len() < HEADER_LEN {
            return Err(SidError::TruncatedHeader { len: bytes.len() });
        }

        let revision = bytes[0];
        let count = bytes[1];
        let needed = HEADER_LEN + usize::from(count) * 4;
        if bytes.len() < needed {
            return Err(SidError::TruncatedSubAuthorities {
                declared: count,
                len: bytes.len(),
            });
        }

        let authority = bytes[2..HEADER_LEN]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

        let sub_authorities = bytes[HEADER_LEN..needed]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// The relative identifier: the last sub-authority.
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-", self.revision)?;
        if self.authority > u64::from(u32::MAX) {
            write!(f, "{:#x}", self.authority)?;
        } else {
            write!(f, "{}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{}", sub)?;
        }
        Ok(())
    }
}

/// Decode binary SID bytes into text, or `None` if the bytes are malformed.
pub fn decode(bytes: &[u8]) -> Option<String> {
    match Sid::from_bytes(bytes) {
        Ok(sid) => Some(sid.to_string()),
        Err(e) => {
            debug!(bytes = %hex::encode(bytes), error = %e, "malformed security identifier");
            None
        }
    }
}

/// Decode a SID supplied in an encoded-value wrapper. Only `base64`
/// (case-insensitive) is supported.
pub fn decode_encoded(encoding: &str, encoded: &str) -> Option<String> {
    match decode_encoded_inner(encoding, encoded) {
        Ok(sid) => Some(sid.to_string()),
        Err(e) => {
            debug!(encoding, error = %e, "could not decode wrapped security identifier");
            None
        }
    }
}

fn decode_encoded_inner(encoding: &str, encoded: &str) -> Result<Sid, SidError> {
    if !encoding.eq_ignore_ascii_case("base64") {
        return Err(SidError::UnsupportedEncoding(encoding.to_string()));
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    Sid::from_bytes(&bytes)
}

/// Extract a textual SID from a raw attribute value.
///
/// Accepts either the already-rendered text form (`"S-1-5-..."`) or an
/// `{"encoding": ..., "encoded": ...}` wrapper.
pub fn from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => {
            let encoding = map.get("encoding").and_then(Value::as_str)?;
            let encoded = map.get("encoded").and_then(Value::as_str)?;
            decode_encoded(encoding, encoded)
        }
        _ => None,
    }
}

/// The domain-relative prefix of a textual SID (everything before the RID).
pub fn domain_prefix(sid: &str) -> Option<&str> {
    sid.rsplit_once('-').map(|(prefix, _)| prefix)
}

/// The relative identifier of a textual SID.
pub fn relative_id(sid: &str) -> Option<u32> {
    sid.rsplit_once('-').and_then(|(_, rid)| rid.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S-1-5-21-1004336348-1177238915-682003330-512
    const DOMAIN_ADMINS: [u8; 28] = [
        0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, // header
        0x15, 0x00, 0x00, 0x00, // 21
        0xdc, 0xf4, 0xdc, 0x3b, // 1004336348
        0x83, 0x3d, 0x2b, 0x46, // 1177238915
        0x82, 0x8b, 0xa6, 0x28, // 682003330
        0x00, 0x02, 0x00, 0x00, // 512
    ];

    #[test]
    fn test_decode_domain_sid() {
        assert_eq!(
            decode(&DOMAIN_ADMINS).as_deref(),
            Some("S-1-5-21-1004336348-1177238915-682003330-512")
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        let first = decode(&DOMAIN_ADMINS);
        for _ in 0..5 {
            assert_eq!(decode(&DOMAIN_ADMINS), first);
        }
    }

    #[test]
    fn test_decode_builtin_administrators() {
        let bytes = [1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 0x20, 0x02, 0, 0];
        assert_eq!(decode(&bytes).as_deref(), Some("S-1-5-32-544"));
    }

    #[test]
    fn test_decode_wide_authority_is_hex() {
        let bytes = [1, 1, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 7, 0, 0, 0];
        assert_eq!(decode(&bytes).as_deref(), Some("S-1-0x10000000000-7"));
    }

    #[test]
    fn test_decode_no_sub_authorities() {
        let bytes = [1, 0, 0, 0, 0, 0, 0, 1];
        assert_eq!(decode(&bytes).as_deref(), Some("S-1-1"));
    }

    #[test]
    fn test_malformed_bytes() {
        assert_eq!(Sid::from_bytes(&[]), Err(SidError::Empty));
        assert_eq!(
            Sid::from_bytes(&[1, 1, 0]),
            Err(SidError::TruncatedHeader { len: 3 })
        );
        assert_eq!(
            Sid::from_bytes(&DOMAIN_ADMINS[..20]),
            Err(SidError::TruncatedSubAuthorities {
                declared: 5,
                len: 20
            })
        );
        assert!(decode(&DOMAIN_ADMINS[..20]).is_none());
    }

    #[test]
    fn test_decode_encoded_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(DOMAIN_ADMINS);
        assert_eq!(
            decode_encoded("base64", &encoded),
            decode(&DOMAIN_ADMINS)
        );
        assert_eq!(
            decode_encoded("BASE64", &encoded),
            decode(&DOMAIN_ADMINS)
        );
    }

    #[test]
    fn test_decode_encoded_unsupported() {
        assert!(decode_encoded("hex", "0105000000000005").is_none());
        assert!(decode_encoded("base64", "!!not base64!!").is_none());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(
            from_value(&Value::String("S-1-5-21-1-2-3-1104".into())).as_deref(),
            Some("S-1-5-21-1-2-3-1104")
        );
        let wrapped = serde_json::json!({
            "encoding": "base64",
            "encoded": base64::engine::general_purpose::STANDARD.encode(DOMAIN_ADMINS),
        });
        assert_eq!(
            from_value(&wrapped).as_deref(),
            Some("S-1-5-21-1004336348-1177238915-682003330-512")
        );
        assert!(from_value(&Value::Null).is_none());
        assert!(from_value(&Value::String(String::new())).is_none());
    }

    #[test]
    fn test_prefix_and_rid() {
        assert_eq!(domain_prefix("S-1-5-21-1-2-3-1105"), Some("S-1-5-21-1-2-3"));
        assert_eq!(relative_id("S-1-5-21-1-2-3-1105"), Some(1105));
        assert_eq!(relative_id("garbage"), None);
        assert_eq!(
            Sid::from_bytes(&DOMAIN_ADMINS).unwrap().rid(),
            Some(512)
        );
    }
}
