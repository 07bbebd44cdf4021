//! Content digests: blob identity and integrity proof.
//!
//! A blob is addressed solely by the SHA-1 of its bytes. Equal digests are
//! treated as equal content; the collision risk is an accepted design
//! assumption and is not re-verified beyond hashing. The hex form is 40
//! chars; the first two select the shard directory under objects/.

use std::fmt;

use sha1::{Digest as _, Sha1};

use crate::consts::{DIGEST_HEX_LEN, DIGEST_LEN};
use crate::error::{FarmError, Result};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Compute the digest of a byte sequence.
    pub fn of(bytes: &[u8]) -> Self {
        let mut h = Sha1::new();
        h.update(bytes);
        let out = h.finalize();
        let mut raw = [0u8; DIGEST_LEN];
        raw.copy_from_slice(&out);
        Digest(raw)
    }

    /// Build from raw bytes read off disk. Length must be exactly 20.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DIGEST_LEN {
            return Err(FarmError::Corrupt(format!(
                "digest length {} (expected {})",
                bytes.len(),
                DIGEST_LEN
            )));
        }
        let mut raw = [0u8; DIGEST_LEN];
        raw.copy_from_slice(bytes);
        Ok(Digest(raw))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }

    /// Parse the 40-char lower/upper hex form.
    pub fn parse_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != DIGEST_HEX_LEN || !s.is_ascii() {
            return Err(FarmError::Corrupt(format!("bad digest hex '{}'", s)));
        }
        let mut raw = [0u8; DIGEST_LEN];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| FarmError::Corrupt(format!("bad digest hex '{}'", s)))?;
        }
        Ok(Digest(raw))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        // sha1("abc")
        let d = Digest::of(b"abc");
        assert_eq!(d.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn hex_roundtrip() {
        let d = Digest::of(b"roundtrip");
        let parsed = Digest::parse_hex(&d.to_hex()).unwrap();
        assert_eq!(d, parsed);

        assert!(Digest::parse_hex("zz").is_err());
        assert!(Digest::parse_hex(&"0".repeat(39)).is_err());
    }

    #[test]
    fn from_bytes_checks_length() {
        assert!(Digest::from_bytes(&[0u8; 19]).is_err());
        assert!(Digest::from_bytes(&[0u8; 20]).is_ok());
    }
}
