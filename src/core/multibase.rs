//! Multibase encoding of binary protocol fields (nonces, keys, signatures, ciphertexts).

use base64::prelude::*;

use crate::error::{Error, Result};

/// Supported multibase alphabets, identified by their one-character prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// `z`
    Base58Btc,
    /// `m`, RFC 4648 without padding.
    Base64,
    /// `M`
    Base64Pad,
    /// `u`
    Base64Url,
    /// `U`
    Base64UrlPad,
}

impl Base {
    pub fn prefix(self) -> char {
        match self {
            Self::Base58Btc => 'z',
            Self::Base64 => 'm',
            Self::Base64Pad => 'M',
            Self::Base64Url => 'u',
            Self::Base64UrlPad => 'U',
        }
    }

    fn from_prefix(prefix: char) -> Option<Self> {
        Some(match prefix {
            'z' => Self::Base58Btc,
            'm' => Self::Base64,
            'M' => Self::Base64Pad,
            'u' => Self::Base64Url,
            'U' => Self::Base64UrlPad,
            _ => return None,
        })
    }
}

pub fn encode(base: Base, data: impl AsRef<[u8]>) -> String {
    let data = data.as_ref();
    let body = match base {
        Base::Base58Btc => bs58::encode(data).into_string(),
        Base::Base64 => BASE64_STANDARD_NO_PAD.encode(data),
        Base::Base64Pad => BASE64_STANDARD.encode(data),
        Base::Base64Url => BASE64_URL_SAFE_NO_PAD.encode(data),
        Base::Base64UrlPad => BASE64_URL_SAFE.encode(data),
    };
    format!("{}{body}", base.prefix())
}

/// Shorthand for the base58btc encoding used by almost every protocol field.
pub fn encode_base58(data: impl AsRef<[u8]>) -> String {
    encode(Base::Base58Btc, data)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let mut chars = encoded.chars();
    let prefix = chars
        .next()
        .ok_or_else(|| Error::decode("multibase", "empty input"))?;
    let base = Base::from_prefix(prefix)
        .ok_or_else(|| Error::decode("multibase", format!("unsupported prefix '{prefix}'")))?;
    let body = chars.as_str();

    match base {
        Base::Base58Btc => bs58::decode(body)
            .into_vec()
            .map_err(|e| Error::decode("multibase", e)),
        Base::Base64 => BASE64_STANDARD_NO_PAD
            .decode(body)
            .map_err(|e| Error::decode("multibase", e)),
        Base::Base64Pad => BASE64_STANDARD
            .decode(body)
            .map_err(|e| Error::decode("multibase", e)),
        Base::Base64Url => BASE64_URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| Error::decode("multibase", e)),
        Base::Base64UrlPad => BASE64_URL_SAFE
            .decode(body)
            .map_err(|e| Error::decode("multibase", e)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nonce_and_key_round_trip() {
        let nonce = [7u8; 16];
        let key = crate::core::crypto::EphemeralKeyPair::generate();
        let secret = key.secret_bytes();

        for base in [Base::Base58Btc, Base::Base64, Base::Base64UrlPad] {
            assert_eq!(decode(&encode(base, nonce)).unwrap(), nonce);
            assert_eq!(decode(&encode(base, &secret)).unwrap(), secret);
        }
    }

    #[test]
    fn known_base58_vector() {
        assert_eq!(encode_base58(b"hello world"), "zStV1DL6CwTryKyV");
        assert_eq!(decode("zStV1DL6CwTryKyV").unwrap(), b"hello world");
    }

    #[test]
    fn leading_zeroes_survive() {
        let data = [0u8, 0, 1, 2];
        assert_eq!(decode(&encode_base58(data)).unwrap(), data);
    }

    #[test]
    fn rejects_unknown_prefix() {
        let err = decode("f68656c6c6f").unwrap_err();
        assert_eq!(err.code(), "DECODE_ERROR");
        assert!(decode("").is_err());
    }
}
