//! Primitives behind key agreement and session-token decryption: secp256r1 ECDH, nonce
//! merging, session-key derivation and AES-CBC.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use p256::{ecdh::diffie_hellman, elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Size of the client nonce sent with the ECDH request.
pub const CLIENT_NONCE_SIZE: usize = 16;

/// Size of the nonce obtained by merging client and server nonces.
pub const MERGED_NONCE_SIZE: usize = 16;

/// Size of an AES-CBC initialisation vector.
pub const IV_SIZE: usize = 16;

/// Elliptic curves negotiated during key agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curve {
    #[serde(rename = "Secp256r1")]
    Secp256r1,
}

/// Symmetric ciphers a session key can be derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetricCipher {
    #[serde(rename = "AES-128-CBC")]
    Aes128Cbc,
    #[serde(rename = "AES-256-CBC")]
    Aes256Cbc,
}

impl SymmetricCipher {
    pub fn key_size(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes256Cbc => 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Padding {
    #[serde(rename = "PKCS5")]
    Pkcs5,
}

pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

pub fn sha256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Sha256::digest(data.as_ref()).into()
}

/// An ephemeral secp256r1 key pair, used for exactly one key agreement.
#[derive(Clone, Debug)]
pub struct EphemeralKeyPair {
    secret: SecretKey,
}

impl EphemeralKeyPair {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(|secret| Self { secret })
            .map_err(|_| Error::Crypto("invalid secp256r1 private key".into()))
    }

    pub fn secret_bytes(&self) -> Vec<u8> {
        self.secret.to_bytes().to_vec()
    }

    /// Compressed SEC1 encoding of the public key.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.secret
            .public_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Raw x-coordinate of the ECDH point shared with `peer_public_key` (SEC1 encoded).
    pub fn shared_secret(&self, peer_public_key: &[u8]) -> Result<[u8; 32]> {
        let peer = PublicKey::from_sec1_bytes(peer_public_key)
            .map_err(|_| Error::Crypto("invalid secp256r1 public key".into()))?;
        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());

        let mut secret = [0u8; 32];
        secret.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Ok(secret)
    }
}

/// Combine client and server nonces: `SHA-256(client || server)`, truncated.
pub fn merge_nonce(client_nonce: &[u8], server_nonce: &[u8]) -> [u8; MERGED_NONCE_SIZE] {
    let digest = sha256([client_nonce, server_nonce].concat());
    let mut merged = [0u8; MERGED_NONCE_SIZE];
    merged.copy_from_slice(&digest[..MERGED_NONCE_SIZE]);
    merged
}

/// Derive the symmetric session key: `SHA-256(shared_secret || merged_nonce)`, truncated to the
/// key size of `cipher`.
pub fn merge_shared_secret_and_nonce(
    shared_secret: &[u8],
    merged_nonce: &[u8],
    cipher: SymmetricCipher,
) -> Vec<u8> {
    let digest = sha256([shared_secret, merged_nonce].concat());
    digest[..cipher.key_size()].to_vec()
}

/// Full client-side session-key derivation from the ephemeral key, the server's ephemeral public
/// key and both nonces.
pub fn derive_session_key(
    key_pair: &EphemeralKeyPair,
    server_public_key: &[u8],
    client_nonce: &[u8],
    server_nonce: &[u8],
    cipher: SymmetricCipher,
) -> Result<Vec<u8>> {
    let shared_secret = key_pair.shared_secret(server_public_key)?;
    let merged = merge_nonce(client_nonce, server_nonce);
    Ok(merge_shared_secret_and_nonce(&shared_secret, &merged, cipher))
}

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

pub fn decrypt(cipher: SymmetricCipher, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let invalid = |_| Error::Crypto(format!("invalid key or iv length for {cipher:?}"));
    let unpad = |_| Error::Crypto("decryption failed: bad padding".into());

    match cipher {
        SymmetricCipher::Aes128Cbc => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(unpad),
        SymmetricCipher::Aes256Cbc => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(unpad),
    }
}

pub fn encrypt(cipher: SymmetricCipher, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let invalid = |_| Error::Crypto(format!("invalid key or iv length for {cipher:?}"));

    Ok(match cipher {
        SymmetricCipher::Aes128Cbc => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        SymmetricCipher::Aes256Cbc => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ecdh_is_symmetric() {
        let client = EphemeralKeyPair::generate();
        let server = EphemeralKeyPair::generate();

        let a = client.shared_secret(&server.public_key_bytes()).unwrap();
        let b = server.shared_secret(&client.public_key_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn session_key_is_deterministic() {
        let client = EphemeralKeyPair::generate();
        let server = EphemeralKeyPair::generate();
        let client_nonce = random_bytes(CLIENT_NONCE_SIZE);
        let server_nonce = random_bytes(CLIENT_NONCE_SIZE);

        let restored = EphemeralKeyPair::from_secret_bytes(&client.secret_bytes()).unwrap();

        let first = derive_session_key(
            &client,
            &server.public_key_bytes(),
            &client_nonce,
            &server_nonce,
            SymmetricCipher::Aes256Cbc,
        )
        .unwrap();
        let second = derive_session_key(
            &restored,
            &server.public_key_bytes(),
            &client_nonce,
            &server_nonce,
            SymmetricCipher::Aes256Cbc,
        )
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 32);

        // The server arrives at the same key from its side of the exchange.
        let server_side = derive_session_key(
            &server,
            &client.public_key_bytes(),
            &client_nonce,
            &server_nonce,
            SymmetricCipher::Aes256Cbc,
        )
        .unwrap();
        assert_eq!(first, server_side);
    }

    #[test]
    fn nonce_merge_is_order_sensitive() {
        let a = [1u8; 16];
        let b = [2u8; 16];
        assert_eq!(merge_nonce(&a, &b), merge_nonce(&a, &b));
        assert_ne!(merge_nonce(&a, &b), merge_nonce(&b, &a));
    }

    #[test]
    fn aes_cbc_round_trip() {
        let key = random_bytes(32);
        let iv = random_bytes(IV_SIZE);
        let ct = encrypt(SymmetricCipher::Aes256Cbc, &key, &iv, b"server token seed").unwrap();
        assert_eq!(ct.len() % 16, 0);
        let pt = decrypt(SymmetricCipher::Aes256Cbc, &key, &iv, &ct).unwrap();
        assert_eq!(pt, b"server token seed");
    }

    #[test]
    fn wrong_key_fails_or_garbles() {
        let iv = random_bytes(IV_SIZE);
        let ct = encrypt(SymmetricCipher::Aes256Cbc, &[1u8; 32], &iv, b"seed").unwrap();
        let result = decrypt(SymmetricCipher::Aes256Cbc, &[2u8; 32], &iv, &ct);
        assert!(result.map(|pt| pt != b"seed").unwrap_or(true));
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(decrypt(SymmetricCipher::Aes256Cbc, &[0u8; 16], &[0u8; 16], &[0u8; 16]).is_err());
        assert!(EphemeralKeyPair::from_secret_bytes(&[0u8; 31]).is_err());
        assert!(EphemeralKeyPair::generate().shared_secret(&[2u8; 10]).is_err());
    }
}
