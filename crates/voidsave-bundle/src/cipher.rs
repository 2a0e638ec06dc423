//! Symmetric envelope around exported save text
//!
//! The engine only needs "encrypt with a key" and its inverse. [`AesCipher`]
//! is the shipped implementation: AES-256 in CBC mode over PKCS#7-padded
//! plaintext, with a random IV and a short key check value inside the
//! envelope so a wrong key is reported as such instead of as garbage.
//! Output is ASCII: a magic prefix followed by base64.
//!
//! The key check is an unkeyed digest of the plaintext, not a MAC. It does
//! not authenticate the envelope; tampered ciphertext can still open.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

const BLOCK: usize = 16;
const CHECK_LEN: usize = 8;

/// Prefix of every [`AesCipher`] envelope
pub const MAGIC: &[u8] = b"VSB1:";

/// Secret the envelope is sealed with
///
/// Key management is the host's concern; any byte string works.
#[derive(Clone, PartialEq, Eq)]
pub struct BundleKey(Vec<u8>);

impl BundleKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(secret.as_ref().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn aes_key(&self) -> [u8; 32] {
        Sha256::digest(&self.0).into()
    }
}

impl std::fmt::Debug for BundleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BundleKey(..)")
    }
}

/// Envelope could not be opened
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("not a bundle envelope")]
    BadMagic,

    #[error("envelope is not valid base64: {0}")]
    Encoding(String),

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    Length(usize),

    #[error("invalid padding")]
    Padding,

    #[error("wrong key or corrupted envelope")]
    WrongKey,
}

/// Encryption collaborator
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], key: &BundleKey) -> Vec<u8>;

    fn decrypt(&self, ciphertext: &[u8], key: &BundleKey) -> Result<Vec<u8>, DecryptError>;
}

/// AES-256-CBC envelope
///
/// Confidentiality only: there is no authentication tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCipher;

impl Cipher for AesCipher {
    fn encrypt(&self, plaintext: &[u8], key: &BundleKey) -> Vec<u8> {
        let cipher = Aes256::new(&GenericArray::from(key.aes_key()));

        let mut body = Vec::with_capacity(CHECK_LEN + plaintext.len() + BLOCK);
        body.extend_from_slice(&key_check(plaintext));
        body.extend_from_slice(plaintext);
        let mut body = pkcs7_pad(&body);

        let mut iv = [0u8; BLOCK];
        rand::rng().fill_bytes(&mut iv);

        let mut prev = iv;
        for chunk in body.chunks_exact_mut(BLOCK) {
            for (byte, mask) in chunk.iter_mut().zip(prev.iter()) {
                *byte ^= mask;
            }
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
            prev.copy_from_slice(chunk);
        }

        let mut raw = Vec::with_capacity(BLOCK + body.len());
        raw.extend_from_slice(&iv);
        raw.extend_from_slice(&body);

        let mut out = MAGIC.to_vec();
        out.extend_from_slice(BASE64_ENGINE.encode(raw).as_bytes());
        out
    }

    fn decrypt(&self, ciphertext: &[u8], key: &BundleKey) -> Result<Vec<u8>, DecryptError> {
        let encoded = ciphertext
            .trim_ascii()
            .strip_prefix(MAGIC)
            .ok_or(DecryptError::BadMagic)?;
        let raw = BASE64_ENGINE
            .decode(encoded)
            .map_err(|e| DecryptError::Encoding(e.to_string()))?;
        if raw.len() < 2 * BLOCK || raw.len() % BLOCK != 0 {
            return Err(DecryptError::Length(raw.len()));
        }

        let cipher = Aes256::new(&GenericArray::from(key.aes_key()));
        let (iv, rest) = raw.split_at(BLOCK);
        let mut body = rest.to_vec();
        let mut prev = [0u8; BLOCK];
        prev.copy_from_slice(iv);
        for chunk in body.chunks_exact_mut(BLOCK) {
            let mut sealed = [0u8; BLOCK];
            sealed.copy_from_slice(chunk);
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
            for (byte, mask) in chunk.iter_mut().zip(prev.iter()) {
                *byte ^= mask;
            }
            prev = sealed;
        }

        // A wrong key almost always breaks the padding first
        let body = pkcs7_unpad(&body).map_err(|_| DecryptError::WrongKey)?;
        if body.len() < CHECK_LEN {
            return Err(DecryptError::WrongKey);
        }
        let (check, plaintext) = body.split_at(CHECK_LEN);
        if check != key_check(plaintext) {
            return Err(DecryptError::WrongKey);
        }
        Ok(plaintext.to_vec())
    }
}

/// No-op envelope, for hosts that encrypt elsewhere and for tests
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCipher;

impl Cipher for PlainCipher {
    fn encrypt(&self, plaintext: &[u8], _key: &BundleKey) -> Vec<u8> {
        plaintext.to_vec()
    }

    fn decrypt(&self, ciphertext: &[u8], _key: &BundleKey) -> Result<Vec<u8>, DecryptError> {
        Ok(ciphertext.to_vec())
    }
}

/// Key check value: the first bytes of SHA-256 over the plaintext
///
/// Detects a wrong key. Anyone can recompute it, so it proves nothing about
/// who produced the envelope.
fn key_check(plaintext: &[u8]) -> [u8; CHECK_LEN] {
    let digest = Sha256::digest(plaintext);
    let mut check = [0u8; CHECK_LEN];
    check.copy_from_slice(&digest[..CHECK_LEN]);
    check
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK - (data.len() % BLOCK);
    let mut result = data.to_vec();
    result.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    result
}

fn pkcs7_unpad(data: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if data.is_empty() || data.len() % BLOCK != 0 {
        return Err(DecryptError::Padding);
    }
    let pad_len = *data.last().ok_or(DecryptError::Padding)? as usize;
    if pad_len == 0 || pad_len > BLOCK || pad_len > data.len() {
        return Err(DecryptError::Padding);
    }
    if !data[data.len() - pad_len..]
        .iter()
        .all(|&byte| byte as usize == pad_len)
    {
        return Err(DecryptError::Padding);
    }
    Ok(data[..data.len() - pad_len].to_vec())
}
