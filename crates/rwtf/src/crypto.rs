//! Authenticated encryption for encrypted section bodies.
//!
//! Sealed bodies are laid out as `nonce || ciphertext || tag` with a fresh
//! 24-byte nonce per seal, a 16-byte Poly1305 tag, and no associated data.
//! The tag is the sole integrity check for an encrypted payload.

use crate::error::{Result, RwtfError};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

/// Required key length in bytes. Any other length is rejected.
pub(crate) const KEY_SIZE: usize = 32;

/// XChaCha20 nonce length in bytes.
pub(crate) const NONCE_SIZE: usize = 24;

/// Poly1305 tag length in bytes.
pub(crate) const TAG_SIZE: usize = 16;

/// Generates fresh key material suitable for an encrypted section.
pub fn random_key_material() -> Vec<u8> {
    XChaCha20Poly1305::generate_key(&mut OsRng).to_vec()
}

/// Checks a caller-supplied key's length.
pub(crate) fn check_key(key: &[u8]) -> Result<&[u8]> {
    if key.len() != KEY_SIZE {
        return Err(RwtfError::DecryptFail);
    }
    Ok(key)
}

/// Seals `plaintext` under `key` with a fresh random nonce.
pub(crate) fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    let aead = XChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = aead
        .encrypt(&nonce, plaintext)
        .map_err(|_| RwtfError::DecryptFail)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens a sealed body, authenticating it against `key`.
///
/// Wrong key, wrong key length, and tampered bytes are indistinguishable:
/// all surface as `DecryptFail`.
pub(crate) fn open(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(RwtfError::DecryptFail);
    }
    let aead = XChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = XNonce::from_slice(&sealed[..NONCE_SIZE]);
    aead.decrypt(nonce, &sealed[NONCE_SIZE..])
        .map_err(|_| RwtfError::DecryptFail)
}
