use anyhow::{bail, ensure, Context as _, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

pub trait Cipher {
    type EncryptionKey;

    fn new_key() -> Self::EncryptionKey;
    fn with_key(key: &Self::EncryptionKey) -> Self;
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

mod xchacha20poly1305cipher {
    use chacha20poly1305::{
        aead::{Aead, AeadCore, KeyInit, OsRng},
        Key, XChaCha20Poly1305,
    };

    use super::*;

    const NONCE_LEN: usize = 24;
    pub const KEY_LEN: usize = 32;

    pub struct XChaCha20Poly1305Cipher {
        cipher: XChaCha20Poly1305,
    }

    impl Cipher for XChaCha20Poly1305Cipher {
        type EncryptionKey = Key;

        fn new_key() -> Key {
            XChaCha20Poly1305::generate_key(&mut OsRng)
        }

        fn with_key(key: &Key) -> Self {
            Self {
                cipher: XChaCha20Poly1305::new(key),
            }
        }

        fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
            let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
            let ciphertext = self
                .cipher
                .encrypt(&nonce, plaintext)
                .map_err(|err| anyhow::anyhow!("Encryption failed: {err}"))?;

            let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            result.extend_from_slice(&nonce);
            result.extend_from_slice(&ciphertext);

            Ok(result)
        }

        fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
            if ciphertext.len() < NONCE_LEN {
                bail!("Ciphertext too small for nonce");
            }
            let nonce = &ciphertext[..NONCE_LEN];
            let ciphertext = &ciphertext[NONCE_LEN..];

            let plaintext = self
                .cipher
                .decrypt(nonce.into(), ciphertext)
                .map_err(|_| anyhow::anyhow!("Decryption failed, wrong key or corrupted file"))?;
            Ok(plaintext)
        }
    }

    pub fn key_from_bytes(bytes: &[u8]) -> Result<Key> {
        ensure!(
            bytes.len() == KEY_LEN,
            "Database key must be {KEY_LEN} bytes but is {} bytes",
            bytes.len()
        );
        Ok(Key::clone_from_slice(bytes))
    }
}
pub use xchacha20poly1305cipher::XChaCha20Poly1305Cipher;

pub type DbKey = <XChaCha20Poly1305Cipher as Cipher>::EncryptionKey;

pub fn encode_key(key: &DbKey) -> String {
    BASE64.encode(key.as_slice())
}

pub fn decode_key(encoded: &str) -> Result<DbKey> {
    let bytes = BASE64
        .decode(encoded.trim())
        .context("Database key isn't valid base64")?;
    xchacha20poly1305cipher::key_from_bytes(&bytes)
}
