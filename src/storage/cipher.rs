// src/storage/cipher.rs
use std::num::NonZeroU32;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use ring::pbkdf2;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use super::errors::*;
use crate::core::gesture::types::GestureSample;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// A gesture sample as it rests in the template document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedSample {
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
    /// SHA3-256 of the plaintext, checked after decryption.
    pub checksum: String,
}

/// Seals samples with AES-256-GCM under a key derived per template from the
/// server secret and a fresh random salt.
pub struct TemplateCipher {
    secret: Vec<u8>,
    iterations: NonZeroU32,
}

impl TemplateCipher {
    pub fn new(secret: &[u8], iterations: u32) -> Result<Self> {
        if secret.is_empty() {
            return Err(StorageError::KeyError("Empty server secret".to_string()));
        }
        let iterations = NonZeroU32::new(iterations)
            .ok_or_else(|| StorageError::KeyError("KDF iterations must be non-zero".to_string()))?;

        Ok(Self {
            secret: secret.to_vec(),
            iterations,
        })
    }

    fn derive_cipher(&self, salt: &[u8]) -> Aes256Gcm {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            &self.secret,
            &mut key,
        );
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<SealedSample> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = self.derive_cipher(&salt);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), data)
            .map_err(|e| StorageError::EncryptionError(e.to_string()))?;

        Ok(SealedSample {
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
            checksum: hex::encode(Sha3_256::digest(data)),
        })
    }

    pub fn decrypt(&self, sealed: &SealedSample) -> Result<Vec<u8>> {
        let salt = decode_field("salt", &sealed.salt)?;
        let nonce_bytes = decode_field("nonce", &sealed.nonce)?;
        let ciphertext = decode_field("ciphertext", &sealed.ciphertext)?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(StorageError::DecryptionError(
                "Invalid nonce length".to_string()
            ));
        }

        let cipher = self.derive_cipher(&salt);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|e| StorageError::DecryptionError(e.to_string()))?;

        if hex::encode(Sha3_256::digest(&plaintext)) != sealed.checksum {
            return Err(StorageError::IntegrityError(
                "Checksum mismatch".to_string()
            ));
        }

        Ok(plaintext)
    }

    pub fn seal(&self, sample: &GestureSample) -> Result<SealedSample> {
        let serialized = serde_json::to_vec(sample)
            .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
        self.encrypt(&serialized)
    }

    pub fn open(&self, sealed: &SealedSample) -> Result<GestureSample> {
        let plaintext = self.decrypt(sealed)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| StorageError::DecryptionError(format!("Malformed sample: {}", e)))
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| StorageError::DecryptionError(format!("Invalid {} encoding: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture::types::Point3;

    fn cipher() -> TemplateCipher {
        TemplateCipher::new(b"server-secret", 1_000).unwrap()
    }

    fn sample() -> GestureSample {
        GestureSample::new(
            vec![Point3::new(0.1, 0.2, 0.3), Point3::new(0.4, 0.5, 0.6), Point3::new(0.7, 0.8, 0.9)],
            vec![0.0, 640.0, 1310.0],
        )
    }

    #[test]
    fn test_seal_and_open() {
        let cipher = cipher();
        let sealed = cipher.seal(&sample()).unwrap();
        assert_eq!(cipher.open(&sealed).unwrap(), sample());
    }

    #[test]
    fn test_salt_and_nonce_are_fresh() {
        let cipher = cipher();
        let a = cipher.seal(&sample()).unwrap();
        let b = cipher.seal(&sample()).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sealed = cipher().seal(&sample()).unwrap();
        let other = TemplateCipher::new(b"another-secret", 1_000).unwrap();
        assert!(matches!(other.open(&sealed), Err(StorageError::DecryptionError(_))));
    }

    #[test]
    fn test_tampered_fields_fail() {
        let cipher = cipher();
        let mut sealed = cipher.seal(&sample()).unwrap();
        let flipped = if sealed.ciphertext.starts_with("00") { "01" } else { "00" };
        sealed.ciphertext.replace_range(0..2, flipped);
        assert!(cipher.open(&sealed).is_err());

        let mut sealed = cipher.seal(&sample()).unwrap();
        sealed.nonce = "zz".to_string();
        assert!(matches!(cipher.open(&sealed), Err(StorageError::DecryptionError(_))));

        let mut sealed = cipher.seal(&sample()).unwrap();
        sealed.checksum = hex::encode([0u8; 32]);
        assert!(matches!(cipher.open(&sealed), Err(StorageError::IntegrityError(_))));
    }

    #[test]
    fn test_rejects_empty_secret() {
        assert!(TemplateCipher::new(b"", 1_000).is_err());
        assert!(TemplateCipher::new(b"secret", 0).is_err());
    }
}
