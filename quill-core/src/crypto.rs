// Quill - A small blog CMS built with Rust
// Copyright (C) 2025 Quill Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Symmetric encryption of stored credentials.
//!
//! Values are sealed with AES-256-GCM under the server's `AUTH_SECRET`.
//! Encoded form: `<nonce hex>:<ciphertext hex>` where the ciphertext carries
//! the 16-byte GCM tag.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Length of the server secret in bytes (AES-256)
pub const SECRET_LENGTH: usize = 32;

const NONCE_LENGTH: usize = 12;
const TOKEN_BYTES: usize = 20;

#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Build a cipher from the raw server secret, which must be exactly 32 bytes
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.len() != SECRET_LENGTH {
            return Err(anyhow!(
                "Auth secret must be exactly {} bytes, got {}",
                SECRET_LENGTH,
                secret.len()
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(secret)
            .map_err(|e| anyhow!("Failed to initialise cipher: {}", e))?;

        Ok(Self { cipher })
    }

    /// Encrypt text with a fresh random nonce
    pub fn encrypt_text(&self, text: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, text.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        Ok(format!("{}:{}", hex::encode(nonce), hex::encode(ciphertext)))
    }

    /// Decrypt text produced by [`SecretCipher::encrypt_text`]
    pub fn decrypt_text(&self, encoded: &str) -> Result<String> {
        let (nonce_hex, ciphertext_hex) = encoded
            .split_once(':')
            .ok_or_else(|| anyhow!("Encrypted value is missing the nonce separator"))?;

        let nonce_bytes = hex::decode(nonce_hex).context("Invalid nonce encoding")?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(anyhow!(
                "Nonce must be {} bytes, got {}",
                NONCE_LENGTH,
                nonce_bytes.len()
            ));
        }
        let ciphertext = hex::decode(ciphertext_hex).context("Invalid ciphertext encoding")?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| anyhow!("Decryption failed: wrong key or corrupted value"))?;

        String::from_utf8(plaintext).context("Decrypted value is not valid UTF-8")
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretCipher(..)")
    }
}

/// Compare two strings without leaking the position of the first difference
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Random token used for API keys and secrets (40 hex characters)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
