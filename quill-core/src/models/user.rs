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

use anyhow::Result;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{constant_time_eq, generate_token, SecretCipher};
use crate::policy::Actor;

/// Failed logins allowed inside one throttle window
pub const MAX_LOGIN_ATTEMPTS: i64 = 5;

/// Length of the throttle window, restarted on every failed attempt
pub const LOGIN_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub login_attempts: i64,
    pub login_attempts_expiry: DateTime<Utc>,
}

impl User {
    /// Create a new user with a hashed password and a fresh pair of API credentials
    pub fn new(
        username: String,
        password: &str,
        is_admin: bool,
        cipher: &SecretCipher,
    ) -> Result<Self> {
        let password_hash = Self::hash_password(password)?;
        let now = Utc::now();

        let mut user = Self {
            id: None,
            username,
            password_hash,
            api_key: String::new(),
            api_secret: String::new(),
            is_admin,
            created_at: now,
            login_attempts: 0,
            login_attempts_expiry: now,
        };
        user.generate_api_keys(cipher)?;

        Ok(user)
    }

    /// Hash a password using Argon2
    pub fn hash_password(password: &str) -> Result<String> {
        use argon2::password_hash::rand_core::OsRng;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(password_hash)
    }

    /// Set a new password for the user
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password_hash = Self::hash_password(password)?;
        Ok(())
    }

    /// Verify a password against the stored hash
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};

        let parsed_hash = PasswordHash::new(&self.password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// Issue a new public API key and a new private secret.
    /// The secret is only ever stored encrypted.
    pub fn generate_api_keys(&mut self, cipher: &SecretCipher) -> Result<()> {
        let private_secret = generate_token();
        self.api_key = generate_token();
        self.api_secret = cipher.encrypt_text(&private_secret)?;
        Ok(())
    }

    /// Decrypt the API secret for display to its owner
    pub fn reveal_api_secret(&self, cipher: &SecretCipher) -> Result<String> {
        cipher.decrypt_text(&self.api_secret)
    }

    pub fn verify_api_secret(&self, candidate: &str, cipher: &SecretCipher) -> Result<bool> {
        let secret = self.reveal_api_secret(cipher)?;
        Ok(constant_time_eq(&secret, candidate))
    }

    /// Check whether the login throttle is engaged.
    ///
    /// Once the window has passed the counter is reset; the caller is
    /// responsible for persisting that reset.
    pub fn too_many_logins(&mut self, now: DateTime<Utc>) -> bool {
        if now >= self.login_attempts_expiry {
            self.login_attempts = 0;
            return false;
        }

        self.login_attempts >= MAX_LOGIN_ATTEMPTS
    }

    /// Count a password check, successful or not, and push the window out
    pub fn record_login_attempt(&mut self, now: DateTime<Utc>) {
        self.login_attempts += 1;
        self.login_attempts_expiry = now + Duration::minutes(LOGIN_WINDOW_MINUTES);
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id.unwrap_or_default(),
            username: self.username.clone(),
            is_admin: self.is_admin,
        }
    }

    /// Validate the persisted fields
    pub fn is_valid(&self) -> Result<(), String> {
        if self.username.is_empty() {
            return Err("Username cannot be empty".to_string());
        }

        if self.password_hash.is_empty() {
            return Err("Password hash cannot be empty".to_string());
        }

        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err("API credentials cannot be empty".to_string());
        }

        Ok(())
    }
}
