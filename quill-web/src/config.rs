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

use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf};

/// Length in bytes of `AUTH_SECRET`, the key that encrypts API secrets
pub const AUTH_SECRET_LENGTH: usize = quill_core::crypto::SECRET_LENGTH;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub templates_dir: String,
    pub static_dir: String,
    pub auth_secret: String,
    pub development_mode: bool,
    pub secure_cookies: bool,
    pub session_hours: i64,
    pub login_rate_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_root = Self::find_project_root()?;
        let default_templates_dir = project_root.join("templates").to_string_lossy().to_string();
        let default_static_dir = project_root.join("static").to_string_lossy().to_string();

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:quill.db".to_string());
        if !database_url.starts_with("sqlite:") {
            bail!("DATABASE_URL must be a sqlite: URL, got '{}'", database_url);
        }

        let auth_secret = lookup("AUTH_SECRET").context("AUTH_SECRET must be set")?;
        if auth_secret.len() != AUTH_SECRET_LENGTH {
            bail!(
                "AUTH_SECRET must be exactly {} bytes long, got {}",
                AUTH_SECRET_LENGTH,
                auth_secret.len()
            );
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            templates_dir: lookup("TEMPLATES_DIR").unwrap_or(default_templates_dir),
            static_dir: lookup("STATIC_DIR").unwrap_or(default_static_dir),
            auth_secret,
            development_mode: parse_flag(lookup("DEVELOPMENT_MODE")),
            secure_cookies: parse_flag(lookup("SECURE_COOKIES")),
            session_hours: lookup("SESSION_HOURS")
                .unwrap_or_else(|| "24".to_string())
                .parse()
                .context("Invalid SESSION_HOURS")?,
            login_rate_limit: lookup("LOGIN_RATE_LIMIT")
                .unwrap_or_else(|| "20".to_string())
                .parse()
                .context("Invalid LOGIN_RATE_LIMIT")?,
        })
    }

    /// Find the project root by looking for the workspace Cargo.toml
    fn find_project_root() -> Result<PathBuf> {
        let mut current_dir = env::current_dir()?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                let content = std::fs::read_to_string(&cargo_toml)?;
                if content.contains("[workspace]") {
                    return Ok(current_dir);
                }
            }

            if !current_dir.pop() {
                break;
            }
        }

        env::current_dir().context("Failed to determine project root")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("AUTH_SECRET", SECRET)])).unwrap();

        assert_eq!(config.database_url, "sqlite:quill.db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_hours, 24);
        assert_eq!(config.login_rate_limit, 20);
        assert!(!config.development_mode);
        assert!(!config.secure_cookies);
        assert!(config.templates_dir.ends_with("templates"));
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET", SECRET),
            ("DATABASE_URL", "sqlite:data/blog.db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DEVELOPMENT_MODE", "true"),
            ("SECURE_COOKIES", "1"),
            ("SESSION_HOURS", "2"),
            ("LOGIN_RATE_LIMIT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite:data/blog.db");
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert!(config.development_mode);
        assert!(config.secure_cookies);
        assert_eq!(config.session_hours, 2);
        assert_eq!(config.login_rate_limit, 5);
    }

    #[test]
    fn test_auth_secret_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("AUTH_SECRET"));
    }

    #[test]
    fn test_auth_secret_length() {
        let err = Config::from_lookup(lookup_from(&[("AUTH_SECRET", "short")])).unwrap_err();
        assert!(err.to_string().contains("exactly 32 bytes"));
    }

    #[test]
    fn test_database_url_must_be_sqlite() {
        let result = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET", SECRET),
            ("DATABASE_URL", "postgres://localhost/blog"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET", SECRET),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true".to_string())));
        assert!(parse_flag(Some(" 1 ".to_string())));
        assert!(!parse_flag(Some("false".to_string())));
        assert!(!parse_flag(Some("0".to_string())));
        assert!(!parse_flag(None));
    }
}
