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

use quill_core::SecretCipher;
use sqlx::SqlitePool;

use crate::autoreload_templates::TemplateEngine;
use crate::config::Config;
use crate::rate_limit::SharedRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub templates: TemplateEngine,
    pub config: Config,
    /// Encrypts API secrets at rest, keyed by `AUTH_SECRET`
    pub cipher: SecretCipher,
    pub login_rate_limiter: SharedRateLimiter,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        templates: TemplateEngine,
        config: Config,
        cipher: SecretCipher,
        login_rate_limiter: SharedRateLimiter,
    ) -> Self {
        Self {
            db,
            templates,
            config,
            cipher,
            login_rate_limiter,
        }
    }
}
