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

use quill_db::repositories::SessionRepository;
use sqlx::SqlitePool;
use std::time::Duration;

/// How often expired sessions are swept
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Delete expired sessions once and report how many went
pub async fn purge_expired_sessions(db: &SqlitePool) -> anyhow::Result<u64> {
    let removed = SessionRepository::new(db.clone()).delete_expired().await?;
    if removed > 0 {
        tracing::info!(removed, "Purged expired sessions");
    }
    Ok(removed)
}

/// Sweep expired sessions in the background for the life of the server
pub fn spawn_session_purge(db: SqlitePool, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = purge_expired_sessions(&db).await {
                tracing::warn!("Session purge failed: {:?}", e);
            }
        }
    })
}
