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

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use quill_core::models::user::User;
use quill_core::policy::PolicyError;
use quill_core::utils::format_timestamp;
use quill_core::validation::{validate_credentials, validate_user_update};
use quill_core::SecretCipher;
use quill_db::repositories::{SessionRepository, UserRepository};
use sqlx::SqlitePool;
use std::io::Write;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill CLI tool for database and account management")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database (create tables)
    Init,

    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Session maintenance commands
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Username
        username: String,
        /// Make user an admin
        #[arg(long)]
        admin: bool,
        /// Password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },

    /// Change user password
    Password {
        username: String,
        /// New password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },

    /// Grant admin status
    Promote { username: String },

    /// Revoke admin status
    Demote { username: String },

    /// Issue a new API key and secret
    ResetKeys { username: String },

    /// List all users
    List,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Delete expired sessions
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Get database URL from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:quill.db".to_string());

    match cli.command {
        Commands::Init => init_database(&database_url).await,
        Commands::User { command } => {
            let pool = connect_database(&database_url).await?;
            handle_user_command(command, pool).await
        }
        Commands::Sessions {
            command: SessionCommands::Purge,
        } => {
            let pool = connect_database(&database_url).await?;
            let removed = SessionRepository::new(pool).delete_expired().await?;
            println!("Removed {} expired session(s)", removed);
            Ok(())
        }
    }
}

async fn init_database(database_url: &str) -> Result<()> {
    println!("Initializing database at: {}", database_url);

    let _pool = quill_db::init_database(database_url).await?;

    println!("Database initialized successfully!");
    Ok(())
}

async fn connect_database(database_url: &str) -> Result<SqlitePool> {
    // Also brings the schema up to date
    quill_db::init_database(database_url).await
}

/// The cipher must use the server's `AUTH_SECRET` or issued API secrets
/// will not decrypt
fn load_cipher() -> Result<SecretCipher> {
    let secret = std::env::var("AUTH_SECRET").context("AUTH_SECRET must be set")?;
    SecretCipher::new(secret.as_bytes())
}

fn read_password(prompt: &str, provided: Option<String>) -> Result<String> {
    match provided {
        Some(password) => Ok(password),
        None => {
            print!("{}", prompt);
            std::io::stdout().flush()?;
            rpassword::read_password().context("Failed to read password")
        }
    }
}

async fn handle_user_command(command: UserCommands, pool: SqlitePool) -> Result<()> {
    match command {
        UserCommands::Create {
            username,
            admin,
            password,
        } => {
            println!("Creating user: {}", username);

            let password = read_password("Password: ", password)?;
            let cipher = load_cipher()?;
            let user = create_user(&pool, &cipher, &username, &password, admin).await?;

            println!(
                "User created successfully with ID: {}",
                user.id.unwrap_or_default()
            );
            if admin {
                println!("User has admin privileges");
            }
            Ok(())
        }

        UserCommands::Password { username, password } => {
            println!("Changing password for {}", username);

            let password = read_password("New password: ", password)?;
            let revoked = change_password(&pool, &username, &password).await?;

            println!("Password changed successfully!");
            println!("Signed out {} active session(s)", revoked);
            Ok(())
        }

        UserCommands::Promote { username } => {
            set_admin(&pool, &username, true).await?;
            println!("{} is now an administrator", username);
            Ok(())
        }

        UserCommands::Demote { username } => {
            set_admin(&pool, &username, false).await?;
            println!("{} is no longer an administrator", username);
            Ok(())
        }

        UserCommands::ResetKeys { username } => {
            let cipher = load_cipher()?;
            let (api_key, api_secret) = reset_keys(&pool, &cipher, &username).await?;

            println!("New API credentials for {}", username);
            println!("   Key: {}", api_key);
            println!("   Secret: {}", api_secret);
            Ok(())
        }

        UserCommands::List => {
            let users = UserRepository::new(pool).list_all().await?;
            if users.is_empty() {
                println!("No users found. Run the web setup or 'user create --admin'.");
            }
            for user in users {
                println!(
                    "{:>4}  {:<30} {:<6} created {}",
                    user.id.unwrap_or_default(),
                    user.username,
                    if user.is_admin { "admin" } else { "writer" },
                    format_timestamp(&user.created_at)
                );
            }
            Ok(())
        }
    }
}

async fn find_user(repo: &UserRepository, username: &str) -> Result<User> {
    repo.find_by_username(username)
        .await?
        .ok_or_else(|| anyhow!("User not found: {}", username))
}

async fn create_user(
    pool: &SqlitePool,
    cipher: &SecretCipher,
    username: &str,
    password: &str,
    admin: bool,
) -> Result<User> {
    if let Err(errors) = validate_credentials(username, password) {
        bail!("Invalid user data:\n  {}", errors.join("\n  "));
    }

    let repo = UserRepository::new(pool.clone());
    if repo.find_by_username(username).await?.is_some() {
        bail!("That username is taken: {}", username);
    }

    let mut user = User::new(username.to_string(), password, admin, cipher)?;
    let user_id = repo.create(&user).await.context("Failed to create user")?;
    user.id = Some(user_id);

    Ok(user)
}

/// Set a new password and sign the user out everywhere.
/// Returns how many sessions were revoked.
async fn change_password(pool: &SqlitePool, username: &str, password: &str) -> Result<u64> {
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    if let Err(errors) = validate_user_update(None, Some(password)) {
        bail!("Invalid password:\n  {}", errors.join("\n  "));
    }

    let repo = UserRepository::new(pool.clone());
    let mut user = find_user(&repo, username).await?;
    user.set_password(password)?;
    repo.update(&user).await?;

    let user_id = user.id.ok_or_else(|| anyhow!("Stored user has no id"))?;
    SessionRepository::new(pool.clone())
        .delete_by_user_id(user_id)
        .await
}

async fn set_admin(pool: &SqlitePool, username: &str, is_admin: bool) -> Result<()> {
    let repo = UserRepository::new(pool.clone());
    let mut user = find_user(&repo, username).await?;

    if user.is_admin == is_admin {
        return Ok(());
    }
    if !is_admin && repo.count_admins().await? <= 1 {
        bail!(PolicyError::LastAdministrator);
    }

    user.is_admin = is_admin;
    repo.update(&user).await
}

/// Returns the new key and the plain secret
async fn reset_keys(
    pool: &SqlitePool,
    cipher: &SecretCipher,
    username: &str,
) -> Result<(String, String)> {
    let repo = UserRepository::new(pool.clone());
    let mut user = find_user(&repo, username).await?;

    user.generate_api_keys(cipher)?;
    repo.update(&user).await?;

    let secret = user.reveal_api_secret(cipher)?;
    Ok((user.api_key, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::models::session::Session;
    use quill_db::init_memory_database;

    fn cipher() -> SecretCipher {
        SecretCipher::new(b"0123456789abcdef0123456789abcdef").unwrap()
    }

    #[tokio::test]
    async fn test_init_creates_database_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data").join("quill.db");

        init_database(&format!("sqlite:{}", path.display())).await?;

        assert!(path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user() -> Result<()> {
        let pool = init_memory_database().await?;

        let user = create_user(&pool, &cipher(), "admin1", "Passw0rd!", true).await?;

        assert!(user.id.is_some());
        let stored = UserRepository::new(pool.clone())
            .find_by_username("admin1")
            .await?
            .unwrap();
        assert!(stored.is_admin);
        assert!(stored.verify_password("Passw0rd!")?);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_validates_input() -> Result<()> {
        let pool = init_memory_database().await?;

        assert!(create_user(&pool, &cipher(), "ad", "Passw0rd!", false)
            .await
            .is_err());
        assert!(create_user(&pool, &cipher(), "writer1", "password", false)
            .await
            .is_err());

        create_user(&pool, &cipher(), "writer1", "Passw0rd!", false).await?;
        let duplicate = create_user(&pool, &cipher(), "writer1", "Passw0rd!", false).await;
        assert!(duplicate.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password() -> Result<()> {
        let pool = init_memory_database().await?;
        create_user(&pool, &cipher(), "writer1", "Passw0rd!", false).await?;

        assert!(change_password(&pool, "writer1", "weak").await.is_err());
        change_password(&pool, "writer1", "N3w-Passw0rd").await?;

        let stored = UserRepository::new(pool.clone())
            .find_by_username("writer1")
            .await?
            .unwrap();
        assert!(stored.verify_password("N3w-Passw0rd")?);

        assert!(change_password(&pool, "ghost1", "N3w-Passw0rd").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_revokes_sessions() -> Result<()> {
        let pool = init_memory_database().await?;
        let user = create_user(&pool, &cipher(), "writer1", "Passw0rd!", false).await?;
        let user_id = user.id.unwrap();
        let sessions = SessionRepository::new(pool.clone());
        sessions.create(&Session::new(user_id)).await?;
        sessions.create(&Session::new(user_id)).await?;

        let revoked = change_password(&pool, "writer1", "N3w-Passw0rd").await?;

        assert_eq!(revoked, 2);
        assert!(sessions.find_by_user_id(user_id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_promote_and_demote() -> Result<()> {
        let pool = init_memory_database().await?;
        create_user(&pool, &cipher(), "admin1", "Passw0rd!", true).await?;
        create_user(&pool, &cipher(), "writer1", "Passw0rd!", false).await?;
        let repo = UserRepository::new(pool.clone());

        set_admin(&pool, "writer1", true).await?;
        assert_eq!(repo.count_admins().await?, 2);

        set_admin(&pool, "admin1", false).await?;
        assert_eq!(repo.count_admins().await?, 1);

        let err = set_admin(&pool, "writer1", false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "There must be at least one administrator account."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_keys() -> Result<()> {
        let pool = init_memory_database().await?;
        let cipher = cipher();
        let user = create_user(&pool, &cipher, "writer1", "Passw0rd!", false).await?;

        let (api_key, api_secret) = reset_keys(&pool, &cipher, "writer1").await?;

        assert_ne!(api_key, user.api_key);
        let stored = UserRepository::new(pool.clone())
            .find_by_api_key(&api_key)
            .await?
            .unwrap();
        assert!(stored.verify_api_secret(&api_secret, &cipher)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_sessions() -> Result<()> {
        let pool = init_memory_database().await?;
        let user = create_user(&pool, &cipher(), "writer1", "Passw0rd!", false).await?;
        let repo = SessionRepository::new(pool.clone());
        repo.create(&Session::new_with_expiry(
            user.id.unwrap(),
            chrono::Duration::hours(-1),
        ))
        .await?;

        assert_eq!(repo.delete_expired().await?, 1);
        Ok(())
    }
}
