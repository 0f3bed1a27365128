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

//! Input validation for accounts, API credentials and posts.
//!
//! Every validator reports all failures at once so forms can show the full
//! list to the user.

use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid username regex"));
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").expect("valid regex"));
static SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[$-/:-?{-~!"^_`\[\]]"#).expect("valid symbol regex"));

pub const USERNAME_MIN: usize = 5;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 24;
pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 100;
pub const BODY_MIN: usize = 20;
pub const BODY_MAX: usize = 10_000;

pub type ValidationResult = Result<(), Vec<String>>;

fn finish(errors: Vec<String>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_username(username: &str, errors: &mut Vec<String>) {
    let len = username.chars().count();
    if len < USERNAME_MIN {
        errors.push(format!(
            "Your username must contain at least {} characters.",
            USERNAME_MIN
        ));
    }
    if len > USERNAME_MAX {
        errors.push(format!(
            "Your username must contain at most {} characters.",
            USERNAME_MAX
        ));
    }
    if !USERNAME_PATTERN.is_match(username) {
        errors.push("Your username cannot contain symbols or spaces.".to_string());
    }
}

fn check_password(password: &str, errors: &mut Vec<String>) {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        errors.push(format!(
            "Your password must contain at least {} characters.",
            PASSWORD_MIN
        ));
    }
    if len > PASSWORD_MAX {
        errors.push(format!(
            "Your password must contain at most {} characters.",
            PASSWORD_MAX
        ));
    }
    if !LOWERCASE.is_match(password) {
        errors.push("Your password must contain at least one lowercase letter.".to_string());
    }
    if !UPPERCASE.is_match(password) {
        errors.push("Your password must contain at least one capital letter.".to_string());
    }
    if !DIGIT.is_match(password) {
        errors.push("Your password must contain at least one number.".to_string());
    }
    if !SYMBOL.is_match(password) {
        errors.push("Your password must contain at least one symbol.".to_string());
    }
}

/// Rules for a new account (also used for setup and as a login format check).
///
/// An empty field reports the missing value along with every rule it breaks.
pub fn validate_credentials(username: &str, password: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if username.is_empty() {
        errors.push("Please provide a username.".to_string());
    }
    check_username(username, &mut errors);

    if password.is_empty() {
        errors.push("Please provide a password.".to_string());
    }
    check_password(password, &mut errors);

    finish(errors)
}

/// Rules for an account update; absent or empty fields are left unchecked
pub fn validate_user_update(
    new_username: Option<&str>,
    new_password: Option<&str>,
) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(username) = new_username.filter(|u| !u.is_empty()) {
        check_username(username, &mut errors);
    }
    if let Some(password) = new_password.filter(|p| !p.is_empty()) {
        check_password(password, &mut errors);
    }

    finish(errors)
}

pub fn validate_api_credentials(api_key: Option<&str>, api_secret: Option<&str>) -> ValidationResult {
    let mut errors = Vec::new();

    if api_key.map_or(true, str::is_empty) {
        errors.push("Missing API key.".to_string());
    }
    if api_secret.map_or(true, str::is_empty) {
        errors.push("Missing API secret.".to_string());
    }

    finish(errors)
}

pub fn validate_blog_post(title: &str, body: &str) -> ValidationResult {
    let mut errors = Vec::new();

    let title_len = title.chars().count();
    if title.is_empty() {
        errors.push("Please provide a title.".to_string());
    }
    if title_len < TITLE_MIN {
        errors.push(format!(
            "Your post title must contain at least {} characters.",
            TITLE_MIN
        ));
    } else if title_len > TITLE_MAX {
        errors.push(format!(
            "Your post title must contain at most {} characters.",
            TITLE_MAX
        ));
    }

    let body_len = body.chars().count();
    if body.is_empty() {
        errors.push("Please post something!".to_string());
    }
    if body_len < BODY_MIN {
        errors.push(format!(
            "Your post must contain at least {} characters.",
            BODY_MIN
        ));
    } else if body_len > BODY_MAX {
        errors.push("Your post must contain at most 10,000 characters.".to_string());
    }

    finish(errors)
}
