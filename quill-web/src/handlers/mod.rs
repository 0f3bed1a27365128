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

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod posts;
pub mod setup;
pub mod users;

pub use auth::{login, login_form, logout};
pub use dashboard::{api_key, dashboard};
pub use posts::{create_post, create_post_form, delete_post, edit_post, fetch_post, list_posts};
pub use setup::{setup, setup_form};
pub use users::{
    create_user, create_user_form, delete_user, delete_user_form, list_users, update_user,
    update_user_form,
};

/// Interpret the admin field of the user forms.
///
/// A checkbox sends "on" or "true"; the update form's select may also send
/// "false". Anything else leaves the flag unspecified.
pub(crate) fn parse_admin_flag(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        Some("true") | Some("on") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_flag() {
        assert_eq!(parse_admin_flag(Some("true")), Some(true));
        assert_eq!(parse_admin_flag(Some("on")), Some(true));
        assert_eq!(parse_admin_flag(Some("false")), Some(false));
        assert_eq!(parse_admin_flag(Some("")), None);
        assert_eq!(parse_admin_flag(Some("maybe")), None);
        assert_eq!(parse_admin_flag(None), None);
    }
}
