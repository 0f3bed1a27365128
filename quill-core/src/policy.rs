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

//! Authorization rules shared by the page and API surfaces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user performing a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Which posts an actor may fetch, edit or delete from the pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    Any,
    OwnedBy(i64),
}

impl PostScope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.is_admin {
            PostScope::Any
        } else {
            PostScope::OwnedBy(actor.id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Myself,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    LastAdministrator,
    AdminCannotBeDeleted,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::LastAdministrator => {
                write!(f, "There must be at least one administrator account.")
            }
            PolicyError::AdminCannotBeDeleted => write!(f, "Admin accounts cannot be deleted."),
        }
    }
}

impl std::error::Error for PolicyError {}

/// Whose posts a listing shows.
///
/// Administrators may list any author and default to themselves; everyone
/// else always lists their own posts.
pub fn listing_username(actor: &Actor, requested: Option<&str>) -> String {
    match requested.filter(|name| !name.is_empty()) {
        Some(name) if actor.is_admin => name.to_string(),
        _ => actor.username.clone(),
    }
}

/// Decide the admin flag to store for the target of an account update.
///
/// Returns `Ok(None)` when the admin status must stay untouched. Only
/// administrators may change it, and an administrator may not demote
/// themself while they are the only one left.
pub fn plan_admin_change(
    actor: &Actor,
    target_is_actor: bool,
    requested: Option<bool>,
    admin_count: i64,
) -> Result<Option<bool>, PolicyError> {
    if !actor.is_admin {
        return Ok(None);
    }

    match requested {
        None => Ok(None),
        Some(false) if target_is_actor && admin_count <= 1 => Err(PolicyError::LastAdministrator),
        Some(flag) => Ok(Some(flag)),
    }
}

/// Decide which account a delete request removes.
///
/// A regular user can only delete their own account. An administrator can
/// only delete other accounts and must give up admin status before their
/// own account can be removed.
pub fn plan_user_delete(
    actor: &Actor,
    requested_username: Option<&str>,
) -> Result<DeleteTarget, PolicyError> {
    if !actor.is_admin {
        return Ok(DeleteTarget::Myself);
    }

    match requested_username.filter(|name| !name.is_empty()) {
        Some(name) if name != actor.username => Ok(DeleteTarget::Other(name.to_string())),
        _ => Err(PolicyError::AdminCannotBeDeleted),
    }
}
