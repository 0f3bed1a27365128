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

/// Which face of the application a request is addressed to.
///
/// Everything under `/api` is the JSON API; all other paths are pages
/// rendered for a browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Page,
    Api,
}

impl Surface {
    pub fn from_path(path: &str) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            Surface::Api
        } else {
            Surface::Page
        }
    }

    /// Noun used in "not found" messages
    pub fn resource_name(&self) -> &'static str {
        match self {
            Surface::Page => "Page",
            Surface::Api => "Endpoint",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Surface::from_path("/api"), Surface::Api);
        assert_eq!(Surface::from_path("/api/list-posts"), Surface::Api);
        assert_eq!(Surface::from_path("/"), Surface::Page);
        assert_eq!(Surface::from_path("/list-posts"), Surface::Page);
        assert_eq!(Surface::from_path("/apiary"), Surface::Page);
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(Surface::Page.resource_name(), "Page");
        assert_eq!(Surface::Api.resource_name(), "Endpoint");
    }
}
