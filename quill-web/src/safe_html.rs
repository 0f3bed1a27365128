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

//! HTML sanitisation for user supplied content.

use std::borrow::Cow;
use std::collections::HashSet;

const IFRAME_HOSTS: &[&str] = &["www.youtube.com"];

fn iframe_source_allowed(value: &str) -> bool {
    url::Url::parse(value)
        .ok()
        .and_then(|url| url.host_str().map(|host| IFRAME_HOSTS.contains(&host)))
        .unwrap_or(false)
}

/// Sanitise rendered post HTML.
///
/// Keeps ammonia's default tag set plus images and iframes embedding
/// YouTube; any other iframe loses its `src`.
pub fn clean_html(html: &str) -> String {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(["img", "iframe"])
        .add_tag_attributes("img", ["src", "alt", "title", "width", "height"])
        .add_tag_attributes(
            "iframe",
            ["src", "width", "height", "frameborder", "allowfullscreen"],
        )
        .attribute_filter(|element, attribute, value| {
            if element == "iframe" && attribute == "src" && !iframe_source_allowed(value) {
                None
            } else {
                Some(Cow::Borrowed(value))
            }
        });

    builder.clean(html).to_string()
}

/// Remove every tag, keeping the text content
pub fn strip_html(html: &str) -> String {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    builder.clean(html).to_string()
}
