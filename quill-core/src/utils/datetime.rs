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

use chrono::{DateTime, Datelike, Utc};

/// English ordinal suffix for a day of the month
fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Human readable timestamp, e.g. "October 19th 2026 at 3:04:05 pm"
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    let day = dt.day();
    format!(
        "{} {}{} {} at {}",
        dt.format("%B"),
        day,
        ordinal_suffix(day),
        dt.format("%Y"),
        dt.format("%-I:%M:%S %P")
    )
}

/// Same as [`format_timestamp`], empty when there is no timestamp
pub fn format_optional_timestamp(dt: Option<&DateTime<Utc>>) -> String {
    dt.map(format_timestamp).unwrap_or_default()
}
