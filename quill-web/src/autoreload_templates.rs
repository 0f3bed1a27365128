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

use anyhow::{anyhow, Result};
use std::sync::{Arc, RwLock};
use tera::{Context, Tera};

use crate::markdown::make_markdown_filter;

#[derive(Clone)]
pub enum TemplateEngine {
    /// Templates parsed once at startup
    Static(Arc<Tera>),
    /// Templates re-read from disk before every render
    Reloadable {
        templates_dir: String,
        cached: Arc<RwLock<Tera>>,
    },
}

impl TemplateEngine {
    pub fn new(templates_dir: &str, development_mode: bool) -> Result<Self> {
        let tera = Self::create_tera_instance(templates_dir)?;

        if development_mode {
            tracing::info!("Template hot reload enabled (development mode)");
            Ok(Self::Reloadable {
                templates_dir: templates_dir.to_string(),
                cached: Arc::new(RwLock::new(tera)),
            })
        } else {
            tracing::info!("Templates loaded once (production mode)");
            Ok(Self::Static(Arc::new(tera)))
        }
    }

    fn create_tera_instance(templates_dir: &str) -> Result<Tera> {
        let pattern = format!("{}/**/*.html", templates_dir);
        let mut tera = Tera::new(&pattern)?;

        tera.register_filter("markdown", make_markdown_filter());

        Ok(tera)
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        match self {
            Self::Static(tera) => Ok(tera.render(template_name, context)?),
            Self::Reloadable {
                templates_dir,
                cached,
            } => {
                match Self::create_tera_instance(templates_dir) {
                    Ok(new_tera) => {
                        if let Ok(mut write_guard) = cached.write() {
                            *write_guard = new_tera;
                        }
                    }
                    Err(e) => {
                        // Keep serving the last good set
                        tracing::warn!("Failed to reload templates: {}. Using cached version.", e);
                    }
                }

                let read_guard = cached
                    .read()
                    .map_err(|_| anyhow!("Template cache lock poisoned"))?;
                Ok(read_guard.render(template_name, context)?)
            }
        }
    }

    pub fn is_reloadable(&self) -> bool {
        matches!(self, Self::Reloadable { .. })
    }
}
