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

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response},
    middleware::Next,
};
use std::{future::Future, pin::Pin};

/// Response headers added to every answer
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    pub content_security_policy: String,
    pub frame_options: String,
    pub referrer_policy: String,
    /// Only sent when the site is served over HTTPS
    pub hsts: Option<String>,
}

impl SecurityHeaders {
    pub fn new(secure_cookies: bool) -> Self {
        Self {
            content_security_policy: "default-src 'self'; img-src 'self' https: data:; \
                 frame-src https://www.youtube.com; style-src 'self' 'unsafe-inline'; \
                 script-src 'self'; base-uri 'self'; frame-ancestors 'none'"
                .to_string(),
            frame_options: "DENY".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            hsts: secure_cookies.then(|| "max-age=31536000; includeSubDomains".to_string()),
        }
    }
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response<Body>> + Send>>;

pub fn create_security_headers_middleware(
    config: SecurityHeaders,
) -> impl Fn(Request<Body>, Next) -> MiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        let config = config.clone();
        Box::pin(async move {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();

            headers.insert(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            );

            let configured = [
                (header::CONTENT_SECURITY_POLICY, Some(&config.content_security_policy)),
                (header::X_FRAME_OPTIONS, Some(&config.frame_options)),
                (header::REFERRER_POLICY, Some(&config.referrer_policy)),
                (header::STRICT_TRANSPORT_SECURITY, config.hsts.as_ref()),
            ];

            for (name, value) in configured {
                let Some(value) = value else { continue };
                match HeaderValue::from_str(value) {
                    Ok(value) => {
                        headers.insert(name, value);
                    }
                    Err(_) => tracing::warn!("Invalid value for {} header", name),
                }
            }

            response
        })
    }
}
