//! Request tracking and response headers for the API and `/media`.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::services::AuthUser;
use crate::services::image::MEDIA_URL_PREFIX;

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
/// Media files are user uploads; they may render as images and nothing else.
const MEDIA_CSP: &str = "default-src 'none'; img-src 'self'; sandbox";
/// Stored images get a fresh uuid name on every upload, so a URL never changes content.
const MEDIA_CACHE: &str = "public, max-age=31536000, immutable";

/// GET /api/metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.prometheus_handle.as_ref() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}

fn is_media_path(path: &str) -> bool {
    path.strip_prefix(MEDIA_URL_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Metric label for a request path. Numeric ids collapse to `{id}` and every
/// media file to `/media/*`.
#[must_use]
pub fn route_label(path: &str) -> String {
    if is_media_path(path) {
        return format!("{MEDIA_URL_PREFIX}/*");
    }

    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Who made the request, as seen after the auth layer ran.
fn caller_label(response: &Response) -> &'static str {
    if response.status() == StatusCode::UNAUTHORIZED {
        "rejected"
    } else if response.extensions().get::<AuthUser>().is_some() {
        "user"
    } else {
        "anonymous"
    }
}

pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = route_label(req.uri().path());

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status();
        let caller = caller_label(&response);

        let timing_labels = [("method", method.clone()), ("route", route.clone())];
        let labels = [
            ("method", method),
            ("route", route),
            ("status", status.as_u16().to_string()),
            ("caller", caller.to_string()),
        ];
        metrics::counter!("pantry_http_requests_total", &labels).increment(1);
        metrics::histogram!("pantry_http_request_duration_seconds", &timing_labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            error!(status = status.as_u16(), duration_ms, caller, "Request failed");
        } else {
            info!(status = status.as_u16(), duration_ms, caller, "Request finished");
        }

        response
    }
    .instrument(span)
    .await
}

/// API responses carry account data and are never cached. Media responses
/// are locked down to image rendering and cached for good.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let media = is_media_path(req.uri().path());
    let mut response = next.run(req).await;
    let served = response.status().is_success();
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    if media {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(MEDIA_CSP),
        );
        if served {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(MEDIA_CACHE));
        }
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(API_CSP),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_label_collapses_ids() {
        assert_eq!(route_label("/api/recipes"), "/api/recipes");
        assert_eq!(route_label("/api/recipes/42"), "/api/recipes/{id}");
        assert_eq!(
            route_label("/api/recipes/7/upload-image"),
            "/api/recipes/{id}/upload-image"
        );
        assert_eq!(route_label("/api/tags/3"), "/api/tags/{id}");
    }

    #[test]
    fn route_label_groups_media() {
        assert_eq!(route_label("/media/uploads/recipe/a.png"), "/media/*");
        assert_eq!(route_label("/mediafile"), "/mediafile");
    }

    #[test]
    fn caller_reflects_auth_outcome() {
        let mut response = StatusCode::OK.into_response();
        assert_eq!(caller_label(&response), "anonymous");

        response.extensions_mut().insert(AuthUser {
            id: 1,
            email: "cook@example.com".to_string(),
            name: String::new(),
            is_staff: false,
        });
        assert_eq!(caller_label(&response), "user");

        assert_eq!(caller_label(&StatusCode::UNAUTHORIZED.into_response()), "rejected");
    }
}
