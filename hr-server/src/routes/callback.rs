//! `POST /hr/callback` — inbound Jobber completion callbacks.
//! Authenticated by a static bearer key (`HR_CALLBACK_KEY`), deliberately not
//! the `CallerIdentity` scheme `/rpc` uses — the Jobber is a trusted backend
//! service, not a user-facing caller.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use hr_jobber::CallbackPayload;
use serde_json::json;

use crate::state::AppState;

pub async fn callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CallbackPayload>,
) -> impl IntoResponse {
    if !authorized(&headers, &state.callback_key) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "ok": false, "error": "invalid callback key" })));
    }

    state.callbacks.route(payload);
    (StatusCode::OK, Json(json!({ "ok": true })))
}

fn authorized(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[test]
    fn matching_key_is_authorized() {
        assert!(authorized(&headers_with_bearer("secret"), "secret"));
    }

    #[test]
    fn wrong_key_is_rejected() {
        assert!(!authorized(&headers_with_bearer("wrong"), "secret"));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(!authorized(&HeaderMap::new(), "secret"));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Basic secret".parse().unwrap());
        assert!(!authorized(&headers, "secret"));
    }
}
