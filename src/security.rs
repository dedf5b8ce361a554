//! Guard for the HTTP bridge: optional bearer token plus a per-client
//! fixed-window rate limit. The TCP surface binds to loopback by default
//! and is deliberately left open, matching the original service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;

use crate::server::ApiResponse;

pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 180;

#[derive(Clone)]
pub struct ApiSecurity {
    pub required_token: Option<String>,
    pub rate_limit_per_sec: u32,
    buckets: Arc<Mutex<HashMap<String, RateBucket>>>,
}

#[derive(Clone, Copy)]
struct RateBucket {
    window_start: Instant,
    count: u32,
}

impl ApiSecurity {
    pub fn from_env() -> Self {
        let required_token = std::env::var("SCENIC_API_TOKEN")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let rate_limit_per_sec = std::env::var("SCENIC_API_RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_SEC)
            .max(1);
        Self::new(required_token, rate_limit_per_sec)
    }

    pub fn new(required_token: Option<String>, rate_limit_per_sec: u32) -> Self {
        Self {
            required_token,
            rate_limit_per_sec,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn token_accepted(&self, request: &Request) -> bool {
        let Some(expected) = self.required_token.as_deref() else {
            return true;
        };
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .unwrap_or("")
        };
        let auth = header("authorization");
        let bearer = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .unwrap_or(auth);
        bearer == expected || header("x-api-key") == expected
    }

    fn over_limit(&self, client_key: &str) -> bool {
        let mut buckets = match self.buckets.lock() {
            Ok(buckets) => buckets,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let bucket = buckets.entry(client_key.to_string()).or_insert(RateBucket {
            window_start: now,
            count: 0,
        });
        if now.duration_since(bucket.window_start).as_secs_f32() >= 1.0 {
            bucket.window_start = now;
            bucket.count = 0;
        }
        bucket.count = bucket.count.saturating_add(1);
        let over = bucket.count > self.rate_limit_per_sec;

        if buckets.len() > 4096 {
            buckets.retain(|_, b| now.duration_since(b.window_start).as_secs_f32() < 10.0);
        }
        over
    }
}

pub async fn api_guard(
    State(security): State<ApiSecurity>,
    request: Request,
    next: Next,
) -> axum::response::Response {
    if !security.token_accepted(&request) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<String>::err(
                "Unauthorized: set SCENIC_API_TOKEN and send Authorization: Bearer <token>",
            )),
        )
            .into_response();
    }

    let client_key = request
        .headers()
        .get("x-forwarded-for")
        .or_else(|| request.headers().get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("local")
        .to_string();
    if security.over_limit(&client_key) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiResponse::<String>::err("Rate limit exceeded")),
        )
            .into_response();
    }

    next.run(request).await
}
