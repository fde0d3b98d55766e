//! Per-client throttling of admin login attempts.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::server::AppState;

/// Buckets idle this long are forgotten once the table grows.
const IDLE_EVICTION: Duration = Duration::from_secs(10 * 60);
const MAX_TRACKED_CLIENTS: usize = 4096;

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Login attempt budget per client IP.
#[derive(Default)]
pub struct LoginRateLimiter {
    buckets: Mutex<HashMap<Option<IpAddr>, TokenBucket>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend one attempt for `client`. `per_minute` is both the burst size
    /// and the refill rate.
    pub fn check(&self, client: Option<IpAddr>, per_minute: u32) -> bool {
        let capacity = f64::from(per_minute.max(1));
        let refill_rate = capacity / 60.0;

        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if buckets.len() >= MAX_TRACKED_CLIENTS {
            buckets.retain(|_, b| b.last_update.elapsed() < IDLE_EVICTION);
        }

        buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(capacity))
            .try_acquire(capacity, refill_rate)
    }
}

/// Middleware answering 429 once a client exhausts its login attempts.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let per_minute = state.inner.load().config.admin.login_attempts_per_minute;

    if !state.login_limiter.check(client, per_minute) {
        tracing::warn!(client = ?client, "Login rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "Too many login attempts, try again later" })),
        )
            .into_response();
    }

    next.run(request).await
}
