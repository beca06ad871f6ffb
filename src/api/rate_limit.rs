// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-window request limiting per client address.
//!
//! Each client gets `max_requests` per window; the window starts with the
//! client's first request and resets once it has elapsed. Expired windows
//! are swept by a background task.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::{config::RateLimitSettings, error::ApiError, state::AppState};

/// How often expired windows are dropped.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const LIMITED_MESSAGE: &str = "Too many requests from this IP, please try again after 15 minutes";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Shared per-client counters.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_proxy: bool,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window: settings.window,
            trust_proxy: settings.trust_proxy,
            clients: DashMap::new(),
        }
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    /// Count one request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut entry = self
            .clients
            .entry(client.to_string())
            .or_insert(Window { started: now, count: 0 });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            return RateDecision::Limited { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drop every window that has fully elapsed at `now`.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, window| now.duration_since(window.started) < self.window);
        before.saturating_sub(self.clients.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Run the sweeper until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(limiter.clone().run_sweeper(shutdown.clone()));
    /// ```
    pub async fn run_sweeper(self: Arc<Self>, shutdown: CancellationToken) {
        tracing::debug!("rate limit sweeper starting");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(SWEEP_INTERVAL) => {
                    let removed = self.sweep(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, "swept expired rate limit windows");
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::debug!("rate limit sweeper shutting down");
                    return;
                }
            }
        }
    }
}

/// Client key.
///
/// Behind a trusted proxy this is the first `X-Forwarded-For` address (or
/// `X-Real-IP`); otherwise the peer IP. Forwarding headers are ignored when
/// the proxy is not trusted, since any client can set them.
fn client_key(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        let headers = request.headers();
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware applying the shared limiter.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_key(&request, state.rate_limiter.trust_proxy);
    match state.rate_limiter.check(&client) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %client, path = %request.uri().path(), "rate limit exceeded");
            let mut response = ApiError::too_many_requests(LIMITED_MESSAGE).into_response();
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitSettings {
            max_requests,
            window: Duration::from_secs(60),
            trust_proxy: false,
        })
    }

    fn request_from(peer: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/v1/news");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(axum::body::Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn client_key_uses_peer_address_by_default() {
        let request = request_from("10.0.0.1:4000", &[("x-forwarded-for", "203.0.113.9")]);
        assert_eq!(client_key(&request, false), "10.0.0.1");
    }

    #[test]
    fn client_key_reads_forwarded_for_behind_trusted_proxy() {
        let request = request_from(
            "10.0.0.1:4000",
            &[("x-forwarded-for", "203.0.113.9, 10.0.0.1")],
        );
        assert_eq!(client_key(&request, true), "203.0.113.9");

        let request = request_from("10.0.0.1:4000", &[("x-real-ip", "198.51.100.7")]);
        assert_eq!(client_key(&request, true), "198.51.100.7");

        // Garbage falls back to the peer
        let request = request_from("10.0.0.1:4000", &[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(client_key(&request, true), "10.0.0.1");
    }

    #[test]
    fn allows_up_to_the_budget() {
        let limiter = limiter(2);
        let now = Instant::now();

        assert_eq!(limiter.check_at("1.2.3.4", now), RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at("1.2.3.4", now), RateDecision::Allowed { remaining: 0 });
        assert!(matches!(
            limiter.check_at("1.2.3.4", now + Duration::from_secs(10)),
            RateDecision::Limited { retry_after } if retry_after == Duration::from_secs(50)
        ));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at("b", now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), RateDecision::Limited { .. }));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), RateDecision::Allowed { .. }));
        assert!(matches!(limiter.check_at("a", now), RateDecision::Limited { .. }));
        assert!(matches!(
            limiter.check_at("a", now + Duration::from_secs(60)),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn sweep_drops_expired_windows() {
        let limiter = limiter(5);
        let now = Instant::now();

        limiter.check_at("old", now);
        limiter.check_at("fresh", now + Duration::from_secs(30));

        assert_eq!(limiter.sweep(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let limiter = Arc::new(limiter(1));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(limiter.clone().run_sweeper(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
