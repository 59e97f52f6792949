// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Rate limiting middleware.
//!
//! A per-client-address token bucket, mounted ahead of the auth pipeline.
//! Per-process by design; not a correctness feature.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};

use crate::error::ApiError;

// =============================================================================
// RateLimitConfig
// =============================================================================

/// Configuration for the per-client rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether the limiter is active.
    pub enabled: bool,
    /// Sustained requests per second per client address.
    pub per_second: u32,
    /// Burst size per client address.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 100,
            burst: 200,
        }
    }
}

impl RateLimitConfig {
    /// Creates a disabled limiter.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

// =============================================================================
// Token bucket
// =============================================================================

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            tokens: max_tokens as f64,
            max_tokens: max_tokens as f64,
            refill_rate: refill_rate as f64,
            last_refill: Instant::now(),
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }
}

// =============================================================================
// Limiter state
// =============================================================================

/// Shared limiter state: one bucket per observed client address.
#[derive(Debug)]
pub struct RateLimiterState {
    config: RateLimitConfig,
    buckets: DashMap<Option<IpAddr>, TokenBucket>,
}

impl RateLimiterState {
    /// Creates limiter state from configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Returns `true` if the client may proceed.
    pub fn allow(&self, client: Option<IpAddr>) -> bool {
        if !self.config.enabled {
            return true;
        }
        let mut bucket = self.buckets.entry(client).or_insert_with(|| {
            TokenBucket::new(self.config.burst, self.config.per_second)
        });
        bucket.try_acquire()
    }

    /// Drops buckets that are fully refilled, bounding the map.
    pub fn cleanup(&self) {
        if self.buckets.len() > 10_000 {
            self.buckets.retain(|_, bucket| bucket.tokens < bucket.max_tokens);
        }
    }
}

// =============================================================================
// RateLimitLayer
// =============================================================================

/// Layer for rate limiting.
#[derive(Clone)]
pub struct RateLimitLayer {
    state: Arc<RateLimiterState>,
}

impl RateLimitLayer {
    /// Creates a new rate limit layer.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(RateLimiterState::new(config)),
        }
    }

    /// Creates a disabled rate limit layer.
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::disabled())
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

// =============================================================================
// RateLimitMiddleware
// =============================================================================

/// Middleware for rate limiting.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    state: Arc<RateLimiterState>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let client = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            if state.allow(client) {
                inner.call(req).await
            } else {
                tracing::debug!(client = ?client, "rate limit exceeded");
                Ok(
                    ApiError(warden_core::Error::resource_exhausted("rate limit exceeded"))
                        .into_response(),
                )
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_burst_then_deny() {
        let mut bucket = TokenBucket::new(5, 1);
        for _ in 0..5 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }

    #[test]
    fn test_bucket_refill() {
        let mut bucket = TokenBucket::new(10, 1000);
        for _ in 0..10 {
            bucket.try_acquire();
        }
        assert!(!bucket.try_acquire());

        bucket.last_refill = Instant::now() - std::time::Duration::from_millis(10);
        bucket.refill();
        assert!(bucket.tokens > 0.0);
    }

    #[test]
    fn test_disabled_always_allows() {
        let state = RateLimiterState::new(RateLimitConfig::disabled());
        for _ in 0..1000 {
            assert!(state.allow(None));
        }
    }

    #[test]
    fn test_per_client_isolation() {
        let state = RateLimiterState::new(RateLimitConfig {
            enabled: true,
            per_second: 1,
            burst: 3,
        });

        let ip1: IpAddr = "192.168.1.1".parse().unwrap();
        let ip2: IpAddr = "192.168.1.2".parse().unwrap();

        for _ in 0..3 {
            assert!(state.allow(Some(ip1)));
        }
        assert!(!state.allow(Some(ip1)));

        // A different client still has its own budget.
        assert!(state.allow(Some(ip2)));
    }
}
