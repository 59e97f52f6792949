// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-api
//!
//! The request surface of the WARDEN identity service.
//!
//! Every RPC passes through a layered pipeline:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Request                    │
//! └─────────────────┬───────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │          Tracing / Timeout              │
//! └─────────────────┬───────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │         Rate Limit (per client)         │
//! └─────────────────┬───────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │   Auth (Bearer / ApiKey / ServiceKey)   │
//! └─────────────────┬───────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │     RBAC (method → permission map)      │
//! └─────────────────┬───────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │              Handler                    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The auth layer binds a [`warden_core::Principal`] into the request
//! scope; the RBAC layer consults the policy checker for methods that
//! declare a required permission. Public methods skip both uniformly.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use middleware::{AuthLayer, MethodPolicy, RateLimitConfig, RateLimitLayer, RbacLayer};
pub use server::ApiServer;
pub use state::AppState;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
