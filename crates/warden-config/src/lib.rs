// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-config
//!
//! Configuration schema and loading for WARDEN.
//!
//! Configuration files may be YAML, TOML, or JSON. Values support
//! `${VAR}` / `${VAR:default}` environment placeholders, and a small set
//! of `WARDEN_*` environment variables override the file afterwards.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader};
pub use schema::{
    DatabaseConfig, JwtConfig, LoggingConfig, OAuthProviderConfig, RateLimitConfig, RbacConfig,
    ServerConfig, WardenConfig,
};
