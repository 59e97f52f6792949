// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-auth
//!
//! Authentication building blocks for WARDEN:
//!
//! - **Credential primitives**: password KDF digests, opaque token
//!   generation, keyed token digests for storage indexing
//! - **Claim-token manager**: HS256 access/refresh pairs over disjoint
//!   secrets, with refresh-family threading
//! - **OAuth provider registry**: generic OIDC plus GitHub
//! - **Auth flows**: register, login, logout, refresh rotation with reuse
//!   detection, OAuth callback, password change

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod claims;
pub mod flows;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod token;

pub use claims::{Claims, TokenType};
pub use flows::{AuthFlows, LoginOutcome, OAuthOutcome};
pub use jwt::{TokenManager, TokenManagerConfig, TokenPair};
pub use oauth::{OAuthProvider, ProviderRegistry, UserInfo};
