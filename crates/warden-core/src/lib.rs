// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-core
//!
//! Core domain types for the WARDEN identity and access control service.
//!
//! This crate defines:
//!
//! - The persistent records every other crate operates on (users, sessions,
//!   credential records, roles, permissions, memberships)
//! - The [`Principal`] variant bound to authenticated requests
//! - The domain [`Error`] taxonomy that the API boundary adapts to
//!   transport status codes
//!
//! It deliberately contains no I/O, no crypto, and no async code.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod model;
pub mod principal;

pub use error::{Error, ErrorCode, Result};
pub use model::{
    ApiKey, OAuthAccount, OrgMember, Permission, Role, SaRoleBinding, ServiceAccount,
    ServiceAccountKey, ServiceAccountStatus, Session, TeamMember, User, UserStatus,
};
pub use principal::Principal;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
