// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-rbac
//!
//! The RBAC evaluation engine:
//!
//! - [`PermissionCache`]: per-(principal, scope) permission names with TTL
//! - [`Resolver`]: effective permissions via a bounded ancestor walk over
//!   the role hierarchy
//! - [`Checker`]: binary allow/deny against a named permission
//!
//! The cache is process-local by design; staleness is bounded by TTL and
//! by explicit invalidation on mutating RBAC operations.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cache;
pub mod checker;
pub mod resolver;
pub mod seed;

pub use cache::PermissionCache;
pub use checker::{Checker, Decision};
pub use resolver::Resolver;
pub use seed::seed_defaults;

/// Default bound on the role-hierarchy ancestor walk.
pub const DEFAULT_MAX_DEPTH: usize = 10;
