// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-store
//!
//! Durable-store contracts for the WARDEN identity service, plus an
//! in-process backend.
//!
//! The service core consumes only the traits in [`traits`]; the relational
//! driver lives outside this repository. [`MemoryStore`] enforces the same
//! unique-key invariants the relational schema declares and backs both the
//! test suite and single-node deployments.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{
    ApiKeyStore, OAuthAccountStore, OrgMemberStore, PermissionStore, RolePermissionStore,
    RoleStore, SaRoleBindingStore, ServiceAccountKeyStore, ServiceAccountStore, SessionStore,
    Store, TeamMemberStore, UserStore,
};
