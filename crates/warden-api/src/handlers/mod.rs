// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RPC handlers.

mod apikeys;
mod auth;
mod health;
mod rbac;
mod service_accounts;
mod users;

pub use apikeys::{create_api_key, list_api_keys, revoke_api_key, validate_api_key};
pub use auth::{
    login, logout, oauth_callback, oauth_url, refresh, register, reset_password, verify_email,
};
pub use health::{health, ready};
pub use rbac::{
    assign_role_permission, check_permission, create_permission, create_role, list_permissions,
    list_roles, remove_org_member, set_org_member,
};
pub use service_accounts::{
    bind_service_account_role, create_service_account, create_service_account_key,
    list_service_account_keys, revoke_service_account_key, set_service_account_status,
};
pub use users::{change_password, current_user};

use uuid::Uuid;

use crate::error::ApiError;

/// Parses a path segment as a UUID, surfacing `InvalidArgument`.
pub(crate) fn parse_id(value: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::invalid_argument(format!("invalid {what}")))
}
