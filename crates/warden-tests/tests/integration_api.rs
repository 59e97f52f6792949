// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential scheme dispatch over the full pipeline: Bearer tokens,
//! API keys, and service keys, plus the public allowlist.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use warden_store::{ApiKeyStore, RoleStore};
use warden_tests::common::TestEnv;

// =============================================================================
// Bearer
// =============================================================================

#[tokio::test]
async fn expired_and_malformed_bearer_rejected() {
    let env = TestEnv::new().await;

    let (status, body) = env
        .request("GET", "/v1/users/me", Some("Bearer not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    // A refresh token is signed with the other secret and must not pass
    // as an access credential.
    let (_, _, refresh) = env.register_user("a@x.io", "P@ssword!").await;
    let (status, _) = env
        .request("GET", "/v1/users/me", Some(&TestEnv::bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_header_and_unknown_scheme() {
    let env = TestEnv::new().await;

    let (status, body) = env.request("GET", "/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "missing authorization header");

    let (status, body) = env
        .request("GET", "/v1/users/me", Some("Basic dXNlcjpwYXNz"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "unsupported authorization scheme");
}

// =============================================================================
// API keys
// =============================================================================

#[tokio::test]
async fn api_key_lifecycle() {
    let env = TestEnv::new().await;
    let (user_id, access, _) = env.register_user("a@x.io", "P@ssword!").await;
    let auth = TestEnv::bearer(&access);

    // Create: the plaintext appears exactly once.
    let (status, body) = env
        .request(
            "POST",
            "/v1/apikeys",
            Some(&auth),
            Some(json!({ "name": "ci", "scopes": ["deploy"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let plaintext = body["key"].as_str().unwrap().to_string();
    let key_id = body["api_key"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["api_key"]["key_prefix"], plaintext[..8]);
    assert!(body["api_key"].get("key_digest").is_none());

    // The key authenticates as its owner.
    let (status, me) = env
        .request(
            "GET",
            "/v1/users/me",
            Some(&format!("ApiKey {plaintext}")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"].as_str().unwrap(), user_id.to_string());

    // The advisory last-used stamp lands asynchronously.
    let mut touched = false;
    for _ in 0..20 {
        let key = env
            .store
            .get_api_key(Uuid::parse_str(&key_id).unwrap())
            .await
            .unwrap();
        if key.last_used_at.is_some() {
            touched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(touched, "last_used_at was never updated");

    // Revoke, then the key stops authenticating.
    let (status, _) = env
        .request("DELETE", &format!("/v1/apikeys/{key_id}"), Some(&auth), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = env
        .request(
            "GET",
            "/v1/users/me",
            Some(&format!("ApiKey {plaintext}")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "invalid API key");
}

#[tokio::test]
async fn expired_api_key_rejected() {
    let env = TestEnv::new().await;
    let (_, access, _) = env.register_user("a@x.io", "P@ssword!").await;

    let (status, body) = env
        .request(
            "POST",
            "/v1/apikeys",
            Some(&TestEnv::bearer(&access)),
            Some(json!({ "name": "short-lived", "expires_in_secs": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let plaintext = body["key"].as_str().unwrap().to_string();

    let (status, body) = env
        .request(
            "GET",
            "/v1/users/me",
            Some(&format!("ApiKey {plaintext}")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "API key expired");
}

#[tokio::test]
async fn api_key_of_another_user_cannot_be_revoked() {
    let env = TestEnv::new().await;
    let (_, owner_access, _) = env.register_user("owner@x.io", "P@ssword!").await;
    let (_, other_access, _) = env.register_user("other@x.io", "P@ssword!").await;

    let (_, body) = env
        .request(
            "POST",
            "/v1/apikeys",
            Some(&TestEnv::bearer(&owner_access)),
            Some(json!({ "name": "ci" })),
        )
        .await;
    let key_id = body["api_key"]["id"].as_str().unwrap().to_string();

    let (status, body) = env
        .request(
            "DELETE",
            &format!("/v1/apikeys/{key_id}"),
            Some(&TestEnv::bearer(&other_access)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn validate_endpoint_pins_the_key_contract() {
    let env = TestEnv::new().await;
    let (user_id, access, _) = env.register_user("a@x.io", "P@ssword!").await;
    let auth = TestEnv::bearer(&access);

    let (_, body) = env
        .request(
            "POST",
            "/v1/apikeys",
            Some(&auth),
            Some(json!({ "name": "ci", "scopes": ["deploy"] })),
        )
        .await;
    let plaintext = body["key"].as_str().unwrap().to_string();
    let key_id = body["api_key"]["id"].as_str().unwrap().to_string();

    // Live key: valid, with owner and scopes. The endpoint is public.
    let (status, body) = env
        .request(
            "POST",
            "/v1/apikeys/validate",
            None,
            Some(json!({ "key": plaintext })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
    assert_eq!(body["scopes"][0], "deploy");

    // Unknown key: invalid, not an error.
    let (status, body) = env
        .request(
            "POST",
            "/v1/apikeys/validate",
            None,
            Some(json!({ "key": "nonsense" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);

    // Revoked key: invalid.
    env.request("DELETE", &format!("/v1/apikeys/{key_id}"), Some(&auth), None)
        .await;
    let (_, body) = env
        .request(
            "POST",
            "/v1/apikeys/validate",
            None,
            Some(json!({ "key": plaintext })),
        )
        .await;
    assert_eq!(body["valid"], false);

    // Expired key: invalid.
    let (_, body) = env
        .request(
            "POST",
            "/v1/apikeys",
            Some(&auth),
            Some(json!({ "name": "old", "expires_in_secs": -1 })),
        )
        .await;
    let expired = body["key"].as_str().unwrap().to_string();
    let (_, body) = env
        .request(
            "POST",
            "/v1/apikeys/validate",
            None,
            Some(json!({ "key": expired })),
        )
        .await;
    assert_eq!(body["valid"], false);
}

// =============================================================================
// Service keys
// =============================================================================

#[tokio::test]
async fn service_key_dispatch_and_disable() {
    let env = TestEnv::new().await;
    let (_, user_access, _) = env.register_user("admin@x.io", "P@ssword!").await;
    let org = Uuid::new_v4();
    let user_auth = TestEnv::bearer(&user_access);

    // Any authenticated principal can manage service accounts.
    let (status, sa) = env
        .request(
            "POST",
            "/v1/service-accounts",
            Some(&user_auth),
            Some(json!({ "org_id": org, "name": "deployer" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let sa_id = sa["id"].as_str().unwrap().to_string();

    let (status, key) = env
        .request(
            "POST",
            &format!("/v1/service-accounts/{sa_id}/keys"),
            Some(&user_auth),
            Some(json!({ "name": "default" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let plaintext = key["plaintext"].as_str().unwrap().to_string();

    // Bind the account to owner: its bindings apply on the global scope,
    // so the guarded rbac mutations open up to it.
    let owner = env.store.get_role_by_name("owner", None).await.unwrap();
    let (status, _) = env
        .request(
            "POST",
            &format!("/v1/service-accounts/{sa_id}/bindings"),
            Some(&user_auth),
            Some(json!({ "role_id": owner.id, "org_id": org })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The service key authenticates and authorizes a guarded mutation.
    let service_auth = format!("ServiceKey {plaintext}");
    let (status, body) = env
        .request(
            "POST",
            "/v1/rbac/roles",
            Some(&service_auth),
            Some(json!({ "name": "created-by-sa" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");

    // A service key has no user identity.
    let (status, _) = env
        .request("GET", "/v1/users/me", Some(&service_auth), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Disabling the account rejects the key outright.
    let (status, _) = env
        .request(
            "PUT",
            &format!("/v1/service-accounts/{sa_id}/status"),
            Some(&user_auth),
            Some(json!({ "status": "disabled" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = env
        .request(
            "POST",
            "/v1/rbac/check",
            Some(&service_auth),
            Some(json!({ "service_account_id": sa_id, "permission": "org:read" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "service account is disabled");
}

// =============================================================================
// Public allowlist
// =============================================================================

#[tokio::test]
async fn public_methods_skip_the_pipeline() {
    let env = TestEnv::new().await;

    // No credentials, even nonsense ones, are consulted on public paths.
    let (status, _) = env.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = env
        .request("GET", "/health", Some("Bearer garbage"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = env.request("GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
