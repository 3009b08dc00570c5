// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider client against a mock management API.

use account_mediator::config::Config;
use account_mediator::error::AppError;
use account_mediator::services::{IdentityClient, IdentityProvider};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, initial_token: Option<&str>) -> IdentityClient {
    let config = Config {
        idp_domain: server.uri(),
        idp_access_token: initial_token.map(str::to_string),
        ..Default::default()
    };
    IdentityClient::new(&config).unwrap()
}

fn token_invalid() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "errors": [{"code": "TOKEN_INVALID", "message": "Invalid token"}]
    }))
}

async fn mount_token_endpoint(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=test_client_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": 86400,
            "token_type": "bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_users_with_valid_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .and(query_param("email", "a@example.com"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "OK",
            "users": [{"id": "kp_1", "email": "a@example.com"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let users = client.get_users("a@example.com").await.unwrap();
    assert_eq!(users.first().unwrap().id, "kp_1");
}

#[tokio::test]
async fn test_get_users_with_no_matches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "OK"})))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let users = client.get_users("nobody@example.com").await.unwrap();
    assert!(users.first().is_none());
}

#[tokio::test]
async fn test_token_invalid_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(token_invalid())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"id": "kp_1"}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let users = client.get_users("a@example.com").await.unwrap();
    assert_eq!(users.first().unwrap().id, "kp_1");

    // The refreshed token is reused without another exchange.
    let again = client.get_users("a@example.com").await.unwrap();
    assert_eq!(again.first().unwrap().id, "kp_1");
}

#[tokio::test]
async fn test_second_token_invalid_is_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user"))
        .respond_with(token_invalid())
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let result = client.create_user("a@example.com").await;
    assert!(matches!(result, Err(AppError::IdentityProvider(_))), "{result:?}");
}

#[tokio::test]
async fn test_other_errors_do_not_refresh() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh", 0).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{"code": "INVALID_EMAIL", "message": "Bad email"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let result = client.create_user("a@example.com").await;
    assert!(matches!(result, Err(AppError::IdentityProvider(_))));
}

#[tokio::test]
async fn test_missing_token_is_fetched_first() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "first", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user"))
        .and(header("authorization", "Bearer first"))
        .and(body_string_contains("a@example.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "kp_9", "created": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let created = client.create_user("a@example.com").await.unwrap();
    assert_eq!(created.id, "kp_9");
    assert!(created.created);
}

#[tokio::test]
async fn test_token_exchange_failure_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let result = client.get_users("a@example.com").await;
    assert!(matches!(result, Err(AppError::IdentityProvider(_))));
}

#[tokio::test]
async fn test_delete_user() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/user"))
        .and(query_param("id", "kp_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "OK"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/user"))
        .and(query_param("id", "kp_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"code": "USER_NOT_FOUND"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    client.delete_user("kp_1").await.unwrap();

    let result = client.delete_user("kp_missing").await;
    assert!(matches!(result, Err(AppError::IdentityProvider(_))));
}
