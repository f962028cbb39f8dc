// Session manager behaviour against a wiremock router.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::future::join_all;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use peplink_api::{PeplinkClient, TransportConfig};
use peplink_core::{AuthCredentials, AuthState, CoreError, LoginPolicy, SessionManager};

// ── Helpers ─────────────────────────────────────────────────────────

fn userpass() -> AuthCredentials {
    AuthCredentials::UserPass {
        username: "admin".into(),
        password: SecretString::from("hunter2"),
    }
}

fn policy() -> LoginPolicy {
    LoginPolicy {
        retries: 2,
        backoff: Duration::from_millis(10),
        rejected_cooldown: Duration::from_secs(300),
    }
}

async fn setup(credentials: AuthCredentials) -> (MockServer, PeplinkClient, SessionManager) {
    let server = MockServer::start().await;
    let api = PeplinkClient::new(server.uri().parse().unwrap(), &TransportConfig::default()).unwrap();
    let sessions = SessionManager::new(api.clone(), credentials, policy());
    (server, api, sessions)
}

fn login_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Set-Cookie", "pauth=sess-1; HttpOnly")
        .set_body_json(json!({ "stat": "ok" }))
}

fn clients(count: usize) -> ResponseTemplate {
    let list: Vec<_> = (0..count).map(|i| json!({ "ip": format!("10.0.0.{i}") })).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok", "response": { "list": list } }))
}

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "stat": "fail", "code": 401, "message": "Unauthorized"
    }))
}

// ── Single-flight login ─────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_acquires_share_one_login() {
    let (server, _api, sessions) = setup(userpass()).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(login_ok().set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let results = join_all((0..8).map(|_| sessions.acquire())).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(sessions.login_count(), 1);
    assert_eq!(sessions.auth_state(), AuthState::Authenticated);

    // A held session is reused without another login.
    sessions.acquire().await.unwrap();
    assert_eq!(sessions.login_count(), 1);
}

#[tokio::test]
async fn test_rejected_credentials_reach_every_waiter_once() {
    let (server, _api, sessions) = setup(userpass()).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "stat": "fail", "code": 401, "message": "Invalid username or password"
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let results = join_all((0..5).map(|_| sessions.acquire())).await;
    assert!(
        results
            .iter()
            .all(|r| matches!(r, Err(CoreError::AuthenticationFailed { .. })))
    );
    assert_eq!(sessions.auth_state(), AuthState::Rejected);

    // Inside the cooldown the error is replayed without a new login.
    let again = sessions.acquire().await;
    assert!(matches!(again, Err(CoreError::AuthenticationFailed { .. })));
    assert_eq!(sessions.login_count(), 1);
}

#[tokio::test]
async fn test_transient_login_failure_is_retried() {
    let (server, _api, sessions) = setup(userpass()).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    sessions.acquire().await.unwrap();
    assert_eq!(sessions.login_count(), 2);
}

// ── Re-authentication ───────────────────────────────────────────────

#[tokio::test]
async fn test_session_expiry_triggers_one_reauth_and_retry() {
    let (server, api, sessions) = setup(userpass()).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(login_ok())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(expired())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(clients(4))
        .mount(&server)
        .await;

    let api = &api;
    let count = sessions
        .call(|session| async move { api.connected_clients(&session).await })
        .await
        .unwrap();
    assert_eq!(count, 4);
    assert_eq!(sessions.login_count(), 2);
}

#[tokio::test]
async fn test_persistent_expiry_gives_up_after_second_login() {
    let (server, api, sessions) = setup(userpass()).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(login_ok())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let api = &api;
    let result = sessions
        .call(|session| async move { api.connected_clients(&session).await })
        .await;
    assert!(matches!(result, Err(CoreError::SessionExpired)));
    assert_eq!(sessions.login_count(), 2);
}

#[tokio::test]
async fn test_concurrent_expiries_cause_single_relogin() {
    let (server, api, sessions) = setup(userpass()).await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(login_ok().set_delay(Duration::from_millis(50)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(expired())
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(clients(1))
        .mount(&server)
        .await;

    sessions.acquire().await.unwrap();

    let api = &api;
    let results = join_all((0..3).map(|_| {
        sessions.call(|session| async move { api.connected_clients(&session).await })
    }))
    .await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(sessions.login_count(), 2);
}

// ── Token mode ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_grant_session_uses_query_parameter() {
    let (server, api, sessions) = setup(AuthCredentials::Token {
        client_id: "client-1".into(),
        client_secret: SecretString::from("s3cret"),
    })
    .await;

    Mock::given(method("POST"))
        .and(path("/api/auth.token.grant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "response": { "accessToken": "tok-9", "expiresIn": 3600 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .and(query_param("accessToken", "tok-9"))
        .respond_with(clients(2))
        .expect(1)
        .mount(&server)
        .await;

    let api = &api;
    let count = sessions
        .call(|session| async move { api.connected_clients(&session).await })
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_out_of_range_token_lifetime_still_yields_session() {
    let (server, _api, sessions) = setup(AuthCredentials::Token {
        client_id: "client-1".into(),
        client_secret: SecretString::from("s3cret"),
    })
    .await;

    Mock::given(method("POST"))
        .and(path("/api/auth.token.grant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "response": { "accessToken": "tok-max", "expiresIn": u64::MAX }
        })))
        .expect(1)
        .mount(&server)
        .await;

    sessions.acquire().await.unwrap();
    assert_eq!(sessions.auth_state(), AuthState::Authenticated);

    // The lease is held and reused.
    sessions.acquire().await.unwrap();
    assert_eq!(sessions.login_count(), 1);
}
