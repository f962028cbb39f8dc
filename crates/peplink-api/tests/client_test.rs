// Integration tests for `PeplinkClient` using wiremock.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use peplink_api::{Error, PeplinkClient, Session};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PeplinkClient) {
    let server = MockServer::start().await;
    let client = PeplinkClient::with_client(reqwest::Client::new(), server.uri().parse().unwrap());
    (server, client)
}

fn cookie_session() -> Session {
    Session::Cookie(SecretString::from("sess-1"))
}

fn ok(response: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok", "response": response }))
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_extracts_pauth_cookie() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({
            "username": "admin",
            "password": "hunter2",
            "challenge": "challenge"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "pauth=abcdef; HttpOnly; SameSite=Strict")
                .set_body_json(json!({ "stat": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .and(header("Cookie", "pauth=abcdef"))
        .respond_with(ok(json!({ "list": [{}, {}, {}] })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client
        .login("admin", &SecretString::from("hunter2"))
        .await
        .unwrap();
    assert!(matches!(session, Session::Cookie(_)));

    let count = client.connected_clients(&session).await.unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "fail",
            "code": 401,
            "message": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_login_without_cookie_is_auth_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok" })))
        .mount(&server)
        .await;

    let err = client
        .login("admin", &SecretString::from("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));
}

#[tokio::test]
async fn test_token_grant_attaches_query_param() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth.token.grant"))
        .and(body_json(json!({
            "clientId": "cid",
            "clientSecret": "csecret",
            "scope": "api"
        })))
        .respond_with(ok(json!({ "accessToken": "tok-42", "expiresIn": 165_600 })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status.pepvpn"))
        .and(query_param("accessToken", "tok-42"))
        .respond_with(ok(json!({
            "profile": {
                "1": { "name": "HQ", "type": "PEPVPN", "status": "CONNECTED" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client
        .grant_token("cid", &SecretString::from("csecret"))
        .await
        .unwrap();
    assert_eq!(grant.expires_in.map(|d| d.as_secs()), Some(165_600));

    let profiles = client.pepvpn_status(&grant.session).await.unwrap();
    assert_eq!(profiles["1"].name.as_deref(), Some("HQ"));
    assert_eq!(profiles["1"].status.as_deref(), Some("CONNECTED"));
}

// ── Session expiry signals ──────────────────────────────────────────

#[tokio::test]
async fn test_http_401_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.connected_clients(&cookie_session()).await.unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_envelope_401_on_http_200_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status.wan.connection.allowance"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "stat": "fail", "code": 401 })),
        )
        .mount(&server)
        .await;

    let err = client.wan_usage(&cookie_session()).await.unwrap_err();
    assert!(matches!(err, Error::SessionExpired));
}

#[tokio::test]
async fn test_http_404_is_unsupported_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/info.location"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.location(&cookie_session()).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedEndpoint { ref path } if path == "/api/info.location"));
    assert!(err.is_unsupported());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status.client"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.connected_clients(&cookie_session()).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_transient());
}

// ── Status endpoints ────────────────────────────────────────────────

#[tokio::test]
async fn test_wan_status_parses_mixed_connections() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status.wan.connection"))
        .and(query_param("id", "1 2 3"))
        .respond_with(ok(json!({
            "1": {
                "name": "Ethernet WAN",
                "enable": true,
                "message": "Connected",
                "priority": 1,
                "uptime": 86_400,
                "ip": "203.0.113.7",
                "statusLed": "green"
            },
            "2": {
                "name": "Cellular",
                "enable": true,
                "message": "Connected",
                "priority": "2",
                "cellular": {
                    "moduleName": "Sierra EM7565",
                    "signalLevel": 4,
                    "carrier": { "name": "Vodafone" },
                    "mobileType": "LTE-A",
                    "carrierAggregation": true,
                    "rat": [{
                        "name": "LTE",
                        "band": [
                            { "name": "B3", "signal": { "rssi": -65, "rsrp": -95, "rsrq": -11.5 } },
                            { "name": "B20" }
                        ]
                    }]
                }
            },
            "order": [1, 2]
        })))
        .mount(&server)
        .await;

    let wans = client.wan_status(&cookie_session(), &[1, 2, 3]).await.unwrap();
    assert_eq!(wans.len(), 2);

    let ethernet = &wans[&1];
    assert_eq!(ethernet.uptime, Some(86_400));
    assert!(ethernet.cellular_info().is_none());

    let cellular = wans[&2].cellular_info().unwrap();
    assert_eq!(wans[&2].priority, Some(2));
    assert_eq!(cellular.signal_level, Some(4));
    assert_eq!(cellular.carrier_name().as_deref(), Some("Vodafone"));
    assert_eq!(cellular.rat[0].band.len(), 2);
    assert_eq!(cellular.rat[0].band[0].signal.as_ref().unwrap().rsrp, Some(-95));
}

#[tokio::test]
async fn test_traffic_and_sensors_without_response_wrapper() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/MANGA/api.cgi"))
        .and(query_param("func", "status.traffic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "bandwidth": {
                "1": { "overall": { "download": 12_500, "upload": 800 } },
                "unit": "kbps"
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/MANGA/api.cgi"))
        .and(query_param("func", "status.system.info"))
        .and(query_param("infoType", "thermalSensor fanSpeed"))
        .respond_with(ok(json!({
            "thermalSensor": [{ "temperature": 48.5, "threshold": 85 }],
            "fanSpeed": [
                { "value": 3200, "percentage": 40, "active": true },
                { "value": 0, "percentage": 0, "active": false }
            ]
        })))
        .mount(&server)
        .await;

    let session = cookie_session();
    let traffic = client.traffic(&session).await.unwrap();
    let overall = traffic[&1].overall.as_ref().unwrap();
    assert_eq!(overall.download, Some(12_500.0));
    assert_eq!(overall.upload, Some(800.0));

    let sensors = client.system_sensors(&session).await.unwrap();
    assert_eq!(sensors.thermal_sensor[0].temperature, Some(48.5));
    assert_eq!(sensors.fan_speed.len(), 2);
    assert_eq!(sensors.fan_speed[1].active, Some(false));
}

#[tokio::test]
async fn test_firmware_prefers_in_use_image() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/info.firmware"))
        .respond_with(ok(json!({
            "1": { "version": "8.3.0 build 5252", "inUse": false },
            "2": { "version": "8.4.1 build 5540", "inUse": true }
        })))
        .mount(&server)
        .await;

    let version = client.firmware_version(&cookie_session()).await.unwrap();
    assert_eq!(version.as_deref(), Some("8.4.1 build 5540"));
}

#[tokio::test]
async fn test_location_root_fallback_and_no_fix() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/info.location"))
        .respond_with(ok(json!({ "gps": false })))
        .mount(&server)
        .await;

    let fix = client.location(&cookie_session()).await.unwrap();
    assert!(!fix.has_fix());
}

#[tokio::test]
async fn test_location_nested_fix() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/info.location"))
        .respond_with(ok(json!({
            "location": { "latitude": 51.5, "longitude": -0.12, "speed": 3.2, "timestamp": 1_700_000_000 }
        })))
        .mount(&server)
        .await;

    let fix = client.location(&cookie_session()).await.unwrap();
    assert!(fix.has_fix());
    assert_eq!(fix.speed, Some(3.2));
    assert_eq!(fix.timestamp, Some(1_700_000_000));
}

// ── Control endpoints ───────────────────────────────────────────────

#[tokio::test]
async fn test_set_priority_and_disable_payloads() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/config.wan.connection.priority"))
        .and(body_json(json!({
            "instantActive": true,
            "list": [{ "connId": 2, "priority": 3 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/config.wan.connection.priority"))
        .and(body_json(json!({
            "instantActive": true,
            "list": [{ "connId": 2, "enable": false }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = cookie_session();
    client.set_wan_priority(&session, 2, Some(3)).await.unwrap();
    client.set_wan_priority(&session, 2, None).await.unwrap();
}

#[tokio::test]
async fn test_modem_reset_sends_string_conn_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cmd.cellularModule.reset"))
        .and(body_json(json!({ "connId": "2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .reset_cellular_modem(&cookie_session(), 2)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_command_failure_carries_router_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cmd.cellularModule.reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "fail",
            "code": 400,
            "message": "Connection is not cellular"
        })))
        .mount(&server)
        .await;

    let err = client
        .reset_cellular_modem(&cookie_session(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { ref message, .. } if message == "Connection is not cellular"));
}
