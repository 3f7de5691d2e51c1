use std::sync::Arc;

use mockall::Sequence;
use reqwest::StatusCode;
use serde_json::json;

use super::*;
use crate::transport::{HttpResponse, MockTransport};

fn json_response(status: StatusCode, body: Value) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_vec(&body).unwrap())
}

fn session_over(mock: MockTransport) -> Session {
    Session::with_transport(SessionConfig::new("https://crm.test"), Arc::new(mock)).unwrap()
}

fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "expires_in": 3600,
        "token_type": "bearer",
        "scope": null,
        "refresh_token": refresh,
        "refresh_expires_in": 1209600,
        "download_token": "dl"
    })
}

#[tokio::test]
async fn test_new_session_is_unauthenticated() {
    let mut mock = MockTransport::new();
    mock.expect_execute().times(0);
    let session = session_over(mock);

    assert!(!session.is_authenticated().await);
    assert!(session.tokens().await.is_empty());
    assert_eq!(session.base_url(), "https://crm.test");
}

#[test]
fn test_new_rejects_bad_url() {
    assert!(matches!(Session::new("crm.test"), Err(Error::Url(_))));
}

#[tokio::test]
async fn test_run_query_unknown_module_makes_no_call() {
    let mut mock = MockTransport::new();
    mock.expect_execute().times(0);
    let session = session_over(mock);

    let err = session.run_query(&Query::new("Widgets")).await.unwrap_err();
    assert!(matches!(err, Error::ModuleUnavailable(ref m) if m == "Widgets"));
}

#[tokio::test]
async fn test_refresh_without_token_makes_no_call() {
    let mut mock = MockTransport::new();
    mock.expect_execute().times(0);
    let session = session_over(mock);

    assert!(matches!(session.refresh().await, Err(Error::NoRefreshToken)));
    assert!(session.tokens().await.is_empty());
}

#[tokio::test]
async fn test_call_json_sends_token_header_and_service_prefix() {
    let mut mock = MockTransport::new();
    let mut seq = Sequence::new();

    mock.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|req| {
            req.url == "https://crm.test/rest/v10/oauth2/token"
                && req.method == Method::POST
                && !req.headers.contains_key(crate::auth::TOKEN_HEADER)
        })
        .returning(|_| Ok(json_response(StatusCode::OK, token_body("acc-1", "ref-1"))));
    mock.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|req| req.url.ends_with("/rest/v10/me"))
        .returning(|_| {
            Ok(json_response(
                StatusCode::OK,
                json!({"current_user": {"id": "1", "module_list": ["Accounts"]}}),
            ))
        });
    mock.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|req| req.url.ends_with("/rest/v10/me/preferences"))
        .returning(|_| Ok(json_response(StatusCode::OK, json!({}))));
    mock.expect_execute()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|req| {
            req.url == "https://crm.test/rest/v10/Accounts/count"
                && req.headers.get(crate::auth::TOKEN_HEADER).map(|v| v.as_bytes())
                    == Some(b"acc-1".as_slice())
                && req.headers.get(reqwest::header::CONTENT_TYPE).map(|v| v.as_bytes())
                    == Some(b"application/json".as_slice())
                && req.body.is_none()
        })
        .returning(|_| Ok(json_response(StatusCode::OK, json!({"record_count": 3}))));

    let session = session_over(mock);
    session.connect("jim", "jim").await.unwrap();

    let count: Value = session.get_json("/Accounts/count").await.unwrap();
    assert_eq!(count["record_count"], 3);
    assert!(session.has_module("Users").await);
}

#[tokio::test]
async fn test_connect_rejected_leaves_tokens_empty() {
    let mut mock = MockTransport::new();
    mock.expect_execute().times(1).returning(|_| {
        Ok(json_response(
            StatusCode::UNAUTHORIZED,
            json!({"error": "need_login", "error_message": "Invalid credentials"}),
        ))
    });
    let session = session_over(mock);

    let err = session.connect("jim", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(session.tokens().await.is_empty());
}

#[tokio::test]
async fn test_transport_error_is_not_retried() {
    let mut mock = MockTransport::new();
    mock.expect_execute().times(1).returning(|_| {
        Err(Error::transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        )))
    });
    let session = session_over(mock);

    let err = session.get_json::<Value>("/ping").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_logout_clears_state() {
    let mut mock = MockTransport::new();
    mock.expect_execute()
        .withf(|req| req.url.ends_with("/oauth2/token"))
        .returning(|_| Ok(json_response(StatusCode::OK, token_body("a", "r"))));
    mock.expect_execute()
        .withf(|req| req.url.ends_with("/me"))
        .returning(|_| {
            Ok(json_response(
                StatusCode::OK,
                json!({"current_user": {"module_list": []}}),
            ))
        });
    mock.expect_execute()
        .withf(|req| req.url.ends_with("/me/preferences"))
        .returning(|_| Ok(json_response(StatusCode::OK, json!({}))));

    let session = session_over(mock);
    session.connect("jim", "jim").await.unwrap();
    assert!(session.is_authenticated().await);

    session.logout().await;
    assert!(!session.is_authenticated().await);
    assert!(session.info().await.module_list.is_empty());
}

#[test]
fn test_apply_me_requires_current_user() {
    let mut state = SessionState::default();
    assert!(matches!(
        apply_me(&mut state, &json!({"user": {}})),
        Err(Error::MissingCurrentUser)
    ));
    assert!(matches!(
        apply_me(&mut state, &json!({"current_user": "jim"})),
        Err(Error::MissingCurrentUser)
    ));
}

#[test]
fn test_apply_me_keeps_user_preferences() {
    let mut state = SessionState::default();
    apply_preferences(&mut state, &json!({"timezone": "UTC"})).unwrap();
    apply_me(&mut state, &json!({"current_user": {"id": "1"}})).unwrap();

    assert_eq!(state.info.user_preferences.timezone, "UTC");
    assert_eq!(state.info.module_list, vec!["Users"]);
}

#[test]
fn test_apply_preferences_requires_object() {
    let mut state = SessionState::default();
    assert!(matches!(
        apply_preferences(&mut state, &json!([1, 2])),
        Err(Error::Decode { .. })
    ));
}
