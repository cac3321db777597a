use chrono::{Duration, Utc};
use school_portal::auth::{AuthApi, AuthProvider, AuthService, HttpAuthClient};
use school_portal::config::AuthConfig;
use school_portal::error::{AppError, AuthError, ValidationError};
use school_portal::session::{encode_claims, Claims, MemoryStorage, Role, SessionState, SessionStore};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn jwt(expires_in: Duration) -> String {
    let claims = Claims {
        sub: "42".to_string(),
        exp: (Utc::now() + expires_in).timestamp(),
        iat: None,
        role: None,
    };
    encode_claims(&claims, "backend_secret").unwrap()
}

fn auth_config(base_url: &str) -> AuthConfig {
    AuthConfig {
        base_url: base_url.to_string(),
        otp_length: 6,
        otp_max_requests: 3,
        otp_window_minutes: 10,
    }
}

async fn setup() -> (MockServer, AuthService) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/audit"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let api: Arc<dyn AuthApi> = Arc::new(HttpAuthClient::new(&server.uri()).unwrap());
    let session = SessionStore::new(Box::new(MemoryStorage::new())).into_shared();
    let service = AuthService::new(api, session, &auth_config(&server.uri()));
    (server, service)
}

#[tokio::test]
async fn otp_login_flow() {
    let (server, service) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/otp/send"))
        .and(body_json(json!({ "phone": "+254712345678" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OTP sent",
            "expires_in": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/otp/verify"))
        .and(body_json(json!({ "phone": "+254712345678", "otp": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": jwt(Duration::hours(1)),
            "refresh_token": "refresh-1",
            "user": { "id": "42", "role": "parent", "phone": "+254712345678" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatch = service.send_otp("+254 712 345 678").await.unwrap();
    assert_eq!(dispatch.message, "OTP sent");
    assert_eq!(dispatch.expires_in, Some(300));

    let user = service.verify_otp("+254712345678", "123456").await.unwrap();
    assert_eq!(user.id, "42");

    let session = service.session();
    let mut store = session.write().await;
    assert!(store.is_authenticated());
    assert!(store.can_access(Role::Parent));
    assert!(!store.can_access(Role::Admin));
}

#[tokio::test]
async fn backend_failure_message_is_returned() {
    let (server, service) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/otp/verify"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid or expired OTP"
        })))
        .mount(&server)
        .await;

    let err = service.verify_otp("0712345678", "999999").await.unwrap_err();
    match &err {
        AppError::AuthError(AuthError::Rejected(message)) => {
            assert_eq!(message, "Invalid or expired OTP")
        }
        other => panic!("Expected rejection, got {:?}", other),
    }
    assert_eq!(err.user_message(), "Invalid or expired OTP");
    assert_eq!(service.session().read().await.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn invalid_phone_never_reaches_backend() {
    let (server, service) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/otp/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    match service.send_otp("phone").await {
        Err(AppError::ValidationError(ValidationError::InvalidPhone(_))) => (),
        other => panic!("Expected invalid phone, got {:?}", other),
    }
}

#[tokio::test]
async fn oauth_login_then_link_and_unlink() {
    let (server, service) = setup().await;
    let session_token = jwt(Duration::hours(1));

    Mock::given(method("POST"))
        .and(path("/auth/oauth/google"))
        .and(body_json(json!({ "access_token": "google-access" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": session_token,
            "refresh_token": "refresh-1",
            "user": { "id": "42", "role": "school", "linked_providers": ["google"] }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/oauth/facebook/link"))
        .and(header("authorization", format!("Bearer {}", session_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Facebook linked",
            "user": { "id": "42", "role": "school", "linked_providers": ["google", "facebook"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/oauth/google/unlink"))
        .and(header("authorization", format!("Bearer {}", session_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "42", "role": "school", "linked_providers": ["facebook"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = service
        .login_with_provider(AuthProvider::Google, "google-access")
        .await
        .unwrap();
    assert_eq!(user.role, Role::School);

    let user = service
        .link_provider(AuthProvider::Facebook, "fb-access")
        .await
        .unwrap();
    assert_eq!(user.linked_providers, vec![AuthProvider::Google, AuthProvider::Facebook]);

    let user = service.unlink_provider(AuthProvider::Google).await.unwrap();
    assert_eq!(user.linked_providers, vec![AuthProvider::Facebook]);
    assert_eq!(
        service.session().read().await.current_user().unwrap().linked_providers,
        vec![AuthProvider::Facebook]
    );
}

#[tokio::test]
async fn refresh_replaces_token_and_failure_logs_out() {
    let (server, service) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/oauth/facebook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": jwt(Duration::minutes(1)),
            "refresh_token": "refresh-1",
            "user": { "id": "42", "role": "admin" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": jwt(Duration::hours(2)),
            "refresh_token": "refresh-2"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "refresh-2" })))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    service
        .login_with_provider(AuthProvider::Facebook, "fb-access")
        .await
        .unwrap();

    service.refresh().await.unwrap();
    {
        let session = service.session();
        let mut store = session.write().await;
        assert!(store.is_authenticated());
        assert!(store.expires_at().unwrap() > Utc::now() + Duration::hours(1));
        assert_eq!(store.refresh_token(), Some("refresh-2"));
        assert!(store.can_access(Role::Admin));
    }

    match service.refresh().await {
        Err(AppError::AuthError(AuthError::InvalidCredentials)) => (),
        other => panic!("Expected invalid credentials, got {:?}", other),
    }
    assert_eq!(service.session().read().await.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let api = HttpAuthClient::new("http://127.0.0.1:9/").unwrap();
    match api.send_otp("+254712345678").await {
        Err(AppError::AuthError(AuthError::Network(_))) => (),
        other => panic!("Expected network error, got {:?}", other),
    }
}
