use chrono::{Duration, Utc};
use school_portal::session::storage::{EXPIRY_KEY, REFRESH_TOKEN_KEY, TOKEN_KEY, USER_KEY};
use school_portal::session::{
    decode_claims, encode_claims, Claims, FileStorage, Role, SessionState, SessionStorage,
    SessionStore, UserProfile,
};
use tempfile::tempdir;

fn token(sub: &str, expires_in: Duration) -> (String, Claims) {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (Utc::now() + expires_in).timestamp(),
        iat: Some(Utc::now().timestamp()),
        role: Some(Role::Parent),
    };
    (encode_claims(&claims, "test_secret").unwrap(), claims)
}

#[test]
fn token_round_trip_recovers_subject_and_expiry() {
    let (token, claims) = token("parent-17", Duration::minutes(30));
    let decoded = decode_claims(&token).unwrap();
    assert_eq!(decoded.sub, claims.sub);
    assert_eq!(decoded.exp, claims.exp);
}

#[test]
fn session_survives_restart_through_file_storage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let (token, claims) = token("parent-17", Duration::hours(1));

    let mut store = SessionStore::new(Box::new(FileStorage::open(&path).unwrap()));
    store
        .set_session(
            token.clone(),
            Some("refresh-abc".to_string()),
            UserProfile::new("parent-17", Role::Parent),
        )
        .unwrap();
    drop(store);

    let raw = FileStorage::open(&path).unwrap();
    assert_eq!(raw.get(TOKEN_KEY).unwrap(), Some(token));
    assert_eq!(raw.get(REFRESH_TOKEN_KEY).unwrap(), Some("refresh-abc".to_string()));
    assert!(raw.get(EXPIRY_KEY).unwrap().is_some());
    assert!(raw.get(USER_KEY).unwrap().unwrap().contains("parent-17"));

    let mut restored = SessionStore::load(Box::new(raw)).unwrap();
    assert!(restored.is_authenticated());
    assert_eq!(restored.expires_at().unwrap().timestamp(), claims.exp);
    assert_eq!(restored.current_user().unwrap().role, Role::Parent);
}

#[test]
fn expiry_check_clears_persisted_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let (token, claims) = token("parent-17", Duration::minutes(10));

    let mut store = SessionStore::new(Box::new(FileStorage::open(&path).unwrap()));
    store
        .set_session(token, Some("refresh-abc".to_string()), UserProfile::new("parent-17", Role::Parent))
        .unwrap();

    let after_expiry = claims.expires_at().unwrap() + Duration::seconds(1);
    assert!(!store.is_authenticated_at(after_expiry));
    assert_eq!(store.state(), SessionState::Anonymous);

    let raw = FileStorage::open(&path).unwrap();
    for key in [TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRY_KEY, USER_KEY] {
        assert_eq!(raw.get(key).unwrap(), None, "{} should be cleared", key);
    }
}

#[test]
fn role_gates_follow_ordinal_order() {
    let dir = tempdir().unwrap();
    let (token, _) = token("u", Duration::hours(1));

    let mut parent = SessionStore::new(Box::new(FileStorage::open(dir.path().join("p.json")).unwrap()));
    parent
        .set_session(token.clone(), None, UserProfile::new("u", Role::Parent))
        .unwrap();
    assert!(!parent.can_access(Role::Admin));

    let mut admin = SessionStore::new(Box::new(FileStorage::open(dir.path().join("a.json")).unwrap()));
    admin
        .set_session(token, None, UserProfile::new("u", Role::Admin))
        .unwrap();
    assert!(admin.can_access(Role::Admin));
}

#[test]
fn logout_wipes_storage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let (token, _) = token("u", Duration::hours(1));

    let mut store = SessionStore::new(Box::new(FileStorage::open(&path).unwrap()));
    store
        .set_session(token, Some("r".to_string()), UserProfile::new("u", Role::School))
        .unwrap();
    store.logout().unwrap();

    let restored = SessionStore::load(Box::new(FileStorage::open(&path).unwrap())).unwrap();
    assert_eq!(restored.state(), SessionState::Anonymous);
    assert!(restored.current_user().is_none());
}
