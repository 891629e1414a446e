mod common;

use common::{MockBackend, ISSUED_TOKEN, VALID_EMAIL, VALID_PASSWORD};
use hearnear_daemon::session::AuthState;
use hearnear_proto::session::{Session, SessionStore};

#[tokio::test]
async fn test_login_persists_session_and_authenticates() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = common::session_machine(&backend, dir.path());

    session.login(VALID_EMAIL, VALID_PASSWORD).await.unwrap();

    match session.snapshot().await {
        AuthState::Authenticated(s) => {
            assert_eq!(s.token, ISSUED_TOKEN);
            assert_eq!(s.user.email, VALID_EMAIL);
        }
        other => panic!("expected Authenticated, got {:?}", other),
    }

    // The store holds the same token a fresh process would load.
    let persisted = SessionStore::new(dir.path().join("session.json"))
        .load()
        .unwrap();
    assert_eq!(persisted.token, ISSUED_TOKEN);
}

#[tokio::test]
async fn test_rejected_login_reports_error_and_keeps_store() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Pre-persisted session from a previous run survives a failed attempt.
    let store = SessionStore::new(dir.path().join("session.json"));
    store
        .save(&Session {
            token: "old-token".to_string(),
            user: common::sample_user(),
        })
        .unwrap();

    let session = common::session_machine(&backend, dir.path());
    session.login(VALID_EMAIL, "wrong-password").await.unwrap();

    match session.snapshot().await {
        AuthState::AuthError(message) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected AuthError, got {:?}", other),
    }
    assert_eq!(store.load().unwrap().token, "old-token");
}

#[tokio::test]
async fn test_validation_failure_never_reaches_the_network() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = common::session_machine(&backend, dir.path());

    assert!(session.login("not-an-email", "secret1").await.is_err());
    assert!(session.login(VALID_EMAIL, "short").await.is_err());

    // State machine untouched by validation failures.
    assert_eq!(session.snapshot().await, AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_cold_start_verify_settles_authenticated() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();

    SessionStore::new(dir.path().join("session.json"))
        .save(&Session {
            token: ISSUED_TOKEN.to_string(),
            user: common::sample_user(),
        })
        .unwrap();

    let session = common::session_machine(&backend, dir.path());
    session.verify_on_start().await;

    assert!(session.snapshot().await.is_authenticated());
    assert_eq!(session.token().await.as_deref(), Some(ISSUED_TOKEN));
}

#[tokio::test]
async fn test_cold_start_with_stale_token_clears_store() {
    let backend = MockBackend::start().await;
    backend.revoke_all_tokens();
    let dir = tempfile::tempdir().unwrap();

    let store = SessionStore::new(dir.path().join("session.json"));
    store
        .save(&Session {
            token: ISSUED_TOKEN.to_string(),
            user: common::sample_user(),
        })
        .unwrap();

    let session = common::session_machine(&backend, dir.path());
    session.verify_on_start().await;

    assert_eq!(session.snapshot().await, AuthState::Unauthenticated);
    assert!(store.load().is_none());
}

#[tokio::test]
async fn test_logout_clears_store_even_when_remote_fails() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = common::logged_in_session(&backend, dir.path()).await;

    backend.set_fail_logout(true);
    session.logout().await;

    assert_eq!(session.snapshot().await, AuthState::Unauthenticated);
    assert!(SessionStore::new(dir.path().join("session.json"))
        .load()
        .is_none());
}

#[tokio::test]
async fn test_register_then_clear_error_roundtrip() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = common::session_machine(&backend, dir.path());

    // Server-side rejection lands in AuthError, clear_error resets it.
    session
        .register("ann", "taken@example.com", "secret1", "secret1", true)
        .await
        .unwrap();
    assert!(matches!(session.snapshot().await, AuthState::AuthError(_)));

    session.clear_error().await;
    assert_eq!(session.snapshot().await, AuthState::Unauthenticated);

    session
        .register("ann", "ann@example.com", "secret1", "secret1", true)
        .await
        .unwrap();
    assert!(session.snapshot().await.is_authenticated());
}
