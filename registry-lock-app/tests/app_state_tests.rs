#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `AppStateBuilder`, `AppState` and the relock worker
//! against a temp-dir `SqliteStore`.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use registry_lock_app::adapters::SqliteStore;
use registry_lock_app::config::{AppConfig, EmailBackend};
use registry_lock_app::{AppState, AppStateBuilder};
use registry_lock_core::error::CoreError;
use registry_lock_core::traits::{ManualClock, RegistrarRepository};
use registry_lock_core::types::{
    Actor, Domain, LockAction, LockRequest, LockStatus, Registrar, RegistrarContact,
    RelockOutcome,
};
use tokio::sync::watch;

const CONTACT: &str = "marla.singer@example.com";
const PASSWORD: &str = "hunter2";

async fn create_test_sqlite_store() -> (Arc<SqliteStore>, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = tmp.path().join("test.db");
    let store = SqliteStore::new(&db_path)
        .await
        .expect("failed to create SqliteStore");
    (Arc::new(store), tmp)
}

fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ))
}

fn build_state(store: &Arc<SqliteStore>, clock: &Arc<ManualClock>) -> AppState {
    AppStateBuilder::new()
        .sqlite_store(Arc::clone(store))
        .email_sender(Arc::clone(store) as _)
        .clock(Arc::clone(clock) as _)
        .build()
        .unwrap()
}

async fn seed(store: &SqliteStore) {
    let mut contact = RegistrarContact::new(CONTACT.to_string());
    contact.enable_registry_lock("lock-marla@example.com".to_string(), PASSWORD);
    RegistrarRepository::save(
        store,
        &Registrar {
            registrar_id: "TheRegistrar".to_string(),
            name: "The Registrar".to_string(),
            registry_lock_allowed: true,
            contacts: vec![contact],
        },
    )
    .await
    .unwrap();

    let domain = Domain::new(
        "1-TLD".to_string(),
        "example.tld".to_string(),
        "TheRegistrar".to_string(),
    );
    registry_lock_core::traits::DomainRepository::save(store, &domain)
        .await
        .unwrap();
}

// ===== Builder =====

#[test]
fn build_without_registry_store_fails() {
    let err = AppStateBuilder::new().build().err().unwrap();
    assert!(
        matches!(err, CoreError::ValidationError(ref msg) if msg == "registry_store is required")
    );
}

#[tokio::test]
async fn build_without_audit_repository_fails() {
    let (store, _tmp) = create_test_sqlite_store().await;
    let err = AppStateBuilder::new()
        .registry_store(Arc::clone(&store) as _)
        .registrar_repository(Arc::clone(&store) as _)
        .domain_repository(store as _)
        .build()
        .err()
        .unwrap();
    assert!(
        matches!(err, CoreError::ValidationError(ref msg) if msg == "audit_repository is required")
    );
}

#[tokio::test]
async fn open_sqlite_creates_database_at_configured_path() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("nested").join("registry-lock.db");
    let config = AppConfig {
        database_path: Some(db_path.clone()),
        email: registry_lock_app::config::EmailConfig {
            backend: EmailBackend::Outbox,
        },
        ..AppConfig::default()
    };

    let (state, store) = AppState::open_sqlite(&config).await.unwrap();
    assert!(db_path.exists());
    assert_eq!(state.ctx.config(), &config.lock);
    assert!(store.pending_emails().await.unwrap().is_empty());
}

// ===== End-to-end flows =====

#[tokio::test]
async fn request_verify_unlock_and_relock() {
    let (store, _tmp) = create_test_sqlite_store().await;
    let clock = test_clock();
    seed(&store).await;
    let state = build_state(&store, &clock);
    let actor = Actor::user(CONTACT);

    let pending = state
        .lock_request_service
        .submit(
            &actor,
            LockRequest {
                registrar_id: "TheRegistrar".to_string(),
                domain_name: "EXAMPLE.tld".to_string(),
                is_lock: true,
                password: Some(PASSWORD.to_string()),
                relock_duration: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.domain_name, "example.tld");
    assert_eq!(
        state.domain_lock_service.lock_status("example.tld").await.unwrap(),
        LockStatus::Pending
    );

    let emails = store.pending_emails().await.unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].message.recipients, vec![CONTACT.to_string()]);
    assert!(emails[0].message.body.contains(&pending.verification_code));

    let outcome = state
        .lock_request_service
        .verify(&actor, &pending.verification_code)
        .await
        .unwrap();
    assert_eq!(outcome.action, LockAction::Lock);
    assert_eq!(
        state.domain_lock_service.lock_status("example.tld").await.unwrap(),
        LockStatus::Locked
    );

    let overview = state
        .lock_request_service
        .locks_overview(&actor, "TheRegistrar")
        .await
        .unwrap();
    assert_eq!(overview.locks.len(), 1);
    assert_eq!(overview.locks[0].locked_by, CONTACT);

    let unlock = state
        .domain_lock_service
        .administratively_apply_unlock(
            "example.tld",
            "TheRegistrar",
            true,
            Some(Duration::from_secs(3600)),
        )
        .await
        .unwrap();
    assert_eq!(
        state.domain_lock_service.lock_status("example.tld").await.unwrap(),
        LockStatus::NotLocked
    );

    let early = state.run_relock_sweep().await.unwrap();
    assert_eq!(early.relocked, 0);

    clock.advance(chrono::Duration::hours(2));
    let sweep = state.run_relock_sweep().await.unwrap();
    assert_eq!(sweep.relocked, 1);
    assert_eq!(
        state.domain_lock_service.lock_status("example.tld").await.unwrap(),
        LockStatus::Locked
    );

    let again = state
        .relock_service
        .relock(unlock.revision_id.unwrap())
        .await
        .unwrap();
    assert!(matches!(again, RelockOutcome::Skipped { .. }));

    let history = state
        .ctx
        .audit_repository()
        .find_history_by_repo_id("1-TLD")
        .await
        .unwrap();
    let reasons: Vec<_> = history.iter().map(|h| h.reason.as_str()).collect();
    assert_eq!(reasons, ["lock", "unlock", "lock"]);

    // Only the registrar-requested lock is billed
    let billing = state
        .ctx
        .audit_repository()
        .find_billing_events_by_target("example.tld")
        .await
        .unwrap();
    assert_eq!(billing.len(), 1);
    assert_eq!(billing[0].history_id, history[0].id);

    let subjects: Vec<_> = store
        .pending_emails()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.message.subject)
        .collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[1].contains("re-lock"));
}

#[tokio::test]
async fn bulk_lock_reports_failures_per_domain() {
    let (store, _tmp) = create_test_sqlite_store().await;
    let clock = test_clock();
    seed(&store).await;
    let state = build_state(&store, &clock);

    let result = state
        .domain_lock_service
        .bulk_apply(
            &["example.tld".to_string(), "missing.tld".to_string()],
            Some("TheRegistrar"),
            LockAction::Lock,
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.failures[0].domain_name, "missing.tld");
}

// ===== Relock worker =====

#[tokio::test]
async fn relock_worker_stops_on_shutdown() {
    let (store, _tmp) = create_test_sqlite_store().await;
    let clock = test_clock();
    let state = build_state(&store, &clock);
    let (tx, rx) = watch::channel(false);

    let handle = state.spawn_relock_worker(Duration::from_secs(3600), rx);
    tokio::task::yield_now().await;
    tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap();
}

#[tokio::test]
async fn relock_worker_stops_when_sender_dropped() {
    let (store, _tmp) = create_test_sqlite_store().await;
    let state = build_state(&store, &test_clock());
    let (tx, rx) = watch::channel(false);

    let handle = state.spawn_relock_worker(Duration::from_secs(3600), rx);
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap();
}
