//! Integration tests for pool lifecycle, acquisition, and release.
//!
//! All tests run against a temp-file SQLite database so the whole pool
//! shares one store without needing a server.

use std::sync::Arc;
use std::time::Duration;

use sqlbridge_conn_mgr::{Backend, ConnectionInner, Database, DatabaseConfig, Error};
use tokio::time::timeout;

struct TestDb {
   db: Arc<Database>,
   _temp_file: tempfile::NamedTempFile,
}

async fn setup_test_db(config: DatabaseConfig) -> TestDb {
   let temp_file = tempfile::NamedTempFile::new().unwrap();
   let db = Database::connect_sqlite(temp_file.path(), config)
      .await
      .unwrap();

   TestDb {
      db: Arc::new(db),
      _temp_file: temp_file,
   }
}

async fn ping(db: &Database) {
   let mut conn = db.acquire().await.unwrap();
   match conn.inner() {
      ConnectionInner::Sqlite(conn) => {
         sqlx::query("SELECT 1").execute(&mut **conn).await.unwrap();
      }
      _ => panic!("expected sqlite connection"),
   }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_connect_and_acquire() {
   let test_db = setup_test_db(DatabaseConfig::default()).await;

   assert_eq!(test_db.db.backend(), Backend::Sqlite);
   assert!(!test_db.db.is_closed());
   ping(&test_db.db).await;
}

#[tokio::test]
async fn test_acquire_after_close_fails() {
   let test_db = setup_test_db(DatabaseConfig::default()).await;

   ping(&test_db.db).await;
   test_db.db.close().await;

   assert!(test_db.db.is_closed());
   let err = test_db.db.acquire().await.unwrap_err();
   assert!(matches!(err, Error::DatabaseClosed));
}

#[tokio::test]
async fn test_missing_credentials_rejected_before_connecting() {
   // Config validation happens before any network activity, so a bogus
   // host is fine here: the missing-user case must fail first.
   let config = DatabaseConfig::new("", "secret", "blog").with_host("nowhere.invalid");
   let err = Database::connect_mysql(config).await.unwrap_err();

   assert!(matches!(err, Error::Config(_)));
   assert!(err.to_string().contains("user"));
}

#[tokio::test]
async fn test_invalid_pool_bounds_rejected() {
   let temp_file = tempfile::NamedTempFile::new().unwrap();
   let config = DatabaseConfig::default().with_minsize(3).with_maxsize(2);

   let err = Database::connect_sqlite(temp_file.path(), config)
      .await
      .unwrap_err();
   assert!(matches!(err, Error::Config(_)));
}

// ============================================================================
// Acquisition & Queueing
// ============================================================================

#[tokio::test]
async fn test_acquire_waits_for_release_when_exhausted() {
   let config = DatabaseConfig::default().with_minsize(1).with_maxsize(1);
   let test_db = setup_test_db(config).await;

   let held = test_db.db.acquire().await.unwrap();

   // Pool is exhausted: a second acquire must suspend, not error
   let waiting = test_db.db.acquire();
   tokio::pin!(waiting);
   assert!(
      timeout(Duration::from_millis(100), &mut waiting)
         .await
         .is_err(),
      "acquire should suspend while the only connection is on loan"
   );

   // Releasing the held connection wakes the waiter
   drop(held);
   let conn = timeout(Duration::from_secs(5), waiting)
      .await
      .expect("waiter should be served after release")
      .unwrap();
   drop(conn);
}

#[tokio::test]
async fn test_acquisitions_past_maxsize_queue_and_all_complete() {
   let config = DatabaseConfig::default().with_minsize(1).with_maxsize(2);
   let test_db = setup_test_db(config).await;

   let mut handles = Vec::new();
   for _ in 0..6 {
      let db = test_db.db.clone();
      handles.push(tokio::spawn(async move {
         let _conn = db.acquire().await.unwrap();
         tokio::time::sleep(Duration::from_millis(20)).await;
      }));
   }

   for handle in handles {
      timeout(Duration::from_secs(10), handle)
         .await
         .expect("queued acquisition should eventually be served")
         .unwrap();
   }
}

// ============================================================================
// Cancellation Safety
// ============================================================================

#[tokio::test]
async fn test_cancelled_waiter_never_holds_a_connection() {
   let config = DatabaseConfig::default().with_minsize(1).with_maxsize(1);
   let test_db = setup_test_db(config).await;

   let held = test_db.db.acquire().await.unwrap();

   // Start a waiter and cancel it while it is still queued
   let db = test_db.db.clone();
   let waiter = tokio::spawn(async move {
      let _conn = db.acquire().await.unwrap();
      std::future::pending::<()>().await;
   });
   tokio::time::sleep(Duration::from_millis(50)).await;
   waiter.abort();
   assert!(waiter.await.unwrap_err().is_cancelled());

   // The cancelled waiter must not have consumed the freed connection
   drop(held);
   let conn = timeout(Duration::from_secs(5), test_db.db.acquire())
      .await
      .expect("connection should be available after cancelled wait")
      .unwrap();
   drop(conn);
}

#[tokio::test]
async fn test_cancelled_holder_returns_its_connection() {
   let config = DatabaseConfig::default().with_minsize(1).with_maxsize(1);
   let test_db = setup_test_db(config).await;

   let db = test_db.db.clone();
   let holder = tokio::spawn(async move {
      let _conn = db.acquire().await.unwrap();
      // Simulate a long-running query suspension point
      std::future::pending::<()>().await;
   });
   tokio::time::sleep(Duration::from_millis(50)).await;
   holder.abort();
   assert!(holder.await.unwrap_err().is_cancelled());

   // The aborted task's connection must be back in the pool, not leaked
   let conn = timeout(Duration::from_secs(5), test_db.db.acquire())
      .await
      .expect("connection should be returned when its holder is cancelled")
      .unwrap();
   drop(conn);
}
