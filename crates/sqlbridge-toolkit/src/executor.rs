//! Read and write query execution over a pooled database handle.
//!
//! [`QueryExecutor`] wraps an explicitly-constructed [`Database`] — there
//! is no global pool. Each call acquires a connection for exactly the
//! duration of one statement; the scoped guard returns it on every exit
//! path, including errors and task cancellation.
//!
//! Writes honor the pool's autocommit setting: with autocommit disabled,
//! every write is framed in an explicit transaction that commits on
//! success and rolls back exactly once on failure, before the connection
//! goes back to the pool. The original driver error always propagates
//! unchanged.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlbridge_conn_mgr::{ConnectionInner, Database};
use sqlx::mysql::MySqlConnection;
use sqlx::postgres::PgConnection;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, info};

use crate::bind::{bind_mysql, bind_postgres, bind_sqlite};
use crate::decode::{decode_mysql_row, decode_postgres_row, decode_sqlite_row};
use crate::error::{Error, Result};
use crate::placeholder::{self, PlaceholderStyle};

/// A decoded result row: column name → JSON value, in column order.
pub type Row = crate::decode::JsonRow;

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID, for backends that report one (MySQL,
   /// SQLite). `None` on PostgreSQL.
   pub last_insert_id: Option<i64>,
}

/// Executes read and write statements against a pooled database.
///
/// Statement templates use `?` placeholders regardless of backend; they
/// are translated to the store's native syntax before dispatch.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use serde_json::json;
/// use sqlbridge_conn_mgr::{Database, DatabaseConfig};
/// use sqlbridge_toolkit::QueryExecutor;
///
/// # async fn example() -> sqlbridge_toolkit::Result<()> {
/// let config = DatabaseConfig::new("app", "secret", "blog").with_autocommit(false);
/// let db = Arc::new(Database::connect_mysql(config).await?);
/// let executor = QueryExecutor::new(db);
///
/// let result = executor
///    .write("INSERT INTO users (name) VALUES (?)", vec![json!("Alice")])
///    .await?;
/// assert_eq!(result.rows_affected, 1);
///
/// let rows = executor
///    .read("SELECT * FROM users WHERE name = ?", vec![json!("Alice")])
///    .limit(10)
///    .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryExecutor {
   db: Arc<Database>,
}

impl QueryExecutor {
   pub fn new(db: Arc<Database>) -> Self {
      Self { db }
   }

   /// The underlying database handle.
   pub fn database(&self) -> &Arc<Database> {
      &self.db
   }

   /// Build a SELECT returning all matching rows, or up to
   /// [`limit`](ReadBuilder::limit) when one is set.
   pub fn read(&self, template: impl Into<String>, values: Vec<JsonValue>) -> ReadBuilder {
      ReadBuilder {
         db: self.db.clone(),
         query: template.into(),
         values,
         limit: None,
      }
   }

   /// Build a SELECT expecting zero or one row.
   pub fn read_one(&self, template: impl Into<String>, values: Vec<JsonValue>) -> ReadOneBuilder {
      ReadOneBuilder {
         db: self.db.clone(),
         query: template.into(),
         values,
      }
   }

   /// Build an INSERT/UPDATE/DELETE returning the affected-row count.
   pub fn write(&self, template: impl Into<String>, values: Vec<JsonValue>) -> WriteBuilder {
      WriteBuilder {
         db: self.db.clone(),
         query: template.into(),
         values,
      }
   }
}

/// Translate `?` placeholders for the database's backend and verify the
/// bind-value count before anything touches the network.
fn prepare(db: &Database, template: &str, values: &[JsonValue]) -> Result<String> {
   let style = PlaceholderStyle::for_backend(db.backend());
   let (sql, placeholders) = placeholder::translate(template, style);
   if placeholders != values.len() {
      return Err(Error::PlaceholderCountMismatch {
         placeholders,
         values: values.len(),
      });
   }
   Ok(sql)
}

/// Builder for read queries returning multiple rows
pub struct ReadBuilder {
   db: Arc<Database>,
   query: String,
   values: Vec<JsonValue>,
   limit: Option<usize>,
}

impl ReadBuilder {
   /// Return at most `limit` rows instead of the full result set.
   pub fn limit(mut self, limit: usize) -> Self {
      self.limit = Some(limit);
      self
   }

   /// Execute the query and return the matching rows.
   pub async fn execute(self) -> Result<Vec<Row>> {
      info!(statement = %self.query, values = ?self.values, "executing read");
      let sql = prepare(&self.db, &self.query, &self.values)?;

      let mut conn = self.db.acquire().await?;
      let rows = match conn.inner() {
         ConnectionInner::MySql(conn) => {
            fetch_mysql(&mut **conn, &sql, self.values, self.limit).await?
         }
         ConnectionInner::Postgres(conn) => {
            fetch_postgres(&mut **conn, &sql, self.values, self.limit).await?
         }
         ConnectionInner::Sqlite(conn) => {
            fetch_sqlite(&mut **conn, &sql, self.values, self.limit).await?
         }
      };

      info!(rows = rows.len(), "rows returned");
      Ok(rows)
   }
}

impl IntoFuture for ReadBuilder {
   type Output = Result<Vec<Row>>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for read queries returning zero or one row
pub struct ReadOneBuilder {
   db: Arc<Database>,
   query: String,
   values: Vec<JsonValue>,
}

impl ReadOneBuilder {
   /// Execute the query and return zero or one row.
   ///
   /// Fetches at most two rows to detect — and reject — queries matching
   /// more than one.
   pub async fn execute(self) -> Result<Option<Row>> {
      let mut rows = ReadBuilder {
         db: self.db,
         query: self.query,
         values: self.values,
         limit: Some(2),
      }
      .execute()
      .await?;

      match rows.len() {
         0 => Ok(None),
         1 => Ok(rows.pop()),
         count => Err(Error::MultipleRowsReturned(count)),
      }
   }
}

impl IntoFuture for ReadOneBuilder {
   type Output = Result<Option<Row>>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for write queries (INSERT/UPDATE/DELETE)
pub struct WriteBuilder {
   db: Arc<Database>,
   query: String,
   values: Vec<JsonValue>,
}

impl WriteBuilder {
   /// Execute the write and return the affected-row count.
   ///
   /// With autocommit disabled on the pool, the statement runs inside an
   /// explicit transaction: committed on success, rolled back on failure
   /// with the original error propagated unchanged.
   pub async fn execute(self) -> Result<WriteResult> {
      info!(statement = %self.query, values = ?self.values, "executing write");
      let sql = prepare(&self.db, &self.query, &self.values)?;
      let in_tx = !self.db.autocommit();

      let mut conn = self.db.acquire().await?;
      match conn.inner() {
         ConnectionInner::MySql(conn) => {
            run_write_mysql(&mut **conn, &sql, self.values, in_tx).await
         }
         ConnectionInner::Postgres(conn) => {
            run_write_postgres(&mut **conn, &sql, self.values, in_tx).await
         }
         ConnectionInner::Sqlite(conn) => {
            run_write_sqlite(&mut **conn, &sql, self.values, in_tx).await
         }
      }
   }
}

impl IntoFuture for WriteBuilder {
   type Output = Result<WriteResult>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

async fn fetch_mysql(
   conn: &mut MySqlConnection,
   sql: &str,
   values: Vec<JsonValue>,
   limit: Option<usize>,
) -> Result<Vec<Row>> {
   let mut q = sqlx::query(sql);
   for value in values {
      q = bind_mysql(q, value);
   }

   let mut rows = Vec::new();
   let mut stream = q.fetch(&mut *conn);
   loop {
      if limit.is_some_and(|n| rows.len() >= n) {
         break;
      }
      match stream.try_next().await? {
         Some(row) => rows.push(decode_mysql_row(&row)?),
         None => break,
      }
   }
   Ok(rows)
}

async fn fetch_postgres(
   conn: &mut PgConnection,
   sql: &str,
   values: Vec<JsonValue>,
   limit: Option<usize>,
) -> Result<Vec<Row>> {
   let mut q = sqlx::query(sql);
   for value in values {
      q = bind_postgres(q, value);
   }

   let mut rows = Vec::new();
   let mut stream = q.fetch(&mut *conn);
   loop {
      if limit.is_some_and(|n| rows.len() >= n) {
         break;
      }
      match stream.try_next().await? {
         Some(row) => rows.push(decode_postgres_row(&row)?),
         None => break,
      }
   }
   Ok(rows)
}

async fn fetch_sqlite(
   conn: &mut SqliteConnection,
   sql: &str,
   values: Vec<JsonValue>,
   limit: Option<usize>,
) -> Result<Vec<Row>> {
   let mut q = sqlx::query(sql);
   for value in values {
      q = bind_sqlite(q, value);
   }

   let mut rows = Vec::new();
   let mut stream = q.fetch(&mut *conn);
   loop {
      if limit.is_some_and(|n| rows.len() >= n) {
         break;
      }
      match stream.try_next().await? {
         Some(row) => rows.push(decode_sqlite_row(&row)?),
         None => break,
      }
   }
   Ok(rows)
}

/// Roll back an open transaction after `cause`, preserving the original
/// error. A rollback that itself fails compounds both errors.
async fn rollback_mysql(conn: &mut MySqlConnection, cause: sqlx::Error) -> Error {
   match sqlx::query("ROLLBACK").execute(&mut *conn).await {
      Ok(_) => {
         debug!("transaction rolled back");
         cause.into()
      }
      Err(rollback_err) => Error::TransactionRollbackFailed {
         transaction_error: cause.to_string(),
         rollback_error: rollback_err.to_string(),
      },
   }
}

async fn rollback_postgres(conn: &mut PgConnection, cause: sqlx::Error) -> Error {
   match sqlx::query("ROLLBACK").execute(&mut *conn).await {
      Ok(_) => {
         debug!("transaction rolled back");
         cause.into()
      }
      Err(rollback_err) => Error::TransactionRollbackFailed {
         transaction_error: cause.to_string(),
         rollback_error: rollback_err.to_string(),
      },
   }
}

async fn rollback_sqlite(conn: &mut SqliteConnection, cause: sqlx::Error) -> Error {
   match sqlx::query("ROLLBACK").execute(&mut *conn).await {
      Ok(_) => {
         debug!("transaction rolled back");
         cause.into()
      }
      Err(rollback_err) => Error::TransactionRollbackFailed {
         transaction_error: cause.to_string(),
         rollback_error: rollback_err.to_string(),
      },
   }
}

async fn run_write_mysql(
   conn: &mut MySqlConnection,
   sql: &str,
   values: Vec<JsonValue>,
   in_tx: bool,
) -> Result<WriteResult> {
   if in_tx {
      sqlx::query("BEGIN").execute(&mut *conn).await?;
      debug!("transaction begun");
   }

   let mut q = sqlx::query(sql);
   for value in values {
      q = bind_mysql(q, value);
   }

   match q.execute(&mut *conn).await {
      Ok(result) => {
         let write = WriteResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id() as i64),
         };
         if in_tx {
            if let Err(commit_err) = sqlx::query("COMMIT").execute(&mut *conn).await {
               return Err(rollback_mysql(conn, commit_err).await);
            }
            debug!("transaction committed");
         }
         Ok(write)
      }
      Err(e) => {
         if in_tx {
            Err(rollback_mysql(conn, e).await)
         } else {
            Err(e.into())
         }
      }
   }
}

async fn run_write_postgres(
   conn: &mut PgConnection,
   sql: &str,
   values: Vec<JsonValue>,
   in_tx: bool,
) -> Result<WriteResult> {
   if in_tx {
      sqlx::query("BEGIN").execute(&mut *conn).await?;
      debug!("transaction begun");
   }

   let mut q = sqlx::query(sql);
   for value in values {
      q = bind_postgres(q, value);
   }

   match q.execute(&mut *conn).await {
      Ok(result) => {
         let write = WriteResult {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
         };
         if in_tx {
            if let Err(commit_err) = sqlx::query("COMMIT").execute(&mut *conn).await {
               return Err(rollback_postgres(conn, commit_err).await);
            }
            debug!("transaction committed");
         }
         Ok(write)
      }
      Err(e) => {
         if in_tx {
            Err(rollback_postgres(conn, e).await)
         } else {
            Err(e.into())
         }
      }
   }
}

async fn run_write_sqlite(
   conn: &mut SqliteConnection,
   sql: &str,
   values: Vec<JsonValue>,
   in_tx: bool,
) -> Result<WriteResult> {
   if in_tx {
      sqlx::query("BEGIN").execute(&mut *conn).await?;
      debug!("transaction begun");
   }

   let mut q = sqlx::query(sql);
   for value in values {
      q = bind_sqlite(q, value);
   }

   match q.execute(&mut *conn).await {
      Ok(result) => {
         let write = WriteResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
         };
         if in_tx {
            if let Err(commit_err) = sqlx::query("COMMIT").execute(&mut *conn).await {
               return Err(rollback_sqlite(conn, commit_err).await);
            }
            debug!("transaction committed");
         }
         Ok(write)
      }
      Err(e) => {
         if in_tx {
            Err(rollback_sqlite(conn, e).await)
         } else {
            Err(e.into())
         }
      }
   }
}
