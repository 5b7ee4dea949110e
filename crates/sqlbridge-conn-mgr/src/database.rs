//! Database handle with connection pooling over the SQLx backends

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySql, Pool, Postgres, Sqlite};
use tracing::{info, trace};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

const MYSQL_DEFAULT_PORT: u16 = 3306;
const POSTGRES_DEFAULT_PORT: u16 = 5432;

/// The backend a [`Database`] is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
   MySql,
   Postgres,
   Sqlite,
}

impl std::fmt::Display for Backend {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      match self {
         Backend::MySql => write!(f, "mysql"),
         Backend::Postgres => write!(f, "postgres"),
         Backend::Sqlite => write!(f, "sqlite"),
      }
   }
}

/// Inner pool variants, one per supported backend.
#[derive(Debug, Clone)]
enum PoolInner {
   MySql(Pool<MySql>),
   Postgres(Pool<Postgres>),
   Sqlite(Pool<Sqlite>),
}

/// A database with a bounded pool of reusable connections.
///
/// The handle is constructed once at startup via one of the `connect_*`
/// methods, passed by reference (or `Arc`) to everything that runs queries,
/// and torn down with [`close`](Database::close) at shutdown. The pool keeps
/// between `minsize` and `maxsize` live connections: the floor is
/// established eagerly at connect time, the rest are created lazily on
/// demand.
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect once (validates config, establishes the minsize floor)
/// 2. acquire() per query — suspends the calling task when exhausted
/// 3. Drop the PooledConnection to return it — on every exit path
/// 4. close() at shutdown
/// ```
#[derive(Debug)]
pub struct Database {
   pool: PoolInner,

   /// Validated configuration the pool was built from
   config: DatabaseConfig,

   /// Credential-free description of the connection target, for logs
   target: String,

   /// Marks the database as closed to prevent further acquisitions
   closed: AtomicBool,
}

impl Database {
   /// Connect to a MySQL server.
   ///
   /// Fails with [`Error::Config`] when a required credential is missing
   /// and with [`Error::Connection`] when the server is unreachable or
   /// rejects the credentials.
   pub async fn connect_mysql(config: DatabaseConfig) -> Result<Self> {
      config.validate_server()?;

      let port = config.port.unwrap_or(MYSQL_DEFAULT_PORT);
      let options = MySqlConnectOptions::new()
         .host(&config.host)
         .port(port)
         .username(&config.user)
         .password(&config.password)
         .database(&config.database)
         .charset(&config.charset);

      let pool = MySqlPoolOptions::new()
         .min_connections(config.minsize)
         .max_connections(config.maxsize)
         .connect_with(options)
         .await?;

      let target = format!(
         "mysql://{}@{}:{}/{}",
         config.user, config.host, port, config.database
      );
      Ok(Self::from_pool(PoolInner::MySql(pool), config, target))
   }

   /// Connect to a PostgreSQL server.
   ///
   /// The `charset` field is ignored by this backend.
   pub async fn connect_postgres(config: DatabaseConfig) -> Result<Self> {
      config.validate_server()?;

      let port = config.port.unwrap_or(POSTGRES_DEFAULT_PORT);
      let options = PgConnectOptions::new()
         .host(&config.host)
         .port(port)
         .username(&config.user)
         .password(&config.password)
         .database(&config.database);

      let pool = PgPoolOptions::new()
         .min_connections(config.minsize)
         .max_connections(config.maxsize)
         .connect_with(options)
         .await?;

      let target = format!(
         "postgres://{}@{}:{}/{}",
         config.user, config.host, port, config.database
      );
      Ok(Self::from_pool(PoolInner::Postgres(pool), config, target))
   }

   /// Open an embedded SQLite database.
   ///
   /// Only the pool bounds and `autocommit` fields of the config apply;
   /// there is no server to authenticate against. The file is created if it
   /// does not exist.
   ///
   /// Note: the special path `:memory:` gives every pooled connection its
   /// own private database — use a (temp) file when more than one
   /// connection must see the same data.
   pub async fn connect_sqlite(path: impl AsRef<Path>, config: DatabaseConfig) -> Result<Self> {
      config.validate_pool_bounds()?;

      let options = SqliteConnectOptions::new()
         .filename(path.as_ref())
         .create_if_missing(true);

      let pool = SqlitePoolOptions::new()
         .min_connections(config.minsize)
         .max_connections(config.maxsize)
         .connect_with(options)
         .await?;

      let target = format!("sqlite://{}", path.as_ref().display());
      Ok(Self::from_pool(PoolInner::Sqlite(pool), config, target))
   }

   fn from_pool(pool: PoolInner, config: DatabaseConfig, target: String) -> Self {
      info!(
         db = %target,
         minsize = config.minsize,
         maxsize = config.maxsize,
         "database connection pool created"
      );
      Self {
         pool,
         config,
         target,
         closed: AtomicBool::new(false),
      }
   }

   /// Acquire a connection from the pool.
   ///
   /// Suspends the calling task — never the thread — until a connection is
   /// available when all `maxsize` connections are on loan. Waiters are
   /// served in arrival order. The connection is returned to the pool when
   /// the [`PooledConnection`] is dropped, on every exit path including
   /// cancellation.
   pub async fn acquire(&self) -> Result<PooledConnection> {
      if self.closed.load(Ordering::Acquire) {
         return Err(Error::DatabaseClosed);
      }

      let inner = match &self.pool {
         PoolInner::MySql(pool) => ConnectionInner::MySql(pool.acquire().await?),
         PoolInner::Postgres(pool) => ConnectionInner::Postgres(pool.acquire().await?),
         PoolInner::Sqlite(pool) => ConnectionInner::Sqlite(pool.acquire().await?),
      };

      let id = Uuid::new_v4();
      trace!(connection = %id, "connection acquired");
      Ok(PooledConnection { inner, id })
   }

   /// The backend this database is connected to.
   pub fn backend(&self) -> Backend {
      match &self.pool {
         PoolInner::MySql(_) => Backend::MySql,
         PoolInner::Postgres(_) => Backend::Postgres,
         PoolInner::Sqlite(_) => Backend::Sqlite,
      }
   }

   /// Whether statements are implicitly committed (see
   /// [`DatabaseConfig::autocommit`]).
   pub fn autocommit(&self) -> bool {
      self.config.autocommit
   }

   /// The configuration this pool was built from.
   pub fn config(&self) -> &DatabaseConfig {
      &self.config
   }

   /// Credential-free description of the connection target, safe to log.
   pub fn target(&self) -> &str {
      &self.target
   }

   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Close the pool.
   ///
   /// Waits for connections on loan to be returned, then closes them.
   /// Subsequent [`acquire`](Database::acquire) calls fail with
   /// [`Error::DatabaseClosed`].
   pub async fn close(&self) {
      self.closed.store(true, Ordering::Release);
      match &self.pool {
         PoolInner::MySql(pool) => pool.close().await,
         PoolInner::Postgres(pool) => pool.close().await,
         PoolInner::Sqlite(pool) => pool.close().await,
      }
      info!(db = %self.target, "database connection pool closed");
   }
}

/// A connection on loan from the pool.
///
/// Exactly one in-flight caller owns the connection at a time; dropping the
/// guard returns it for reuse. Statements issued through one guard execute
/// in the order they are issued.
#[derive(Debug)]
pub struct PooledConnection {
   inner: ConnectionInner,
   id: Uuid,
}

/// Backend-specific connection variants.
#[derive(Debug)]
pub enum ConnectionInner {
   MySql(sqlx::pool::PoolConnection<MySql>),
   Postgres(sqlx::pool::PoolConnection<Postgres>),
   Sqlite(sqlx::pool::PoolConnection<Sqlite>),
}

impl PooledConnection {
   /// Unique identifier for this acquisition, used for log correlation.
   pub fn id(&self) -> Uuid {
      self.id
   }

   /// Access the backend-specific connection.
   pub fn inner(&mut self) -> &mut ConnectionInner {
      &mut self.inner
   }
}

impl Drop for PooledConnection {
   fn drop(&mut self) {
      trace!(connection = %self.id, "connection returned");
   }
}
