//! Configuration for database connection pools

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for a [`Database`](crate::Database) connection pool.
///
/// Credentials (`user`, `password`, `database`) are required for the server
/// backends and validated before any connection attempt. Everything else has
/// a sensible default.
///
/// # Examples
///
/// ```
/// use sqlbridge_conn_mgr::DatabaseConfig;
///
/// let config = DatabaseConfig::new("app", "secret", "blog")
///    .with_host("db.internal")
///    .with_maxsize(20);
///
/// assert_eq!(config.host, "db.internal");
/// assert_eq!(config.minsize, 1);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
   /// Hostname of the database server.
   ///
   /// Default: `localhost`
   pub host: String,

   /// Port of the database server.
   ///
   /// When unset, the backend's documented default is used (3306 for
   /// MySQL, 5432 for PostgreSQL).
   pub port: Option<u16>,

   /// User to authenticate as. Required for server backends.
   pub user: String,

   /// Password to authenticate with. Required for server backends.
   pub password: String,

   /// Name of the database to use. Required for server backends.
   pub database: String,

   /// Connection character set. Only meaningful for MySQL.
   ///
   /// Default: `utf8mb4`
   pub charset: String,

   /// Whether each statement is implicitly committed. When disabled, the
   /// query layer frames every write in an explicit transaction.
   ///
   /// Default: `true`
   pub autocommit: bool,

   /// Maximum number of live connections in the pool.
   ///
   /// Acquisitions beyond this bound queue until a connection frees up.
   ///
   /// Default: 10
   pub maxsize: u32,

   /// Minimum number of live connections the pool keeps open.
   ///
   /// This many connections are established eagerly at startup.
   ///
   /// Default: 1
   pub minsize: u32,
}

// Manual impl: the password must never reach logs or debug output
impl std::fmt::Debug for DatabaseConfig {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("DatabaseConfig")
         .field("host", &self.host)
         .field("port", &self.port)
         .field("user", &self.user)
         .field("password", &"***")
         .field("database", &self.database)
         .field("charset", &self.charset)
         .field("autocommit", &self.autocommit)
         .field("maxsize", &self.maxsize)
         .field("minsize", &self.minsize)
         .finish()
   }
}

impl Default for DatabaseConfig {
   fn default() -> Self {
      Self {
         host: "localhost".to_string(),
         port: None,
         user: String::new(),
         password: String::new(),
         database: String::new(),
         charset: "utf8mb4".to_string(),
         autocommit: true,
         maxsize: 10,
         minsize: 1,
      }
   }
}

impl DatabaseConfig {
   /// Create a configuration with the required credentials and defaults for
   /// everything else.
   pub fn new(
      user: impl Into<String>,
      password: impl Into<String>,
      database: impl Into<String>,
   ) -> Self {
      Self {
         user: user.into(),
         password: password.into(),
         database: database.into(),
         ..Default::default()
      }
   }

   pub fn with_host(mut self, host: impl Into<String>) -> Self {
      self.host = host.into();
      self
   }

   pub fn with_port(mut self, port: u16) -> Self {
      self.port = Some(port);
      self
   }

   pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
      self.charset = charset.into();
      self
   }

   pub fn with_autocommit(mut self, autocommit: bool) -> Self {
      self.autocommit = autocommit;
      self
   }

   pub fn with_maxsize(mut self, maxsize: u32) -> Self {
      self.maxsize = maxsize;
      self
   }

   pub fn with_minsize(mut self, minsize: u32) -> Self {
      self.minsize = minsize;
      self
   }

   /// Validate pool bounds. Applies to every backend.
   pub(crate) fn validate_pool_bounds(&self) -> Result<()> {
      if self.maxsize == 0 {
         return Err(Error::Config("maxsize must be greater than zero".into()));
      }
      if self.minsize > self.maxsize {
         return Err(Error::Config(format!(
            "minsize ({}) must not exceed maxsize ({})",
            self.minsize, self.maxsize
         )));
      }
      Ok(())
   }

   /// Validate that all fields required by the server backends are present.
   pub(crate) fn validate_server(&self) -> Result<()> {
      self.validate_pool_bounds()?;
      for (field, value) in [
         ("user", &self.user),
         ("password", &self.password),
         ("database", &self.database),
      ] {
         if value.is_empty() {
            return Err(Error::Config(format!("missing required field: {field}")));
         }
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_defaults() {
      let config = DatabaseConfig::default();
      assert_eq!(config.host, "localhost");
      assert_eq!(config.port, None);
      assert_eq!(config.charset, "utf8mb4");
      assert!(config.autocommit);
      assert_eq!(config.maxsize, 10);
      assert_eq!(config.minsize, 1);
   }

   #[test]
   fn test_missing_required_fields() {
      for config in [
         DatabaseConfig::new("", "secret", "blog"),
         DatabaseConfig::new("app", "", "blog"),
         DatabaseConfig::new("app", "secret", ""),
      ] {
         let err = config.validate_server().unwrap_err();
         assert!(matches!(err, Error::Config(_)));
         assert!(err.to_string().contains("missing required field"));
      }
   }

   #[test]
   fn test_valid_server_config() {
      let config = DatabaseConfig::new("app", "secret", "blog");
      assert!(config.validate_server().is_ok());
   }

   #[test]
   fn test_invalid_pool_bounds() {
      let config = DatabaseConfig::new("app", "secret", "blog").with_maxsize(0);
      assert!(config.validate_pool_bounds().is_err());

      let config = DatabaseConfig::new("app", "secret", "blog")
         .with_minsize(5)
         .with_maxsize(2);
      let err = config.validate_pool_bounds().unwrap_err();
      assert!(err.to_string().contains("minsize"));
   }

   #[test]
   fn test_debug_masks_password() {
      let config = DatabaseConfig::new("app", "hunter2", "blog");
      let rendered = format!("{config:?}");
      assert!(!rendered.contains("hunter2"));
      assert!(rendered.contains("***"));
   }

   #[test]
   fn test_deserialize_with_defaults() {
      let config: DatabaseConfig = serde_json::from_str(
         r#"{"user": "app", "password": "secret", "database": "blog", "maxsize": 4}"#,
      )
      .unwrap();
      assert_eq!(config.user, "app");
      assert_eq!(config.maxsize, 4);
      assert_eq!(config.host, "localhost");
      assert!(config.autocommit);
   }
}
