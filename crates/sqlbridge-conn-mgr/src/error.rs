//! Error types for sqlbridge-conn-mgr

use thiserror::Error;

/// Errors that may occur when working with sqlbridge-conn-mgr
#[derive(Error, Debug)]
pub enum Error {
   /// Configuration is missing a required field or contains an invalid
   /// value. Raised before any network activity takes place.
   #[error("invalid configuration: {0}")]
   Config(String),

   /// The pool could not establish or obtain a connection. Standard sqlx
   /// errors are converted to this variant.
   #[error("connection error: {0}")]
   Connection(#[from] sqlx::Error),

   /// Database has been closed and cannot be used
   #[error("database has been closed")]
   DatabaseClosed,
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
