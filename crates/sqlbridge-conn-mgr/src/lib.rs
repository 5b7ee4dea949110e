//! # sqlbridge-conn-mgr
//!
//! A minimal wrapper around SQLx that puts MySQL, PostgreSQL, and embedded
//! SQLite connection pools behind one explicitly-constructed handle.
//!
//! ## Core Types
//!
//! - **[`Database`]**: pool handle with an explicit connect/close lifecycle
//! - **[`DatabaseConfig`]**: credentials, pool bounds, and connection options
//! - **[`PooledConnection`]**: scoped loan of a connection, returned on drop
//! - **[`Error`]**: error type for configuration and connection failures
//!
//! ## Architecture
//!
//! - **Bounded pool**: between `minsize` (established eagerly) and `maxsize`
//!   (created lazily on demand) live connections
//! - **Task-level blocking**: exhausted pools suspend the calling task, never
//!   the thread; waiters are served in arrival order
//! - **Scoped acquisition**: connections return to the pool when their guard
//!   drops, on success, failure, and cancellation alike
//! - **No globals**: the handle is passed by reference, not process state

mod config;
mod database;
mod error;

// Re-export public types
pub use config::DatabaseConfig;
pub use database::{Backend, ConnectionInner, Database, PooledConnection};
pub use error::{Error, Result};
