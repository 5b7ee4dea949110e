//! # sqlbridge-toolkit
//!
//! High-level read/write query API over [`sqlbridge_conn_mgr`] with
//! portable `?` placeholders, JSON row decoding, and transactional writes.
//!
//! ## Core Types
//!
//! - **[`QueryExecutor`]**: read/write entry point over a pooled [`Database`]
//! - **[`ReadBuilder`] / [`ReadOneBuilder`] / [`WriteBuilder`]**: awaitable
//!   per-statement builders
//! - **[`TableSchema`]**: explicit field registration with per-field defaults
//! - **[`Error`]**: query-layer errors, driver errors passed through intact
//!
//! ## Architecture
//!
//! - **One connection per statement**: acquired from the pool at execution,
//!   returned by scope on every exit path
//! - **Placeholder translation**: callers write `?`; the toolkit rewrites to
//!   the backend's native syntax (`$N` on PostgreSQL) outside quotes and
//!   comments, and rejects bind-count mismatches before dispatch
//! - **Write transactions**: with autocommit disabled, writes commit on
//!   success and roll back exactly once on failure — the connection never
//!   returns to the pool with a transaction open
//! - **Statement logging**: every statement is logged at info level with its
//!   pre-translation text; reads also log the returned row count

mod bind;
mod decode;
mod error;
mod executor;
mod placeholder;
mod schema;

// Re-export public types
pub use error::{Error, Result};
pub use executor::{
   QueryExecutor, ReadBuilder, ReadOneBuilder, Row, WriteBuilder, WriteResult,
};
pub use schema::{FieldDef, FieldDefault, TableSchema};

// Re-export the connection manager's surface so callers need one import
pub use sqlbridge_conn_mgr::{Backend, Database, DatabaseConfig};
