/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for query execution.
///
/// Driver and pool errors pass through unchanged — nothing at this layer
/// swallows or rewraps the original failure. Retry policy belongs to the
/// caller; [`error_code`](Error::error_code) gives it something machine-
/// readable to classify on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Statement execution failed (malformed SQL, constraint violation,
   /// type mismatch). The original SQLx error is preserved intact.
   #[error(transparent)]
   Query(#[from] sqlx::Error),

   /// Error from the connection manager (configuration or pool failure).
   #[error(transparent)]
   ConnectionManager(#[from] sqlbridge_conn_mgr::Error),

   /// The statement's `?` placeholder count disagrees with the number of
   /// bind values supplied. Caught before any network round-trip.
   #[error("statement has {placeholders} placeholders but {values} bind values were supplied")]
   PlaceholderCountMismatch { placeholders: usize, values: usize },

   /// Multiple rows returned from a read_one() query.
   #[error("read_one() query returned {0} rows, expected 0 or 1")]
   MultipleRowsReturned(usize),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },

   /// Column type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// Driver errors carry the backend's own code (e.g. `SQL_1062` for a
   /// MySQL duplicate key) when one is available.
   pub fn error_code(&self) -> String {
      match self {
         Error::Query(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQL_{}", code);
            }
            "QUERY_ERROR".to_string()
         }
         Error::ConnectionManager(sqlbridge_conn_mgr::Error::Config(_)) => {
            "CONFIG_ERROR".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::PlaceholderCountMismatch { .. } => "PLACEHOLDER_COUNT_MISMATCH".to_string(),
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_placeholder_count_mismatch() {
      let err = Error::PlaceholderCountMismatch {
         placeholders: 2,
         values: 3,
      };
      assert_eq!(err.error_code(), "PLACEHOLDER_COUNT_MISMATCH");
      assert!(err.to_string().contains("2 placeholders"));
      assert!(err.to_string().contains("3 bind values"));
   }

   #[test]
   fn test_error_code_multiple_rows_returned() {
      let err = Error::MultipleRowsReturned(2);
      assert_eq!(err.error_code(), "MULTIPLE_ROWS_RETURNED");
      assert!(err.to_string().contains("2 rows"));
   }

   #[test]
   fn test_error_code_transaction_rollback_failed() {
      let err = Error::TransactionRollbackFailed {
         transaction_error: "constraint".into(),
         rollback_error: "gone away".into(),
      };
      assert_eq!(err.error_code(), "TRANSACTION_ROLLBACK_FAILED");
      assert!(err.to_string().contains("constraint"));
      assert!(err.to_string().contains("gone away"));
   }

   #[test]
   fn test_error_code_unsupported_datatype() {
      let err = Error::UnsupportedDatatype("GEOMETRY".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DATATYPE");
      assert!(err.to_string().contains("GEOMETRY"));
   }

   #[test]
   fn test_error_code_config_vs_connection() {
      let err = Error::ConnectionManager(sqlbridge_conn_mgr::Error::Config("missing".into()));
      assert_eq!(err.error_code(), "CONFIG_ERROR");

      let err = Error::ConnectionManager(sqlbridge_conn_mgr::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "CONNECTION_ERROR");
   }

   #[test]
   fn test_error_code_query_non_database() {
      // RowNotFound is not a database error, so no backend code
      let err = Error::Query(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "QUERY_ERROR");
   }
}
