//! Binding of JSON values to backend-specific queries.
//!
//! Integer precision is preserved by binding as i64 whenever the value
//! fits; only then does a number degrade to f64. Strings and null bind as
//! their SQL equivalents, and anything else (arrays, objects) binds as a
//! JSON value for backends with a JSON type.

use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::{MySql, Postgres, Sqlite};

/// How a JSON number should reach the driver.
enum NumberBind {
   Int(i64),
   Float(f64),
}

fn classify_number(number: &serde_json::Number) -> NumberBind {
   if let Some(int_val) = number.as_i64() {
      return NumberBind::Int(int_val);
   }
   if let Some(uint_val) = number.as_u64() {
      // Try to fit u64 into i64; values beyond that lose precision as f64
      if uint_val <= i64::MAX as u64 {
         return NumberBind::Int(uint_val as i64);
      }
      return NumberBind::Float(uint_val as f64);
   }
   NumberBind::Float(number.as_f64().unwrap_or_default())
}

pub(crate) fn bind_mysql<'a>(
   query: Query<'a, MySql, sqlx::mysql::MySqlArguments>,
   value: JsonValue,
) -> Query<'a, MySql, sqlx::mysql::MySqlArguments> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => match classify_number(&number) {
         NumberBind::Int(v) => query.bind(v),
         NumberBind::Float(v) => query.bind(v),
      },
      other => query.bind(other),
   }
}

pub(crate) fn bind_postgres<'a>(
   query: Query<'a, Postgres, sqlx::postgres::PgArguments>,
   value: JsonValue,
) -> Query<'a, Postgres, sqlx::postgres::PgArguments> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => match classify_number(&number) {
         NumberBind::Int(v) => query.bind(v),
         NumberBind::Float(v) => query.bind(v),
      },
      other => query.bind(other),
   }
}

pub(crate) fn bind_sqlite<'a>(
   query: Query<'a, Sqlite, sqlx::sqlite::SqliteArguments<'a>>,
   value: JsonValue,
) -> Query<'a, Sqlite, sqlx::sqlite::SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => match classify_number(&number) {
         NumberBind::Int(v) => query.bind(v),
         NumberBind::Float(v) => query.bind(v),
      },
      other => query.bind(other),
   }
}
