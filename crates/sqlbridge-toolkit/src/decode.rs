//! Decoding of driver rows into ordered JSON maps.
//!
//! Each backend decodes by the declared column type: integers stay JSON
//! numbers with full i64 precision, binary data becomes base64 text, and
//! temporal types render as strings. A column type with no JSON mapping
//! fails with [`Error::UnsupportedDatatype`] naming the type, rather than
//! silently dropping the column.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::error::{Error, Result};

/// A decoded result row: column name → JSON value, in column order.
pub type JsonRow = IndexMap<String, JsonValue>;

fn json_f64(v: f64) -> JsonValue {
   serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}

pub(crate) fn decode_sqlite_row(row: &SqliteRow) -> Result<JsonRow> {
   let mut out = IndexMap::default();
   for (i, column) in row.columns().iter().enumerate() {
      let raw = row.try_get_raw(i)?;
      let value = if raw.is_null() {
         JsonValue::Null
      } else {
         match raw.type_info().name() {
            "NULL" => JsonValue::Null,
            "INTEGER" => JsonValue::from(row.try_get::<i64, _>(i)?),
            "REAL" | "NUMERIC" => json_f64(row.try_get::<f64, _>(i)?),
            "TEXT" | "DATETIME" | "DATE" | "TIME" => JsonValue::from(row.try_get::<String, _>(i)?),
            "BOOLEAN" => JsonValue::from(row.try_get::<bool, _>(i)?),
            "BLOB" => JsonValue::from(BASE64.encode(row.try_get::<Vec<u8>, _>(i)?)),
            other => return Err(Error::UnsupportedDatatype(other.to_string())),
         }
      };
      out.insert(column.name().to_string(), value);
   }
   Ok(out)
}

pub(crate) fn decode_mysql_row(row: &MySqlRow) -> Result<JsonRow> {
   let mut out = IndexMap::default();
   for (i, column) in row.columns().iter().enumerate() {
      let raw = row.try_get_raw(i)?;
      let value = if raw.is_null() {
         JsonValue::Null
      } else {
         match raw.type_info().name() {
            "NULL" => JsonValue::Null,
            "BOOLEAN" => JsonValue::from(row.try_get::<bool, _>(i)?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
               JsonValue::from(row.try_get::<i64, _>(i)?)
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => JsonValue::from(row.try_get::<u64, _>(i)?),
            "YEAR" => JsonValue::from(row.try_get::<u16, _>(i)?),
            "FLOAT" => json_f64(f64::from(row.try_get::<f32, _>(i)?)),
            "DOUBLE" => json_f64(row.try_get::<f64, _>(i)?),
            "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => {
               JsonValue::from(row.try_get::<String, _>(i)?)
            }
            "DATE" => JsonValue::from(row.try_get::<time::Date, _>(i)?.to_string()),
            "TIME" => JsonValue::from(row.try_get::<time::Time, _>(i)?.to_string()),
            "DATETIME" => JsonValue::from(row.try_get::<time::PrimitiveDateTime, _>(i)?.to_string()),
            "TIMESTAMP" => JsonValue::from(row.try_get::<time::OffsetDateTime, _>(i)?.to_string()),
            "JSON" => row.try_get::<JsonValue, _>(i)?,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
               JsonValue::from(BASE64.encode(row.try_get::<Vec<u8>, _>(i)?))
            }
            other => return Err(Error::UnsupportedDatatype(other.to_string())),
         }
      };
      out.insert(column.name().to_string(), value);
   }
   Ok(out)
}

pub(crate) fn decode_postgres_row(row: &PgRow) -> Result<JsonRow> {
   let mut out = IndexMap::default();
   for (i, column) in row.columns().iter().enumerate() {
      let raw = row.try_get_raw(i)?;
      let value = if raw.is_null() {
         JsonValue::Null
      } else {
         match raw.type_info().name() {
            "BOOL" => JsonValue::from(row.try_get::<bool, _>(i)?),
            "INT2" => JsonValue::from(row.try_get::<i16, _>(i)?),
            "INT4" => JsonValue::from(row.try_get::<i32, _>(i)?),
            "INT8" => JsonValue::from(row.try_get::<i64, _>(i)?),
            "FLOAT4" => json_f64(f64::from(row.try_get::<f32, _>(i)?)),
            "FLOAT8" => json_f64(row.try_get::<f64, _>(i)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
               JsonValue::from(row.try_get::<String, _>(i)?)
            }
            "BYTEA" => JsonValue::from(BASE64.encode(row.try_get::<Vec<u8>, _>(i)?)),
            "JSON" | "JSONB" => row.try_get::<JsonValue, _>(i)?,
            "UUID" => JsonValue::from(row.try_get::<uuid::Uuid, _>(i)?.to_string()),
            "DATE" => JsonValue::from(row.try_get::<time::Date, _>(i)?.to_string()),
            "TIME" => JsonValue::from(row.try_get::<time::Time, _>(i)?.to_string()),
            "TIMESTAMP" => JsonValue::from(row.try_get::<time::PrimitiveDateTime, _>(i)?.to_string()),
            "TIMESTAMPTZ" => JsonValue::from(row.try_get::<time::OffsetDateTime, _>(i)?.to_string()),
            other => return Err(Error::UnsupportedDatatype(other.to_string())),
         }
      };
      out.insert(column.name().to_string(), value);
   }
   Ok(out)
}
