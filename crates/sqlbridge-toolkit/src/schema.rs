//! Explicit table schemas with per-field defaults.
//!
//! Maps between result rows and typed records without runtime reflection:
//! an application registers each table's fields once, up front, and the
//! schema fills in declared defaults for values a row does not carry. A
//! default is either a fixed JSON value or a function evaluated at the
//! moment it is needed (generated IDs, timestamps).

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::executor::Row;

/// Default for a field whose value is absent.
#[derive(Debug, Clone)]
pub enum FieldDefault {
   /// A fixed value, cloned on use.
   Fixed(JsonValue),
   /// A function evaluated each time the default is needed.
   Computed(fn() -> JsonValue),
}

impl FieldDefault {
   fn materialize(&self) -> JsonValue {
      match self {
         FieldDefault::Fixed(value) => value.clone(),
         FieldDefault::Computed(f) => f(),
      }
   }
}

/// A registered column of a table.
#[derive(Debug, Clone)]
pub struct FieldDef {
   name: String,
   default: Option<FieldDefault>,
}

impl FieldDef {
   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn default(&self) -> Option<&FieldDefault> {
      self.default.as_ref()
   }
}

/// An explicitly registered mapping from a table to its fields.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sqlbridge_toolkit::{FieldDefault, TableSchema};
///
/// let users = TableSchema::new("users")
///    .field("id")
///    .field("name")
///    .field_with_default("active", FieldDefault::Fixed(json!(true)));
///
/// assert_eq!(users.table(), "users");
/// assert_eq!(users.default_for("active"), Some(json!(true)));
/// assert_eq!(users.default_for("name"), None);
/// ```
#[derive(Debug, Clone)]
pub struct TableSchema {
   table: String,
   fields: Vec<FieldDef>,
}

impl TableSchema {
   pub fn new(table: impl Into<String>) -> Self {
      Self {
         table: table.into(),
         fields: Vec::new(),
      }
   }

   /// Register a field with no default.
   pub fn field(mut self, name: impl Into<String>) -> Self {
      self.fields.push(FieldDef {
         name: name.into(),
         default: None,
      });
      self
   }

   /// Register a field with a default used when a row has no value for it.
   pub fn field_with_default(mut self, name: impl Into<String>, default: FieldDefault) -> Self {
      self.fields.push(FieldDef {
         name: name.into(),
         default: Some(default),
      });
      self
   }

   pub fn table(&self) -> &str {
      &self.table
   }

   pub fn fields(&self) -> &[FieldDef] {
      &self.fields
   }

   pub fn field_names(&self) -> impl Iterator<Item = &str> {
      self.fields.iter().map(|f| f.name.as_str())
   }

   /// The declared default for `name`, evaluated if computed.
   pub fn default_for(&self, name: &str) -> Option<JsonValue> {
      self
         .fields
         .iter()
         .find(|f| f.name == name)
         .and_then(|f| f.default.as_ref())
         .map(FieldDefault::materialize)
   }

   /// A row's value for `name`, falling back to the field's default when
   /// the row has no value (or an explicit null) for it.
   pub fn value_or_default(&self, row: &Row, name: &str) -> Option<JsonValue> {
      match row.get(name) {
         Some(value) if !value.is_null() => Some(value.clone()),
         _ => {
            let value = self.default_for(name)?;
            debug!(table = %self.table, field = name, "using default value");
            Some(value)
         }
      }
   }

   /// Fill every missing or null field that declares a default, in place.
   ///
   /// Used to complete a record before an INSERT so generated values
   /// (IDs, timestamps) are decided by the application, once.
   pub fn apply_defaults(&self, row: &mut Row) {
      for field in &self.fields {
         let missing = row.get(&field.name).is_none_or(JsonValue::is_null);
         if missing && let Some(default) = &field.default {
            debug!(table = %self.table, field = %field.name, "using default value");
            row.insert(field.name.clone(), default.materialize());
         }
      }
   }
}
