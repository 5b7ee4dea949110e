//! Translation of generic `?` placeholders to backend-native syntax.
//!
//! Callers always write `?` for bind parameters. Before dispatch, the
//! statement is rewritten to whatever the backing store expects: `$1`,
//! `$2`, … for PostgreSQL, and `?` passthrough for MySQL and SQLite. The
//! scanner is quote- and comment-aware so a `?` inside a string literal,
//! a quoted identifier, or a comment is never treated as a parameter.

use sqlbridge_conn_mgr::Backend;

/// Native placeholder syntax of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaceholderStyle {
   /// Positional `?` markers (MySQL, SQLite)
   Question,
   /// Numbered `$1`, `$2`, … markers (PostgreSQL)
   Numbered,
}

impl PlaceholderStyle {
   pub(crate) fn for_backend(backend: Backend) -> Self {
      match backend {
         Backend::MySql | Backend::Sqlite => PlaceholderStyle::Question,
         Backend::Postgres => PlaceholderStyle::Numbered,
      }
   }
}

/// Advance the scanner index past a quoted literal or identifier.
///
/// `quote` is the opening quote character (`'`, `"`, or a backtick). The
/// scanner handles SQL-standard doubled-quote escaping. Returns the index
/// of the closing quote, or `len` when the literal is unterminated.
fn skip_quoted(bytes: &[u8], len: usize, i: usize, quote: u8) -> usize {
   let mut j = i + 1;
   while j < len {
      if bytes[j] == quote {
         // Doubled quote is an escape — skip both and continue
         if j + 1 < len && bytes[j + 1] == quote {
            j += 2;
            continue;
         }
         return j;
      }
      j += 1;
   }
   j // unterminated — return end
}

/// Advance the scanner index past a `--` line comment (until newline or end).
fn skip_line_comment(bytes: &[u8], len: usize, i: usize) -> usize {
   let mut j = i + 2; // skip the `--`
   while j < len && bytes[j] != b'\n' {
      j += 1;
   }
   j
}

/// Advance the scanner index past a `/* … */` block comment. Returns the
/// index just past the closing `/`, or `len` when unterminated.
fn skip_block_comment(bytes: &[u8], len: usize, i: usize) -> usize {
   let mut j = i + 2; // skip the `/*`
   while j + 1 < len {
      if bytes[j] == b'*' && bytes[j + 1] == b'/' {
         return j + 2;
      }
      j += 1;
   }
   len // unterminated — return end
}

/// True when the byte at `i` starts a region the scanner must skip or
/// rewrite rather than copy blindly.
fn is_special(bytes: &[u8], len: usize, i: usize) -> bool {
   match bytes[i] {
      b'\'' | b'"' | b'`' | b'?' => true,
      b'-' => i + 1 < len && bytes[i + 1] == b'-',
      b'/' => i + 1 < len && bytes[i + 1] == b'*',
      _ => false,
   }
}

/// Rewrite `?` placeholders to `style` and count them.
///
/// Everything outside placeholders — including `?` occurrences inside
/// quoted sections and comments — is copied through verbatim.
pub(crate) fn translate(sql: &str, style: PlaceholderStyle) -> (String, usize) {
   let bytes = sql.as_bytes();
   let len = bytes.len();
   let mut out = String::with_capacity(len + 8);
   let mut count = 0usize;
   let mut i = 0;

   while i < len {
      match bytes[i] {
         // Quoted literal or identifier — copy whole, including quotes
         b'\'' | b'"' | b'`' => {
            let end = skip_quoted(bytes, len, i, bytes[i]);
            let stop = if end < len { end + 1 } else { len };
            out.push_str(&sql[i..stop]);
            i = stop;
         }
         // Line comment: --
         b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
            let end = skip_line_comment(bytes, len, i);
            out.push_str(&sql[i..end]);
            i = end;
         }
         // Block comment: /* ... */
         b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
            let end = skip_block_comment(bytes, len, i);
            out.push_str(&sql[i..end]);
            i = end;
         }
         b'?' => {
            count += 1;
            match style {
               PlaceholderStyle::Question => out.push('?'),
               PlaceholderStyle::Numbered => {
                  out.push('$');
                  out.push_str(&count.to_string());
               }
            }
            i += 1;
         }
         _ => {
            // Plain run — copy verbatim up to the next byte of interest.
            // Special bytes are all ASCII, so the slice bounds always land
            // on char boundaries.
            let mut j = i + 1;
            while j < len && !is_special(bytes, len, j) {
               j += 1;
            }
            out.push_str(&sql[i..j]);
            i = j;
         }
      }
   }

   (out, count)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_question_style_passes_through() {
      let (sql, count) = translate(
         "SELECT * FROM users WHERE id = ? AND name = ?",
         PlaceholderStyle::Question,
      );
      assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
      assert_eq!(count, 2);
   }

   #[test]
   fn test_numbered_style_rewrites_in_order() {
      let (sql, count) = translate(
         "INSERT INTO users (id, name, email) VALUES (?, ?, ?)",
         PlaceholderStyle::Numbered,
      );
      assert_eq!(sql, "INSERT INTO users (id, name, email) VALUES ($1, $2, $3)");
      assert_eq!(count, 3);
   }

   #[test]
   fn test_no_placeholders() {
      let (sql, count) = translate("SELECT 1", PlaceholderStyle::Numbered);
      assert_eq!(sql, "SELECT 1");
      assert_eq!(count, 0);
   }

   #[test]
   fn test_question_mark_in_string_literal_untouched() {
      let (sql, count) = translate(
         "SELECT * FROM faq WHERE question = 'why?' AND id = ?",
         PlaceholderStyle::Numbered,
      );
      assert_eq!(sql, "SELECT * FROM faq WHERE question = 'why?' AND id = $1");
      assert_eq!(count, 1);
   }

   #[test]
   fn test_doubled_quote_escape() {
      let (sql, count) = translate(
         "SELECT 'it''s a ?' , ? FROM t",
         PlaceholderStyle::Numbered,
      );
      assert_eq!(sql, "SELECT 'it''s a ?' , $1 FROM t");
      assert_eq!(count, 1);
   }

   #[test]
   fn test_quoted_identifiers_untouched() {
      let (sql, count) = translate(
         r#"SELECT "weird?col", `odd?col` FROM t WHERE a = ?"#,
         PlaceholderStyle::Numbered,
      );
      assert_eq!(sql, r#"SELECT "weird?col", `odd?col` FROM t WHERE a = $1"#);
      assert_eq!(count, 1);
   }

   #[test]
   fn test_comments_untouched() {
      let (sql, count) = translate(
         "SELECT ? -- really?\n/* sure? */ FROM t",
         PlaceholderStyle::Numbered,
      );
      assert_eq!(sql, "SELECT $1 -- really?\n/* sure? */ FROM t");
      assert_eq!(count, 1);
   }

   #[test]
   fn test_unterminated_literal_copied_through() {
      let (sql, count) = translate("SELECT '? unclosed", PlaceholderStyle::Numbered);
      assert_eq!(sql, "SELECT '? unclosed");
      assert_eq!(count, 0);
   }

   #[test]
   fn test_multibyte_text_preserved() {
      let (sql, count) = translate(
         "SELECT * FROM 博客 WHERE 标题 = ?",
         PlaceholderStyle::Numbered,
      );
      assert_eq!(sql, "SELECT * FROM 博客 WHERE 标题 = $1");
      assert_eq!(count, 1);
   }

   #[test]
   fn test_style_for_backend() {
      assert_eq!(
         PlaceholderStyle::for_backend(Backend::MySql),
         PlaceholderStyle::Question
      );
      assert_eq!(
         PlaceholderStyle::for_backend(Backend::Sqlite),
         PlaceholderStyle::Question
      );
      assert_eq!(
         PlaceholderStyle::for_backend(Backend::Postgres),
         PlaceholderStyle::Numbered
      );
   }
}
