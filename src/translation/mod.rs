use std::borrow::Cow;
use std::fmt::Write;

mod parsers;
mod scanner;

use parsers::{is_block_comment_end, is_block_comment_start, is_doubled, is_line_comment_start};
use scanner::State;

use crate::error::SqlBridgeError;

/// Statement text rewritten for SQL Server, plus how many placeholders it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<'a> {
    pub sql: Cow<'a, str>,
    pub placeholders: usize,
}

impl Translated<'_> {
    /// Positional binding is strict: every placeholder needs exactly one value.
    ///
    /// # Errors
    /// Returns `SqlBridgeError::StatementFailure` when `supplied` differs from the placeholder count.
    pub fn check_arity(&self, supplied: usize) -> Result<(), SqlBridgeError> {
        if self.placeholders == supplied {
            Ok(())
        } else {
            Err(SqlBridgeError::StatementFailure(format!(
                "statement has {} parameter placeholder(s) but {} value(s) were supplied",
                self.placeholders, supplied
            )))
        }
    }
}

/// Rewrite positional `?` placeholders into SQL Server's numbered `@P1`, `@P2`, ... form,
/// left to right.
///
/// Question marks inside string literals, quoted or bracketed identifiers, and comments are
/// left alone:
/// ```rust
/// use mssql_bridge::translation::translate_placeholders;
///
/// let t = translate_placeholders("UPDATE orders SET status=? WHERE id=? AND note <> '?'");
/// assert_eq!(t.sql, "UPDATE orders SET status=@P1 WHERE id=@P2 AND note <> '?'");
/// assert_eq!(t.placeholders, 2);
/// ```
/// Returns a borrowed `Cow` when the statement has no placeholders.
#[must_use]
pub fn translate_placeholders(sql: &str) -> Translated<'_> {
    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut placeholders = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'?' => {
                    placeholders += 1;
                    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                    buf.push_str(&sql[copied..idx]);
                    let _ = write!(buf, "@P{placeholders}");
                    copied = idx + 1;
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted | State::Bracketed => {
                let delimiter = match state {
                    State::SingleQuoted => b'\'',
                    State::DoubleQuoted => b'"',
                    _ => b']',
                };
                if b == delimiter {
                    if is_doubled(bytes, idx, delimiter) {
                        idx += 1; // skip escaped delimiter
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    let sql = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };
    Translated { sql, placeholders }
}

/// Stored-procedure invocation with one positional placeholder per argument, the SQL Server
/// spelling of `{call name(?, ?)}`.
#[must_use]
pub fn procedure_call(procedure_name: &str, arg_count: usize) -> String {
    if arg_count == 0 {
        return format!("EXEC {procedure_name}");
    }
    let placeholders = vec!["?"; arg_count].join(", ");
    format!("EXEC {procedure_name} {placeholders}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_left_to_right() {
        let t = translate_placeholders("select * from t where a = ? and b = ? or c = ?");
        assert_eq!(t.sql, "select * from t where a = @P1 and b = @P2 or c = @P3");
        assert_eq!(t.placeholders, 3);
    }

    #[test]
    fn skips_inside_literals_identifiers_and_comments() {
        let sql = "select 'it''s ?', \"q?\", [w?] -- ?\n/* ? /* ? */ ? */ from t where a = ?";
        let t = translate_placeholders(sql);
        assert_eq!(
            t.sql,
            "select 'it''s ?', \"q?\", [w?] -- ?\n/* ? /* ? */ ? */ from t where a = @P1"
        );
        assert_eq!(t.placeholders, 1);
    }

    #[test]
    fn borrows_when_nothing_to_rewrite() {
        let t = translate_placeholders("select 1");
        assert!(matches!(t.sql, Cow::Borrowed(_)));
        assert_eq!(t.placeholders, 0);
    }

    #[test]
    fn keeps_non_ascii_text_intact() {
        let t = translate_placeholders("select N'café' where nom = ?");
        assert_eq!(t.sql, "select N'café' where nom = @P1");
    }

    #[test]
    fn arity_mismatch_is_a_statement_failure() {
        let t = translate_placeholders("update t set a = ? where id = ?");
        assert!(t.check_arity(2).is_ok());
        assert!(matches!(
            t.check_arity(1),
            Err(SqlBridgeError::StatementFailure(_))
        ));
        assert!(matches!(
            t.check_arity(3),
            Err(SqlBridgeError::StatementFailure(_))
        ));
    }

    #[test]
    fn procedure_call_has_one_placeholder_per_argument() {
        assert_eq!(procedure_call("dbo.get_orders", 0), "EXEC dbo.get_orders");
        let sql = procedure_call("dbo.get_orders", 2);
        assert_eq!(sql, "EXEC dbo.get_orders ?, ?");
        assert_eq!(translate_placeholders(&sql).sql, "EXEC dbo.get_orders @P1, @P2");
    }
}
