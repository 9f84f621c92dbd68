//! Statement-text inference
//!
//! Keyspace, table and row-limit handling are driven by a handful of
//! case-insensitive patterns that must match the *entire* statement. This is
//! a heuristic, not a parser: trailing text, embedded statements and odd
//! whitespace can change which rule applies, and that behaviour is kept.
//!
//! Character classes are spelled out in ASCII (`\w` is `[0-9A-Za-z_]`, `\s`
//! is the six ASCII whitespace characters) and `.` stops at line terminators.
//! Case folding is ASCII-only, so `K` never matches the Kelvin sign.

use crate::error::{ProtocolError, ProtocolResult};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::trace;

macro_rules! statement_pattern {
    ($body:expr) => {
        LazyLock::new(|| {
            let body = $body
                .replace("{S}", r"[ \t\n\x0B\x0C\r]")
                .replace("{DOT}", r"(?u:[^\n\r\x{85}\x{2028}\x{2029}])")
                .replace("{ID}", r"[0-9A-Za-z_+.]");
            RegexBuilder::new(&format!(r"\A(?:{body})\z"))
                .case_insensitive(true)
                .unicode(false)
                .build()
                .expect("statement pattern")
        })
    };
}

static USE_KEYSPACE: LazyLock<Regex> = statement_pattern!(r"USE ([0-9A-Za-z_]+);?");
static SELECT: LazyLock<Regex> = statement_pattern!(r"SELECT{S}+{DOT}*FROM{S}+{ID}+");
static SELECT_COUNT: LazyLock<Regex> = statement_pattern!(r"SELECT{S}+COUNT\((?u:[^)])+\){DOT}*");
static SELECT_ALL: LazyLock<Regex> = statement_pattern!(r"SELECT{S}+\*{DOT}*");
static SELECT_DELETE: LazyLock<Regex> =
    statement_pattern!(r"(?:SELECT|DELETE){S}+{DOT}+FROM{S}+({ID}+){DOT}*");
static UPDATE: LazyLock<Regex> = statement_pattern!(r"UPDATE{S}+({ID}+){S}+{DOT}*");

/// `SELECT ... FROM <source>` over the whole text.
pub fn is_select_query(text: &str) -> bool {
    SELECT.is_match(text)
}

/// `SELECT COUNT(...) ...` over the whole text.
pub fn is_select_count_query(text: &str) -> bool {
    SELECT_COUNT.is_match(text)
}

/// `SELECT * ...` over the whole text.
pub fn is_select_all_query(text: &str) -> bool {
    SELECT_ALL.is_match(text)
}

/// Source identifier named by a SELECT, DELETE or UPDATE statement.
fn statement_source(text: &str) -> Option<&str> {
    SELECT_DELETE
        .captures(text)
        .or_else(|| UPDATE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Keyspace part of `keyspace.table`; `None` without a dot.
fn source_keyspace(source: &str) -> Option<&str> {
    source.split_once('.').map(|(keyspace, _)| keyspace)
}

/// Table part of `keyspace.table`; the whole source without a dot.
fn source_table(source: &str) -> &str {
    source.split_once('.').map_or(source, |(_, table)| table)
}

/// Keyspace in effect after `text` runs.
///
/// A `USE` statement wins outright. Otherwise a dotted source in a
/// SELECT/DELETE and then an UPDATE statement supplies it. In every other
/// case `current` is returned unchanged.
pub fn infer_keyspace(text: &str, current: &str) -> String {
    if let Some(caps) = USE_KEYSPACE.captures(text) {
        if let Some(keyspace) = caps.get(1) {
            return keyspace.as_str().to_string();
        }
    }

    let from_select = SELECT_DELETE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| source_keyspace(m.as_str()));
    let from_update = || {
        UPDATE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| source_keyspace(m.as_str()))
    };

    from_select
        .or_else(from_update)
        .unwrap_or(current)
        .to_string()
}

/// Table named by a SELECT, DELETE or UPDATE statement.
pub fn infer_table(text: &str) -> Option<String> {
    statement_source(text).map(|source| source_table(source).to_string())
}

/// Append ` LIMIT <max_rows>` to plain selects.
///
/// Zero means unlimited. Counting selects are left alone. An existing LIMIT
/// clause is not detected.
pub fn inject_limit(text: &str, max_rows: u32) -> String {
    if max_rows > 0 && is_select_query(text) && !is_select_count_query(text) {
        trace!(max_rows, "Appending row limit to statement");
        format!("{text} LIMIT {max_rows}")
    } else {
        text.to_string()
    }
}

/// Statement context derived from the text and the session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub keyspace: String,
    pub table: Option<String>,
    /// 0 means unlimited
    pub max_rows: u32,
}

impl QueryContext {
    pub fn derive(text: &str, current_keyspace: &str, max_rows: u32) -> Self {
        Self {
            keyspace: infer_keyspace(text, current_keyspace),
            table: infer_table(text),
            max_rows,
        }
    }

    /// Statement text to send, with the row limit applied.
    pub fn rewrite(&self, text: &str) -> String {
        inject_limit(text, self.max_rows)
    }
}

/// SQL `LIKE`-style name filter: `%` is any run, `_` any one character.
///
/// Case-insensitive and anchored to the whole name.
pub fn matches_name_pattern(name: &str, pattern: &str) -> ProtocolResult<bool> {
    let mut body = String::with_capacity(pattern.len() + 8);
    for ch in pattern.chars() {
        match ch {
            '%' => body.push_str(".*"),
            '_' => body.push('.'),
            other => body.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    let re = RegexBuilder::new(&format!(r"\A(?s:{body})\z"))
        .case_insensitive(true)
        .build()
        .map_err(|e| ProtocolError::Syntax(e.to_string()))?;
    Ok(re.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_keyspace_ordering() {
        assert_eq!(infer_keyspace("USE Foo;", "bar"), "Foo");
        assert_eq!(infer_keyspace("use Foo", "bar"), "Foo");
        assert_eq!(infer_keyspace("SELECT a FROM Foo.Bar", "bar"), "Foo");
        assert_eq!(infer_keyspace("SELECT a FROM Bar", "bar"), "bar");
        assert_eq!(infer_keyspace("UPDATE Foo.Bar SET x=1", "bar"), "Foo");
        assert_eq!(infer_keyspace("DELETE x FROM Ks.T WHERE KEY = 1", "bar"), "Ks");
    }

    #[test]
    fn test_infer_keyspace_requires_whole_match() {
        // USE embedded mid-string falls through to the next rule
        assert_eq!(infer_keyspace("SELECT a FROM Other.T; USE Foo;", "bar"), "Other");
        assert_eq!(infer_keyspace("  USE Foo;", "bar"), "bar");
        assert_eq!(infer_keyspace("USE Foo; ", "bar"), "bar");
        assert_eq!(infer_keyspace("INSERT INTO Foo.Bar (a) VALUES (1)", "bar"), "bar");
    }

    #[test]
    fn test_infer_keyspace_dot_rule() {
        assert_eq!(infer_keyspace("SELECT a FROM ks.t.extra", "cur"), "ks");
        assert_eq!(infer_keyspace("UPDATE T SET x=1", "cur"), "cur");
    }

    #[test]
    fn test_infer_table() {
        assert_eq!(infer_table("SELECT a FROM Foo.Bar").as_deref(), Some("Bar"));
        assert_eq!(infer_table("SELECT a FROM Bar").as_deref(), Some("Bar"));
        assert_eq!(infer_table("USE Foo"), None);
        assert_eq!(infer_table("UPDATE Foo.Bar SET x=1").as_deref(), Some("Bar"));
        assert_eq!(
            infer_table("SELECT * FROM users WHERE KEY = 'k'").as_deref(),
            Some("users")
        );
    }

    #[test]
    fn test_inject_limit() {
        assert_eq!(inject_limit("SELECT * FROM t", 10), "SELECT * FROM t LIMIT 10");
        assert_eq!(
            inject_limit("SELECT COUNT(*) FROM t", 10),
            "SELECT COUNT(*) FROM t"
        );
        assert_eq!(inject_limit("SELECT * FROM t", 0), "SELECT * FROM t");
        assert_eq!(inject_limit("UPDATE t SET a=1", 10), "UPDATE t SET a=1");
    }

    #[test]
    fn test_inject_limit_quirks() {
        // a WHERE clause after the source defeats the select pattern
        assert_eq!(
            inject_limit("SELECT * FROM t WHERE x = 1", 5),
            "SELECT * FROM t WHERE x = 1"
        );
        // an existing limit is not detected when the source is last
        assert_eq!(
            inject_limit("SELECT * FROM ks.t", 5),
            "SELECT * FROM ks.t LIMIT 5"
        );
        // a trailing semicolon is outside the source pattern
        assert_eq!(inject_limit("SELECT * FROM t;", 5), "SELECT * FROM t;");
    }

    #[test]
    fn test_case_folding_is_ascii_only() {
        assert_eq!(infer_keyspace("USE \u{212A}s", "bar"), "bar");
        assert_eq!(infer_keyspace("uſe Ks", "bar"), "bar");
        assert_eq!(infer_keyspace("uSe ks", "bar"), "ks");
        assert_eq!(inject_limit("ſELECT * FROM t", 5), "ſELECT * FROM t");
        assert_eq!(infer_table("SELECT a FROM \u{212A}t"), None);
        // non-ASCII text between keywords still matches
        assert_eq!(
            inject_limit("SELECT 'grüße' FROM t", 5),
            "SELECT 'grüße' FROM t LIMIT 5"
        );
        assert!(is_select_count_query("SELECT COUNT(ü) FROM t"));
    }

    #[test]
    fn test_select_classifiers() {
        assert!(is_select_query("select a, b from t"));
        assert!(is_select_count_query("SELECT count(1) FROM t"));
        assert!(is_select_all_query("SELECT * FROM t WHERE KEY = 1"));
        assert!(!is_select_all_query("SELECT a FROM t"));
        assert!(!is_select_query("SELECT a\nFROM t"));
        assert!(is_select_query("SELECT a FROM\nt"));
    }

    #[test]
    fn test_query_context() {
        let ctx = QueryContext::derive("SELECT * FROM Ks1.users", "system", 25);
        assert_eq!(ctx.keyspace, "Ks1");
        assert_eq!(ctx.table.as_deref(), Some("users"));
        assert_eq!(ctx.rewrite("SELECT * FROM Ks1.users"), "SELECT * FROM Ks1.users LIMIT 25");
    }

    #[test]
    fn test_matches_name_pattern() {
        assert!(matches_name_pattern("Users", "user%").unwrap());
        assert!(matches_name_pattern("users", "u_ers").unwrap());
        assert!(!matches_name_pattern("users", "user").unwrap());
        assert!(matches_name_pattern("a.b", "a.b").unwrap());
        assert!(!matches_name_pattern("axb", "a.b").unwrap());
    }
}
