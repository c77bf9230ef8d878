//! Read-only, single-statement policy for generated SQL.
//!
//! The gate fails closed: anything it cannot positively accept is rejected.
//! A rejection is an ordinary value the caller inspects, not an error.

use std::fmt;

/// Substrings that reject a query. Matched against the lower-cased query
/// with whitespace collapsed to single spaces and one trailing space added,
/// so `drop ` also catches `DROP\n` at the very end.
pub const DENYLIST: &[&str] = &[
    "drop ",
    "alter ",
    "truncate ",
    "delete from",
    "update ",
    "insert into",
    "merge ",
    "exec ",
    "exec(",
    "execute ",
    "sp_",
    "xp_",
    "create ",
    "grant ",
    "revoke ",
    "begin tran",
    "commit",
    "rollback",
];

/// Query text returned in place of a rejected statement.
pub const REJECTED_PLACEHOLDER: &str =
    "SELECT 'Query rejected: only single read-only SELECT statements are allowed' AS Message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    Empty,
    Denylisted(&'static str),
    MultipleStatements(usize),
    NotASelect,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty query"),
            Self::Denylisted(keyword) => write!(f, "contains forbidden keyword '{}'", keyword.trim_end()),
            Self::MultipleStatements(count) => write!(f, "contains {count} statement separators"),
            Self::NotASelect => f.write_str("does not start with SELECT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    Unsafe(UnsafeReason),
}

impl SafetyVerdict {
    pub const fn is_safe(self) -> bool {
        matches!(self, Self::Safe)
    }
}

/// Lower-case, collapse whitespace runs, trim.
pub fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Apply the policy to one generated statement.
pub fn check(sql: &str) -> SafetyVerdict {
    let normalized = normalize(sql);
    if normalized.is_empty() {
        return SafetyVerdict::Unsafe(UnsafeReason::Empty);
    }

    let probe = format!("{normalized} ");
    if let Some(keyword) = DENYLIST.iter().find(|k| probe.contains(*k)) {
        return SafetyVerdict::Unsafe(UnsafeReason::Denylisted(keyword));
    }

    let separators = normalized.matches(';').count();
    if separators > 1 {
        return SafetyVerdict::Unsafe(UnsafeReason::MultipleStatements(separators));
    }

    if !probe.starts_with("select ") {
        return SafetyVerdict::Unsafe(UnsafeReason::NotASelect);
    }

    SafetyVerdict::Safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_select_is_safe() {
        assert_eq!(
            check("SELECT SUM(Totale) FROM Vendite WHERE MONTH(Data) = 3;"),
            SafetyVerdict::Safe
        );
        assert!(check("  select\n\t*\nfrom Ordini").is_safe());
    }

    #[test]
    fn test_denylisted_keywords_rejected() {
        assert_eq!(
            check("DROP TABLE Ordini"),
            SafetyVerdict::Unsafe(UnsafeReason::Denylisted("drop "))
        );
        assert_eq!(
            check("SELECT 1; EXEC xp_cmdshell 'dir'"),
            SafetyVerdict::Unsafe(UnsafeReason::Denylisted("exec "))
        );
        assert!(!check("select * from t where x = 1 ;\nDELETE   FROM t").is_safe());
    }

    #[test]
    fn test_trailing_keyword_caught() {
        assert!(!check("select 1 from t drop").is_safe());
    }

    #[test]
    fn test_multiple_statements_rejected() {
        assert_eq!(
            check("select 1; select 2;"),
            SafetyVerdict::Unsafe(UnsafeReason::MultipleStatements(2))
        );
    }

    #[test]
    fn test_must_start_with_select() {
        assert_eq!(
            check("WITH x AS (SELECT 1) SELECT * FROM x"),
            SafetyVerdict::Unsafe(UnsafeReason::NotASelect)
        );
        assert_eq!(check("   "), SafetyVerdict::Unsafe(UnsafeReason::Empty));
    }

    #[test]
    fn test_placeholder_itself_is_safe() {
        assert!(check(REJECTED_PLACEHOLDER).is_safe());
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(
            UnsafeReason::Denylisted("drop ").to_string(),
            "contains forbidden keyword 'drop'"
        );
    }
}
