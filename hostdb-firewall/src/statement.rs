//! Statement classification by leading keyword.

/// How a statement's result is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Produces a result set (`SELECT`, `SHOW`, `DESCRIBE`, `EXPLAIN`).
    Read,
    /// Anything else; reports affected rows.
    Write,
}

const READ_KEYWORDS: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "EXPLAIN"];

impl StatementKind {
    /// Classify `query` by its first keyword.
    pub fn classify(query: &str) -> Self {
        let keyword = leading_keyword(query);
        if READ_KEYWORDS
            .iter()
            .any(|read| read.eq_ignore_ascii_case(keyword))
        {
            Self::Read
        } else {
            Self::Write
        }
    }

    /// Whether the statement returns rows.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read)
    }
}

/// The first word after leading whitespace, or `""` when the query opens
/// with anything else (a parenthesis, say).
///
/// The firewall decides which statements get a `LIMIT` with this same
/// function, so a statement is only ever read into memory when it was also
/// row-bounded.
pub fn leading_keyword(query: &str) -> &str {
    let rest = query.trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Whether `query` starts with `keyword`, ignoring case.
pub fn starts_with_keyword(query: &str, keyword: &str) -> bool {
    leading_keyword(query).eq_ignore_ascii_case(keyword)
}
