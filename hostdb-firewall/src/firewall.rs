//! Query validation and rewriting.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::error::{ValidationError, ValidationKind, ValidationResult};
use crate::policy::FirewallPolicy;
use crate::rules;
use crate::statement::starts_with_keyword;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)--.*$").expect("valid pattern"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid pattern"));
static HEX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0x[0-9A-Fa-f]+").expect("valid pattern"));
static LIMIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLIMIT\s+(\d+)(?:\s*,\s*(\d+))?").expect("valid pattern")
});
static WHERE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid pattern"));

/// Remove `--` line comments and `/* */` block comments, then trim.
pub fn strip_comments(query: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(query, "");
    let without_blocks = BLOCK_COMMENT.replace_all(&without_lines, "");
    without_blocks.trim().to_string()
}

/// Validates tenant SQL against a [`FirewallPolicy`].
#[derive(Debug, Clone, Default)]
pub struct QueryFirewall {
    policy: FirewallPolicy,
}

/// What an explicit `LIMIT` clause says.
enum LimitClause {
    Absent,
    Rows(u64),
    Unbounded,
}

impl QueryFirewall {
    /// Create a firewall with the given policy.
    pub fn new(policy: FirewallPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &FirewallPolicy {
        &self.policy
    }

    /// Validate `raw` for execution against `target_db`.
    ///
    /// Returns the text to run, which may carry an appended `LIMIT`, or the
    /// first check that failed.
    pub fn validate(&self, raw: &str, target_db: &str) -> ValidationResult<String> {
        let result = self.check(raw);
        if let Err(ref err) = result {
            debug!(
                db_name = %target_db,
                kind = err.code(),
                detail = err.detail.as_deref().unwrap_or(""),
                "Query refused by firewall"
            );
        }
        result
    }

    fn check(&self, raw: &str) -> ValidationResult<String> {
        let length = raw.chars().count();
        if length > self.policy.max_query_length {
            return Err(ValidationError::new(ValidationKind::QueryTooLong).with_detail(format!(
                "{} characters, maximum {}",
                length, self.policy.max_query_length
            )));
        }

        let query = strip_comments(raw);
        if query.is_empty() {
            return Err(ValidationKind::EmptyQuery.into());
        }

        if let Some(hex) = HEX_LITERAL.find(&query) {
            return Err(ValidationError::new(ValidationKind::HexLiteral).with_detail(hex.as_str()));
        }

        if let Some(rule) = rules::first_match(&query) {
            return Err(ValidationError::new(ValidationKind::ForbiddenCommand).with_detail(rule.name));
        }

        if !self.policy.allow_multi_statement && has_multiple_statements(&query) {
            return Err(ValidationKind::MultiStatement.into());
        }

        if starts_with_keyword(&query, "UPDATE") || starts_with_keyword(&query, "DELETE") {
            if !WHERE_CLAUSE.is_match(&query) {
                return Err(ValidationKind::MissingWhere.into());
            }
            return self.bound_limit(query, self.policy.max_mutation_limit, self.policy.max_mutation_limit);
        }

        if starts_with_keyword(&query, "SELECT") {
            return self.bound_limit(query, self.policy.max_select_limit, self.policy.default_select_limit);
        }

        Ok(query)
    }

    fn bound_limit(&self, query: String, max: u64, default: u64) -> ValidationResult<String> {
        match limit_clause(&query) {
            LimitClause::Absent => Ok(append_limit(&query, default)),
            LimitClause::Rows(rows) if rows <= max => Ok(query),
            LimitClause::Rows(rows) => Err(ValidationError::new(ValidationKind::LimitTooLarge)
                .with_detail(format!("limit {} exceeds {}", rows, max))),
            LimitClause::Unbounded => Err(ValidationError::new(ValidationKind::LimitTooLarge)
                .with_detail("limit does not fit in 64 bits")),
        }
    }
}

/// Read the first `LIMIT` clause. In `LIMIT offset, count` the count is the
/// second number.
fn limit_clause(query: &str) -> LimitClause {
    let Some(caps) = LIMIT_CLAUSE.captures(query) else {
        return LimitClause::Absent;
    };
    let rows = caps.get(2).or_else(|| caps.get(1)).map(|m| m.as_str());
    match rows.map(str::parse::<u64>) {
        Some(Ok(rows)) => LimitClause::Rows(rows),
        _ => LimitClause::Unbounded,
    }
}

fn append_limit(query: &str, limit: u64) -> String {
    let body = query.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    format!("{} LIMIT {}", body, limit)
}

fn has_multiple_statements(query: &str) -> bool {
    query
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .contains(';')
}
