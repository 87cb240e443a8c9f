//! Firewall rejection reasons.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for firewall validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// The reason a query was refused.
///
/// Each kind has a stable [`code`](ValidationKind::code) so a console can
/// render a specific message without matching on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// The raw query is longer than the policy allows.
    QueryTooLong,
    /// Nothing is left once comments are removed.
    EmptyQuery,
    /// A `0x...` literal was found.
    HexLiteral,
    /// A deny-table rule matched.
    ForbiddenCommand,
    /// `UPDATE` or `DELETE` without a `WHERE` clause.
    MissingWhere,
    /// An explicit `LIMIT` above the policy bound.
    LimitTooLarge,
    /// More than one statement while the policy forbids it.
    MultiStatement,
}

impl ValidationKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::QueryTooLong => "query_too_long",
            Self::EmptyQuery => "empty_query",
            Self::HexLiteral => "hex_literal",
            Self::ForbiddenCommand => "forbidden_command",
            Self::MissingWhere => "missing_where",
            Self::LimitTooLarge => "limit_too_large",
            Self::MultiStatement => "multi_statement",
        }
    }

    /// Message shown to the tenant.
    pub fn message(&self) -> &'static str {
        match self {
            Self::QueryTooLong => "query exceeds maximum length",
            Self::EmptyQuery => "query cannot be empty",
            Self::HexLiteral => "hex literals are not allowed",
            Self::ForbiddenCommand => "this command is not allowed",
            Self::MissingWhere => "UPDATE/DELETE requires a WHERE clause",
            Self::LimitTooLarge => "LIMIT exceeds maximum allowed",
            Self::MultiStatement => "multi-statement queries are not allowed",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A refused query.
///
/// `Display` only renders the kind's message. `detail` names the rule or
/// bound that fired and is meant for logs, not for the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ValidationError {
    /// Why the query was refused.
    pub kind: ValidationKind,
    /// Which rule or limit fired.
    pub detail: Option<String>,
}

impl ValidationError {
    /// Create an error without detail.
    pub fn new(kind: ValidationKind) -> Self {
        Self { kind, detail: None }
    }

    /// Attach detail for logging.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Stable machine-readable code of the kind.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<ValidationKind> for ValidationError {
    fn from(kind: ValidationKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_hides_detail() {
        let err = ValidationError::new(ValidationKind::ForbiddenCommand).with_detail("grant");
        assert_eq!(err.to_string(), "this command is not allowed");
        assert_eq!(err.detail.as_deref(), Some("grant"));
    }

    #[test]
    fn test_codes_are_distinct() {
        let kinds = [
            ValidationKind::QueryTooLong,
            ValidationKind::EmptyQuery,
            ValidationKind::HexLiteral,
            ValidationKind::ForbiddenCommand,
            ValidationKind::MissingWhere,
            ValidationKind::LimitTooLarge,
            ValidationKind::MultiStatement,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }
}
