//! Firewall limits.

use serde::{Deserialize, Serialize};

/// Bounds applied by the firewall.
///
/// Loaded from the `[firewall]` table of `hostdb.toml`; every field has a
/// default so a partial table is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FirewallPolicy {
    /// Maximum query length, in characters.
    pub max_query_length: usize,
    /// Largest explicit `LIMIT` accepted on a `SELECT`.
    pub max_select_limit: u64,
    /// `LIMIT` appended to a `SELECT` that has none.
    pub default_select_limit: u64,
    /// Largest `LIMIT` on an `UPDATE`/`DELETE`; also the appended default.
    pub max_mutation_limit: u64,
    /// Accept `;`-separated statements in one submission.
    pub allow_multi_statement: bool,
}

impl Default for FirewallPolicy {
    fn default() -> Self {
        Self {
            max_query_length: 10_000,
            max_select_limit: 5_000,
            default_select_limit: 1_000,
            max_mutation_limit: 500,
            allow_multi_statement: true,
        }
    }
}

impl FirewallPolicy {
    /// Set the maximum query length.
    pub fn max_query_length(mut self, len: usize) -> Self {
        self.max_query_length = len;
        self
    }

    /// Set the `SELECT` limit bound.
    pub fn max_select_limit(mut self, limit: u64) -> Self {
        self.max_select_limit = limit;
        self
    }

    /// Set the `LIMIT` appended to unbounded `SELECT`s.
    pub fn default_select_limit(mut self, limit: u64) -> Self {
        self.default_select_limit = limit;
        self
    }

    /// Set the `UPDATE`/`DELETE` limit bound.
    pub fn max_mutation_limit(mut self, limit: u64) -> Self {
        self.max_mutation_limit = limit;
        self
    }

    /// Allow or refuse multi-statement submissions.
    pub fn allow_multi_statement(mut self, allow: bool) -> Self {
        self.allow_multi_statement = allow;
        self
    }
}
