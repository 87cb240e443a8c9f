//! The deny table.
//!
//! Each row is a case-insensitive pattern; any match refuses the query with
//! [`ValidationKind::ForbiddenCommand`](crate::ValidationKind::ForbiddenCommand).
//! Patterns are anchored on word boundaries so identifiers such as
//! `granted_at` or `my_sys` do not trip them.

use std::sync::LazyLock;

use regex_lite::Regex;

/// What a deny rule protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// Database-level DDL and switching the default schema.
    DatabaseDdl,
    /// Users and privileges.
    Privilege,
    /// Server-wide settings, flushes and file access.
    ServerAdmin,
    /// Destructive whole-table operations.
    TableOperation,
    /// Procedures, functions, triggers and events.
    StoredProgram,
    /// Explicit table locks and handlers.
    TableLocking,
    /// Engine-owned schemas.
    SystemSchema,
}

/// One row of the deny table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenyRule {
    /// Short name, used in logs.
    pub name: &'static str,
    /// What the rule protects.
    pub category: RuleCategory,
    /// `regex-lite` pattern.
    pub pattern: &'static str,
}

const fn rule(name: &'static str, category: RuleCategory, pattern: &'static str) -> DenyRule {
    DenyRule {
        name,
        category,
        pattern,
    }
}

/// The fixed deny table, checked in order.
pub const DENY_RULES: &[DenyRule] = &[
    // Database level. MySQL treats SCHEMA as a synonym for DATABASE.
    rule("drop_database", RuleCategory::DatabaseDdl, r"(?i)\bDROP\s+(DATABASE|SCHEMA)\b"),
    rule("create_database", RuleCategory::DatabaseDdl, r"(?i)\bCREATE\s+(DATABASE|SCHEMA)\b"),
    rule("use", RuleCategory::DatabaseDdl, r"(?i)(^|;)\s*USE\b"),
    // Users and privileges
    rule("grant", RuleCategory::Privilege, r"(?i)\bGRANT\b"),
    rule("revoke", RuleCategory::Privilege, r"(?i)\bREVOKE\b"),
    rule("create_user", RuleCategory::Privilege, r"(?i)\bCREATE\s+USER\b"),
    rule("drop_user", RuleCategory::Privilege, r"(?i)\bDROP\s+USER\b"),
    rule("alter_user", RuleCategory::Privilege, r"(?i)\bALTER\s+USER\b"),
    // Server administration
    rule("flush", RuleCategory::ServerAdmin, r"(?i)\bFLUSH\b"),
    rule("set_global", RuleCategory::ServerAdmin, r"(?i)\bSET\s+GLOBAL\b"),
    rule("set_session", RuleCategory::ServerAdmin, r"(?i)\bSET\s+SESSION\b"),
    rule("load_data", RuleCategory::ServerAdmin, r"(?i)\bLOAD\s+DATA\b"),
    rule("into_file", RuleCategory::ServerAdmin, r"(?i)\bINTO\s+(OUTFILE|DUMPFILE)\b"),
    // Whole-table operations
    rule("truncate", RuleCategory::TableOperation, r"(?i)\bTRUNCATE\b"),
    rule("rename_table", RuleCategory::TableOperation, r"(?i)\bRENAME\s+TABLE\b"),
    // Stored programs
    rule(
        "create_program",
        RuleCategory::StoredProgram,
        r"(?i)\bCREATE\s+(PROCEDURE|FUNCTION|TRIGGER|EVENT)\b",
    ),
    rule(
        "drop_program",
        RuleCategory::StoredProgram,
        r"(?i)\bDROP\s+(PROCEDURE|FUNCTION|TRIGGER|EVENT)\b",
    ),
    rule(
        "alter_program",
        RuleCategory::StoredProgram,
        r"(?i)\bALTER\s+(PROCEDURE|FUNCTION|TRIGGER|EVENT)\b",
    ),
    rule("call", RuleCategory::StoredProgram, r"(?i)\bCALL\s+\w+"),
    // Locking
    rule("lock_tables", RuleCategory::TableLocking, r"(?i)\bLOCK\s+TABLES?\b"),
    rule("unlock_tables", RuleCategory::TableLocking, r"(?i)\bUNLOCK\s+TABLES?\b"),
    rule("handler", RuleCategory::TableLocking, r"(?i)\bHANDLER\b"),
    // System schemas, quoted or not
    rule("information_schema", RuleCategory::SystemSchema, r"(?i)\bINFORMATION_SCHEMA\b"),
    rule("mysql_schema", RuleCategory::SystemSchema, r"(?i)\bMYSQL`?\s*\."),
    rule("performance_schema", RuleCategory::SystemSchema, r"(?i)\bPERFORMANCE_SCHEMA\b"),
    rule("sys_schema", RuleCategory::SystemSchema, r"(?i)\bSYS`?\s*\."),
];

struct CompiledRule {
    rule: &'static DenyRule,
    regex: Regex,
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    DENY_RULES
        .iter()
        .map(|rule| CompiledRule {
            rule,
            regex: Regex::new(rule.pattern).expect("deny rule patterns are valid"),
        })
        .collect()
});

/// First deny rule matching `query`, if any.
pub fn first_match(query: &str) -> Option<&'static DenyRule> {
    COMPILED
        .iter()
        .find(|compiled| compiled.regex.is_match(query))
        .map(|compiled| compiled.rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED.len(), DENY_RULES.len());
    }

    #[test]
    fn test_rule_names_unique() {
        let names: std::collections::HashSet<_> = DENY_RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), DENY_RULES.len());
    }

    #[test]
    fn test_first_match_reports_rule() {
        let rule = first_match("grant select on *.* to x").unwrap();
        assert_eq!(rule.name, "grant");
        assert_eq!(rule.category, RuleCategory::Privilege);
    }

    #[test]
    fn test_word_boundaries() {
        assert!(first_match("SELECT granted_at FROM audits").is_none());
        assert!(first_match("SELECT * FROM my_sys.t").is_none());
        assert!(first_match("SELECT * FROM t USE INDEX (idx_a)").is_none());
        assert!(first_match("SELECT flushed FROM t").is_none());
    }

    #[test]
    fn test_use_statement_anywhere_in_batch() {
        assert_eq!(first_match("use other_db").unwrap().name, "use");
        assert_eq!(first_match("SELECT 1; USE other_db").unwrap().name, "use");
    }

    #[test]
    fn test_quoted_system_schema() {
        assert_eq!(first_match("SELECT * FROM `mysql`.`user`").unwrap().name, "mysql_schema");
        assert_eq!(first_match("select * from sys . x").unwrap().name, "sys_schema");
        assert_eq!(
            first_match("SELECT * FROM `performance_schema`.threads").unwrap().name,
            "performance_schema"
        );
    }
}
