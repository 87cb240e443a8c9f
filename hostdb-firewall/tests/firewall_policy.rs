//! Integration tests for the firewall's public surface.

use hostdb_firewall::rules::DENY_RULES;
use hostdb_firewall::{FirewallPolicy, QueryFirewall, RuleCategory, StatementKind, ValidationKind};
use pretty_assertions::assert_eq;

fn validate(query: &str) -> Result<String, ValidationKind> {
    QueryFirewall::default()
        .validate(query, "c0ffee_shop")
        .map_err(|e| e.kind)
}

#[test]
fn test_documented_examples() {
    assert_eq!(validate("SELECT * FROM t"), Ok("SELECT * FROM t LIMIT 1000".to_string()));
    assert_eq!(validate("SELECT * FROM t LIMIT 99999"), Err(ValidationKind::LimitTooLarge));
    assert_eq!(validate("DELETE FROM t"), Err(ValidationKind::MissingWhere));
    assert_eq!(
        validate("DELETE FROM t WHERE id=1"),
        Ok("DELETE FROM t WHERE id=1 LIMIT 500".to_string())
    );
    assert_eq!(validate("DROP DATABASE x"), Err(ValidationKind::ForbiddenCommand));
    assert_eq!(
        validate("SELECT * FROM information_schema.tables"),
        Err(ValidationKind::ForbiddenCommand)
    );
}

#[test]
fn test_every_category_refuses_a_sample() {
    let samples = [
        (RuleCategory::DatabaseDdl, "create schema other"),
        (RuleCategory::Privilege, "REVOKE ALL ON db.* FROM u"),
        (RuleCategory::ServerAdmin, "SET GLOBAL max_connections = 1"),
        (RuleCategory::TableOperation, "RENAME TABLE a TO b"),
        (RuleCategory::StoredProgram, "CREATE TRIGGER trg BEFORE INSERT ON t FOR EACH ROW SET @x = 1"),
        (RuleCategory::TableLocking, "HANDLER t OPEN"),
        (RuleCategory::SystemSchema, "SELECT user FROM mysql.user"),
    ];

    for (category, sample) in samples {
        assert!(DENY_RULES.iter().any(|r| r.category == category));
        assert_eq!(validate(sample), Err(ValidationKind::ForbiddenCommand), "{}", sample);
    }
}

#[test]
fn test_case_insensitive_rules() {
    assert_eq!(validate("dRoP dAtAbAsE x"), Err(ValidationKind::ForbiddenCommand));
    assert_eq!(validate("load   data infile 'x' into table t"), Err(ValidationKind::ForbiddenCommand));
}

#[test]
fn test_table_column_references_allowed() {
    assert_eq!(
        validate("SELECT orders.id, users.name FROM orders JOIN users ON users.id = orders.user_id"),
        Ok("SELECT orders.id, users.name FROM orders JOIN users ON users.id = orders.user_id LIMIT 1000"
            .to_string())
    );
}

#[test]
fn test_custom_policy_limits() {
    let firewall = QueryFirewall::new(
        FirewallPolicy::default()
            .max_select_limit(100)
            .default_select_limit(25)
            .max_mutation_limit(10),
    );

    assert_eq!(
        firewall.validate("SELECT * FROM t", "db").unwrap(),
        "SELECT * FROM t LIMIT 25"
    );
    assert_eq!(
        firewall.validate("SELECT * FROM t LIMIT 101", "db").unwrap_err().kind,
        ValidationKind::LimitTooLarge
    );
    assert_eq!(
        firewall.validate("UPDATE t SET a = 1 WHERE b = 1", "db").unwrap(),
        "UPDATE t SET a = 1 WHERE b = 1 LIMIT 10"
    );
}

#[test]
fn test_sanitized_text_classifies_like_raw() {
    let sql = validate("-- list\nSHOW TABLES").unwrap();
    assert_eq!(StatementKind::classify(&sql), StatementKind::Read);

    let sql = validate("/* fix */ UPDATE t SET a = 1 WHERE id = 3").unwrap();
    assert_eq!(StatementKind::classify(&sql), StatementKind::Write);
}
