//! Builders for the administrative DDL issued during provisioning.
//!
//! MySQL account management statements do not accept placeholders, so names
//! and secrets are embedded as text. Identifiers are restricted to
//! `[A-Za-z0-9_]` and backtick-quoted; secrets go through [`escape_literal`].

use crate::error::{MysqlError, MysqlResult};

/// The statement that reloads the grant tables.
pub const FLUSH_PRIVILEGES: &str = "FLUSH PRIVILEGES";

/// Marker placed in front of an embedded secret.
const IDENTIFIED_BY: &str = "IDENTIFIED BY";

fn is_word(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Backtick-quote a schema identifier.
pub fn quote_identifier(name: &str) -> MysqlResult<String> {
    if !is_word(name) {
        return Err(MysqlError::identifier(format!(
            "'{}' is not a plain identifier",
            name
        )));
    }
    Ok(format!("`{}`", name))
}

/// Escape a value for embedding in a single-quoted string literal.
///
/// Quotes are doubled, and so are backslashes because the administrative
/// session does not run with `NO_BACKSLASH_ESCAPES`.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\'' => escaped.push_str("''"),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A `'user'@'host'` account reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    user: String,
    host: String,
}

impl Account {
    /// Build an account, rejecting names that cannot be embedded safely.
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> MysqlResult<Self> {
        let user = user.into();
        let host = host.into();
        if !is_word(&user) {
            return Err(MysqlError::identifier(format!(
                "'{}' is not a valid account name",
                user
            )));
        }
        let host_ok = !host.is_empty()
            && host
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"_.%:-".contains(&b));
        if !host_ok {
            return Err(MysqlError::identifier(format!(
                "'{}' is not a valid account host",
                host
            )));
        }
        Ok(Self { user, host })
    }

    /// The account's user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The account's host pattern.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'@'{}'", self.user, self.host)
    }
}

/// `CREATE DATABASE` with an explicit character set and collation.
pub fn create_database(db_name: &str, charset: &str, collation: &str) -> MysqlResult<String> {
    if !is_word(charset) || !is_word(collation) {
        return Err(MysqlError::identifier(format!(
            "invalid charset/collation '{}'/'{}'",
            charset, collation
        )));
    }
    Ok(format!(
        "CREATE DATABASE {} CHARACTER SET {} COLLATE {}",
        quote_identifier(db_name)?,
        charset,
        collation
    ))
}

/// Idempotent `DROP DATABASE`.
pub fn drop_database(db_name: &str) -> MysqlResult<String> {
    Ok(format!("DROP DATABASE IF EXISTS {}", quote_identifier(db_name)?))
}

/// `CREATE USER` with an embedded password.
pub fn create_user(account: &Account, password: &str) -> String {
    format!(
        "CREATE USER {} {} '{}'",
        account,
        IDENTIFIED_BY,
        escape_literal(password)
    )
}

/// Idempotent `DROP USER`.
pub fn drop_user(account: &Account) -> String {
    format!("DROP USER IF EXISTS {}", account)
}

/// Grant every privilege on one schema.
pub fn grant_all(db_name: &str, account: &Account) -> MysqlResult<String> {
    Ok(format!(
        "GRANT ALL PRIVILEGES ON {}.* TO {}",
        quote_identifier(db_name)?,
        account
    ))
}

/// `ALTER USER ... IDENTIFIED BY` for a password rotation.
pub fn alter_user_password(account: &Account, password: &str) -> String {
    format!(
        "ALTER USER {} {} '{}'",
        account,
        IDENTIFIED_BY,
        escape_literal(password)
    )
}

/// Text of a statement that is safe to log: an embedded secret is masked.
pub fn redact(statement: &str) -> String {
    match statement.find(IDENTIFIED_BY) {
        Some(idx) => format!("{}{} '***'", &statement[..idx], IDENTIFIED_BY),
        None => statement.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn account() -> Account {
        Account::new("ab12cd_app", "%").unwrap()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("ab12cd_shop").unwrap(), "`ab12cd_shop`");
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("shop`; DROP").is_err());
        assert!(quote_identifier("my-db").is_err());
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("plain"), "plain");
        assert_eq!(escape_literal("it's"), "it''s");
        assert_eq!(escape_literal(r"a\'b"), r"a\\''b");
        assert_eq!(escape_literal(r"trail\"), r"trail\\");
    }

    #[test]
    fn test_account_validation() {
        assert_eq!(account().to_string(), "'ab12cd_app'@'%'");
        assert!(Account::new("app", "10.0.0.%").is_ok());
        assert!(Account::new("app", "localhost").is_ok());
        assert!(Account::new("a'pp", "%").is_err());
        assert!(Account::new("app", "").is_err());
        assert!(Account::new("app", "x' OR '1").is_err());
    }

    #[test]
    fn test_create_database() {
        assert_eq!(
            create_database("ab12cd_shop", "utf8mb4", "utf8mb4_unicode_ci").unwrap(),
            "CREATE DATABASE `ab12cd_shop` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci"
        );
        assert!(create_database("ab12cd_shop", "utf8mb4; DROP", "x").is_err());
    }

    #[test]
    fn test_account_statements() {
        assert_eq!(
            create_user(&account(), "pa'ss"),
            "CREATE USER 'ab12cd_app'@'%' IDENTIFIED BY 'pa''ss'"
        );
        assert_eq!(drop_user(&account()), "DROP USER IF EXISTS 'ab12cd_app'@'%'");
        assert_eq!(
            grant_all("ab12cd_shop", &account()).unwrap(),
            "GRANT ALL PRIVILEGES ON `ab12cd_shop`.* TO 'ab12cd_app'@'%'"
        );
        assert_eq!(
            alter_user_password(&account(), "n3w"),
            "ALTER USER 'ab12cd_app'@'%' IDENTIFIED BY 'n3w'"
        );
        assert_eq!(
            drop_database("ab12cd_shop").unwrap(),
            "DROP DATABASE IF EXISTS `ab12cd_shop`"
        );
    }

    #[test]
    fn test_redact() {
        let statement = create_user(&account(), "hunter22");
        let redacted = redact(&statement);
        assert!(!redacted.contains("hunter22"));
        assert_eq!(redacted, "CREATE USER 'ab12cd_app'@'%' IDENTIFIED BY '***'");
        assert_eq!(redact(FLUSH_PRIVILEGES), FLUSH_PRIVILEGES);
    }
}
