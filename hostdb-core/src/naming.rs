//! Owner namespaces, identifier derivation and password policy.

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Length of an owner's prefix token, in hex characters.
pub const PREFIX_LEN: usize = 6;

/// Longest account name MySQL accepts.
pub const MAX_USER_LEN: usize = 32;

/// Longest schema name MySQL accepts.
pub const MAX_DB_NAME_LEN: usize = 64;

/// A fresh random prefix token.
pub fn generate_prefix() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(PREFIX_LEN);
    token
}

/// Drop every character outside `[A-Za-z0-9_]`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// [`sanitize`], rejecting a name with nothing left.
pub fn sanitized(raw: &str, what: &str) -> CoreResult<String> {
    let cleaned = sanitize(raw);
    if cleaned.is_empty() {
        return Err(CoreError::invalid_input(format!(
            "{} must contain at least one letter, digit or underscore",
            what
        )));
    }
    Ok(cleaned)
}

/// `<prefix>_<sanitized>`, rejecting empty or over-long results.
pub fn namespaced(prefix: &str, raw: &str, what: &str, max_len: usize) -> CoreResult<String> {
    let name = format!("{}_{}", prefix, sanitized(raw, what)?);
    if name.len() > max_len {
        return Err(CoreError::invalid_input(format!(
            "{} '{}' is longer than {} characters",
            what, name, max_len
        )));
    }
    Ok(name)
}

/// A charset or collation that will be embedded in DDL.
pub fn check_ddl_word(value: &str, what: &str) -> CoreResult<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CoreError::invalid_input(format!(
            "{} '{}' may only contain letters, digits and underscores",
            what, value
        )))
    }
}

/// Rules a tenant password must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum length in characters.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 6 }
    }
}

impl PasswordPolicy {
    /// Check a candidate password.
    pub fn check(&self, password: &str) -> CoreResult<()> {
        if password.contains('\0') {
            return Err(CoreError::invalid_input("password must not contain NUL bytes"));
        }
        if password.chars().count() < self.min_length {
            return Err(CoreError::invalid_input(format!(
                "password must be at least {} characters",
                self.min_length
            )));
        }
        Ok(())
    }
}
