//! Error types for MySQL operations.

use std::fmt;

/// Result type for MySQL operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

/// Server error codes reported when the engine refuses a login.
const AUTH_ERROR_CODES: &[u16] = &[
    1044, // ER_DBACCESS_DENIED_ERROR
    1045, // ER_ACCESS_DENIED_ERROR
    1130, // ER_HOST_NOT_PRIVILEGED
    1698, // ER_ACCESS_DENIED_NO_PASSWORD_ERROR
    1862, // ER_MUST_CHANGE_PASSWORD_LOGIN
];

/// Server error code for `max_connections` exhaustion.
const TOO_MANY_CONNECTIONS: u16 = 1040;

/// Error type for MySQL operations.
#[derive(Debug)]
pub enum MysqlError {
    /// Pool error.
    Pool(String),
    /// MySQL driver error.
    Mysql(mysql_async::Error),
    /// Configuration error.
    Config(String),
    /// Connection error.
    Connection(String),
    /// Query error.
    Query(String),
    /// An identifier or account name that cannot be embedded in DDL.
    Identifier(String),
    /// Timeout error.
    Timeout(String),
}

impl MysqlError {
    /// Create a pool error.
    pub fn pool(msg: impl Into<String>) -> Self {
        Self::Pool(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create an identifier error.
    pub fn identifier(msg: impl Into<String>) -> Self {
        Self::Identifier(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// The server error code, if the engine itself rejected the request.
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Self::Mysql(mysql_async::Error::Server(e)) => Some(e.code),
            _ => None,
        }
    }

    /// Whether the error means the tenant could not reach or log into the
    /// engine, as opposed to a statement that the engine refused to run.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Pool(_) | Self::Connection(_) | Self::Timeout(_) | Self::Config(_) => true,
            Self::Mysql(mysql_async::Error::Server(e)) => {
                AUTH_ERROR_CODES.contains(&e.code) || e.code == TOO_MANY_CONNECTIONS
            }
            Self::Mysql(mysql_async::Error::Io(_))
            | Self::Mysql(mysql_async::Error::Driver(_))
            | Self::Mysql(mysql_async::Error::Url(_)) => true,
            Self::Mysql(_) | Self::Query(_) | Self::Identifier(_) => false,
        }
    }

    /// Message suitable for surfacing to a tenant. Driver errors carry the
    /// engine's own text.
    pub fn engine_message(&self) -> String {
        match self {
            Self::Mysql(mysql_async::Error::Server(e)) => e.message.clone(),
            Self::Mysql(e) => e.to_string(),
            Self::Pool(msg)
            | Self::Config(msg)
            | Self::Connection(msg)
            | Self::Query(msg)
            | Self::Identifier(msg)
            | Self::Timeout(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for MysqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool(msg) => write!(f, "Pool error: {}", msg),
            Self::Mysql(e) => write!(f, "MySQL error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Connection(msg) => write!(f, "Connection error: {}", msg),
            Self::Query(msg) => write!(f, "Query error: {}", msg),
            Self::Identifier(msg) => write!(f, "Invalid identifier: {}", msg),
            Self::Timeout(msg) => write!(f, "Timeout error: {}", msg),
        }
    }
}

impl std::error::Error for MysqlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mysql(e) => Some(e),
            _ => None,
        }
    }
}

impl From<mysql_async::Error> for MysqlError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Mysql(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(code: u16, message: &str) -> MysqlError {
        MysqlError::Mysql(mysql_async::Error::Server(mysql_async::ServerError {
            code,
            message: message.to_string(),
            state: "HY000".to_string(),
        }))
    }

    #[test]
    fn test_error_display() {
        let err = MysqlError::config("invalid url");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("invalid url"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(MysqlError::pool("test"), MysqlError::Pool(_)));
        assert!(matches!(MysqlError::config("test"), MysqlError::Config(_)));
        assert!(matches!(
            MysqlError::connection("test"),
            MysqlError::Connection(_)
        ));
        assert!(matches!(MysqlError::query("test"), MysqlError::Query(_)));
        assert!(matches!(
            MysqlError::identifier("test"),
            MysqlError::Identifier(_)
        ));
    }

    #[test]
    fn test_access_denied_is_connection_failure() {
        let err = server_error(1045, "Access denied for user 'ab12cd_app'@'%'");
        assert!(err.is_connection_failure());
        assert_eq!(err.server_code(), Some(1045));
    }

    #[test]
    fn test_syntax_error_is_not_connection_failure() {
        let err = server_error(1064, "You have an error in your SQL syntax");
        assert!(!err.is_connection_failure());
        assert_eq!(
            err.engine_message(),
            "You have an error in your SQL syntax"
        );
    }

    #[test]
    fn test_local_errors_classification() {
        assert!(MysqlError::timeout("probe").is_connection_failure());
        assert!(MysqlError::pool("closed").is_connection_failure());
        assert!(!MysqlError::query("no rows").is_connection_failure());
        assert!(!MysqlError::identifier("bad").is_connection_failure());
    }
}
