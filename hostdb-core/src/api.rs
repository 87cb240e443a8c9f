//! Request and response payloads of the console boundary.

use hostdb_mysql::QueryOutput;
use hostdb_store::EngineType;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Message returned in the single cell of a write-style result.
pub const WRITE_RESULT_COLUMN: &str = "Result";

/// Cell value of a write-style result.
pub const WRITE_RESULT_VALUE: &str = "Query executed successfully";

/// Body of a create-database request.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseRequest {
    pub database_name: String,
    pub database_user: String,
    pub database_password: String,
    #[serde(default = "default_engine")]
    pub database_type: EngineType,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
}

fn default_engine() -> EngineType {
    EngineType::Mysql
}

impl CreateDatabaseRequest {
    /// A mysql request with default charset and collation.
    pub fn mysql(
        name: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database_name: name.into(),
            database_user: user.into(),
            database_password: password.into(),
            database_type: EngineType::Mysql,
            charset: None,
            collation: None,
        }
    }

    /// Use a different engine.
    pub fn engine(mut self, engine: EngineType) -> Self {
        self.database_type = engine;
        self
    }

    /// Use an explicit charset.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Use an explicit collation.
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }
}

impl std::fmt::Debug for CreateDatabaseRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateDatabaseRequest")
            .field("database_name", &self.database_name)
            .field("database_user", &self.database_user)
            .field("database_password", &"***")
            .field("database_type", &self.database_type)
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .finish()
    }
}

/// Body of a change-password request.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("new_password", &"***")
            .finish()
    }
}

/// Body of an execute-query request. An absent or empty password falls
/// back to the stored secret.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteQueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for ExecuteQueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteQueryRequest")
            .field("query", &self.query)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Result of an ad-hoc query, as rendered by the console.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct QueryOutcome {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    pub message: String,
}

impl QueryOutcome {
    /// A buffered result set.
    pub fn rows_returned(output: QueryOutput) -> Self {
        let message = format!("{} rows returned", output.row_count());
        Self {
            columns: output.columns,
            rows: output.rows,
            message,
        }
    }

    /// The affected-row summary of a write-style statement.
    pub fn rows_affected(affected: u64) -> Self {
        Self {
            columns: vec![WRITE_RESULT_COLUMN.to_string()],
            rows: vec![vec![JsonValue::String(WRITE_RESULT_VALUE.to_string())]],
            message: format!("{} rows affected", affected),
        }
    }
}
