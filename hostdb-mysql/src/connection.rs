//! A checked-out MySQL connection.

use mysql_async::prelude::*;
use mysql_async::{Conn, Params, Row, Value};
use tracing::debug;

use crate::error::{MysqlError, MysqlResult};
use crate::types::{QueryOutput, row_to_json};

/// A wrapper around a MySQL connection.
pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    /// Create a new connection wrapper.
    pub fn new(conn: Conn) -> Self {
        Self { conn }
    }

    /// Round-trip a ping packet.
    pub async fn ping(&mut self) -> MysqlResult<()> {
        self.conn.ping().await?;
        Ok(())
    }

    /// Run text-protocol SQL and buffer the first result set with its
    /// column names. Any further result sets are drained and discarded.
    pub async fn query_table(&mut self, query: &str) -> MysqlResult<QueryOutput> {
        debug!(query_len = query.len(), "Executing tabular query");
        let mut result = self.conn.query_iter(query).await?;

        let columns = result
            .columns_ref()
            .iter()
            .map(|column| column.name_str().into_owned())
            .collect();
        let rows: Vec<Row> = result.collect().await?;
        result.drop_result().await?;

        Ok(QueryOutput {
            columns,
            rows: rows.iter().map(row_to_json).collect(),
        })
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&mut self, query: &str) -> MysqlResult<u64> {
        debug!(query_len = query.len(), "Executing statement");
        self.conn.query_drop(query).await?;
        Ok(self.conn.affected_rows())
    }

    /// Fetch the first column of the first row of a prepared query.
    pub async fn query_scalar<T, P>(&mut self, query: &str, params: P) -> MysqlResult<T>
    where
        T: FromValue + Send,
        P: Into<Params> + Send,
    {
        debug!(query = %query, "Executing scalar query");
        let value: Option<Value> = self.conn.exec_first(query, params).await?;
        match value {
            Some(v) => T::from_value_opt(v)
                .map_err(|e| MysqlError::query(format!("unexpected scalar value: {}", e))),
            None => Err(MysqlError::query("expected scalar value, got none")),
        }
    }
}
