//! Statement execution pipeline
//!
//! A [`Session`] owns the connection-level state the adapter core needs:
//! the current keyspace, the row limit and the column decoder. Sending
//! statements and reading schema is delegated to a [`QueryExecutor`]
//! supplied by the transport layer.

use super::decoder::{ColumnDecoder, DecodeMode};
use super::inference::{is_select_all_query, QueryContext};
use super::result_set::ResultSet;
use super::schema::{KeyspaceDef, ResultSchema, Row, TableSchema};
use crate::config::ConnectionConfig;
use crate::error::{ProtocolError, ProtocolResult};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lazy, forward-only sequence of wire rows
pub type RowStream = Box<dyn Iterator<Item = ProtocolResult<Row>> + Send>;

/// Raw outcome of one statement as reported by the executor
pub enum QueryResult {
    Rows {
        rows: RowStream,
        schema: Option<ResultSchema>,
    },
    /// Number of affected rows
    Int(i32),
    Void,
}

impl QueryResult {
    /// Rows already held in memory, without per-result type hints.
    pub fn rows(rows: Vec<Row>) -> Self {
        QueryResult::Rows {
            rows: Box::new(rows.into_iter().map(Ok)),
            schema: None,
        }
    }

    pub fn rows_with_schema(rows: Vec<Row>, schema: ResultSchema) -> Self {
        QueryResult::Rows {
            rows: Box::new(rows.into_iter().map(Ok)),
            schema: Some(schema),
        }
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows { schema, .. } => f
                .debug_struct("Rows")
                .field("schema", schema)
                .finish_non_exhaustive(),
            QueryResult::Int(n) => f.debug_tuple("Int").field(n).finish(),
            QueryResult::Void => f.write_str("Void"),
        }
    }
}

/// Transport-side collaborator that talks to the cluster.
///
/// Implementations report remote failures with the connectivity variants of
/// [`ProtocolError`]; a rejected statement is [`ProtocolError::InvalidRequest`].
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, query: &str, keyspace: &str) -> ProtocolResult<QueryResult>;

    /// Full keyspace catalog.
    fn describe_keyspaces(&self) -> ProtocolResult<Vec<KeyspaceDef>>;

    fn describe_keyspace(&self, name: &str) -> ProtocolResult<KeyspaceDef>;

    fn set_keyspace(&self, name: &str) -> ProtocolResult<()>;
}

/// What an executed statement produced
#[derive(Debug)]
pub enum StatementOutcome {
    Rows(ResultSet),
    UpdateCount(i32),
}

pub struct Session {
    config: ConnectionConfig,
    executor: Arc<dyn QueryExecutor>,
    decoder: Arc<ColumnDecoder>,
    keyspace: String,
    max_rows: u32,
    closed: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("keyspace", &self.keyspace)
            .field("max_rows", &self.max_rows)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Load the keyspace catalog and switch to the configured keyspace.
    pub fn connect(config: ConnectionConfig, executor: Arc<dyn QueryExecutor>) -> ProtocolResult<Self> {
        config.validate()?;

        let catalog = executor.describe_keyspaces()?;
        let decoder = Arc::new(ColumnDecoder::new(&catalog));
        executor.set_keyspace(&config.keyspace)?;

        info!(
            host = %config.host,
            port = config.port,
            keyspace = %config.keyspace,
            struct_result_set = config.struct_result_set,
            "Session connected"
        );

        Ok(Self {
            keyspace: config.keyspace.clone(),
            max_rows: config.max_rows,
            config,
            executor,
            decoder,
            closed: false,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Keyspace subsequent statements run against.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn decoder(&self) -> Arc<ColumnDecoder> {
        Arc::clone(&self.decoder)
    }

    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    /// Row limit appended to plain selects; 0 disables it.
    pub fn set_max_rows(&mut self, max_rows: u32) {
        self.max_rows = max_rows;
    }

    /// Run one statement.
    ///
    /// The keyspace is first updated from the statement text, then the row
    /// limit is applied. Rejections from the cluster carry the statement as
    /// it was passed in.
    pub fn execute(&mut self, cql: &str) -> ProtocolResult<StatementOutcome> {
        self.check_open()?;

        let context = QueryContext::derive(cql, &self.keyspace, self.max_rows);
        if context.keyspace != self.keyspace {
            debug!(from = %self.keyspace, to = %context.keyspace, "Statement changed keyspace");
            self.keyspace = context.keyspace.clone();
        }

        let query = context.rewrite(cql);
        if query.len() != cql.len() {
            debug!(limit = context.max_rows, "Row limit appended to statement");
        }

        let result = self
            .executor
            .execute(&query, &self.keyspace)
            .map_err(|err| match err {
                ProtocolError::InvalidRequest { why, .. } => ProtocolError::InvalidRequest {
                    why,
                    query: cql.to_string(),
                },
                other => other,
            })?;

        match result {
            QueryResult::Rows { rows, schema } => {
                let table_schema = context
                    .table
                    .as_deref()
                    .and_then(|table| self.table_metadata(&context.keyspace, table));
                let mode = if self.config.struct_result_set
                    && table_schema.is_some()
                    && is_select_all_query(cql)
                {
                    DecodeMode::Struct
                } else {
                    DecodeMode::Plain
                };
                debug!(keyspace = %context.keyspace, table = ?context.table, ?mode, "Statement returned rows");
                Ok(StatementOutcome::Rows(ResultSet::new(
                    rows,
                    schema,
                    context.keyspace,
                    context.table,
                    table_schema,
                    mode,
                )))
            }
            QueryResult::Int(count) => Ok(StatementOutcome::UpdateCount(count)),
            QueryResult::Void => Ok(StatementOutcome::UpdateCount(0)),
        }
    }

    /// Table definition from the decoder, or from the executor in struct mode.
    fn table_metadata(&self, keyspace: &str, table: &str) -> Option<Arc<TableSchema>> {
        if let Some(schema) = self.decoder.table(keyspace, table) {
            return Some(schema);
        }
        if !self.config.struct_result_set {
            return None;
        }
        match self.executor.describe_keyspace(keyspace) {
            Ok(def) => def.table(table).map(|schema| {
                let mut schema = schema.clone();
                schema.keyspace = def.name.clone();
                Arc::new(schema)
            }),
            Err(err) => {
                warn!(%keyspace, %table, error = %err, "Can't read table meta information");
                None
            }
        }
    }

    /// Run a statement that must produce rows.
    pub fn execute_query(&mut self, cql: &str) -> ProtocolResult<ResultSet> {
        match self.execute(cql)? {
            StatementOutcome::Rows(rows) => Ok(rows),
            StatementOutcome::UpdateCount(_) => Err(ProtocolError::NoResultSet),
        }
    }

    /// Run a statement that must not produce rows.
    pub fn execute_update(&mut self, cql: &str) -> ProtocolResult<i32> {
        match self.execute(cql)? {
            StatementOutcome::UpdateCount(count) => Ok(count),
            StatementOutcome::Rows(_) => Err(ProtocolError::NoUpdateCount),
        }
    }

    /// Reload the keyspace catalog into the decoder.
    pub fn refresh_schema(&self) -> ProtocolResult<()> {
        self.check_open()?;
        let catalog = self.executor.describe_keyspaces()?;
        self.decoder.refresh(&catalog);
        Ok(())
    }

    pub fn set_keyspace(&mut self, keyspace: &str) -> ProtocolResult<()> {
        self.check_open()?;
        self.executor.set_keyspace(keyspace)?;
        debug!(from = %self.keyspace, to = %keyspace, "Keyspace set");
        self.keyspace = keyspace.to_string();
        Ok(())
    }

    pub fn add_batch(&mut self, _cql: &str) -> ProtocolResult<()> {
        Err(ProtocolError::not_supported("this batch in Statement"))
    }

    pub fn execute_batch(&mut self) -> ProtocolResult<Vec<i32>> {
        Err(ProtocolError::not_supported("this batch in Statement"))
    }

    pub fn generated_keys(&self) -> ProtocolResult<ResultSet> {
        Err(ProtocolError::not_supported("returning generated  keys"))
    }

    /// Always true; the store has no transactions.
    pub fn auto_commit(&self) -> bool {
        true
    }

    pub fn commit(&mut self) -> ProtocolResult<()> {
        Err(no_transactions())
    }

    pub fn rollback(&mut self) -> ProtocolResult<()> {
        Err(no_transactions())
    }

    pub fn close(&mut self) {
        if !self.closed {
            debug!(keyspace = %self.keyspace, "Session closed");
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> ProtocolResult<()> {
        if self.closed {
            return Err(ProtocolError::Closed(
                "method was called on a closed Connection".to_string(),
            ));
        }
        Ok(())
    }
}

fn no_transactions() -> ProtocolError {
    ProtocolError::Unsupported("the Cassandra implementation does not support transactions".to_string())
}
