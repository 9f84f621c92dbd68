//! Shared fixtures for the adapter integration tests
//!
//! A scripted in-memory executor plus a small keyspace catalog.

#![allow(dead_code)]

use cqlbridge_protocols::config::ConnectionConfig;
use cqlbridge_protocols::cql::{KeyspaceDef, QueryExecutor, QueryResult, Session, TableSchema};
use cqlbridge_protocols::{ProtocolError, ProtocolResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// `Music.songs`: key `id`, declared columns `a`, `b`, `c`
pub fn songs_table() -> TableSchema {
    TableSchema::new("Music", "songs")
        .with_comparator("UTF8Type")
        .with_default_validator("UTF8Type")
        .with_key("id", "UTF8Type")
        .with_column("a", "UTF8Type")
        .with_column("b", "Int32Type")
        .with_column("c", "org.apache.cassandra.db.marshal.LongType")
}

pub fn albums_table() -> TableSchema {
    TableSchema::new("Music", "albums")
        .with_comparator("UTF8Type")
        .with_default_validator("BytesType")
        .with_column("year", "Int32Type")
}

pub fn catalog() -> Vec<KeyspaceDef> {
    vec![
        KeyspaceDef::new("system", vec![]),
        KeyspaceDef::new("Music", vec![songs_table()]),
    ]
}

pub fn config(keyspace: &str) -> ConnectionConfig {
    ConnectionConfig {
        keyspace: keyspace.to_string(),
        ..ConnectionConfig::default()
    }
}

/// Executor that replays queued responses and records every call
#[derive(Default)]
pub struct MockExecutor {
    catalog: Mutex<Vec<KeyspaceDef>>,
    responses: Mutex<VecDeque<ProtocolResult<QueryResult>>>,
    executed: Mutex<Vec<(String, String)>>,
    keyspace_switches: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new(catalog: Vec<KeyspaceDef>) -> Arc<Self> {
        Arc::new(Self {
            catalog: Mutex::new(catalog),
            ..Self::default()
        })
    }

    pub fn respond(&self, response: ProtocolResult<QueryResult>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn set_catalog(&self, catalog: Vec<KeyspaceDef>) {
        *self.catalog.lock().unwrap() = catalog;
    }

    /// `(query, keyspace)` pairs in call order
    pub fn executed(&self) -> Vec<(String, String)> {
        self.executed.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> Option<String> {
        self.executed.lock().unwrap().last().map(|(q, _)| q.clone())
    }

    pub fn keyspace_switches(&self) -> Vec<String> {
        self.keyspace_switches.lock().unwrap().clone()
    }
}

impl QueryExecutor for MockExecutor {
    fn execute(&self, query: &str, keyspace: &str) -> ProtocolResult<QueryResult> {
        self.executed
            .lock()
            .unwrap()
            .push((query.to_string(), keyspace.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(QueryResult::Void))
    }

    fn describe_keyspaces(&self) -> ProtocolResult<Vec<KeyspaceDef>> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    fn describe_keyspace(&self, name: &str) -> ProtocolResult<KeyspaceDef> {
        self.catalog
            .lock()
            .unwrap()
            .iter()
            .find(|ks| ks.name == name)
            .cloned()
            .ok_or_else(|| ProtocolError::InvalidRequest {
                why: format!("Keyspace {name} does not exist"),
                query: String::new(),
            })
    }

    fn set_keyspace(&self, name: &str) -> ProtocolResult<()> {
        self.keyspace_switches.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Session over a fresh mock loaded with [`catalog`]
pub fn connect(keyspace: &str) -> (Session, Arc<MockExecutor>) {
    let executor = MockExecutor::new(catalog());
    let session = Session::connect(config(keyspace), executor.clone()).unwrap();
    (session, executor)
}

pub fn connect_struct(keyspace: &str) -> (Session, Arc<MockExecutor>) {
    let executor = MockExecutor::new(catalog());
    let mut config = config(keyspace);
    config.struct_result_set = true;
    let session = Session::connect(config, executor.clone()).unwrap();
    (session, executor)
}
