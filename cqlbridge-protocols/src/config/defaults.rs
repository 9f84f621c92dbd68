//! Default values and fixed names shared across the adapter

// ===== Connection Defaults =====

pub const PROTOCOL: &str = "jdbc:jkiss:cassandra:";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9160;
pub const DEFAULT_KEYSPACE: &str = "system";
pub const DEFAULT_MAX_ROWS: u32 = 0;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ===== Connection Property Names =====

pub const PROP_USER: &str = "user";
pub const PROP_PASSWORD: &str = "password";
pub const PROP_DATABASE_NAME: &str = "databaseName";
pub const PROP_SERVER_NAME: &str = "serverName";
pub const PROP_PORT_NUMBER: &str = "portNumber";
pub const PROP_CQL_VERSION: &str = "cqlVersion";
pub const PROP_ACTIVE_CQL_VERSION: &str = "activeCqlVersion";
pub const PROP_STRUCT_RESULT_SET: &str = "structResultSet";

// ===== Result Shape Names =====

pub const DEFAULT_KEY_ALIAS: &str = "KEY";
pub const ROW_COLUMN_NAME: &str = "ROW";
pub const ROW_TYPE_NAME: &str = "ROW";
pub const COUNT_COLUMN_NAME: &str = "count";
