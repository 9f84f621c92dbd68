//! Connection configuration
//!
//! A [`ConnectionConfig`] can be built three ways: from a connection URL of the
//! form `jdbc:jkiss:cassandra://host[:port][/keyspace][?version=X]`, from a
//! flat property map using the `PROP_*` names, or from a TOML document.

pub mod defaults;

pub use defaults::*;

use crate::error::{ProtocolError, ProtocolResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

const HOST_IN_URL: &str =
    "Connection url must specify a host, e.g., jdbc:jkiss:cassandra://localhost:9170/Keyspace1";
const URI_IS_SIMPLE: &str = "Connection url may only include host, port, and keyspace and version option, e.g., jdbc:jkiss:cassandra://localhost:9170/Keyspace1?version=2.0.0";
const NOT_OPTION: &str = "Connection url only support the 'version' option";
const URL_SCHEME: &str = "cassandra";

static KEYSPACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[a-zA-Z][0-9A-Za-z_]+\z").expect("keyspace name pattern"));

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set
    pub level: String,
    /// Emit target module paths
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            with_target: false,
        }
    }
}

/// Everything needed to open a session against one store endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub keyspace: String,
    pub cql_version: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Reshape `SELECT *` rows into key, declared columns and a trailing `ROW` column
    pub struct_result_set: bool,
    /// Row cap appended to plain selects; 0 means unlimited
    pub max_rows: u32,
    pub logging: LoggingConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            keyspace: DEFAULT_KEYSPACE.to_string(),
            cql_version: None,
            user: None,
            password: None,
            struct_result_set: false,
            max_rows: DEFAULT_MAX_ROWS,
            logging: LoggingConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Parse a connection URL.
    ///
    /// The text after the `jdbc:jkiss:cassandra:` prefix is parsed as a URL
    /// under a throwaway scheme, then host, port, path and query are read off it.
    pub fn from_url(url: &str) -> ProtocolResult<Self> {
        let rest = url.strip_prefix(PROTOCOL).ok_or_else(|| {
            ProtocolError::Config(format!("url must start with '{PROTOCOL}': {url}"))
        })?;
        if !rest.starts_with("//") {
            return Err(ProtocolError::Config(HOST_IN_URL.to_string()));
        }
        let parsed = Url::parse(&format!("{URL_SCHEME}:{rest}")).map_err(|e| {
            ProtocolError::Config(format!("invalid connection url '{url}': {e}"))
        })?;

        let mut config = Self::default();

        config.host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(ProtocolError::Config(HOST_IN_URL.to_string())),
        };
        config.port = parsed.port().unwrap_or(DEFAULT_PORT);

        let path = parsed.path();
        let keyspace = path.strip_prefix('/').unwrap_or(path);
        if !keyspace.is_empty() {
            if !KEYSPACE_NAME.is_match(keyspace) {
                return Err(ProtocolError::Config(format!(
                    "Keyspace names must be composed of alphanumerics and underscores (parsed: '{keyspace}')"
                )));
            }
            config.keyspace = keyspace.to_string();
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(ProtocolError::Config(URI_IS_SIMPLE.to_string()));
        }

        if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
            if query.split('&').count() != 1 {
                return Err(ProtocolError::Config(URI_IS_SIMPLE.to_string()));
            }
            let option: Vec<&str> = query.split('=').collect();
            if !option[0].eq_ignore_ascii_case("version") || option.len() != 2 {
                return Err(ProtocolError::Config(NOT_OPTION.to_string()));
            }
            config.cql_version = Some(option[1].to_string());
        }

        Ok(config)
    }

    /// Rebuild the connection URL for this configuration.
    pub fn to_url(&self) -> String {
        let mut url = format!("{PROTOCOL}//{}:{}/{}", self.host, self.port, self.keyspace);
        if let Some(version) = &self.cql_version {
            url.push_str("?version=");
            url.push_str(version);
        }
        url
    }

    /// Overlay connection properties by their well-known names.
    ///
    /// Unknown names are ignored. A malformed port or flag is an error.
    pub fn apply_properties(&mut self, props: &HashMap<String, String>) -> ProtocolResult<()> {
        for (name, value) in props {
            match name.as_str() {
                PROP_USER => self.user = Some(value.clone()),
                PROP_PASSWORD => self.password = Some(value.clone()),
                PROP_DATABASE_NAME => self.keyspace = value.clone(),
                PROP_SERVER_NAME => self.host = value.clone(),
                PROP_PORT_NUMBER => {
                    self.port = value.parse().map_err(|_| {
                        ProtocolError::Config(format!("invalid {PROP_PORT_NUMBER}: {value}"))
                    })?
                }
                PROP_CQL_VERSION | PROP_ACTIVE_CQL_VERSION => {
                    self.cql_version = Some(value.clone())
                }
                PROP_STRUCT_RESULT_SET => {
                    self.struct_result_set = value.parse().map_err(|_| {
                        ProtocolError::Config(format!("invalid {PROP_STRUCT_RESULT_SET}: {value}"))
                    })?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Flatten into the property map form.
    pub fn to_properties(&self) -> HashMap<String, String> {
        let mut props = HashMap::new();
        props.insert(PROP_SERVER_NAME.to_string(), self.host.clone());
        props.insert(PROP_PORT_NUMBER.to_string(), self.port.to_string());
        props.insert(PROP_DATABASE_NAME.to_string(), self.keyspace.clone());
        props.insert(
            PROP_STRUCT_RESULT_SET.to_string(),
            self.struct_result_set.to_string(),
        );
        if let Some(version) = &self.cql_version {
            props.insert(PROP_CQL_VERSION.to_string(), version.clone());
        }
        if let Some(user) = &self.user {
            props.insert(PROP_USER.to_string(), user.clone());
        }
        if let Some(password) = &self.password {
            props.insert(PROP_PASSWORD.to_string(), password.clone());
        }
        props
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> ProtocolResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ProtocolResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> ProtocolResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.host.is_empty() {
            return Err(ProtocolError::Config(
                "a 'host' name is required to build a Connection".to_string(),
            ));
        }
        if !KEYSPACE_NAME.is_match(&self.keyspace) {
            return Err(ProtocolError::Config(format!(
                "Keyspace names must be composed of alphanumerics and underscores (parsed: '{}')",
                self.keyspace
            )));
        }
        Ok(())
    }
}
