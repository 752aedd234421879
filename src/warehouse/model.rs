//! State models of the transactional warehouse resource.
//!
//! Every attribute is optional: imported state only carries the three ids, and
//! computed values stay null until the platform reports them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::types::{null_as_default, CredentialsTest};
use crate::client::TRANSACTIONAL_CONNECTION_TYPE;
use crate::error::ProviderError;

/// Placeholder written over credential strings once they drift remotely.
pub const UNKNOWN_REMOTE_VALUE: &str = "(unknown remote value)";

/// Placeholder written over the port once credentials drift remotely.
pub const UNKNOWN_REMOTE_PORT: i64 = -1;

/// Database engines a transactional warehouse can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbType {
    /// PostgreSQL.
    #[serde(rename = "POSTGRES")]
    Postgres,
    /// MySQL.
    #[serde(rename = "MYSQL")]
    Mysql,
    /// Microsoft SQL Server.
    #[serde(rename = "SQL-SERVER")]
    SqlServer,
}

impl DbType {
    /// Accepted configuration values.
    pub const VALUES: [&'static str; 3] = ["POSTGRES", "MYSQL", "SQL-SERVER"];

    /// Configuration spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "POSTGRES",
            Self::Mysql => "MYSQL",
            Self::SqlServer => "SQL-SERVER",
        }
    }

    /// Spelling expected by the credentials test.
    pub fn api_name(&self) -> String {
        self.as_str().to_lowercase()
    }
}

/// Current (version 1) state of the resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionalWarehouseModel {
    /// Warehouse id assigned by the platform.
    #[serde(default)]
    pub uuid: Option<String>,
    /// Display name of the warehouse.
    #[serde(default)]
    pub name: Option<String>,
    /// Database engine behind the connection.
    #[serde(default)]
    pub db_type: Option<DbType>,
    /// Data collector the warehouse belongs to.
    #[serde(default)]
    pub collector_uuid: Option<String>,
    /// Connection credentials.
    #[serde(default, deserialize_with = "null_as_default")]
    pub credentials: TransactionalCredentials,
    /// Refuse deletes while set. Null counts as set.
    #[serde(default)]
    pub deletion_protection: Option<bool>,
}

/// Connection credentials nested under `credentials`.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionalCredentials {
    /// Connection id assigned by the platform.
    #[serde(default)]
    pub connection_uuid: Option<String>,
    /// Database host.
    #[serde(default)]
    pub host: Option<String>,
    /// Database port.
    #[serde(default)]
    pub port: Option<i64>,
    /// Database name.
    #[serde(default)]
    pub database: Option<String>,
    /// Login user.
    #[serde(default)]
    pub username: Option<String>,
    /// Login password.
    #[serde(default)]
    pub password: Option<String>,
    /// Last credential change reported by the platform.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TransactionalCredentials {
    /// Overwrite every credential value with the drift placeholder.
    pub fn mark_unknown(&mut self) {
        self.host = Some(UNKNOWN_REMOTE_VALUE.to_string());
        self.port = Some(UNKNOWN_REMOTE_PORT);
        self.database = Some(UNKNOWN_REMOTE_VALUE.to_string());
        self.username = Some(UNKNOWN_REMOTE_VALUE.to_string());
        self.password = Some(UNKNOWN_REMOTE_VALUE.to_string());
    }
}

impl std::fmt::Debug for TransactionalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionalCredentials")
            .field("connection_uuid", &self.connection_uuid)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl TransactionalWarehouseModel {
    /// Decode host-provided state or plan.
    pub fn from_state(state: &Value) -> Result<Self, ProviderError> {
        Ok(serde_json::from_value(state.clone())?)
    }

    /// Encode for the host.
    pub fn to_state(&self) -> Result<Value, ProviderError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deletion protection, treating an unset flag as enabled.
    pub fn is_deletion_protected(&self) -> bool {
        self.deletion_protection.unwrap_or(true)
    }

    /// The warehouse id, which must be known.
    pub fn require_uuid(&self) -> Result<&str, ProviderError> {
        require(&self.uuid, "uuid")
    }

    /// The owning collector id, which must be known.
    pub fn require_collector_uuid(&self) -> Result<&str, ProviderError> {
        require(&self.collector_uuid, "collector_uuid")
    }

    /// The connection id, which must be known.
    pub fn require_connection_uuid(&self) -> Result<&str, ProviderError> {
        require(&self.credentials.connection_uuid, "credentials.connection_uuid")
    }

    /// Build the credentials test request from configured values.
    pub fn credentials_test(&self) -> Result<CredentialsTest, ProviderError> {
        let db_type = self
            .db_type
            .ok_or_else(|| missing("db_type"))?;
        let credentials = &self.credentials;
        Ok(CredentialsTest {
            connection_type: TRANSACTIONAL_CONNECTION_TYPE.to_string(),
            db_type: db_type.api_name(),
            host: require(&credentials.host, "credentials.host")?.to_string(),
            port: credentials.port.ok_or_else(|| missing("credentials.port"))?,
            db_name: require(&credentials.database, "credentials.database")?.to_string(),
            user: require(&credentials.username, "credentials.username")?.to_string(),
            password: require(&credentials.password, "credentials.password")?.to_string(),
        })
    }
}

/// Version 0 state: credentials lived in a flat `configuration` block and the
/// connection id sat at the top level.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TransactionalWarehouseModelV0 {
    /// Warehouse id.
    #[serde(default)]
    pub uuid: Option<String>,
    /// Connection id, later moved under `credentials`.
    #[serde(default)]
    pub connection_uuid: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Database engine.
    #[serde(default)]
    pub db_type: Option<DbType>,
    /// Owning data collector.
    #[serde(default)]
    pub collector_uuid: Option<String>,
    /// Flat credentials block.
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration: ConfigurationV0,
    /// Delete guard.
    #[serde(default)]
    pub deletion_protection: Option<bool>,
}

/// The version 0 `configuration` block.
#[derive(Clone, PartialEq, Default, Deserialize)]
pub struct ConfigurationV0 {
    /// Database host.
    #[serde(default)]
    pub host: Option<String>,
    /// Database port.
    #[serde(default)]
    pub port: Option<i64>,
    /// Database name.
    #[serde(default)]
    pub database: Option<String>,
    /// Login user.
    #[serde(default)]
    pub username: Option<String>,
    /// Login password.
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for ConfigurationV0 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationV0")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl From<TransactionalWarehouseModelV0> for TransactionalWarehouseModel {
    fn from(prior: TransactionalWarehouseModelV0) -> Self {
        let configuration = prior.configuration;
        Self {
            uuid: prior.uuid,
            name: prior.name,
            db_type: prior.db_type,
            collector_uuid: prior.collector_uuid,
            credentials: TransactionalCredentials {
                connection_uuid: prior.connection_uuid,
                host: configuration.host,
                port: configuration.port,
                database: configuration.database,
                username: configuration.username,
                password: configuration.password,
                updated_at: None,
            },
            deletion_protection: prior.deletion_protection,
        }
    }
}

fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, ProviderError> {
    field
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(name))
}

fn missing(name: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!("attribute '{}' must be known", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_state() -> Value {
        json!({
            "uuid": "wh-1",
            "name": "orders",
            "db_type": "SQL-SERVER",
            "collector_uuid": "dc-1",
            "credentials": {
                "connection_uuid": "conn-1",
                "host": "db.internal",
                "port": 1433,
                "database": "orders",
                "username": "reader",
                "password": "hunter2",
                "updated_at": "2024-01-01T00:00:00Z"
            },
            "deletion_protection": false
        })
    }

    #[test]
    fn test_state_roundtrip_keeps_nulls() {
        let model = TransactionalWarehouseModel::from_state(&full_state()).unwrap();
        assert_eq!(model.db_type, Some(DbType::SqlServer));
        assert_eq!(model.to_state().unwrap(), full_state());

        let sparse = TransactionalWarehouseModel::default().to_state().unwrap();
        assert!(sparse["uuid"].is_null());
        assert!(sparse["credentials"]["updated_at"].is_null());
    }

    #[test]
    fn test_null_credentials_block() {
        let model =
            TransactionalWarehouseModel::from_state(&json!({"uuid": "wh-1", "credentials": null}))
                .unwrap();
        assert_eq!(model.credentials, TransactionalCredentials::default());
    }

    #[test]
    fn test_invalid_db_type_is_serialization_error() {
        let err = TransactionalWarehouseModel::from_state(&json!({"db_type": "ORACLE"})).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_deletion_protection_defaults_to_enabled() {
        let mut model = TransactionalWarehouseModel::default();
        assert!(model.is_deletion_protected());
        model.deletion_protection = Some(false);
        assert!(!model.is_deletion_protected());
    }

    #[test]
    fn test_credentials_test_request() {
        let model = TransactionalWarehouseModel::from_state(&full_state()).unwrap();
        let test = model.credentials_test().unwrap();
        assert_eq!(test.connection_type, "transactional-db");
        assert_eq!(test.db_type, "sql-server");
        assert_eq!(test.port, 1433);
        assert_eq!(test.db_name, "orders");

        let mut incomplete = model.clone();
        incomplete.credentials.password = None;
        let err = incomplete.credentials_test().unwrap_err();
        assert!(err.to_string().contains("credentials.password"));
    }

    #[test]
    fn test_mark_unknown() {
        let mut credentials = TransactionalWarehouseModel::from_state(&full_state())
            .unwrap()
            .credentials;
        credentials.mark_unknown();
        assert_eq!(credentials.host.as_deref(), Some(UNKNOWN_REMOTE_VALUE));
        assert_eq!(credentials.port, Some(UNKNOWN_REMOTE_PORT));
        assert_eq!(credentials.password.as_deref(), Some(UNKNOWN_REMOTE_VALUE));
        assert_eq!(credentials.connection_uuid.as_deref(), Some("conn-1"));
        assert_eq!(
            credentials.updated_at.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let model = TransactionalWarehouseModel::from_state(&full_state()).unwrap();
        let debug = format!("{:?}", model);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("reader"));
        assert!(debug.contains("db.internal"));
    }

    #[test]
    fn test_require_rejects_empty() {
        let model = TransactionalWarehouseModel {
            uuid: Some(String::new()),
            ..Default::default()
        };
        assert!(model.require_uuid().is_err());
    }
}
