//! Wire types of the GraphQL operations, named after the API's fields.

use serde::{Deserialize, Deserializer, Serialize};

/// Request body sent to the GraphQL endpoint.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

/// Raw GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

impl<T> GraphqlResponse<T> {
    /// Error messages carried by the response.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

// getWarehouse

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWarehouseData {
    pub get_warehouse: Option<Warehouse>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: Vec<Connection>,
    /// A null collector decodes to an empty id, which never matches a configured one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_collector: DataCollector,
}

impl Warehouse {
    /// Find a connection bound to this warehouse by its id.
    pub fn connection(&self, uuid: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.uuid == uuid)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub connection_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl Connection {
    /// Timestamp of the last credential change, falling back to creation time.
    pub fn last_updated(&self) -> &str {
        match self.updated_on.as_deref() {
            Some(updated) if !updated.is_empty() => updated,
            _ => &self.created_on,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DataCollector {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,
}

// setWarehouseName

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWarehouseNameVariables<'a> {
    pub dw_id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWarehouseNameData {
    pub set_warehouse_name: Option<SetWarehouseNamePayload>,
}

#[derive(Debug, Deserialize)]
pub struct SetWarehouseNamePayload {
    pub warehouse: Option<WarehouseRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WarehouseRef {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
}

// testDatabaseCredentials

/// Credentials submitted for validation before they are stored.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsTest {
    pub connection_type: String,
    pub db_type: String,
    pub host: String,
    pub port: i64,
    pub db_name: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsTest")
            .field("connection_type", &self.connection_type)
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("user", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCredentialsData {
    pub test_database_credentials: Option<CredentialsTestResult>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CredentialsTestResult {
    #[serde(default)]
    pub key: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub warnings: Vec<DatabaseTestDiagnostic>,
    #[serde(default)]
    pub validations: Vec<DatabaseTestDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseTestDiagnostic {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

// addConnection

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddConnectionRequest {
    pub key: String,
    pub connection_type: String,
    pub dc_id: Option<String>,
    pub dw_id: Option<String>,
    pub name: Option<String>,
    pub create_warehouse_type: Option<String>,
}

impl std::fmt::Debug for AddConnectionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddConnectionRequest")
            .field("key", &"[REDACTED]")
            .field("connection_type", &self.connection_type)
            .field("dc_id", &self.dc_id)
            .field("dw_id", &self.dw_id)
            .field("name", &self.name)
            .field("create_warehouse_type", &self.create_warehouse_type)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddConnectionData {
    pub add_connection: Option<AddConnectionPayload>,
}

#[derive(Debug, Deserialize)]
pub struct AddConnectionPayload {
    pub connection: Option<AddedConnection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedConnection {
    pub uuid: String,
    #[serde(default)]
    pub created_on: String,
    pub warehouse: WarehouseRef,
}

// updateCredentialsV2

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialsVariables<'a> {
    pub connection_id: &'a str,
    pub temp_credentials_key: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialsData {
    pub update_credentials_v2: Option<UpdatedCredentials>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedCredentials {
    pub success: bool,
    #[serde(default)]
    pub updated_at: String,
}

// removeConnection

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveConnectionVariables<'a> {
    pub connection_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveConnectionData {
    pub remove_connection: Option<RemoveConnectionPayload>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveConnectionPayload {
    pub success: bool,
}

/// Decode a JSON `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
