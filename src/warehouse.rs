//! The transactional warehouse resource.
//!
//! A transactional warehouse is a platform warehouse backed by a single connection
//! to a transactional database. Its lifecycle maps onto fixed GraphQL operations:
//!
//! - **create**: test the credentials, then add a connection that creates the warehouse
//! - **read**: fetch the warehouse and detect drift of the connection
//! - **update**: rename, (re)attach a connection if needed, then replace the credentials
//! - **delete**: remove the connection, unless deletion protection is on
//!
//! Import, state upgrade and planning need no remote calls and live in their own
//! submodules.

mod import;
mod model;
mod plan;
mod schema;
mod upgrade;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::types::{AddConnectionRequest, DatabaseTestDiagnostic};
use crate::client::{
    ClientError, WarehouseApi, TRANSACTIONAL_CONNECTION_TYPE, TRANSACTIONAL_CONNECTION_TYPE_RESPONSE,
    TRANSACTIONAL_WAREHOUSE_TYPE,
};
use crate::error::ProviderError;
use crate::schema::Diagnostic;
use crate::types::StateResponse;

pub use import::{import_state, IMPORT_ID_FORMAT};
pub use model::{
    DbType, TransactionalCredentials, TransactionalWarehouseModel, UNKNOWN_REMOTE_PORT,
    UNKNOWN_REMOTE_VALUE,
};
pub use plan::plan;
pub use schema::{resource_schema, CREDENTIAL_FIELDS};
pub use upgrade::upgrade_state;

/// Current schema version of the resource state.
pub const SCHEMA_VERSION: i64 = 1;

/// Suffix appended to the provider type name to form the resource type name.
pub const RESOURCE_SUFFIX: &str = "_transactional_warehouse";

/// Resource type name for a provider registered as `provider_type_name`.
pub fn resource_type_name(provider_type_name: &str) -> String {
    format!("{}{}", provider_type_name, RESOURCE_SUFFIX)
}

/// Remote lifecycle of a transactional warehouse.
#[derive(Clone)]
pub struct TransactionalWarehouseResource {
    api: Arc<dyn WarehouseApi>,
}

impl TransactionalWarehouseResource {
    /// Create a resource handler over the given API.
    pub fn new(api: Arc<dyn WarehouseApi>) -> Self {
        Self { api }
    }

    /// Test the planned credentials and create the warehouse with its connection.
    #[instrument(skip_all, fields(collector = tracing::field::Empty))]
    pub async fn create(&self, planned: &Value) -> Result<StateResponse, ProviderError> {
        let mut model = TransactionalWarehouseModel::from_state(planned)?;
        let collector_uuid = model.require_collector_uuid()?.to_string();
        tracing::Span::current().record("collector", collector_uuid.as_str());

        let key = self.test_credentials(&model).await?;
        let connection = self
            .api
            .add_connection(&AddConnectionRequest {
                key,
                connection_type: TRANSACTIONAL_CONNECTION_TYPE.to_string(),
                dc_id: Some(collector_uuid),
                dw_id: None,
                name: model.name.clone(),
                create_warehouse_type: Some(TRANSACTIONAL_WAREHOUSE_TYPE.to_string()),
            })
            .await?;

        info!(
            warehouse = %connection.warehouse.uuid,
            connection = %connection.uuid,
            "Transactional warehouse created"
        );
        model.uuid = Some(connection.warehouse.uuid);
        model.credentials.connection_uuid = Some(connection.uuid);
        model.credentials.updated_at = Some(connection.created_on);
        model.deletion_protection.get_or_insert(true);
        Ok(StateResponse::present(model.to_state()?))
    }

    /// Refresh state from the platform.
    ///
    /// The resource is dropped from state, with a diagnostic, when the warehouse is
    /// gone, was moved to another collector, or no longer carries the stored
    /// transactional connection. Credentials whose remote timestamp moved are
    /// replaced with placeholders since secrets are never read back.
    #[instrument(skip_all, fields(warehouse = tracing::field::Empty))]
    pub async fn read(&self, current: &Value) -> Result<StateResponse, ProviderError> {
        let mut model = TransactionalWarehouseModel::from_state(current)?;
        let uuid = model.require_uuid()?.to_string();
        tracing::Span::current().record("warehouse", uuid.as_str());

        let response = self.api.get_warehouse(&uuid).await?;
        let messages = response.error_messages();
        let Some(warehouse) = response.data.and_then(|data| data.get_warehouse) else {
            warn!(errors = messages.len(), "Warehouse not found remotely");
            let mut diagnostic = Diagnostic::warning(format!(
                "Warehouse '{}' was not found. It will be removed from state without deletion.",
                uuid
            ));
            if !messages.is_empty() {
                diagnostic = diagnostic.with_detail(messages.join("; "));
            }
            return Ok(StateResponse::removed(diagnostic));
        };

        let configured_collector = model.collector_uuid.as_deref().unwrap_or_default();
        if warehouse.data_collector.uuid != configured_collector {
            warn!(
                obtained = %warehouse.data_collector.uuid,
                configured = configured_collector,
                "Warehouse collector changed"
            );
            return Ok(StateResponse::removed(
                Diagnostic::warning(format!(
                    "Warehouse '{}' belongs to data collector '{}' instead of '{}'. \
                     It will be removed from state without deletion.",
                    uuid, warehouse.data_collector.uuid, configured_collector
                ))
                .with_detail("The warehouse might have been moved to another data collector."),
            ));
        }

        let connection_uuid = model.credentials.connection_uuid.clone().unwrap_or_default();
        let Some(connection) = warehouse.connection(&connection_uuid) else {
            warn!(connection = %connection_uuid, "Connection not found remotely");
            return Ok(StateResponse::removed(
                Diagnostic::warning(format!(
                    "Warehouse '{}' has no connection '{}'. It will be removed from state without deletion.",
                    uuid, connection_uuid
                ))
                .with_attribute("credentials.connection_uuid"),
            ));
        };

        if connection.connection_type != TRANSACTIONAL_CONNECTION_TYPE_RESPONSE {
            warn!(
                connection = %connection_uuid,
                connection_type = %connection.connection_type,
                "Unexpected connection type"
            );
            return Ok(StateResponse::removed(
                Diagnostic::error(format!(
                    "Warehouse '{}' connection '{}' has unexpected type '{}'",
                    uuid, connection_uuid, connection.connection_type
                ))
                .with_detail(
                    "Fix the remote connection manually or remove this resource from the configuration.",
                )
                .with_attribute("credentials.connection_uuid"),
            ));
        }

        let remote_updated_at = connection.last_updated().to_string();
        if model.credentials.updated_at.as_deref() != Some(remote_updated_at.as_str()) {
            debug!(
                stored = ?model.credentials.updated_at,
                remote = %remote_updated_at,
                "Credentials changed remotely"
            );
            model.credentials.mark_unknown();
        }
        model.credentials.updated_at = Some(remote_updated_at);
        model.name = Some(warehouse.name);

        Ok(StateResponse::present(model.to_state()?))
    }

    /// Rename the warehouse and replace its credentials.
    #[instrument(skip_all, fields(warehouse = tracing::field::Empty))]
    pub async fn update(&self, planned: &Value) -> Result<StateResponse, ProviderError> {
        let mut model = TransactionalWarehouseModel::from_state(planned)?;
        let uuid = model.require_uuid()?.to_string();
        tracing::Span::current().record("warehouse", uuid.as_str());

        let name = model
            .name
            .clone()
            .ok_or_else(|| ProviderError::InvalidRequest("attribute 'name' must be known".to_string()))?;
        self.api.set_warehouse_name(&uuid, &name).await?;
        debug!(name = %name, "Warehouse renamed");

        if model.credentials.connection_uuid.as_deref().map_or(true, str::is_empty) {
            let key = self.test_credentials(&model).await?;
            let connection = self
                .api
                .add_connection(&AddConnectionRequest {
                    key,
                    connection_type: TRANSACTIONAL_CONNECTION_TYPE.to_string(),
                    dc_id: None,
                    dw_id: Some(uuid.clone()),
                    name: None,
                    create_warehouse_type: None,
                })
                .await?;
            info!(connection = %connection.uuid, "Connection attached to existing warehouse");
            model.credentials.connection_uuid = Some(connection.uuid);
            model.credentials.updated_at = Some(connection.created_on);
        }

        let connection_uuid = model.require_connection_uuid()?.to_string();
        let key = self.test_credentials(&model).await?;
        let updated = self.api.update_credentials(&connection_uuid, &key).await?;
        if !updated.success {
            return Err(ProviderError::FailedPrecondition(format!(
                "'updateCredentialsV2' reported success = false for connection '{}'",
                connection_uuid
            )));
        }

        info!(connection = %connection_uuid, "Transactional warehouse updated");
        model.credentials.updated_at = Some(updated.updated_at);
        model.deletion_protection.get_or_insert(true);
        Ok(StateResponse::present(model.to_state()?))
    }

    /// Remove the warehouse connection.
    ///
    /// Refused while deletion protection is on (an unset flag counts as on). A
    /// removal the platform reports as unsuccessful only yields a warning.
    #[instrument(skip_all, fields(warehouse = tracing::field::Empty))]
    pub async fn delete(&self, current: &Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let model = TransactionalWarehouseModel::from_state(current)?;
        if let Some(uuid) = model.uuid.as_deref() {
            tracing::Span::current().record("warehouse", uuid);
        }

        if model.is_deletion_protected() {
            warn!("Delete refused by deletion protection");
            return Err(ProviderError::FailedPrecondition(
                "Failed to delete warehouse because deletion_protection is set to true. \
                 Set it to false to proceed with warehouse deletion"
                    .to_string(),
            ));
        }

        let connection_uuid = model.require_connection_uuid()?;
        if !self.api.remove_connection(connection_uuid).await? {
            warn!(connection = connection_uuid, "Connection removal reported failure");
            return Ok(vec![Diagnostic::warning(
                "'removeConnection' reported success = false; the connection probably no longer exists",
            )
            .with_detail("The resource is removed from state anyway.")]);
        }

        info!(connection = connection_uuid, "Transactional warehouse deleted");
        Ok(vec![])
    }

    /// Validate credentials remotely, returning the temporary credentials key.
    async fn test_credentials(&self, model: &TransactionalWarehouseModel) -> Result<String, ProviderError> {
        let request = model.credentials_test()?;
        let result = self.api.test_database_credentials(&request).await?;

        if !result.success {
            let issues: Vec<Diagnostic> = result
                .warnings
                .iter()
                .chain(result.validations.iter())
                .map(issue_diagnostic)
                .collect();
            warn!(issues = issues.len(), "Database credentials rejected");
            return Err(ProviderError::CredentialsRejected { issues });
        }

        result.key.filter(|key| !key.is_empty()).ok_or_else(|| {
            ClientError::EmptyResponse {
                operation: "testDatabaseCredentials",
            }
            .into()
        })
    }
}

fn issue_diagnostic(issue: &DatabaseTestDiagnostic) -> Diagnostic {
    Diagnostic::warning(issue.message.clone())
        .with_detail(issue.kind.clone())
        .with_attribute("credentials")
}

impl std::fmt::Debug for TransactionalWarehouseResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionalWarehouseResource").finish_non_exhaustive()
    }
}
