//! The provider lifecycle contract and its warehouse implementation.
//!
//! [`ProviderService`] is the surface the host drives: schema and metadata,
//! provider configuration, then per-resource validate, upgrade, plan, create, read,
//! update, delete and import. [`WarehouseProvider`] implements it for the
//! transactional warehouse resource, dispatching on the resource type name.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{GraphqlClient, WarehouseApi};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, StateResponse};
use crate::validation::validate;
use crate::warehouse::{self, TransactionalWarehouseResource};

/// Provider type name the resource type is derived from.
pub const DEFAULT_PROVIDER_TYPE_NAME: &str = "montecarlo";

/// Operations a provider exposes to its host.
///
/// # Example
///
/// ```ignore
/// use warehouse_provider::{ProviderService, WarehouseProvider};
/// use serde_json::json;
///
/// let provider = WarehouseProvider::new();
/// provider.configure(json!({"api_key_id": "id", "api_key_token": "token"})).await?;
/// let imported = provider
///     .import_resource("montecarlo_transactional_warehouse", "wh,conn,dc")
///     .await?;
/// ```
#[async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Schema of the provider block and every resource.
    fn schema(&self) -> ProviderSchema;

    /// Resource type names, derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> = self.schema().resources.keys().cloned().collect();
        resources.sort();
        ProviderMetadata { resources }
    }

    /// Validate the provider block before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state written by an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource. A null proposal plans a delete.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource from its planned state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<StateResponse, ProviderError>;

    /// Refresh a resource. A response without state removes it.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<StateResponse, ProviderError>;

    /// Update a resource in place.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<StateResponse, ProviderError>;

    /// Delete a resource, returning any warnings.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Import existing infrastructure by identifier.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// Provider serving the transactional warehouse resource.
pub struct WarehouseProvider {
    type_name: String,
    api: RwLock<Option<Arc<dyn WarehouseApi>>>,
}

impl WarehouseProvider {
    /// An unconfigured provider named [`DEFAULT_PROVIDER_TYPE_NAME`].
    pub fn new() -> Self {
        Self::with_type_name(DEFAULT_PROVIDER_TYPE_NAME)
    }

    /// An unconfigured provider registered under another type name.
    pub fn with_type_name(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            api: RwLock::new(None),
        }
    }

    /// A provider already bound to an API implementation.
    pub fn with_api(api: Arc<dyn WarehouseApi>) -> Self {
        Self {
            type_name: DEFAULT_PROVIDER_TYPE_NAME.to_string(),
            api: RwLock::new(Some(api)),
        }
    }

    /// Full type name of the transactional warehouse resource.
    pub fn resource_type(&self) -> String {
        warehouse::resource_type_name(&self.type_name)
    }

    fn check_resource_type(&self, resource_type: &str) -> Result<(), ProviderError> {
        if resource_type == self.resource_type() {
            Ok(())
        } else {
            Err(ProviderError::UnknownResource(resource_type.to_string()))
        }
    }

    async fn resource(&self, resource_type: &str) -> Result<TransactionalWarehouseResource, ProviderError> {
        self.check_resource_type(resource_type)?;
        let api = self.api.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider must be configured before managing resources".to_string())
        })?;
        Ok(TransactionalWarehouseResource::new(api))
    }
}

impl Default for WarehouseProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WarehouseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseProvider")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderService for WarehouseProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(self.resource_type(), warehouse::resource_schema())
    }

    #[instrument(skip_all, name = "provider.validate_provider_config")]
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("ValidateProviderConfig called");
        let mut diagnostics = validate(&ProviderConfig::schema(), &config);
        if diagnostics.is_empty() {
            diagnostics = ProviderConfig::from_value(config)?.with_env_fallback().validate();
        }
        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "ValidateProviderConfig completed with errors");
        } else {
            info!("ValidateProviderConfig completed successfully");
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all, name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("Configure called");
        let config = ProviderConfig::from_value(config)?.with_env_fallback();
        let diagnostics = config.validate();
        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
            return Ok(diagnostics);
        }

        let client = GraphqlClient::from_config(&config).map_err(|e| {
            error!(error = %e, "Configure failed");
            ProviderError::Configuration(e.to_string())
        })?;
        info!(endpoint = %client.endpoint(), "Configure completed successfully");
        *self.api.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    #[instrument(skip(self, config))]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("ValidateResourceConfig called");
        self.check_resource_type(resource_type)?;

        let mut diagnostics = validate(&warehouse::resource_schema(), &config);
        if let Some(port) = config.pointer("/credentials/port").and_then(Value::as_i64) {
            if !(1..=65535).contains(&port) {
                diagnostics.push(
                    Diagnostic::error("Invalid port")
                        .with_detail(format!("Port must be between 1 and 65535, got {}", port))
                        .with_attribute("credentials.port"),
                );
            }
        }

        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "ValidateResourceConfig completed with errors");
        } else {
            info!("ValidateResourceConfig completed successfully");
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, state))]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        debug!("UpgradeResourceState called");
        self.check_resource_type(resource_type)?;
        let upgraded = warehouse::upgrade_state(version, state).inspect_err(|e| {
            error!(error = %e, "UpgradeResourceState failed");
        })?;
        info!(from_version = version, to_version = warehouse::SCHEMA_VERSION, "UpgradeResourceState completed");
        Ok(upgraded)
    }

    #[instrument(skip(self, prior_state, proposed_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        debug!(has_prior_state = prior_state.is_some(), "Plan called");
        self.check_resource_type(resource_type)?;
        let result = warehouse::plan(prior_state.as_ref(), &proposed_state, &config).inspect_err(|e| {
            error!(error = %e, "Plan failed");
        })?;
        info!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "Plan completed"
        );
        Ok(result)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<StateResponse, ProviderError> {
        debug!("Create called");
        let response = self
            .resource(resource_type)
            .await?
            .create(&planned_state)
            .await
            .inspect_err(|e| error!(error = %e, "Create failed"))?;
        info!("Create completed");
        Ok(response)
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<StateResponse, ProviderError> {
        debug!("Read called");
        let response = self
            .resource(resource_type)
            .await?
            .read(&current_state)
            .await
            .inspect_err(|e| error!(error = %e, "Read failed"))?;
        if response.is_removed() {
            warn!(diagnostics = response.diagnostics.len(), "Read removed resource from state");
        } else {
            info!("Read completed");
        }
        Ok(response)
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<StateResponse, ProviderError> {
        debug!(prior_uuid = ?prior_state.get("uuid"), "Update called");
        let response = self
            .resource(resource_type)
            .await?
            .update(&planned_state)
            .await
            .inspect_err(|e| error!(error = %e, "Update failed"))?;
        info!("Update completed");
        Ok(response)
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!("Delete called");
        let diagnostics = self
            .resource(resource_type)
            .await?
            .delete(&current_state)
            .await
            .inspect_err(|e| error!(error = %e, "Delete failed"))?;
        if diagnostics.is_empty() {
            info!("Delete completed");
        } else {
            warn!(diagnostics = diagnostics.len(), "Delete completed with warnings");
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        debug!("ImportResourceState called");
        self.check_resource_type(resource_type)?;
        let state = warehouse::import_state(id).inspect_err(|e| {
            error!(error = %e, "ImportResourceState failed");
        })?;
        info!("ImportResourceState completed");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}
