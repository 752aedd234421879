//! Testing utilities for provider implementations.
//!
//! [`ProviderTester`] drives a [`ProviderService`] the way the host would, and the
//! `assert_*` helpers make plan and diagnostic expectations read well in tests.
//!
//! # Example
//!
//! ```ignore
//! use warehouse_provider::testing::ProviderTester;
//! use warehouse_provider::WarehouseProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_import() {
//!     let tester = ProviderTester::new(WarehouseProvider::new());
//!     let imported = tester
//!         .import_resource("montecarlo_transactional_warehouse", "wh,conn,dc")
//!         .await
//!         .unwrap();
//!     assert_eq!(imported[0].state["uuid"], "wh");
//! }
//! ```

use crate::error::ProviderError;
use crate::provider::ProviderService;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, StateResponse};
use serde_json::Value;

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration, failing on error diagnostics.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan a resource update where the proposal is the configuration.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<StateResponse, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<StateResponse, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<StateResponse, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource, returning its warnings.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Upgrade resource state from an older schema version.
    pub async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .upgrade_resource_state(resource_type, version, state)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run plan → create → read and return the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created = expect_state(self.create(resource_type, plan_result.planned_state).await?)?;
        expect_state(self.read(resource_type, created).await?)
    }

    /// Run plan → update → read and return the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated = expect_state(
            self.update(resource_type, prior_state, plan_result.planned_state)
                .await?,
        )?;
        expect_state(self.read(resource_type, updated).await?)
    }

    /// Run plan → delete and return the delete warnings.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        self.plan_delete(resource_type, current_state.clone()).await?;
        self.delete(resource_type, current_state).await
    }

    /// Run create → update → delete and return the state after update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;
        let updated_state = self
            .lifecycle_update(resource_type, created_state, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated_state.clone())
            .await?;
        Ok(updated_state)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation dropped the resource from state.
    Removed(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let diags = match self {
            TestError::Provider(e) => return write!(f, "Provider error: {}", e),
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                diags
            },
            TestError::Removed(diags) => {
                writeln!(f, "Resource removed from state with {} diagnostic(s):", diags.len())?;
                diags
            },
        };
        for diag in diags {
            write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
            if let Some(detail) = &diag.detail {
                write!(f, ": {}", detail)?;
            }
            if let Some(attr) = &diag.attribute {
                write!(f, " (at {})", attr)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Unwrap the state of a response, failing if the resource was removed.
pub fn expect_state(response: StateResponse) -> Result<Value, TestError> {
    match response.state {
        Some(state) => Ok(state),
        None => Err(TestError::Removed(response.diagnostics)),
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

fn summaries(diagnostics: &[Diagnostic], severity: DiagnosticSeverity) -> Vec<&str> {
    diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .map(|d| d.summary.as_str())
        .collect()
}

/// Panics unless the plan adds attributes without replacing anything.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(!plan.changes.is_empty(), "create plan has no attribute changes");
    assert!(!plan.requires_replace, "create plan was marked as a replacement");
}

/// Panics if the plan changes any attribute.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "plan should be empty, changed: {:?}",
        changed_paths(plan)
    );
}

/// Panics unless the plan destroys and recreates the resource.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "plan does not replace the resource");
}

/// Panics if the plan would replace the resource.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(!plan.requires_replace, "plan replaces the resource instead of updating it");
}

/// Panics unless `path` (dotted, e.g. `credentials.host`) is among the changes.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let paths = changed_paths(plan);
    assert!(paths.contains(&path), "'{}' is not among the changed paths {:?}", path, paths);
}

/// Panics if `path` is among the changes.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !changed_paths(plan).contains(&path),
        "'{}' should be left untouched by the plan",
        path
    );
}

/// Panics on any error diagnostic. Warnings are allowed.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors = summaries(diagnostics, DiagnosticSeverity::Error);
    assert!(errors.is_empty(), "unexpected error diagnostics: {:?}", errors);
}

/// Panics unless some error summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors = summaries(diagnostics, DiagnosticSeverity::Error);
    assert!(
        errors.iter().any(|s| s.contains(substring)),
        "no error mentions '{}', errors: {:?}",
        substring,
        errors
    );
}

/// Panics unless some warning summary contains `substring`.
pub fn assert_warning_contains(diagnostics: &[Diagnostic], substring: &str) {
    let warnings = summaries(diagnostics, DiagnosticSeverity::Warning);
    assert!(
        warnings.iter().any(|s| s.contains(substring)),
        "no warning mentions '{}', warnings: {:?}",
        substring,
        warnings
    );
}
