use serde_json::Value;
use tracing::debug;

use super::model::{TransactionalWarehouseModel, TransactionalWarehouseModelV0};
use super::SCHEMA_VERSION;
use crate::error::ProviderError;

/// Upgrade persisted state written at `version` to the current schema.
///
/// Version 0 kept the connection id at the top level and the credentials in a
/// `configuration` block. State that already has the current layout is returned
/// untouched.
pub fn upgrade_state(version: i64, state: Value) -> Result<Value, ProviderError> {
    match version {
        SCHEMA_VERSION => Ok(state),
        0 if state.is_null() || has_current_layout(&state) => Ok(state),
        0 => {
            let prior: TransactionalWarehouseModelV0 = serde_json::from_value(state)?;
            debug!(uuid = ?prior.uuid, "Upgrading warehouse state from version 0");
            TransactionalWarehouseModel::from(prior).to_state()
        },
        other => Err(ProviderError::Unimplemented(format!(
            "no state upgrade from schema version {} to {}",
            other, SCHEMA_VERSION
        ))),
    }
}

fn has_current_layout(state: &Value) -> bool {
    state.get("credentials").is_some() && state.get("configuration").is_none()
}
