use serde_json::Value;

use super::model::{TransactionalCredentials, TransactionalWarehouseModel};
use crate::error::ProviderError;

/// Format of the identifier accepted by import.
pub const IMPORT_ID_FORMAT: &str = "<warehouse_uuid>,<connection_uuid>,<data_collector_uuid>";

/// Build the partial state of an imported warehouse.
///
/// Only the three identifiers are known; the following read fills in the name and
/// marks the credentials as unknown remote values once it sees them.
pub fn import_state(id: &str) -> Result<Value, ProviderError> {
    let parts: Vec<&str> = id.split(',').collect();
    let [warehouse_uuid, connection_uuid, collector_uuid] = parts.as_slice() else {
        return Err(unexpected_id(id));
    };
    if parts.iter().any(|part| part.is_empty()) {
        return Err(unexpected_id(id));
    }

    TransactionalWarehouseModel {
        uuid: Some(warehouse_uuid.to_string()),
        collector_uuid: Some(collector_uuid.to_string()),
        credentials: TransactionalCredentials {
            connection_uuid: Some(connection_uuid.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
    .to_state()
}

fn unexpected_id(id: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!(
        "Unexpected Import Identifier: expected {}, got: {}",
        IMPORT_ID_FORMAT, id
    ))
}
