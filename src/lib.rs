//! Transactional warehouse provider
//!
//! This crate implements the `transactional_warehouse` resource of the Monte Carlo
//! infrastructure provider. It translates the declarative resource lifecycle into
//! fixed GraphQL operations against the platform's API.
//!
//! # Overview
//!
//! - **ProviderService trait**: the lifecycle contract the host drives
//! - **WarehouseProvider**: the implementation, dispatching on resource type
//! - **Schema types**: attributes, plan modifiers, validators and diagnostics
//! - **GraphQL client**: a thin `reqwest` client behind the [`client::WarehouseApi`] seam
//! - **Error types**: [`ProviderError`] and [`client::ClientError`]
//! - **Logging**: `tracing` spans on every operation, written to stderr
//!
//! # Quick Start
//!
//! ```ignore
//! use warehouse_provider::{init_logging, ProviderService, WarehouseProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = WarehouseProvider::new();
//!     provider
//!         .configure(json!({"api_key_id": "id", "api_key_token": "token"}))
//!         .await?;
//!
//!     let response = provider
//!         .read("montecarlo_transactional_warehouse", json!({"uuid": "..."}))
//!         .await?;
//!     if response.is_removed() {
//!         tracing::warn!("warehouse is gone");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Resource lifecycle
//!
//! - **Create**: test credentials, then `addConnection` creates the warehouse
//! - **Read**: `getWarehouse`; drift in the connection masks stored credentials
//! - **Update**: `setWarehouseName`, then test and `updateCredentialsV2`
//! - **Delete**: `removeConnection`, refused while `deletion_protection` is set
//! - **Import**: `<warehouse_uuid>,<connection_uuid>,<data_collector_uuid>`
//! - **UpgradeResourceState**: version 0 state moves into the `credentials` block

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;
pub mod warehouse;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{ProviderService, WarehouseProvider};
pub use schema::ProviderSchema;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata, StateResponse};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
