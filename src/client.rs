//! GraphQL client for the data-observability platform.
//!
//! Only the fixed operations needed by the warehouse resource are exposed, through
//! the [`WarehouseApi`] trait. [`GraphqlClient`] implements it over HTTP.

mod error;
#[allow(missing_docs)]
pub mod queries;
#[allow(missing_docs)]
pub mod types;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub use error::ClientError;
use types::{
    AddConnectionData, AddConnectionRequest, AddedConnection, CredentialsTest,
    CredentialsTestResult, GetWarehouseData, GraphqlRequest, GraphqlResponse,
    RemoveConnectionData, RemoveConnectionVariables, SetWarehouseNameData,
    SetWarehouseNameVariables, TestCredentialsData, UpdateCredentialsData,
    UpdateCredentialsVariables, UpdatedCredentials, WarehouseRef,
};

use crate::config::ProviderConfig;

/// Connection type submitted when testing and adding transactional credentials.
pub const TRANSACTIONAL_CONNECTION_TYPE: &str = "transactional-db";

/// Connection type reported by the API for transactional connections.
pub const TRANSACTIONAL_CONNECTION_TYPE_RESPONSE: &str = "TRANSACTIONAL_DB";

/// Warehouse type requested when a connection creates a new warehouse.
pub const TRANSACTIONAL_WAREHOUSE_TYPE: &str = "transactional";

const API_KEY_ID_HEADER: &str = "x-mcd-id";
const API_KEY_TOKEN_HEADER: &str = "x-mcd-token";

/// Remote operations used by the transactional warehouse resource.
#[async_trait]
pub trait WarehouseApi: Send + Sync {
    /// Fetch a warehouse with its connections and owning collector.
    ///
    /// The raw envelope is returned: a missing warehouse may come back as
    /// `null` data, with or without GraphQL errors.
    async fn get_warehouse(
        &self,
        uuid: &str,
    ) -> Result<GraphqlResponse<GetWarehouseData>, ClientError>;

    /// Rename a warehouse.
    async fn set_warehouse_name(
        &self,
        warehouse_uuid: &str,
        name: &str,
    ) -> Result<WarehouseRef, ClientError>;

    /// Validate database credentials, yielding a temporary credentials key.
    async fn test_database_credentials(
        &self,
        test: &CredentialsTest,
    ) -> Result<CredentialsTestResult, ClientError>;

    /// Bind a tested credentials key as a new connection.
    async fn add_connection(
        &self,
        request: &AddConnectionRequest,
    ) -> Result<AddedConnection, ClientError>;

    /// Replace the credentials of an existing connection.
    async fn update_credentials(
        &self,
        connection_uuid: &str,
        temp_credentials_key: &str,
    ) -> Result<UpdatedCredentials, ClientError>;

    /// Remove a connection. Returns the API's `success` flag.
    async fn remove_connection(&self, connection_uuid: &str) -> Result<bool, ClientError>;
}

/// HTTP implementation of [`WarehouseApi`].
#[derive(Clone)]
pub struct GraphqlClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphqlClient {
    /// Build a client from resolved provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ClientError> {
        let key_id = config
            .api_key_id
            .as_deref()
            .ok_or_else(|| ClientError::Settings("missing API key id".to_string()))?;
        let key_token = config
            .api_key_token
            .as_deref()
            .ok_or_else(|| ClientError::Settings("missing API key token".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_ID_HEADER,
            HeaderValue::from_str(key_id)
                .map_err(|_| ClientError::Settings("invalid API key id format".to_string()))?,
        );
        let mut token = HeaderValue::from_str(key_token)
            .map_err(|_| ClientError::Settings("invalid API key token format".to_string()))?;
        token.set_sensitive(true);
        headers.insert(API_KEY_TOKEN_HEADER, token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint().to_string(),
        })
    }

    /// The GraphQL endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a document and decode the raw response envelope.
    #[instrument(level = "debug", skip(self, query, variables))]
    async fn execute<V, T>(
        &self,
        operation: &'static str,
        query: &str,
        variables: V,
    ) -> Result<GraphqlResponse<T>, ClientError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(operation, status = status.as_u16(), "GraphQL request rejected");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: truncate(&body, 256),
            });
        }

        let decoded: GraphqlResponse<T> = serde_json::from_str(&body)
            .map_err(|source| ClientError::Decode { operation, source })?;
        debug!(operation, errors = decoded.errors.len(), "GraphQL response received");
        Ok(decoded)
    }

    /// Post a document, failing on any GraphQL error or missing data.
    async fn mutate<V, T>(
        &self,
        operation: &'static str,
        query: &str,
        variables: V,
    ) -> Result<T, ClientError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let response = self.execute(operation, query, variables).await?;
        if !response.errors.is_empty() {
            return Err(ClientError::Graphql {
                operation,
                messages: response.error_messages(),
            });
        }
        response
            .data
            .ok_or(ClientError::EmptyResponse { operation })
    }
}

#[async_trait]
impl WarehouseApi for GraphqlClient {
    async fn get_warehouse(
        &self,
        uuid: &str,
    ) -> Result<GraphqlResponse<GetWarehouseData>, ClientError> {
        self.execute(
            "getWarehouse",
            queries::GET_WAREHOUSE,
            serde_json::json!({ "uuid": uuid }),
        )
        .await
    }

    async fn set_warehouse_name(
        &self,
        warehouse_uuid: &str,
        name: &str,
    ) -> Result<WarehouseRef, ClientError> {
        const OPERATION: &str = "setWarehouseName";
        let data: SetWarehouseNameData = self
            .mutate(
                OPERATION,
                queries::SET_WAREHOUSE_NAME,
                SetWarehouseNameVariables {
                    dw_id: warehouse_uuid,
                    name,
                },
            )
            .await?;
        data.set_warehouse_name
            .and_then(|payload| payload.warehouse)
            .ok_or(ClientError::EmptyResponse {
                operation: OPERATION,
            })
    }

    async fn test_database_credentials(
        &self,
        test: &CredentialsTest,
    ) -> Result<CredentialsTestResult, ClientError> {
        const OPERATION: &str = "testDatabaseCredentials";
        let data: TestCredentialsData = self
            .mutate(OPERATION, queries::TEST_DATABASE_CREDENTIALS, test)
            .await?;
        data.test_database_credentials
            .ok_or(ClientError::EmptyResponse {
                operation: OPERATION,
            })
    }

    async fn add_connection(
        &self,
        request: &AddConnectionRequest,
    ) -> Result<AddedConnection, ClientError> {
        const OPERATION: &str = "addConnection";
        let data: AddConnectionData = self
            .mutate(OPERATION, queries::ADD_CONNECTION, request)
            .await?;
        data.add_connection
            .and_then(|payload| payload.connection)
            .ok_or(ClientError::EmptyResponse {
                operation: OPERATION,
            })
    }

    async fn update_credentials(
        &self,
        connection_uuid: &str,
        temp_credentials_key: &str,
    ) -> Result<UpdatedCredentials, ClientError> {
        const OPERATION: &str = "updateCredentialsV2";
        let data: UpdateCredentialsData = self
            .mutate(
                OPERATION,
                queries::UPDATE_CREDENTIALS,
                UpdateCredentialsVariables {
                    connection_id: connection_uuid,
                    temp_credentials_key,
                },
            )
            .await?;
        data.update_credentials_v2
            .ok_or(ClientError::EmptyResponse {
                operation: OPERATION,
            })
    }

    async fn remove_connection(&self, connection_uuid: &str) -> Result<bool, ClientError> {
        const OPERATION: &str = "removeConnection";
        let data: RemoveConnectionData = self
            .mutate(
                OPERATION,
                queries::REMOVE_CONNECTION,
                RemoveConnectionVariables {
                    connection_id: connection_uuid,
                },
            )
            .await?;
        Ok(data
            .remove_connection
            .map(|payload| payload.success)
            .unwrap_or(false))
    }
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
