use serde_json::{json, Value};
use warehouse_provider::client::{ClientError, GraphqlClient, WarehouseApi};
use warehouse_provider::testing::{
    assert_error_contains, assert_warning_contains, expect_state, ProviderTester, TestError,
};
use warehouse_provider::{ProviderConfig, ProviderError, WarehouseProvider};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE: &str = "montecarlo_transactional_warehouse";

async fn configured_tester(mock_server: &MockServer) -> ProviderTester<WarehouseProvider> {
    let tester = ProviderTester::new(WarehouseProvider::new());
    tester
        .configure(json!({
            "api_key_id": "key-id",
            "api_key_token": "key-token",
            "api_endpoint": format!("{}/graphql", mock_server.uri()),
            "timeout_seconds": 5
        }))
        .await
        .unwrap();
    tester
}

fn config() -> Value {
    json!({
        "name": "orders",
        "db_type": "SQL-SERVER",
        "collector_uuid": "dc-1",
        "credentials": {
            "host": "db.internal",
            "port": 1433,
            "database": "orders",
            "username": "reader",
            "password": "hunter2"
        },
        "deletion_protection": false
    })
}

fn state() -> Value {
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

fn warehouse_body(updated_on: Option<&str>) -> Value {
    json!({
        "data": {
            "getWarehouse": {
                "uuid": "wh-1",
                "name": "orders-remote",
                "connections": [{
                    "uuid": "conn-1",
                    "type": "TRANSACTIONAL_DB",
                    "createdOn": "2024-01-01T00:00:00Z",
                    "updatedOn": updated_on
                }],
                "dataCollector": { "uuid": "dc-1" }
            }
        }
    })
}

async fn mount_credentials_ok(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation testDatabaseCredentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "testDatabaseCredentials": {
                    "key": "tmp-key",
                    "success": true,
                    "warnings": [],
                    "validations": []
                }
            }
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_create_then_read() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-mcd-id", "key-id"))
        .and(header("x-mcd-token", "key-token"))
        .and(body_string_contains("mutation testDatabaseCredentials"))
        .and(body_partial_json(json!({
            "variables": {
                "connectionType": "transactional-db",
                "dbType": "sql-server",
                "host": "db.internal",
                "port": 1433,
                "dbName": "orders",
                "user": "reader",
                "password": "hunter2"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "testDatabaseCredentials": {
                    "key": "tmp-key",
                    "success": true,
                    "warnings": [],
                    "validations": []
                }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation addConnection"))
        .and(body_partial_json(json!({
            "variables": {
                "key": "tmp-key",
                "connectionType": "transactional-db",
                "dcId": "dc-1",
                "name": "orders",
                "createWarehouseType": "transactional"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "addConnection": {
                    "connection": {
                        "uuid": "conn-1",
                        "createdOn": "2024-01-01T00:00:00Z",
                        "warehouse": { "uuid": "wh-1", "name": "orders" }
                    }
                }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .and(body_partial_json(json!({"variables": {"uuid": "wh-1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouse_body(None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let state = tester.lifecycle_create(RESOURCE, config()).await.unwrap();

    assert_eq!(state["uuid"], "wh-1");
    assert_eq!(state["name"], "orders-remote");
    assert_eq!(state["credentials"]["connection_uuid"], "conn-1");
    assert_eq!(state["credentials"]["updated_at"], "2024-01-01T00:00:00Z");
    assert_eq!(state["credentials"]["host"], "db.internal");
    assert_eq!(state["credentials"]["password"], "hunter2");
    assert_eq!(state["deletion_protection"], false);
}

#[tokio::test]
async fn test_read_detects_credential_drift() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(warehouse_body(Some("2024-06-01T12:00:00Z"))),
        )
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let state = expect_state(tester.read(RESOURCE, state()).await.unwrap()).unwrap();

    let credentials = &state["credentials"];
    assert_eq!(credentials["updated_at"], "2024-06-01T12:00:00Z");
    for field in ["host", "database", "username", "password"] {
        assert_eq!(credentials[field], "(unknown remote value)", "{}", field);
    }
    assert_eq!(credentials["port"], -1);
}

#[tokio::test]
async fn test_read_missing_warehouse_removes_resource() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "getWarehouse": null },
            "errors": [{ "message": "Warehouse does not exist" }]
        })))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let response = tester.read(RESOURCE, state()).await.unwrap();

    assert!(response.is_removed());
    assert_warning_contains(&response.diagnostics, "wh-1");
    assert_eq!(
        response.diagnostics[0].detail.as_deref(),
        Some("Warehouse does not exist")
    );
}

#[tokio::test]
async fn test_read_empty_updated_on_falls_back_to_created_on() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouse_body(Some(""))))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let state = expect_state(tester.read(RESOURCE, state()).await.unwrap()).unwrap();

    let credentials = &state["credentials"];
    assert_eq!(credentials["updated_at"], "2024-01-01T00:00:00Z");
    assert_eq!(credentials["host"], "db.internal");
    assert_eq!(credentials["port"], 1433);
    assert_eq!(credentials["password"], "hunter2");
    assert_eq!(state["name"], "orders-remote");
}

#[tokio::test]
async fn test_read_null_connections_removes_resource() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "getWarehouse": {
                    "uuid": "wh-1",
                    "name": null,
                    "connections": null,
                    "dataCollector": { "uuid": "dc-1" }
                }
            }
        })))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let response = tester.read(RESOURCE, state()).await.unwrap();

    assert!(response.is_removed());
    assert_warning_contains(&response.diagnostics, "has no connection 'conn-1'");
    assert_eq!(
        response.diagnostics[0].attribute.as_deref(),
        Some("credentials.connection_uuid")
    );
}

#[tokio::test]
async fn test_read_null_collector_removes_resource() {
    let mock_server = MockServer::start().await;

    let mut body = warehouse_body(None);
    body["data"]["getWarehouse"]["dataCollector"] = Value::Null;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let response = tester.read(RESOURCE, state()).await.unwrap();

    assert!(response.is_removed());
    assert_warning_contains(&response.diagnostics, "instead of 'dc-1'");
}

#[tokio::test]
async fn test_read_server_error_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let err = tester.read(RESOURCE, state()).await.unwrap_err();

    match err {
        ProviderError::Client(ClientError::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream unavailable");
        },
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_with_rejected_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation testDatabaseCredentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "testDatabaseCredentials": {
                    "key": null,
                    "success": false,
                    "warnings": [{ "message": "Could not connect", "type": "NETWORK" }],
                    "validations": [{ "message": "Missing SELECT", "type": "PERMISSIONS" }]
                }
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation addConnection"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let err = tester.create(RESOURCE, config()).await.unwrap_err();
    let diagnostics = err.into_diagnostics();

    assert_error_contains(&diagnostics, "credentials test failed");
    assert_warning_contains(&diagnostics, "Could not connect");
    assert_warning_contains(&diagnostics, "Missing SELECT");
}

#[tokio::test]
async fn test_update_renames_and_rotates_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation setWarehouseName"))
        .and(body_partial_json(json!({"variables": {"dwId": "wh-1", "name": "orders-v2"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "setWarehouseName": { "warehouse": { "uuid": "wh-1", "name": "orders-v2" } }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_credentials_ok(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation updateCredentialsV2"))
        .and(body_partial_json(json!({
            "variables": {"connectionId": "conn-1", "tempCredentialsKey": "tmp-key"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "updateCredentialsV2": { "success": true, "updatedAt": "2024-07-01T00:00:00Z" }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let mut desired = config();
    desired["name"] = json!("orders-v2");
    desired["credentials"]["password"] = json!("rotated");

    let plan = tester.plan_update(RESOURCE, state(), desired).await.unwrap();
    assert!(plan.planned_state["credentials"]["updated_at"].is_null());

    let updated = expect_state(
        tester
            .update(RESOURCE, state(), plan.planned_state)
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(updated["name"], "orders-v2");
    assert_eq!(updated["credentials"]["password"], "rotated");
    assert_eq!(updated["credentials"]["updated_at"], "2024-07-01T00:00:00Z");
}

#[tokio::test]
async fn test_update_graphql_error_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation setWarehouseName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Permission denied" }]
        })))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let err = tester.update(RESOURCE, state(), state()).await.unwrap_err();
    assert!(err.to_string().contains("Permission denied"));
    assert!(err.to_string().contains("setWarehouseName"));
}

#[tokio::test]
async fn test_delete_protected_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let mut protected = state();
    protected["deletion_protection"] = json!(true);

    let err = tester.delete(RESOURCE, protected).await.unwrap_err();
    assert!(matches!(err, ProviderError::FailedPrecondition(_)));
}

#[tokio::test]
async fn test_delete_unsuccessful_removal_warns() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation removeConnection"))
        .and(body_partial_json(json!({"variables": {"connectionId": "conn-1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "removeConnection": { "success": false } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let diagnostics = tester.lifecycle_delete(RESOURCE, state()).await.unwrap();
    assert_warning_contains(&diagnostics, "removeConnection");
}

#[tokio::test]
async fn test_import_then_read() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("query getWarehouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(warehouse_body(None)))
        .mount(&mock_server)
        .await;

    let tester = configured_tester(&mock_server).await;
    let imported = tester
        .import_resource(RESOURCE, "wh-1,conn-1,dc-1")
        .await
        .unwrap();
    let state = expect_state(
        tester
            .read(RESOURCE, imported[0].state.clone())
            .await
            .unwrap(),
    )
    .unwrap();

    assert_eq!(state["name"], "orders-remote");
    assert_eq!(state["credentials"]["host"], "(unknown remote value)");
    assert_eq!(state["credentials"]["updated_at"], "2024-01-01T00:00:00Z");

    match tester.import_resource(RESOURCE, "wh-1,,dc-1").await {
        Err(ProviderError::InvalidRequest(msg)) => {
            assert!(msg.contains("Unexpected Import Identifier"))
        },
        other => panic!("expected invalid request, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upgrade_v0_state() {
    let tester = ProviderTester::new(WarehouseProvider::new());
    let upgraded = tester
        .upgrade_resource_state(
            RESOURCE,
            0,
            json!({
                "uuid": "wh-1",
                "connection_uuid": "conn-1",
                "name": "orders",
                "db_type": "POSTGRES",
                "collector_uuid": "dc-1",
                "configuration": {
                    "host": "db.internal",
                    "port": 5432,
                    "database": "orders",
                    "username": "reader",
                    "password": "hunter2"
                },
                "deletion_protection": true
            }),
        )
        .await
        .unwrap();

    assert!(upgraded.get("configuration").is_none());
    assert!(upgraded.get("connection_uuid").is_none());
    assert_eq!(upgraded["credentials"]["connection_uuid"], "conn-1");
    assert_eq!(upgraded["credentials"]["port"], 5432);
    assert!(upgraded["credentials"]["updated_at"].is_null());

    let again = tester
        .upgrade_resource_state(RESOURCE, 0, upgraded.clone())
        .await
        .unwrap();
    assert_eq!(again, upgraded);
}

#[tokio::test]
async fn test_client_remove_connection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("mutation removeConnection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "removeConnection": { "success": true } }
        })))
        .mount(&mock_server)
        .await;

    let client = GraphqlClient::from_config(&ProviderConfig {
        api_key_id: Some("key-id".to_string()),
        api_key_token: Some("key-token".to_string()),
        api_endpoint: Some(format!("{}/graphql", mock_server.uri())),
        timeout_seconds: 5,
    })
    .unwrap();

    assert!(client.remove_connection("conn-1").await.unwrap());
}

#[tokio::test]
async fn test_configure_rejects_missing_token() {
    let tester = ProviderTester::new(WarehouseProvider::new());
    let result = tester
        .configure(json!({"api_key_id": "key-id", "api_key_token": ""}))
        .await;
    match result {
        Err(TestError::Diagnostics(diagnostics)) => {
            assert_error_contains(&diagnostics, "Missing API key token")
        },
        other => panic!("expected diagnostics, got {:?}", other),
    }
}
