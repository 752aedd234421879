//! Hand-written GraphQL documents issued by the warehouse resource.

pub const GET_WAREHOUSE: &str = r#"
query getWarehouse($uuid: UUID) {
  getWarehouse(uuid: $uuid) {
    uuid
    name
    connections {
      uuid
      type
      createdOn
      updatedOn
    }
    dataCollector {
      uuid
    }
  }
}
"#;

pub const SET_WAREHOUSE_NAME: &str = r#"
mutation setWarehouseName($dwId: UUID!, $name: String!) {
  setWarehouseName(dwId: $dwId, name: $name) {
    warehouse {
      uuid
      name
    }
  }
}
"#;

pub const TEST_DATABASE_CREDENTIALS: &str = r#"
mutation testDatabaseCredentials(
  $connectionType: String,
  $dbType: String,
  $host: String,
  $port: Int,
  $dbName: String,
  $user: String,
  $password: String
) {
  testDatabaseCredentials(
    connectionType: $connectionType,
    dbType: $dbType,
    host: $host,
    port: $port,
    dbName: $dbName,
    user: $user,
    password: $password
  ) {
    key
    success
    warnings {
      message
      type
    }
    validations {
      message
      type
    }
  }
}
"#;

pub const ADD_CONNECTION: &str = r#"
mutation addConnection(
  $key: String!,
  $connectionType: String!,
  $dcId: UUID,
  $dwId: UUID,
  $name: String,
  $createWarehouseType: String
) {
  addConnection(
    key: $key,
    connectionType: $connectionType,
    dcId: $dcId,
    dwId: $dwId,
    name: $name,
    createWarehouseType: $createWarehouseType
  ) {
    connection {
      uuid
      createdOn
      warehouse {
        uuid
        name
      }
    }
  }
}
"#;

pub const UPDATE_CREDENTIALS: &str = r#"
mutation updateCredentialsV2($connectionId: UUID!, $tempCredentialsKey: String!) {
  updateCredentialsV2(connectionId: $connectionId, tempCredentialsKey: $tempCredentialsKey) {
    success
    updatedAt
  }
}
"#;

pub const REMOVE_CONNECTION: &str = r#"
mutation removeConnection($connectionId: UUID!) {
  removeConnection(connectionId: $connectionId) {
    success
  }
}
"#;
