use serde_json::json;

use super::model::DbType;
use super::SCHEMA_VERSION;
use crate::schema::{Attribute, Block, NestedBlock, PlanModifier, Schema, Validator};

/// Attributes under `credentials` that hold connection settings.
pub const CREDENTIAL_FIELDS: [&str; 5] = ["host", "port", "database", "username", "password"];

/// Schema of the transactional warehouse resource.
pub fn resource_schema() -> Schema {
    Schema::new(SCHEMA_VERSION)
        .with_attribute(
            "uuid",
            Attribute::computed_string()
                .with_description("Unique identifier of the warehouse.")
                .with_plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Display name of the warehouse."),
        )
        .with_attribute(
            "db_type",
            Attribute::required_string()
                .with_description("Database engine: POSTGRES, MYSQL or SQL-SERVER.")
                .with_validator(Validator::one_of(DbType::VALUES)),
        )
        .with_attribute(
            "collector_uuid",
            Attribute::required_string()
                .with_description("Data collector the warehouse is attached to.")
                .with_plan_modifier(PlanModifier::RequiresReplaceIfConfigured),
        )
        .with_attribute(
            "deletion_protection",
            Attribute::optional_computed_bool()
                .with_description("Refuse to delete the warehouse while true.")
                .with_default(json!(true)),
        )
        .with_block("credentials", NestedBlock::single(credentials_block()).required())
}

fn credentials_block() -> Block {
    Block::new()
        .with_description("Credentials of the transactional database.")
        .with_attribute(
            "connection_uuid",
            Attribute::computed_string()
                .with_description("Identifier of the connection holding these credentials.")
                .with_plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .with_attribute("host", Attribute::required_string())
        .with_attribute("port", Attribute::required_int64())
        .with_attribute("database", Attribute::required_string())
        .with_attribute("username", Attribute::required_string().sensitive())
        .with_attribute("password", Attribute::required_string().sensitive())
        .with_attribute(
            "updated_at",
            Attribute::computed_string()
                .with_description("When the credentials were last changed on the platform."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn test_schema_shape() {
        let schema = resource_schema();
        assert_eq!(schema.version, 1);
        assert!(schema.attribute("uuid").unwrap().uses_state_for_unknown());
        assert!(schema.attribute("collector_uuid").unwrap().requires_replace());
        assert!(schema
            .attribute("credentials.connection_uuid")
            .unwrap()
            .uses_state_for_unknown());
        assert!(schema.attribute("credentials.password").unwrap().flags.sensitive);
        assert!(schema.attribute("credentials.username").unwrap().flags.sensitive);
        assert!(!schema.attribute("credentials.host").unwrap().flags.sensitive);
        assert_eq!(
            schema.attribute("deletion_protection").unwrap().default,
            Some(json!(true))
        );
        for field in CREDENTIAL_FIELDS {
            assert!(schema.attribute(&format!("credentials.{}", field)).is_some());
        }
    }

    #[test]
    fn test_validate_config() {
        let schema = resource_schema();
        let config = json!({
            "name": "orders",
            "db_type": "MYSQL",
            "collector_uuid": "dc-1",
            "credentials": {
                "host": "db", "port": 3306, "database": "orders",
                "username": "u", "password": "p"
            }
        });
        assert!(validate(&schema, &config).is_empty());

        let mut bad = config.clone();
        bad["db_type"] = json!("ORACLE");
        let diagnostics = validate(&schema, &bad);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("db_type"));

        let mut missing = config;
        missing["credentials"] = json!(null);
        let diagnostics = validate(&schema, &missing);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("credentials"));
    }
}
