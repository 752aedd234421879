//! Planning for the transactional warehouse resource.
//!
//! The planner fills defaults, carries computed values over from prior state where
//! the schema allows it, decides whether the resource must be replaced and reports
//! every attribute that changes.

use serde_json::{json, Map, Value};

use super::schema::{resource_schema, CREDENTIAL_FIELDS};
use crate::error::ProviderError;
use crate::schema::Attribute;
use crate::types::{AttributeChange, PlanResult};

const SENSITIVE_PLACEHOLDER: &str = "(sensitive value)";
const UPDATED_AT: &str = "credentials.updated_at";

static NULL: Value = Value::Null;

/// Plan a create (no prior state), an update, or a delete (null proposal).
pub fn plan(
    prior: Option<&Value>,
    proposed: &Value,
    config: &Value,
) -> Result<PlanResult, ProviderError> {
    if proposed.is_null() {
        return Ok(PlanResult::no_change(Value::Null));
    }
    if !proposed.is_object() {
        return Err(ProviderError::InvalidRequest(
            "proposed state must be an object".to_string(),
        ));
    }

    let schema = resource_schema();
    let paths = schema.block.attribute_paths();
    let mut planned = proposed.clone();

    for (path, attr) in &paths {
        if let Some(default) = &attr.default {
            if value_at(config, path).is_null() && value_at(&planned, path).is_null() {
                set_at(&mut planned, path, default.clone());
            }
        }
    }

    let prior = match prior.filter(|p| !p.is_null()) {
        Some(prior) => prior,
        None => {
            clear_computed(&mut planned, &paths);
            let changes = paths
                .iter()
                .filter(|(path, _)| !value_at(&planned, path).is_null())
                .map(|(path, attr)| {
                    AttributeChange::added(path.clone(), display(attr, value_at(&planned, path)))
                })
                .collect();
            return Ok(PlanResult::with_changes(planned, changes, false));
        },
    };

    let requires_replace = paths.iter().any(|(path, attr)| {
        let configured = value_at(config, path);
        attr.requires_replace() && !configured.is_null() && configured != value_at(prior, path)
    });

    if requires_replace {
        clear_computed(&mut planned, &paths);
    } else {
        for (path, attr) in &paths {
            if attr.uses_state_for_unknown() && value_at(&planned, path).is_null() {
                let previous = value_at(prior, path);
                if !previous.is_null() {
                    set_at(&mut planned, path, previous.clone());
                }
            }
        }

        let credentials_changed = CREDENTIAL_FIELDS.iter().any(|field| {
            let path = format!("credentials.{}", field);
            value_at(prior, &path) != value_at(&planned, &path)
        });
        let updated_at = if credentials_changed {
            Value::Null
        } else {
            value_at(prior, UPDATED_AT).clone()
        };
        set_at(&mut planned, UPDATED_AT, updated_at);
    }

    let changes = paths
        .iter()
        .filter_map(|(path, attr)| {
            let before = value_at(prior, path);
            let after = value_at(&planned, path);
            if before == after {
                return None;
            }
            Some(match (before.is_null(), after.is_null()) {
                (true, _) => AttributeChange::added(path.clone(), display(attr, after)),
                (false, true) => AttributeChange::new(path.clone(), Some(display(attr, before)), None),
                (false, false) => {
                    AttributeChange::modified(path.clone(), display(attr, before), display(attr, after))
                },
            })
        })
        .collect();

    Ok(PlanResult::with_changes(planned, changes, requires_replace))
}

fn clear_computed(planned: &mut Value, paths: &[(String, &Attribute)]) {
    for (path, attr) in paths {
        if attr.flags.is_computed_only() {
            set_at(planned, path, Value::Null);
        }
    }
}

fn display(attr: &Attribute, value: &Value) -> Value {
    if attr.flags.sensitive {
        json!(SENSITIVE_PLACEHOLDER)
    } else {
        value.clone()
    }
}

fn value_at<'a>(value: &'a Value, path: &str) -> &'a Value {
    value
        .pointer(&format!("/{}", path.replace('.', "/")))
        .unwrap_or(&NULL)
}

fn set_at(value: &mut Value, path: &str, new: Value) {
    let Value::Object(root) = value else {
        return;
    };
    match path.split_once('.') {
        None => {
            root.insert(path.to_string(), new);
        },
        Some((block, attr)) => {
            let nested = root
                .entry(block.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if nested.is_null() {
                *nested = Value::Object(Map::new());
            }
            if let Value::Object(map) = nested {
                map.insert(attr.to_string(), new);
            }
        },
    }
}
