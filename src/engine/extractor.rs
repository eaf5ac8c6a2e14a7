use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::event::ResponseTemplateMapping;
use crate::models::event_config::EventConfig;
use crate::models::vendor::VendorResponseVariable;

/// Key of a value extracted for one rule application.
///
/// Vendor payload values are keyed by the id of the response variable that
/// declared them; local json values are keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SourceKey {
    Variable(i32),
    Local(String),
}

impl SourceKey {
    pub(crate) fn local(name: &str) -> Self {
        SourceKey::Local(name.to_string())
    }
}

pub(crate) type SourceTable = HashMap<SourceKey, String>;

/// String form of a payload value. Strings are unquoted, `null` counts as
/// absent and everything else keeps its compact JSON text.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn parse_response_body(body: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(body)
}

/// Copies the top-level properties named by `variables` out of a parsed
/// vendor payload. Keys are matched exactly; nested paths are not followed.
pub(crate) fn extract_vendor_values(
    variables: &[VendorResponseVariable],
    body: &Value,
    table: &mut SourceTable,
) {
    let Some(object) = body.as_object() else {
        warn!("vendor response body is not a JSON object; no response values extracted");
        return;
    };

    for variable in variables {
        match object.get(&variable.internal_name).and_then(value_to_string) {
            Some(value) => {
                table.insert(SourceKey::Variable(variable.id), value);
            }
            None => debug!(
                variable_id = variable.id,
                name = %variable.internal_name,
                "response variable missing from vendor payload"
            ),
        }
    }
}

/// Parses a rule's local json blob. Failures are logged and treated as
/// "no local values".
pub(crate) fn parse_local_json(raw: Option<&str>, rule_id: i32) -> Option<Map<String, Value>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(rule_id, "local json is not an object; ignoring local values");
            None
        }
        Err(err) => {
            warn!(rule_id, error = %err, "failed to parse local json; ignoring local values");
            None
        }
    }
}

pub(crate) fn extract_local_values<'a>(
    local: &Map<String, Value>,
    names: impl IntoIterator<Item = &'a str>,
    table: &mut SourceTable,
) {
    for name in names {
        if let Some(value) = local.get(name).and_then(value_to_string) {
            table.insert(SourceKey::local(name), value);
        }
    }
}

/// Builds the source table for one render rule: vendor payload values (when
/// the rule is linked to a vendor response) plus the local values its
/// variable mappings refer to by name.
///
/// Only a malformed vendor body is an error.
pub(crate) fn extract_rule_values(
    config: &EventConfig,
    rule: &ResponseTemplateMapping,
    body: &str,
) -> Result<SourceTable, serde_json::Error> {
    let mut table = SourceTable::new();

    if let Some(response_id) = rule.response_id {
        let parsed = parse_response_body(body)?;
        extract_vendor_values(config.response_variables(response_id), &parsed, &mut table);
    }

    if let Some(local) = parse_local_json(rule.json.as_deref(), rule.id) {
        let names = config
            .response_variable_mappings(rule.id)
            .iter()
            .filter_map(|m| m.name.as_deref());
        extract_local_values(&local, names, &mut table);
    }

    Ok(table)
}
