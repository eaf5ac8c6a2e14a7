use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::engine::extractor::{extract_local_values, parse_local_json, SourceKey, SourceTable};
use crate::engine::resolver::resolve_mappings;
use crate::models::card_template::DEFAULT_ACTION_TYPE;
use crate::models::event::RequestTemplateMapping;
use crate::models::event_config::EventConfig;
use crate::models::vendor::VendorRequestVariable;

pub const MESSAGE_ID_KEY: &str = "message_id";
pub const CONVERSATION_ID_KEY: &str = "conversation_id";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathTokenError {
    #[error("path token opened at byte {position} is never closed")]
    Unterminated { position: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionUrlError {
    #[error("vendor request {0} is not part of the loaded rule set")]
    MissingRequest(i32),
    #[error("vendor {0} is not part of the loaded rule set")]
    MissingVendor(i32),
    #[error("template action {0} is not part of the loaded rule set")]
    MissingAction(i32),
    #[error("invalid endpoint `{endpoint}`: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: PathTokenError,
    },
    #[error(
        "endpoint `{endpoint}` has {tokens} path tokens but {matched} declared request variables match them"
    )]
    PathTokenMismatch {
        endpoint: String,
        tokens: usize,
        matched: usize,
    },
    #[error("no value resolved for path variable `{name}`")]
    MissingPathValue { name: String },
}

/// Chat-side identifiers injected into every follow-up rule.
#[derive(Debug, Clone, Copy)]
pub struct MessageIdentifiers<'a> {
    pub message_id: &'a str,
    pub conversation_id: &'a str,
}

/// Result of one follow-up rule, ready to be merged into the card values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub action_name: String,
    pub action_type: String,
    pub url: String,
}

impl ActionBinding {
    pub fn url_key(&self) -> String {
        format!("{}_url", self.action_name)
    }

    pub fn action_key(&self) -> String {
        format!("{}_action", self.action_name)
    }
}

/// One `${name}` occurrence; `start..end` covers the braces.
struct PathToken<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

fn locate_path_tokens(endpoint: &str) -> Result<Vec<PathToken<'_>>, PathTokenError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    while let Some(start_rel) = endpoint[offset..].find("${") {
        let start = offset + start_rel;
        let name_start = start + 2;
        let Some(end_rel) = endpoint[name_start..].find('}') else {
            return Err(PathTokenError::Unterminated { position: start });
        };
        let name_end = name_start + end_rel;
        tokens.push(PathToken {
            start,
            end: name_end + 1,
            name: &endpoint[name_start..name_end],
        });
        offset = name_end + 1;
    }
    Ok(tokens)
}

/// Lists the `${name}` tokens of an endpoint from left to right.
pub fn scan_path_tokens(endpoint: &str) -> Result<Vec<String>, PathTokenError> {
    Ok(locate_path_tokens(endpoint)?
        .into_iter()
        .map(|t| t.name.to_string())
        .collect())
}

/// Builds `base_url + endpoint (+ ?query)` from the resolved request values.
///
/// Declared variables whose name appears as an endpoint token become path
/// variables; the rest are appended as query parameters in declaration
/// order. Query parameters without a value are left out, and no `?` is
/// emitted when none resolve. Path values, query keys and query values are
/// percent-encoded.
pub fn build_action_url(
    base_url: &str,
    endpoint: &str,
    variables: &[VendorRequestVariable],
    values: &HashMap<i32, String>,
) -> Result<String, ActionUrlError> {
    let tokens = locate_path_tokens(endpoint).map_err(|source| ActionUrlError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;

    let (path_variables, query_variables): (Vec<&VendorRequestVariable>, Vec<&VendorRequestVariable>) =
        variables
            .iter()
            .partition(|v| tokens.iter().any(|t| t.name == v.internal_name));

    // Only counts are compared; a repeated token counts twice.
    if path_variables.len() != tokens.len() {
        return Err(ActionUrlError::PathTokenMismatch {
            endpoint: endpoint.to_string(),
            tokens: tokens.len(),
            matched: path_variables.len(),
        });
    }

    // Single pass over the endpoint so inserted values are never rescanned.
    let mut path = String::with_capacity(endpoint.len());
    let mut cursor = 0;
    for token in &tokens {
        let value = path_variables
            .iter()
            .find(|v| v.internal_name == token.name)
            .and_then(|v| values.get(&v.id))
            .ok_or_else(|| ActionUrlError::MissingPathValue {
                name: token.name.to_string(),
            })?;
        path.push_str(&endpoint[cursor..token.start]);
        path.push_str(&encode(value));
        cursor = token.end;
    }
    path.push_str(&endpoint[cursor..]);

    let query: Vec<String> = query_variables
        .into_iter()
        .filter_map(|v| {
            values
                .get(&v.id)
                .map(|value| format!("{}={}", encode(&v.internal_name), encode(value)))
        })
        .collect();

    let mut url = format!("{base_url}{path}");
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.join("&"));
    }
    Ok(url)
}

/// Source table for one follow-up rule: the vendor response values, the
/// rule's own local json and the chat identifiers, which always win over a
/// same-named local entry.
pub(crate) fn request_sources(
    config: &EventConfig,
    rule: &RequestTemplateMapping,
    response_values: &SourceTable,
    ids: MessageIdentifiers<'_>,
) -> SourceTable {
    let mut sources = response_values.clone();

    if let Some(local) = parse_local_json(rule.json.as_deref(), rule.id) {
        let names = config
            .request_variable_mappings(rule.id)
            .iter()
            .filter_map(|m| m.name.as_deref());
        extract_local_values(&local, names, &mut sources);
    }

    sources.insert(SourceKey::local(MESSAGE_ID_KEY), ids.message_id.to_string());
    sources.insert(
        SourceKey::local(CONVERSATION_ID_KEY),
        ids.conversation_id.to_string(),
    );
    sources
}

/// Runs one follow-up rule end to end. Errors only affect this rule.
pub(crate) fn build_action(
    config: &EventConfig,
    rule: &RequestTemplateMapping,
    response_values: &SourceTable,
    ids: MessageIdentifiers<'_>,
) -> Result<ActionBinding, ActionUrlError> {
    let action = config
        .template_action(rule.action_id)
        .ok_or(ActionUrlError::MissingAction(rule.action_id))?;
    let request = config
        .request(rule.request_id)
        .ok_or(ActionUrlError::MissingRequest(rule.request_id))?;
    let vendor = config
        .vendor(request.vendor_id)
        .ok_or(ActionUrlError::MissingVendor(request.vendor_id))?;

    let sources = request_sources(config, rule, response_values, ids);
    let values = resolve_mappings(config.request_variable_mappings(rule.id), &sources);
    debug!(
        rule_id = rule.id,
        resolved = values.len(),
        "resolved follow-up request variables"
    );

    let url = build_action_url(
        &vendor.url,
        &request.endpoint,
        config.request_variables(request.id),
        &values,
    )?;

    let action_type = match action.action_type.trim() {
        "" => DEFAULT_ACTION_TYPE.to_string(),
        kind => kind.to_string(),
    };
    Ok(ActionBinding {
        action_name: action.internal_name.clone(),
        action_type,
        url,
    })
}

/// Runs every follow-up rule of the event, skipping (and logging) the ones
/// that cannot produce a URL.
pub(crate) fn build_actions(
    config: &EventConfig,
    response_values: &SourceTable,
    ids: MessageIdentifiers<'_>,
) -> Vec<ActionBinding> {
    let mut bindings = Vec::new();
    for rule in config.request_mappings() {
        match build_action(config, rule, response_values, ids) {
            Ok(binding) => bindings.push(binding),
            Err(err) => warn!(
                rule_id = rule.id,
                error = %err,
                "follow-up rule produced no action URL"
            ),
        }
    }
    bindings
}
