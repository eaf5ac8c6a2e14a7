use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::event_config_repository::EventConfigRepository;
use crate::engine::action_url::{self, MessageIdentifiers};
use crate::engine::assembler::assemble_template_values;
use crate::engine::extractor::{extract_rule_values, extract_vendor_values, parse_response_body, SourceTable};
use crate::engine::resolver::resolve_mappings;
use crate::engine::templating::{expand_card, TemplateValues};
use crate::models::event_config::EventConfig;

#[derive(Debug, Error)]
pub enum CardBuildError {
    #[error("event {event_id} has no response mapping")]
    NoResponseMapping { event_id: i32 },
    #[error("event {event_id} has no response mapping linked to a vendor response")]
    NoVendorResponse { event_id: i32 },
    #[error("template {template_id} referenced by event {event_id} was not loaded")]
    MissingTemplate { event_id: i32, template_id: i32 },
    #[error("vendor response body is not valid JSON: {0}")]
    MalformedResponseBody(#[source] serde_json::Error),
    #[error("template {template_id} is not valid JSON: {source}")]
    MalformedTemplate {
        template_id: i32,
        #[source]
        source: serde_json::Error,
    },
}

/// Builds the card of one event from a vendor payload.
///
/// A builder pins the rule set loaded at [`CardBuilder::init`] and owns the
/// flat value table the primary template is expanded against. Use one per
/// request.
#[derive(Debug, Clone)]
pub struct CardBuilder {
    config: EventConfig,
    values: TemplateValues,
}

impl CardBuilder {
    /// Loads the rule set of `event_id`. `Ok(None)` means the event has no
    /// configuration and no card should be produced.
    pub async fn init(
        repo: &dyn EventConfigRepository,
        event_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let config = repo.load_event_config(event_id).await?;
        if config.is_none() {
            info!(event_id, "no rule set stored for event");
        }
        Ok(config.map(Self::new))
    }

    pub fn new(config: EventConfig) -> Self {
        Self {
            config,
            values: TemplateValues::new(),
        }
    }

    pub fn summary(&self) -> &str {
        &self.config.event().summary
    }

    pub fn template_values(&self) -> &TemplateValues {
        &self.values
    }

    /// Runs every render rule in declaration order into the shared value
    /// table and expands the primary template.
    pub fn build(&mut self, response_body: &str) -> Result<Value, CardBuildError> {
        let event_id = self.config.event().id;
        if self.config.response_mappings().is_empty() {
            return Err(CardBuildError::NoResponseMapping { event_id });
        }

        for rule in self.config.response_mappings() {
            let sources = extract_rule_values(&self.config, rule, response_body)
                .map_err(CardBuildError::MalformedResponseBody)?;
            let resolved = resolve_mappings(self.config.response_variable_mappings(rule.id), &sources);
            let inserted = assemble_template_values(
                self.config.template_variables(rule.template_id),
                &resolved,
                &mut self.values,
            );
            debug!(event_id, rule_id = rule.id, inserted, "applied render rule");
        }

        self.expand_primary()
    }

    /// Builds the follow-up URLs of every card action and re-expands the
    /// primary template with them.
    ///
    /// Values come from the first render rule linked to a vendor response.
    /// Rules that cannot produce a URL are logged and left out; calling this
    /// again with the same inputs yields the same card.
    pub fn build_actions(
        &mut self,
        response_body: &str,
        message_id: &str,
        conversation_id: &str,
    ) -> Result<Value, CardBuildError> {
        let event_id = self.config.event().id;
        let response_id = self
            .config
            .response_mappings()
            .iter()
            .find_map(|m| m.response_id)
            .ok_or(CardBuildError::NoVendorResponse { event_id })?;

        let body = parse_response_body(response_body).map_err(CardBuildError::MalformedResponseBody)?;
        let mut response_values = SourceTable::new();
        extract_vendor_values(
            self.config.response_variables(response_id),
            &body,
            &mut response_values,
        );

        let ids = MessageIdentifiers {
            message_id,
            conversation_id,
        };
        let bindings = action_url::build_actions(&self.config, &response_values, ids);
        info!(
            event_id,
            actions = bindings.len(),
            rules = self.config.request_mappings().len(),
            "built action urls"
        );
        for binding in bindings {
            self.values.insert(binding.url_key(), binding.url.clone());
            self.values.insert(binding.action_key(), binding.action_type);
        }

        self.expand_primary()
    }

    fn expand_primary(&self) -> Result<Value, CardBuildError> {
        let event_id = self.config.event().id;
        let rule = self
            .config
            .response_mappings()
            .first()
            .ok_or(CardBuildError::NoResponseMapping { event_id })?;
        let template = self
            .config
            .template(rule.template_id)
            .ok_or(CardBuildError::MissingTemplate {
                event_id,
                template_id: rule.template_id,
            })?;
        let parsed: Value = serde_json::from_str(&template.template_string).map_err(|source| {
            CardBuildError::MalformedTemplate {
                template_id: template.id,
                source,
            }
        })?;
        Ok(expand_card(&parsed, &self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock_db::{
        sample_ticket_config, sample_ticket_rows, MockEventConfigRepository, SAMPLE_EVENT_ID,
        SAMPLE_VENDOR_URL,
    };
    use crate::models::event::ResponseTemplateMapping;
    use serde_json::json;

    const BODY: &str =
        r#"{"ticket_id": 42, "title": "Printer on fire", "requester": "World", "priority": "high"}"#;

    fn builder() -> CardBuilder {
        CardBuilder::new(sample_ticket_config())
    }

    #[tokio::test]
    async fn init_loads_rule_set() {
        let repo = MockEventConfigRepository::with_config(sample_ticket_config());
        let builder = CardBuilder::init(&repo, SAMPLE_EVENT_ID)
            .await
            .expect("load succeeds")
            .expect("rule set exists");
        assert_eq!(builder.summary(), "A new helpdesk ticket was created");
    }

    #[tokio::test]
    async fn init_reloads_rule_set_every_time() {
        let repo = MockEventConfigRepository::with_config(sample_ticket_config());
        let first = CardBuilder::init(&repo, SAMPLE_EVENT_ID)
            .await
            .expect("load succeeds")
            .expect("rule set exists");

        let (mut event, rows) = sample_ticket_rows();
        event.summary = "Ticket updated".into();
        repo.insert(EventConfig::from_rows(event, rows));

        let second = CardBuilder::init(&repo, SAMPLE_EVENT_ID)
            .await
            .expect("load succeeds")
            .expect("rule set exists");

        assert_eq!(first.summary(), "A new helpdesk ticket was created");
        assert_eq!(second.summary(), "Ticket updated");
        assert_eq!(*repo.load_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn init_without_rule_set_is_absent() {
        let repo = MockEventConfigRepository::default();
        let builder = CardBuilder::init(&repo, 404).await.expect("load succeeds");
        assert!(builder.is_none());
    }

    #[tokio::test]
    async fn init_propagates_store_errors() {
        let repo = MockEventConfigRepository::failing();
        assert!(CardBuilder::init(&repo, SAMPLE_EVENT_ID).await.is_err());
    }

    #[test]
    fn build_fills_every_card_variable() {
        let mut builder = builder();
        let card = builder.build(BODY).expect("card builds");

        assert_eq!(card["body"][0]["text"], "Printer on fire");
        assert_eq!(card["body"][1]["text"], "Hello World!");
        assert_eq!(card["body"][2]["text"], "Priority: high");
        let rendered = card["body"].to_string();
        assert!(!rendered.contains("${"), "unexpanded token in {rendered}");
    }

    #[test]
    fn build_with_missing_source_leaves_variable_absent() {
        let mut builder = builder();
        let card = builder
            .build(r#"{"ticket_id": 42, "title": "Printer on fire"}"#)
            .expect("missing values are not fatal");

        assert_eq!(card["body"][1]["text"], "");
        assert_eq!(card["body"][2]["text"], "Priority: ");
        assert!(!builder.template_values().contains_key("greeting"));
        assert!(!builder.template_values().contains_key("priority"));
    }

    #[test]
    fn malformed_body_aborts_build() {
        let mut builder = builder();
        let err = builder.build("{\"title\": ").unwrap_err();
        assert!(matches!(err, CardBuildError::MalformedResponseBody(_)));
    }

    #[test]
    fn malformed_local_json_degrades_silently() {
        let (event, mut rows) = sample_ticket_rows();
        rows.response_mappings[0].json = Some("{greeting".into());
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let card = builder.build(BODY).expect("card still builds");

        assert_eq!(card["body"][0]["text"], "Printer on fire");
        assert_eq!(card["body"][1]["text"], "");
    }

    #[test]
    fn build_without_response_mapping_fails() {
        let (event, mut rows) = sample_ticket_rows();
        rows.response_mappings.clear();
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let err = builder.build(BODY).unwrap_err();
        assert!(matches!(
            err,
            CardBuildError::NoResponseMapping { event_id: SAMPLE_EVENT_ID }
        ));
    }

    #[test]
    fn invalid_template_json_fails() {
        let (event, mut rows) = sample_ticket_rows();
        rows.templates[0].template_string = "{\"type\": \"AdaptiveCard\",".into();
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let err = builder.build(BODY).unwrap_err();
        assert!(matches!(err, CardBuildError::MalformedTemplate { template_id: 1, .. }));
    }

    #[test]
    fn missing_primary_template_fails() {
        let (event, mut rows) = sample_ticket_rows();
        rows.templates.clear();
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let err = builder.build(BODY).unwrap_err();
        assert!(matches!(err, CardBuildError::MissingTemplate { template_id: 1, .. }));
    }

    #[test]
    fn later_rules_overwrite_shared_names() {
        let (event, mut rows) = sample_ticket_rows();
        rows.response_mappings.push(ResponseTemplateMapping {
            id: 2,
            event_id: SAMPLE_EVENT_ID,
            template_id: 1,
            response_id: None,
            json: Some(r#"{"override": "Escalated"}"#.into()),
        });
        rows.response_variable_mappings
            .push(crate::models::event::ResponseVariableMapping {
                id: 4,
                mapping_id: 2,
                combine: false,
                name: Some("override".into()),
                response_variable_id: None,
                template_variable_id: 1,
            });
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let card = builder.build(BODY).expect("card builds");
        assert_eq!(card["body"][0]["text"], "Escalated");
    }

    #[test]
    fn build_actions_fills_action_url_and_type() {
        let mut builder = builder();
        builder.build(BODY).expect("card builds");

        let card = builder
            .build_actions(BODY, "msg-1", "conv-1")
            .expect("actions build");

        assert_eq!(
            card["actions"][0],
            json!({
                "type": "Action.OpenUrl",
                "title": "Close ticket",
                "url": format!(
                    "{SAMPLE_VENDOR_URL}/tickets/42/close?message_id=msg-1&conversation_id=conv-1"
                ),
            })
        );
        assert_eq!(card["body"][0]["text"], "Printer on fire");
    }

    #[test]
    fn build_actions_is_idempotent() {
        let mut builder = builder();
        builder.build(BODY).expect("card builds");

        let first = builder.build_actions(BODY, "msg-1", "conv-1").expect("first");
        let second = builder.build_actions(BODY, "msg-1", "conv-1").expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn build_actions_requires_linked_vendor_response() {
        let (event, mut rows) = sample_ticket_rows();
        rows.response_mappings[0].response_id = None;
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let err = builder.build_actions(BODY, "m", "c").unwrap_err();
        assert!(matches!(err, CardBuildError::NoVendorResponse { .. }));
    }

    #[test]
    fn failed_action_rule_leaves_url_empty() {
        let (event, mut rows) = sample_ticket_rows();
        rows.requests[0].endpoint = "/tickets/${ticket_id}/${missing}".into();
        let mut builder = CardBuilder::new(EventConfig::from_rows(event, rows));

        let card = builder.build_actions(BODY, "m", "c").expect("card still builds");

        assert_eq!(card["actions"][0]["url"], "");
        assert!(!builder.template_values().contains_key("close_url"));
        assert!(!builder.template_values().contains_key("close_action"));
    }
}
