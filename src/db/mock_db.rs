use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::event_config_repository::EventConfigRepository;
use crate::models::card_template::{AdaptiveCardTemplate, TemplateAction, TemplateVariable};
use crate::models::event::{
    Event, RequestTemplateMapping, RequestVariableMapping, ResponseTemplateMapping,
    ResponseVariableMapping,
};
use crate::models::event_config::{EventConfig, EventConfigRows};
use crate::models::vendor::{
    Vendor, VendorRequest, VendorRequestVariable, VendorResponse, VendorResponseVariable,
};

/// In-memory rule store used by tests and local runs without Postgres.
#[derive(Default)]
pub struct MockEventConfigRepository {
    pub configs: Mutex<HashMap<i32, EventConfig>>,
    pub should_fail: bool,
    pub load_calls: Mutex<usize>,
}

impl MockEventConfigRepository {
    pub fn with_config(config: EventConfig) -> Self {
        let repo = Self::default();
        repo.insert(config);
        repo
    }

    pub fn insert(&self, config: EventConfig) {
        if let Ok(mut configs) = self.configs.lock() {
            configs.insert(config.event().id, config);
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl EventConfigRepository for MockEventConfigRepository {
    async fn load_event_config(&self, event_id: i32) -> Result<Option<EventConfig>, sqlx::Error> {
        if let Ok(mut calls) = self.load_calls.lock() {
            *calls += 1;
        }
        if self.should_fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let configs = self
            .configs
            .lock()
            .map_err(|_| sqlx::Error::Protocol("mock config store poisoned".into()))?;
        Ok(configs.get(&event_id).cloned())
    }
}

pub const SAMPLE_EVENT_ID: i32 = 7;
pub const SAMPLE_VENDOR_URL: &str = "https://helpdesk.example.com";

pub const SAMPLE_TEMPLATE: &str = r#"{
    "type": "AdaptiveCard",
    "version": "1.5",
    "body": [
        { "type": "TextBlock", "text": "${title}", "weight": "Bolder" },
        { "type": "TextBlock", "text": "${greeting}" },
        { "type": "TextBlock", "text": "Priority: ${priority}" }
    ],
    "actions": [
        { "type": "${close_action}", "title": "Close ticket", "url": "${close_url}" }
    ]
}"#;

/// Rows of a helpdesk "ticket created" rule set: one render rule feeding
/// three card variables and one follow-up rule building a close-ticket URL.
pub fn sample_ticket_rows() -> (Event, EventConfigRows) {
    let event = Event {
        id: SAMPLE_EVENT_ID,
        name: "ticket.created".into(),
        summary: "A new helpdesk ticket was created".into(),
    };

    let rows = EventConfigRows {
        response_mappings: vec![ResponseTemplateMapping {
            id: 1,
            event_id: SAMPLE_EVENT_ID,
            template_id: 1,
            response_id: Some(1),
            json: Some(r#"{"greeting": "Hello ${0}!"}"#.into()),
        }],
        response_variable_mappings: vec![
            ResponseVariableMapping {
                id: 1,
                mapping_id: 1,
                combine: false,
                name: None,
                response_variable_id: Some(2),
                template_variable_id: 1,
            },
            ResponseVariableMapping {
                id: 2,
                mapping_id: 1,
                combine: true,
                name: Some("greeting".into()),
                response_variable_id: Some(3),
                template_variable_id: 2,
            },
            ResponseVariableMapping {
                id: 3,
                mapping_id: 1,
                combine: false,
                name: None,
                response_variable_id: Some(4),
                template_variable_id: 3,
            },
        ],
        request_mappings: vec![RequestTemplateMapping {
            id: 1,
            event_id: SAMPLE_EVENT_ID,
            request_id: 1,
            action_id: 1,
            json: Some(r#"{"message_id": "stale"}"#.into()),
        }],
        request_variable_mappings: vec![
            RequestVariableMapping {
                id: 1,
                mapping_id: 1,
                combine: false,
                name: None,
                response_variable_id: Some(1),
                request_variable_id: 1,
            },
            RequestVariableMapping {
                id: 2,
                mapping_id: 1,
                combine: false,
                name: Some("message_id".into()),
                response_variable_id: None,
                request_variable_id: 2,
            },
            RequestVariableMapping {
                id: 3,
                mapping_id: 1,
                combine: false,
                name: Some("conversation_id".into()),
                response_variable_id: None,
                request_variable_id: 3,
            },
        ],
        templates: vec![AdaptiveCardTemplate {
            id: 1,
            internal_name: "ticket_card".into(),
            template_string: SAMPLE_TEMPLATE.into(),
        }],
        template_variables: vec![
            template_variable(1, "title"),
            template_variable(2, "greeting"),
            template_variable(3, "priority"),
        ],
        template_actions: vec![TemplateAction {
            id: 1,
            template_id: 1,
            internal_name: "close".into(),
            action_type: "Action.OpenUrl".into(),
        }],
        vendors: vec![Vendor {
            id: 1,
            name: "Helpdesk".into(),
            url: SAMPLE_VENDOR_URL.into(),
        }],
        requests: vec![VendorRequest {
            id: 1,
            vendor_id: 1,
            internal_name: "close_ticket".into(),
            endpoint: "/tickets/${ticket_id}/close".into(),
        }],
        request_variables: vec![
            request_variable(1, "ticket_id"),
            request_variable(2, "message_id"),
            request_variable(3, "conversation_id"),
        ],
        responses: vec![VendorResponse {
            id: 1,
            vendor_id: 1,
            internal_name: "ticket_webhook".into(),
        }],
        response_variables: vec![
            response_variable(1, "ticket_id"),
            response_variable(2, "title"),
            response_variable(3, "requester"),
            response_variable(4, "priority"),
        ],
    };

    (event, rows)
}

pub fn sample_ticket_config() -> EventConfig {
    let (event, rows) = sample_ticket_rows();
    EventConfig::from_rows(event, rows)
}

fn template_variable(id: i32, name: &str) -> TemplateVariable {
    TemplateVariable {
        id,
        template_id: 1,
        internal_name: name.into(),
        is_required: true,
        default_value: String::new(),
    }
}

fn request_variable(id: i32, name: &str) -> VendorRequestVariable {
    VendorRequestVariable {
        id,
        request_id: 1,
        internal_name: name.into(),
        is_required: true,
    }
}

fn response_variable(id: i32, name: &str) -> VendorResponseVariable {
    VendorResponseVariable {
        id,
        response_id: 1,
        internal_name: name.into(),
    }
}
