use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub summary: String,
}

/// Render rule: feeds values from a vendor response (and/or its local json)
/// into the variables of one card template.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ResponseTemplateMapping {
    pub id: i32,
    pub event_id: i32,
    pub template_id: i32,
    pub response_id: Option<i32>,
    pub json: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ResponseVariableMapping {
    pub id: i32,
    pub mapping_id: i32,
    pub combine: bool,
    pub name: Option<String>,
    pub response_variable_id: Option<i32>,
    pub template_variable_id: i32,
}

/// Follow-up rule: builds the vendor URL carried by one card action.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RequestTemplateMapping {
    pub id: i32,
    pub event_id: i32,
    pub request_id: i32,
    pub action_id: i32,
    pub json: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RequestVariableMapping {
    pub id: i32,
    pub mapping_id: i32,
    pub combine: bool,
    pub name: Option<String>,
    pub response_variable_id: Option<i32>,
    pub request_variable_id: i32,
}
