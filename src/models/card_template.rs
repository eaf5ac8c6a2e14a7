use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ACTION_TYPE: &str = "Action.OpenUrl";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct AdaptiveCardTemplate {
    pub id: i32,
    pub internal_name: String,
    /// Adaptive Card JSON containing `${name}` tokens.
    pub template_string: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TemplateVariable {
    pub id: i32,
    pub template_id: i32,
    pub internal_name: String,
    pub is_required: bool,
    pub default_value: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TemplateAction {
    pub id: i32,
    pub template_id: i32,
    pub internal_name: String,
    pub action_type: String,
}
