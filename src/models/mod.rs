pub mod card_template;
pub mod conversation;
pub mod event;
pub mod event_config;
pub mod notification;
pub mod vendor;
