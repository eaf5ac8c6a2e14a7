use crate::db::event_config_repository::EventConfigRepository;
use crate::services::card_delivery::CardDispatch;
use crate::services::conversations::ConversationRegistry;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    pub event_config_repo: Arc<dyn EventConfigRepository>,
    pub conversations: Arc<ConversationRegistry>,
    pub card_queue: mpsc::Sender<CardDispatch>,
    pub http_client: Arc<Client>,
}
