use async_trait::async_trait;

use crate::models::event_config::EventConfig;

#[async_trait]
pub trait EventConfigRepository: Send + Sync {
    /// Loads the complete rule graph for one event.
    ///
    /// `Ok(None)` means no rule set exists for the event, which callers treat
    /// as "produce no card". Store failures are returned as-is; retrying is up
    /// to the caller.
    async fn load_event_config(&self, event_id: i32) -> Result<Option<EventConfig>, sqlx::Error>;
}
