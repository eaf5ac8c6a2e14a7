use dashmap::DashMap;
use tracing::debug;

use crate::models::conversation::ConversationReference;

/// Latest conversation reference per user, refreshed by every activity the
/// user sends. Held in memory only.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    references: DashMap<String, ConversationReference>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `reference`, replacing any previous one for the same user.
    /// Returns `true` when the user was not known before.
    pub fn record(&self, reference: ConversationReference) -> bool {
        let user_id = reference.user_id.clone();
        let previous = self.references.insert(user_id.clone(), reference);
        if previous.is_none() {
            debug!(%user_id, "recorded new conversation reference");
        }
        previous.is_none()
    }

    pub fn get(&self, user_id: &str) -> Option<ConversationReference> {
        self.references.get(user_id).map(|r| r.value().clone())
    }
}
