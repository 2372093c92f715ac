//! InMemory Notification Repository 実装

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Notification, NotificationRepository, RepositoryError, UserId};

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    /// Append-only, in insertion order
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.notifications.read().await.len()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<(), RepositoryError> {
        let mut stored = self.notifications.write().await;
        stored.extend(notifications);
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let stored = self.notifications.read().await;
        // newest insert first among equal timestamps
        let mut records: Vec<Notification> = stored
            .iter()
            .rev()
            .filter(|n| n.user_id == *user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }
}
