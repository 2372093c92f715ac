//! UseCase: notification fan-out
//!
//! Persists one record per target user, then publishes
//! `notification.created` to each user's private room. Every record of a
//! call is written before the first publish.

use std::sync::Arc;

use taskboard_shared::time::Clock;

use crate::domain::{
    Event, EventPublisher, Notification, NotificationIntent, NotificationPayload,
    NotificationRepository, NotificationType, RoomKey, TeamId, UserId,
};

use super::error::NotifyError;

/// Records returned by `list_for_user`
pub const NOTIFICATION_LIST_LIMIT: usize = 50;

pub struct NotificationFanout {
    repository: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl NotificationFanout {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            publisher,
            clock,
        }
    }

    /// Same message for every user. Repeated user ids get a single record.
    pub async fn notify(
        &self,
        user_ids: &[UserId],
        team_id: Option<TeamId>,
        r#type: NotificationType,
        message: &str,
    ) -> Result<Vec<Notification>, NotifyError> {
        let mut targets: Vec<UserId> = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if !targets.contains(user_id) {
                targets.push(*user_id);
            }
        }

        let intents = targets
            .into_iter()
            .map(|user_id| NotificationIntent {
                user_id,
                r#type,
                message: message.to_string(),
            })
            .collect();
        self.deliver(team_id, intents).await
    }

    /// Persist and publish the intents produced by the notification policy.
    pub async fn deliver(
        &self,
        team_id: Option<TeamId>,
        intents: Vec<NotificationIntent>,
    ) -> Result<Vec<Notification>, NotifyError> {
        if intents.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Notification> = intents
            .into_iter()
            .map(|intent| {
                Notification::unread(
                    intent.user_id,
                    team_id,
                    intent.r#type,
                    intent.message,
                    self.clock.now(),
                )
            })
            .collect();
        self.repository.insert_many(records.clone()).await?;

        for record in &records {
            self.publisher.publish(
                RoomKey::for_user(&record.user_id),
                Event::NotificationCreated(NotificationPayload::from(record)),
            );
        }
        tracing::debug!("Fanned out {} notification(s)", records.len());
        Ok(records)
    }

    /// The newest records for a user, newest first
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, NotifyError> {
        Ok(self
            .repository
            .list_for_user(user_id, NOTIFICATION_LIST_LIMIT)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{EventEnvelope, RepositoryError},
        infrastructure::repository::InMemoryNotificationRepository,
    };
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use taskboard_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 接続がなくても通知レコードが対象人数ぶん永続化されること
    // - 永続化が publish より先に行われること
    // - 永続化に失敗した場合は何も publish されないこと
    // ========================================

    /// Counts persisted records so the publisher can observe write-before-publish
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryNotificationRepository,
        stored: AtomicUsize,
    }

    #[async_trait]
    impl NotificationRepository for CountingRepository {
        async fn insert_many(&self, notifications: Vec<Notification>) -> Result<(), RepositoryError> {
            let count = notifications.len();
            self.inner.insert_many(notifications).await?;
            self.stored.fetch_add(count, Ordering::SeqCst);
            Ok(())
        }

        async fn list_for_user(
            &self,
            user_id: &UserId,
            limit: usize,
        ) -> Result<Vec<Notification>, RepositoryError> {
            self.inner.list_for_user(user_id, limit).await
        }
    }

    /// Records submitted envelopes together with the record count at that moment
    struct RecordingPublisher {
        repository: Arc<CountingRepository>,
        seen: Mutex<Vec<(EventEnvelope, usize)>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn submit(&self, envelope: EventEnvelope) {
            let stored = self.repository.stored.load(Ordering::SeqCst);
            self.seen.lock().unwrap().push((envelope, stored));
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl NotificationRepository for FailingRepository {
        async fn insert_many(&self, _notifications: Vec<Notification>) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("disk full".to_string()))
        }

        async fn list_for_user(
            &self,
            _user_id: &UserId,
            _limit: usize,
        ) -> Result<Vec<Notification>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::stepping(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            Duration::seconds(1),
        ))
    }

    fn setup() -> (NotificationFanout, Arc<CountingRepository>, Arc<RecordingPublisher>) {
        let repository = Arc::new(CountingRepository::default());
        let publisher = Arc::new(RecordingPublisher {
            repository: repository.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let fanout = NotificationFanout::new(repository.clone(), publisher.clone(), clock());
        (fanout, repository, publisher)
    }

    #[tokio::test]
    async fn test_notify_persists_one_record_per_user() {
        // テスト項目: notify([u1, u2]) でレコードがちょうど 2 件増える（接続なしでも）
        // given (前提条件):
        let (fanout, repository, _publisher) = setup();
        let u1 = UserId::generate();
        let u2 = UserId::generate();

        // when (操作):
        let records = fanout
            .notify(&[u1, u2, u1], None, NotificationType::TodoUpdated, "Task \"x\" was updated")
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(records.len(), 2);
        assert_eq!(repository.inner.count().await, 2);
        assert!(records.iter().all(|record| !record.read));
    }

    #[tokio::test]
    async fn test_records_are_written_before_first_publish() {
        // テスト項目: 最初の publish の時点で全レコードが永続化済み
        // given (前提条件):
        let (fanout, _repository, publisher) = setup();
        let users = [UserId::generate(), UserId::generate(), UserId::generate()];

        // when (操作):
        fanout
            .notify(&users, Some(TeamId::generate()), NotificationType::TodoCreated, "hi")
            .await
            .unwrap();

        // then (期待する結果):
        let seen = publisher.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(_, stored)| *stored == 3));
        let rooms: Vec<RoomKey> = seen.iter().map(|(envelope, _)| envelope.room.clone()).collect();
        assert_eq!(rooms, users.iter().map(RoomKey::for_user).collect::<Vec<_>>());
        assert!(
            seen.iter()
                .all(|(envelope, _)| envelope.event.name() == "notification.created")
        );
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        // テスト項目: 永続化に失敗した場合はエラーを返し、何も publish しない
        // given (前提条件):
        let (_, repository, publisher) = setup();
        let fanout = NotificationFanout::new(Arc::new(FailingRepository), publisher.clone(), clock());

        // when (操作):
        let result = fanout
            .notify(&[UserId::generate()], None, NotificationType::TodoDeleted, "gone")
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(NotifyError::Repository(_))));
        assert!(publisher.seen.lock().unwrap().is_empty());
        assert_eq!(repository.inner.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_for_user_returns_newest_first() {
        // テスト項目: list_for_user は新しい順に返す
        // given (前提条件):
        let (fanout, _repository, _publisher) = setup();
        let user = UserId::generate();
        for message in ["first", "second", "third"] {
            fanout
                .notify(&[user], None, NotificationType::TodoUpdated, message)
                .await
                .unwrap();
        }

        // when (操作):
        let listed = fanout.list_for_user(&user).await.unwrap();

        // then (期待する結果):
        let messages: Vec<&str> = listed.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }
}
