//! Who gets a durable notification when a todo changes.
//!
//! Pure functions: the todo use case asks the policy for intents and hands
//! them to the notification fan-out. Nobody is ever notified about their own
//! action.

use super::{entity::NotificationType, value_object::UserId};

/// One notification the policy wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub user_id: UserId,
    pub r#type: NotificationType,
    pub message: String,
}

pub struct NotificationPolicy;

impl NotificationPolicy {
    pub fn on_created(actor: UserId, assignee: Option<UserId>, title: &str) -> Vec<NotificationIntent> {
        Self::unless_actor(actor, assignee, NotificationType::TodoCreated, assigned_message(title))
            .into_iter()
            .collect()
    }

    /// On reassignment the previous assignee hears about the update and the
    /// new assignee gets the distinct "assigned" message instead.
    pub fn on_updated(
        actor: UserId,
        previous_assignee: Option<UserId>,
        current_assignee: Option<UserId>,
        title: &str,
    ) -> Vec<NotificationIntent> {
        let kind = NotificationType::TodoUpdated;
        if previous_assignee == current_assignee {
            return Self::unless_actor(actor, current_assignee, kind, updated_message(title))
                .into_iter()
                .collect();
        }

        Self::unless_actor(actor, previous_assignee, kind, updated_message(title))
            .into_iter()
            .chain(Self::unless_actor(actor, current_assignee, kind, assigned_message(title)))
            .collect()
    }

    pub fn on_deleted(actor: UserId, assignee: Option<UserId>, title: &str) -> Vec<NotificationIntent> {
        Self::unless_actor(actor, assignee, NotificationType::TodoDeleted, deleted_message(title))
            .into_iter()
            .collect()
    }

    fn unless_actor(
        actor: UserId,
        target: Option<UserId>,
        r#type: NotificationType,
        message: String,
    ) -> Option<NotificationIntent> {
        target
            .filter(|user_id| *user_id != actor)
            .map(|user_id| NotificationIntent {
                user_id,
                r#type,
                message,
            })
    }
}

pub fn assigned_message(title: &str) -> String {
    format!("You were assigned task \"{}\"", title)
}

pub fn updated_message(title: &str) -> String {
    format!("Task \"{}\" was updated", title)
}

pub fn deleted_message(title: &str) -> String {
    format!("Task \"{}\" was deleted", title)
}
