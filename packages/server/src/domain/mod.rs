//! ドメイン層
//!
//! Value objects, entities, the typed event union, the notification policy and
//! the traits the outer layers implement (repositories, pusher, verifier,
//! publisher, text generator).

pub mod collaborator;
pub mod entity;
pub mod error;
pub mod event;
pub mod notification_policy;
pub mod repository;
pub mod value_object;

pub use collaborator::{
    EventPublisher, MessagePusher, OUTBOUND_QUEUE_CAPACITY, PusherChannel, TextGenerator,
    TokenVerifier, outbound_channel,
};
pub use entity::{Notification, NotificationType, Team, TeamMembership, TeamRole, Todo, TodoStatus, User};
pub use error::{AuthError, MessagePushError, RepositoryError, SessionError, TextGenerationError};
pub use event::{
    Event, EventEnvelope, NotificationPayload, TeamJoinedPayload, TeamPayload, TodoDeletedPayload,
    TodoPayload, UserPayload,
};
pub use notification_policy::{NotificationIntent, NotificationPolicy};
pub use repository::{NotificationRepository, TeamRepository, TodoRepository, UserRepository};
pub use value_object::{
    ConnectionId, Identity, NotificationId, RoomKey, RoomKind, TeamId, TodoId, UserId,
};
