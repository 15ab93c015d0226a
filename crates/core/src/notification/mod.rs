//! Notifications: storage, dispatch and the owner's inbox.
//!
//! The transfer engine and the scheduler emit [`NotificationEvent`]s after
//! each recorded mutation attempt; delivery to devices is a collaborator
//! behind [`crate::ports::NotificationSink`].

mod dispatcher;
mod service;
mod types;

pub use dispatcher::{LoggingSink, NotificationDispatcher, NotificationEvent};
pub use service::NotificationService;
pub use types::{Notification, NotificationType};
