// Messaging - notifications from the session to the host

pub mod channels;
pub mod notification;

pub use channels::{
    NotificationConsumer, NotificationProducer, NotificationSender, create_notification_channel,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
