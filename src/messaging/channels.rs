// Lock-free notification channel

use crate::messaging::notification::Notification;
use ringbuf::{
    HeapRb,
    traits::{Producer, Split},
};
use std::sync::{Arc, Mutex};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Producer side shared between the session loop and its spawned calls
#[derive(Clone)]
pub struct NotificationSender {
    inner: Arc<Mutex<NotificationProducer>>,
}

impl NotificationSender {
    pub fn new(producer: NotificationProducer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(producer)),
        }
    }

    /// Push a notification; returns false when it had to be dropped
    pub fn send(&self, notification: Notification) -> bool {
        let Ok(mut producer) = self.inner.lock() else {
            tracing::warn!("notification producer poisoned, dropping notification");
            return false;
        };

        match producer.try_push(notification) {
            Ok(()) => true,
            Err(dropped) => {
                tracing::warn!(message = %dropped.message, "notification queue full, dropping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::NotificationCategory;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_full_queue_drops_newest() {
        let (producer, mut consumer) = create_notification_channel(2);
        let sender = NotificationSender::new(producer);

        assert!(sender.send(Notification::info(NotificationCategory::Seek, "1".to_string())));
        assert!(sender.clone().send(Notification::info(NotificationCategory::Seek, "2".to_string())));
        assert!(!sender.send(Notification::info(NotificationCategory::Seek, "3".to_string())));

        let messages: Vec<String> = consumer.pop_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["1", "2"]);
    }
}
