use shelfcure_shared::clients::rabbitmq::RabbitMQClient;
use shelfcure_shared::types::event::{payloads, routing_keys, Event};

use crate::models::Notification;

/// Announce a newly persisted notification on the event bus so audit and
/// analytics consumers can pick it up. Fire-and-forget.
pub async fn publish_notification_created(rabbitmq: &RabbitMQClient, notification: &Notification) {
    let event = Event::new(
        "shelfcure-notification",
        routing_keys::NOTIFICATION_ALERT_CREATED,
        payloads::NotificationCreated {
            notification_id: notification.id,
            store_id: notification.store_id,
            notification_type: notification.notification_type.clone(),
            priority: notification.priority.clone(),
        },
    )
    .with_store(notification.store_id);

    if let Err(e) = rabbitmq.publish(&event).await {
        tracing::error!(error = %e, "failed to publish notification.alert.created event");
    }
}
