use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `shelfcure.{domain}.{entity}.{action}`
/// Example: `shelfcure.inventory.stock.adjusted`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            store_id: None,
            data,
        }
    }

    pub fn with_store(mut self, store_id: Uuid) -> Self {
        self.store_id = Some(store_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Inventory events
    pub const INVENTORY_STOCK_ADJUSTED: &str = "shelfcure.inventory.stock.adjusted";
    pub const INVENTORY_BATCH_RECEIVED: &str = "shelfcure.inventory.batch.received";

    // Sales events
    pub const SALES_SALE_COMPLETED: &str = "shelfcure.sales.sale.completed";

    // WhatsApp messaging events
    pub const WHATSAPP_MESSAGE_QUEUED: &str = "shelfcure.whatsapp.message.queued";
    pub const WHATSAPP_MESSAGE_FAILED: &str = "shelfcure.whatsapp.message.failed";

    // Notification events
    pub const NOTIFICATION_ALERT_CREATED: &str = "shelfcure.notification.alert.created";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct StockAdjusted {
        pub store_id: Uuid,
        pub medicine_id: Uuid,
        pub quantity_before: i32,
        pub quantity_after: i32,
        pub reason: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BatchReceived {
        pub store_id: Uuid,
        pub batch_id: Uuid,
        pub medicine_id: Uuid,
        pub quantity: i32,
        pub expiry_date: chrono::NaiveDate,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SaleCompleted {
        pub store_id: Uuid,
        pub sale_id: Uuid,
        pub total_amount: i64,
        pub item_count: i32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WhatsappMessageQueued {
        pub store_id: Uuid,
        pub message_id: Uuid,
        pub recipient: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WhatsappMessageFailed {
        pub store_id: Uuid,
        pub message_id: Uuid,
        pub recipient: String,
        pub failure_reason: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct NotificationCreated {
        pub notification_id: Uuid,
        pub store_id: Uuid,
        pub notification_type: String,
        pub priority: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_store_scope() {
        let store_id = Uuid::new_v4();
        let event = Event::new(
            "shelfcure-inventory",
            routing_keys::INVENTORY_STOCK_ADJUSTED,
            payloads::StockAdjusted {
                store_id,
                medicine_id: Uuid::new_v4(),
                quantity_before: 12,
                quantity_after: 4,
                reason: "sale".into(),
            },
        )
        .with_store(store_id);

        assert_eq!(event.store_id, Some(store_id));
        assert_eq!(event.event_type, "shelfcure.inventory.stock.adjusted");

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event<payloads::StockAdjusted> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.data.quantity_after, 4);
    }
}
