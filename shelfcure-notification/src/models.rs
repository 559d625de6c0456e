use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{medicine_batches, medicines, notifications, whatsapp_messages};

/// Closed set of alert classifications. Stored as text so new variants
/// can ship without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    LowStock,
    ExpiryAlert,
    Whatsapp,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::ExpiryAlert => "expiry_alert",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_stock" => Ok(Self::LowStock),
            "expiry_alert" => Ok(Self::ExpiryAlert),
            "whatsapp" => Ok(Self::Whatsapp),
            _ => Err(format!("unknown notification type: {s}")),
        }
    }
}

/// Ordered severity. Derived `Ord` gives `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

/// A persisted notification. Immutable after insert except for `is_read`.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub store_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub related_entity: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub store_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub related_entity: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = medicines)]
pub struct Medicine {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = medicine_batches)]
pub struct MedicineBatch {
    pub id: Uuid,
    pub store_id: Uuid,
    pub medicine_id: Uuid,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = whatsapp_messages)]
pub struct WhatsappMessage {
    pub id: Uuid,
    pub store_id: Uuid,
    pub recipient: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn notification_type_round_trip() {
        for t in [NotificationType::LowStock, NotificationType::ExpiryAlert, NotificationType::Whatsapp] {
            assert_eq!(NotificationType::from_str(t.as_str()).unwrap(), t);
        }
        assert!(NotificationType::from_str("price_drop").is_err());
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::from_str("high").unwrap(), Priority::High);
    }
}
