use chrono::Duration;

use super::{Candidate, ScanThresholds, ScannerError, StoreSnapshot};
use crate::models::{NotificationType, Priority};

/// Flag outbound WhatsApp messages that failed, and queued messages that
/// have been sitting longer than the stale window.
pub fn scan(snapshot: &StoreSnapshot, thresholds: &ScanThresholds) -> Result<Vec<Candidate>, ScannerError> {
    let stale_cutoff = snapshot.now - Duration::minutes(thresholds.whatsapp_stale_minutes);
    let mut candidates = Vec::new();

    for msg in &snapshot.whatsapp_messages {
        let candidate = match msg.status.as_str() {
            "failed" => Candidate {
                notification_type: NotificationType::Whatsapp,
                title: "WhatsApp message failed".into(),
                message: match &msg.failure_reason {
                    Some(reason) => format!("Message to {} failed: {}", msg.recipient, reason),
                    None => format!("Message to {} failed", msg.recipient),
                },
                priority: Priority::High,
                related_entity: format!("whatsapp:{}", msg.id),
            },
            "queued" if msg.created_at < stale_cutoff => Candidate {
                notification_type: NotificationType::Whatsapp,
                title: "WhatsApp message stuck in queue".into(),
                message: format!(
                    "Message to {} has been queued since {}",
                    msg.recipient,
                    msg.created_at.format("%Y-%m-%d %H:%M UTC")
                ),
                priority: Priority::Medium,
                related_entity: format!("whatsapp:{}", msg.id),
            },
            _ => continue,
        };
        candidates.push(candidate);
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WhatsappMessage;
    use crate::scanners::test_support::{empty_snapshot, thresholds};
    use uuid::Uuid;

    fn message(snapshot: &StoreSnapshot, status: &str, age_minutes: i64) -> WhatsappMessage {
        WhatsappMessage {
            id: Uuid::new_v4(),
            store_id: snapshot.store_id,
            recipient: "+919876543210".into(),
            status: status.into(),
            failure_reason: None,
            created_at: snapshot.now - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn sent_messages_are_ignored() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let m = message(&snapshot, "sent", 120);
        snapshot.whatsapp_messages.push(m);
        assert!(scan(&snapshot, &thresholds()).unwrap().is_empty());
    }

    #[test]
    fn fresh_queued_messages_are_ignored() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let m = message(&snapshot, "queued", 5);
        snapshot.whatsapp_messages.push(m);
        assert!(scan(&snapshot, &thresholds()).unwrap().is_empty());
    }

    #[test]
    fn stale_queued_message_is_medium() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let m = message(&snapshot, "queued", 45);
        snapshot.whatsapp_messages.push(m);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].priority, Priority::Medium);
    }

    #[test]
    fn failed_message_is_high_and_carries_reason() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let mut m = message(&snapshot, "failed", 1);
        m.failure_reason = Some("invalid recipient".into());
        let id = m.id;
        snapshot.whatsapp_messages.push(m);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates[0].priority, Priority::High);
        assert!(candidates[0].message.contains("invalid recipient"));
        assert_eq!(candidates[0].related_entity, format!("whatsapp:{id}"));
    }
}
