use super::{Candidate, ScanThresholds, ScannerError, StoreSnapshot};
use crate::models::{NotificationType, Priority};

/// Flag batches with remaining stock that expire inside the warning window.
/// Already-expired batches and those inside the critical window are `high`,
/// the rest of the warning window is `medium`.
pub fn scan(snapshot: &StoreSnapshot, thresholds: &ScanThresholds) -> Result<Vec<Candidate>, ScannerError> {
    let mut candidates = Vec::new();

    for batch in &snapshot.batches {
        if batch.quantity <= 0 {
            continue;
        }

        let days_left = (batch.expiry_date - snapshot.today).num_days();
        if days_left > thresholds.expiry_warning_days {
            continue;
        }

        let medicine_name = snapshot
            .medicines
            .iter()
            .find(|m| m.id == batch.medicine_id)
            .map(|m| m.name.as_str())
            .unwrap_or("Unknown medicine");

        let priority = if days_left <= thresholds.expiry_critical_days {
            Priority::High
        } else {
            Priority::Medium
        };

        let message = if days_left < 0 {
            format!(
                "{} (batch {}) expired {} days ago with {} units remaining",
                medicine_name,
                batch.batch_number,
                -days_left,
                batch.quantity
            )
        } else {
            format!(
                "{} (batch {}) expires in {} days with {} units remaining",
                medicine_name, batch.batch_number, days_left, batch.quantity
            )
        };

        candidates.push(Candidate {
            notification_type: NotificationType::ExpiryAlert,
            title: format!("Expiry alert: {medicine_name}"),
            message,
            priority,
            related_entity: format!("batch:{}", batch.id),
        });
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medicine, MedicineBatch};
    use crate::scanners::test_support::{empty_snapshot, thresholds};
    use chrono::Duration;
    use uuid::Uuid;

    fn batch(snapshot: &super::StoreSnapshot, days_from_today: i64, quantity: i32) -> MedicineBatch {
        MedicineBatch {
            id: Uuid::new_v4(),
            store_id: snapshot.store_id,
            medicine_id: Uuid::new_v4(),
            batch_number: "B-1042".into(),
            expiry_date: snapshot.today + Duration::days(days_from_today),
            quantity,
        }
    }

    #[test]
    fn far_future_expiry_is_ignored() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let b = batch(&snapshot, 15, 40);
        snapshot.batches.push(b);
        assert!(scan(&snapshot, &thresholds()).unwrap().is_empty());
    }

    #[test]
    fn two_days_out_is_high_priority() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let b = batch(&snapshot, 2, 40);
        snapshot.batches.push(b);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].priority, Priority::High);
    }

    #[test]
    fn warning_window_is_medium_priority() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let b = batch(&snapshot, 10, 40);
        snapshot.batches.push(b);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates[0].priority, Priority::Medium);
        assert_eq!(candidates[0].notification_type, NotificationType::ExpiryAlert);
    }

    #[test]
    fn already_expired_batch_is_high() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let b = batch(&snapshot, -4, 12);
        snapshot.batches.push(b);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates[0].priority, Priority::High);
        assert!(candidates[0].message.contains("expired 4 days ago"));
    }

    #[test]
    fn empty_batches_are_ignored() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let b = batch(&snapshot, 2, 0);
        snapshot.batches.push(b);
        assert!(scan(&snapshot, &thresholds()).unwrap().is_empty());
    }

    #[test]
    fn message_names_the_medicine_when_known() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let mut b = batch(&snapshot, 5, 8);
        let medicine = Medicine {
            id: Uuid::new_v4(),
            store_id: snapshot.store_id,
            name: "Amoxicillin 250mg".into(),
            quantity: 8,
            reorder_level: Some(5),
            is_active: true,
        };
        b.medicine_id = medicine.id;
        snapshot.medicines.push(medicine);
        snapshot.batches.push(b);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert!(candidates[0].title.contains("Amoxicillin 250mg"));
    }
}
