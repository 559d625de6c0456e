use super::{Candidate, ScanThresholds, ScannerError, StoreSnapshot};
use crate::models::{NotificationType, Priority};

/// Flag active medicines at or below their reorder level. Out-of-stock
/// medicines are `high` priority, low-but-present stock is `medium`.
pub fn scan(snapshot: &StoreSnapshot, thresholds: &ScanThresholds) -> Result<Vec<Candidate>, ScannerError> {
    let mut candidates = Vec::new();

    for medicine in &snapshot.medicines {
        if !medicine.is_active {
            continue;
        }

        let reorder_level = medicine.reorder_level.unwrap_or(thresholds.default_reorder_level);
        if medicine.quantity > reorder_level {
            continue;
        }

        let (priority, title, message) = if medicine.quantity <= 0 {
            (
                Priority::High,
                format!("Out of stock: {}", medicine.name),
                format!("{} is out of stock and needs immediate reordering", medicine.name),
            )
        } else {
            (
                Priority::Medium,
                format!("Low stock: {}", medicine.name),
                format!(
                    "{} is down to {} units (reorder level {})",
                    medicine.name, medicine.quantity, reorder_level
                ),
            )
        };

        candidates.push(Candidate {
            notification_type: NotificationType::LowStock,
            title,
            message,
            priority,
            related_entity: format!("medicine:{}", medicine.id),
        });
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Medicine;
    use crate::scanners::test_support::{empty_snapshot, thresholds};
    use uuid::Uuid;

    fn medicine(quantity: i32, reorder_level: Option<i32>) -> Medicine {
        Medicine {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            name: "Paracetamol 500mg".into(),
            quantity,
            reorder_level,
            is_active: true,
        }
    }

    #[test]
    fn stock_above_reorder_level_is_ignored() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        snapshot.medicines.push(medicine(11, Some(10)));
        assert!(scan(&snapshot, &thresholds()).unwrap().is_empty());
    }

    #[test]
    fn stock_at_reorder_level_is_medium() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        snapshot.medicines.push(medicine(10, Some(10)));

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].priority, Priority::Medium);
        assert_eq!(candidates[0].notification_type, NotificationType::LowStock);
    }

    #[test]
    fn zero_stock_is_high() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        snapshot.medicines.push(medicine(0, Some(10)));

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates[0].priority, Priority::High);
        assert!(candidates[0].title.starts_with("Out of stock"));
    }

    #[test]
    fn missing_reorder_level_uses_configured_default() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        snapshot.medicines.push(medicine(10, None)); // default threshold is 10

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn inactive_medicines_are_skipped() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let mut m = medicine(0, Some(10));
        m.is_active = false;
        snapshot.medicines.push(m);

        assert!(scan(&snapshot, &thresholds()).unwrap().is_empty());
    }

    #[test]
    fn related_entity_references_the_medicine() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        let m = medicine(2, Some(10));
        let id = m.id;
        snapshot.medicines.push(m);

        let candidates = scan(&snapshot, &thresholds()).unwrap();
        assert_eq!(candidates[0].related_entity, format!("medicine:{id}"));
    }
}
