//! Condition scanners.
//!
//! Each scanner is a pure function of a [`StoreSnapshot`] and the configured
//! [`ScanThresholds`]: no I/O, no cross-call state, deterministic priorities.
//! A scanner that cannot evaluate its slice returns a [`ScannerError`]; the
//! generation coordinator isolates the failure instead of aborting the run.

pub mod expiry;
pub mod low_stock;
pub mod whatsapp;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Medicine, MedicineBatch, NotificationType, Priority, WhatsappMessage};

/// Read-only slice of one store's state, loaded once per generation run.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub store_id: Uuid,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
    pub medicines: Vec<Medicine>,
    pub batches: Vec<MedicineBatch>,
    pub whatsapp_messages: Vec<WhatsappMessage>,
}

/// Threshold knobs for every scanner, sourced from `AppConfig`.
#[derive(Debug, Clone, Copy)]
pub struct ScanThresholds {
    /// Batches expiring within this many days are critical (`high`).
    pub expiry_critical_days: i64,
    /// Batches expiring within this many days get a `medium` warning.
    pub expiry_warning_days: i64,
    /// Fallback reorder level for medicines without an explicit one.
    pub default_reorder_level: i32,
    /// Queued WhatsApp messages older than this are considered stuck.
    pub whatsapp_stale_minutes: i64,
}

/// A potential notification produced by a scanner, before dedupe and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// Weak reference to the triggering entity, e.g. `medicine:<uuid>`.
    /// Empty when the candidate has no single related entity.
    pub related_entity: String,
}

impl Candidate {
    /// The tuple the persistence layer dedupes on within the unread set.
    pub fn dedupe_key<'a>(&'a self, store_id: Uuid) -> (Uuid, &'static str, &'a str) {
        (store_id, self.notification_type.as_str(), &self.related_entity)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("scanner {scanner} failed: {reason}")]
pub struct ScannerError {
    pub scanner: &'static str,
    pub reason: String,
}

pub type ScanFn = fn(&StoreSnapshot, &ScanThresholds) -> Result<Vec<Candidate>, ScannerError>;

pub struct Scanner {
    pub name: &'static str,
    pub run: ScanFn,
}

/// The scanners invoked on every generation run, in a fixed order so that
/// candidate order (and therefore delivery order) is stable.
static SCANNERS: &[Scanner] = &[
    Scanner { name: "low_stock", run: low_stock::scan },
    Scanner { name: "expiry", run: expiry::scan },
    Scanner { name: "whatsapp", run: whatsapp::scan },
];

pub fn registered() -> &'static [Scanner] {
    SCANNERS
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn registry_order_is_stable() {
        let names: Vec<_> = registered().iter().map(|s| s.name).collect();
        assert_eq!(names, ["low_stock", "expiry", "whatsapp"]);
    }

    #[test]
    fn empty_snapshot_yields_no_candidates() {
        let snapshot = empty_snapshot(Uuid::new_v4());
        let thresholds = thresholds();
        for scanner in registered() {
            let candidates = (scanner.run)(&snapshot, &thresholds).unwrap();
            assert!(candidates.is_empty(), "{} produced candidates", scanner.name);
        }
    }

    #[test]
    fn dedupe_key_is_stable_across_rescans() {
        let store_id = Uuid::new_v4();
        let make = || Candidate {
            notification_type: NotificationType::LowStock,
            title: "Low stock".into(),
            message: "Paracetamol is low".into(),
            priority: Priority::Medium,
            related_entity: "medicine:a2f1".into(),
        };
        assert_eq!(make().dedupe_key(store_id), make().dedupe_key(store_id));
    }
}
