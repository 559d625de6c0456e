use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use shelfcure_shared::errors::AppResult;

use crate::scanners::{self, Candidate, ScanThresholds, StoreSnapshot};
use crate::services::{notification_service, store_service};
use crate::AppState;

/// Outcome of one generation run. `generate` never partially fails:
/// persisted notifications stay valid regardless of later dispatch errors,
/// so a retry is always safe.
#[derive(Debug, Default, Serialize)]
pub struct GenerateSummary {
    pub generated: usize,
    pub duplicates: usize,
    pub scanner_errors: Vec<String>,
}

/// Run every registered scanner for a store, persist the non-duplicate
/// candidates, and push each new notification to the store's realtime
/// subscribers in persistence order.
pub async fn generate(state: &Arc<AppState>, store_id: Uuid) -> AppResult<GenerateSummary> {
    store_service::ensure_store_active(&state.db, store_id)?;
    let snapshot = store_service::load_snapshot(&state.db, store_id)?;
    let thresholds = state.config.thresholds();

    let (candidates, scanner_errors) = collect_candidates(&snapshot, &thresholds);

    let mut summary = GenerateSummary {
        scanner_errors,
        ..Default::default()
    };

    for candidate in candidates {
        match notification_service::insert_if_absent(&state.db, store_id, &candidate)? {
            Some(notification) => {
                summary.generated += 1;

                // Best-effort fan-out; a serialization failure or empty
                // subscriber set never fails the run.
                match serde_json::to_value(&notification) {
                    Ok(payload) => {
                        let delivered = state.channels.publish(store_id, &payload);
                        tracing::debug!(
                            notification_id = %notification.id,
                            store_id = %store_id,
                            delivered,
                            "notification dispatched"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            notification_id = %notification.id,
                            "failed to serialize notification for dispatch"
                        );
                    }
                }

                crate::events::publisher::publish_notification_created(&state.rabbitmq, &notification)
                    .await;
            }
            None => {
                summary.duplicates += 1;
                let (_, kind, entity) = candidate.dedupe_key(store_id);
                tracing::debug!(
                    store_id = %store_id,
                    notification_type = kind,
                    related_entity = entity,
                    "duplicate candidate skipped"
                );
            }
        }
    }

    tracing::info!(
        store_id = %store_id,
        generated = summary.generated,
        duplicates = summary.duplicates,
        scanner_errors = summary.scanner_errors.len(),
        "generation run complete"
    );

    Ok(summary)
}

/// Run the scanner registry over a snapshot, isolating individual scanner
/// failures instead of aborting the run.
fn collect_candidates(
    snapshot: &StoreSnapshot,
    thresholds: &ScanThresholds,
) -> (Vec<Candidate>, Vec<String>) {
    let mut candidates = Vec::new();
    let mut errors = Vec::new();

    for scanner in scanners::registered() {
        match (scanner.run)(snapshot, thresholds) {
            Ok(found) => {
                tracing::debug!(
                    scanner = scanner.name,
                    store_id = %snapshot.store_id,
                    candidates = found.len(),
                    "scanner finished"
                );
                candidates.extend(found);
            }
            Err(e) => {
                tracing::warn!(scanner = scanner.name, error = %e, "scanner failed, continuing run");
                errors.push(e.to_string());
            }
        }
    }

    (candidates, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medicine, MedicineBatch};
    use crate::scanners::test_support::{empty_snapshot, thresholds};
    use crate::scanners::ScannerError;
    use chrono::Duration;

    fn failing_scanner(_: &StoreSnapshot, _: &ScanThresholds) -> Result<Vec<Candidate>, ScannerError> {
        Err(ScannerError {
            scanner: "failing",
            reason: "slice unavailable".into(),
        })
    }

    #[test]
    fn low_stock_and_expiry_conditions_both_become_candidates() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        snapshot.medicines.push(Medicine {
            id: Uuid::new_v4(),
            store_id: snapshot.store_id,
            name: "Cetirizine 10mg".into(),
            quantity: 3,
            reorder_level: Some(10),
            is_active: true,
        });
        snapshot.batches.push(MedicineBatch {
            id: Uuid::new_v4(),
            store_id: snapshot.store_id,
            medicine_id: Uuid::new_v4(),
            batch_number: "B-77".into(),
            expiry_date: snapshot.today + Duration::days(2),
            quantity: 20,
        });

        let (candidates, errors) = collect_candidates(&snapshot, &thresholds());
        assert!(errors.is_empty());
        assert_eq!(candidates.len(), 2);
        // Scanner registry order: low_stock before expiry.
        assert_eq!(candidates[0].notification_type.as_str(), "low_stock");
        assert_eq!(candidates[1].notification_type.as_str(), "expiry_alert");
        assert_eq!(candidates[1].priority.as_str(), "high");
    }

    #[test]
    fn scanner_failure_is_isolated() {
        let snapshot = empty_snapshot(Uuid::new_v4());
        let result = failing_scanner(&snapshot, &thresholds());
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "scanner failing failed: slice unavailable");

        // The coordinator records the error string without aborting.
        let mut errors = Vec::new();
        let mut candidates: Vec<Candidate> = Vec::new();
        match failing_scanner(&snapshot, &thresholds()) {
            Ok(found) => candidates.extend(found),
            Err(e) => errors.push(e.to_string()),
        }
        assert!(candidates.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn unchanged_state_produces_identical_candidates() {
        let mut snapshot = empty_snapshot(Uuid::new_v4());
        snapshot.medicines.push(Medicine {
            id: Uuid::new_v4(),
            store_id: snapshot.store_id,
            name: "Ibuprofen 400mg".into(),
            quantity: 0,
            reorder_level: Some(5),
            is_active: true,
        });

        let (first, _) = collect_candidates(&snapshot, &thresholds());
        let (second, _) = collect_candidates(&snapshot, &thresholds());
        assert_eq!(first, second);
    }
}
