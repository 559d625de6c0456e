use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::services::{generator, store_service};
use crate::AppState;

/// Periodically scan every active store. Stores are scanned concurrently;
/// a failing store never stops the loop or the other stores.
pub async fn run_scan_loop(state: Arc<AppState>) {
    let interval_secs = state.config.scan_interval_secs;
    if interval_secs == 0 {
        tracing::info!("scheduled scans disabled (scan_interval_secs = 0)");
        return;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(interval_secs, "scan scheduler started");

    loop {
        ticker.tick().await;

        let store_ids = match store_service::active_store_ids(&state.db) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "failed to load active stores, skipping tick");
                continue;
            }
        };

        tracing::debug!(stores = store_ids.len(), "scheduled scan tick");

        for store_id in store_ids {
            let state = state.clone();
            tokio::spawn(async move {
                match generator::generate(&state, store_id).await {
                    Ok(summary) => {
                        if summary.generated > 0 || !summary.scanner_errors.is_empty() {
                            tracing::info!(
                                store_id = %store_id,
                                generated = summary.generated,
                                duplicates = summary.duplicates,
                                scanner_errors = summary.scanner_errors.len(),
                                "scheduled generation run finished"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, store_id = %store_id, "scheduled generation run failed");
                    }
                }
            });
        }
    }
}
