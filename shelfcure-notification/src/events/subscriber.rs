use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;
use uuid::Uuid;

use shelfcure_shared::types::event::{payloads, routing_keys, Event};

use crate::services::generator;
use crate::AppState;

/// Listen for inventory events (stock.adjusted, batch.received) and trigger
/// a generation run for the affected store. Redundant triggers are harmless:
/// the dedupe key suppresses repeat notifications.
pub async fn listen_inventory_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "shelfcure-notification.inventory",
        &[
            routing_keys::INVENTORY_STOCK_ADJUSTED,
            routing_keys::INVENTORY_BATCH_RECEIVED,
        ],
    ).await?;

    tracing::info!("listening for inventory events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                let store_id = if routing_key == routing_keys::INVENTORY_STOCK_ADJUSTED {
                    match serde_json::from_slice::<Event<payloads::StockAdjusted>>(&delivery.data) {
                        Ok(event) => {
                            tracing::info!(
                                store_id = %event.data.store_id,
                                medicine_id = %event.data.medicine_id,
                                quantity_after = event.data.quantity_after,
                                "received stock.adjusted event"
                            );
                            Some(event.data.store_id)
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize stock.adjusted event");
                            None
                        }
                    }
                } else if routing_key == routing_keys::INVENTORY_BATCH_RECEIVED {
                    match serde_json::from_slice::<Event<payloads::BatchReceived>>(&delivery.data) {
                        Ok(event) => {
                            tracing::info!(
                                store_id = %event.data.store_id,
                                batch_id = %event.data.batch_id,
                                "received batch.received event"
                            );
                            Some(event.data.store_id)
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize batch.received event");
                            None
                        }
                    }
                } else {
                    None
                };

                if let Some(store_id) = store_id {
                    trigger_generate(&state, store_id).await;
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "inventory consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for WhatsApp delivery failures and trigger a generation run so the
/// failure surfaces as a notification without waiting for the next scheduled
/// scan.
pub async fn listen_whatsapp_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "shelfcure-notification.whatsapp",
        &[routing_keys::WHATSAPP_MESSAGE_FAILED],
    ).await?;

    tracing::info!("listening for whatsapp events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::WhatsappMessageFailed>>(&delivery.data) {
                    Ok(event) => {
                        tracing::info!(
                            store_id = %event.data.store_id,
                            message_id = %event.data.message_id,
                            "received whatsapp.message.failed event"
                        );
                        trigger_generate(&state, event.data.store_id).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize whatsapp.message.failed event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "whatsapp consumer error");
            }
        }
    }

    Ok(())
}

async fn trigger_generate(state: &Arc<AppState>, store_id: Uuid) {
    match generator::generate(state, store_id).await {
        Ok(summary) => {
            tracing::debug!(
                store_id = %store_id,
                generated = summary.generated,
                duplicates = summary.duplicates,
                "event-triggered generation run finished"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, store_id = %store_id, "event-triggered generation run failed");
        }
    }
}
