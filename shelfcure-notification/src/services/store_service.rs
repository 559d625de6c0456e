use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use shelfcure_shared::clients::db::{DbPool, PooledConn};
use shelfcure_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Medicine, MedicineBatch, WhatsappMessage};
use crate::scanners::StoreSnapshot;
use crate::schema::{medicine_batches, medicines, stores, whatsapp_messages};

fn get_conn(pool: &DbPool) -> AppResult<PooledConn> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })
}

/// Check the store exists and is active before scanning on its behalf.
pub fn ensure_store_active(pool: &DbPool, store_id: Uuid) -> AppResult<()> {
    let mut conn = get_conn(pool)?;

    let is_active = stores::table
        .filter(stores::id.eq(store_id))
        .select(stores::is_active)
        .first::<bool>(&mut conn)
        .optional()?;

    match is_active {
        None => Err(AppError::new(ErrorCode::StoreNotFound, "store not found")),
        Some(false) => Err(AppError::new(ErrorCode::StoreInactive, "store is inactive")),
        Some(true) => Ok(()),
    }
}

/// Store ids the scheduled scan loop iterates over.
pub fn active_store_ids(pool: &DbPool) -> AppResult<Vec<Uuid>> {
    let mut conn = get_conn(pool)?;

    let ids = stores::table
        .filter(stores::is_active.eq(true))
        .select(stores::id)
        .load::<Uuid>(&mut conn)?;

    Ok(ids)
}

/// Load the read-only state slice the scanners evaluate. One point-in-time
/// read per generation run; scanners themselves never touch the database.
pub fn load_snapshot(pool: &DbPool, store_id: Uuid) -> AppResult<StoreSnapshot> {
    let mut conn = get_conn(pool)?;

    let medicines = medicines::table
        .filter(medicines::store_id.eq(store_id))
        .load::<Medicine>(&mut conn)?;

    let batches = medicine_batches::table
        .filter(medicine_batches::store_id.eq(store_id))
        .load::<MedicineBatch>(&mut conn)?;

    let whatsapp_messages = whatsapp_messages::table
        .filter(whatsapp_messages::store_id.eq(store_id))
        .filter(whatsapp_messages::status.eq_any(["queued", "failed"]))
        .load::<WhatsappMessage>(&mut conn)?;

    let now = Utc::now();
    Ok(StoreSnapshot {
        store_id,
        today: now.date_naive(),
        now,
        medicines,
        batches,
        whatsapp_messages,
    })
}
