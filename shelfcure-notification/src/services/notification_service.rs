use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::upsert::*;
use serde::Deserialize;
use uuid::Uuid;

use shelfcure_shared::clients::db::{DbPool, PooledConn};
use shelfcure_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewNotification, Notification};
use crate::scanners::Candidate;
use crate::schema::notifications;

/// Optional list filters, matched exactly against the stored text columns.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NotificationFilter {
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub priority: Option<String>,
    pub is_read: Option<bool>,
}

fn get_conn(pool: &DbPool) -> AppResult<PooledConn> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })
}

/// Persist a candidate unless an unread notification with the same
/// `(store_id, type, related_entity)` already exists. The partial unique
/// index makes this check-and-insert atomic, so concurrent generation runs
/// for the same store cannot double-create. Returns `None` for a duplicate.
pub fn insert_if_absent(
    pool: &DbPool,
    store_id: Uuid,
    candidate: &Candidate,
) -> AppResult<Option<Notification>> {
    let mut conn = get_conn(pool)?;

    let new_notification = NewNotification {
        store_id,
        notification_type: candidate.notification_type.as_str().to_string(),
        title: candidate.title.clone(),
        message: candidate.message.clone(),
        priority: candidate.priority.as_str().to_string(),
        related_entity: candidate.related_entity.clone(),
    };

    let notification = diesel::insert_into(notifications::table)
        .values(&new_notification)
        .on_conflict((
            notifications::store_id,
            notifications::notification_type,
            notifications::related_entity,
        ))
        .filter_target(notifications::is_read.eq(false))
        .do_nothing()
        .get_result::<Notification>(&mut conn)
        .optional()?;

    if let Some(n) = &notification {
        tracing::debug!(
            notification_id = %n.id,
            store_id = %store_id,
            notification_type = %n.notification_type,
            "notification created"
        );
    }

    Ok(notification)
}

/// List notifications for a store, newest first, with optional filters.
pub fn list_notifications(
    pool: &DbPool,
    store_id: Uuid,
    filter: &NotificationFilter,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<Notification>, i64)> {
    let mut conn = get_conn(pool)?;

    let mut count_query = notifications::table
        .select(count_star())
        .filter(notifications::store_id.eq(store_id))
        .into_boxed();
    let mut items_query = notifications::table
        .filter(notifications::store_id.eq(store_id))
        .into_boxed();

    if let Some(t) = &filter.notification_type {
        count_query = count_query.filter(notifications::notification_type.eq(t.clone()));
        items_query = items_query.filter(notifications::notification_type.eq(t.clone()));
    }
    if let Some(p) = &filter.priority {
        count_query = count_query.filter(notifications::priority.eq(p.clone()));
        items_query = items_query.filter(notifications::priority.eq(p.clone()));
    }
    if let Some(r) = filter.is_read {
        count_query = count_query.filter(notifications::is_read.eq(r));
        items_query = items_query.filter(notifications::is_read.eq(r));
    }

    let total: i64 = count_query.get_result(&mut conn)?;

    let items = items_query
        .order(notifications::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<Notification>(&mut conn)?;

    Ok((items, total))
}

/// Count unread notifications for a store.
pub fn count_unread(pool: &DbPool, store_id: Uuid) -> AppResult<i64> {
    let mut conn = get_conn(pool)?;

    let count: i64 = notifications::table
        .filter(notifications::store_id.eq(store_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(&mut conn)?;

    Ok(count)
}

/// Mark a single notification as read, scoped to the caller's store.
/// Idempotent: re-reading an already-read notification succeeds.
pub fn mark_read(pool: &DbPool, notification_id: Uuid, store_id: Uuid) -> AppResult<Notification> {
    let mut conn = get_conn(pool)?;

    let notification = diesel::update(
        notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::store_id.eq(store_id)),
    )
    .set(notifications::is_read.eq(true))
    .get_result::<Notification>(&mut conn)
    .map_err(|e| match e {
        diesel::result::Error::NotFound => {
            AppError::new(ErrorCode::NotificationNotFound, "notification not found")
        }
        other => AppError::Database(other),
    })?;

    Ok(notification)
}

/// Mark every unread notification for a store as read.
pub fn mark_all_read(pool: &DbPool, store_id: Uuid) -> AppResult<usize> {
    let mut conn = get_conn(pool)?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::store_id.eq(store_id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut conn)?;

    Ok(updated)
}
