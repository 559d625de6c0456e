use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use shelfcure_shared::errors::{AppError, AppResult};
use shelfcure_shared::types::api::ApiResponse;
use shelfcure_shared::types::auth::AuthUser;
use shelfcure_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Notification, NotificationType, Priority};
use crate::services::generator::{self, GenerateSummary};
use crate::services::notification_service::{self, NotificationFilter};
use crate::AppState;

/// GET /notifications
/// List notifications for the caller's store, newest first, with optional
/// `type`, `priority`, and `is_read` filters.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<NotificationFilter>,
) -> AppResult<Json<ApiResponse<Paginated<Notification>>>> {
    validate_filter(&filter)?;

    let limit = params.limit() as i64;
    let offset = params.offset() as i64;

    let (items, total) = notification_service::list_notifications(
        &state.db,
        auth_user.store_id,
        &filter,
        limit,
        offset,
    )?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

fn validate_filter(filter: &NotificationFilter) -> AppResult<()> {
    if let Some(t) = &filter.notification_type {
        NotificationType::from_str(t).map_err(AppError::Validation)?;
    }
    if let Some(p) = &filter.priority {
        Priority::from_str(p).map_err(AppError::Validation)?;
    }
    Ok(())
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = notification_service::count_unread(&state.db, auth_user.store_id)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { count })))
}

#[derive(Debug, serde::Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// POST /notifications/generate
/// Run all condition scanners for the caller's store and push any new
/// notifications to connected clients. Safe to retry: duplicates are
/// suppressed by the unread dedupe key.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<GenerateSummary>>> {
    let summary = generator::generate(&state, auth_user.store_id).await?;

    let message = format!(
        "{} notifications generated, {} duplicates skipped",
        summary.generated, summary.duplicates
    );
    Ok(Json(ApiResponse::ok_with_message(summary, message)))
}

/// PATCH /notifications/:id/read
/// Mark a single notification as read. 404 when the id does not resolve
/// inside the caller's store scope; a repeat call is a no-op success.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_read(&state.db, id, auth_user.store_id)?;

    Ok(Json(ApiResponse::ok(notification)))
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = notification_service::mark_all_read(&state.db, auth_user.store_id)?;

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

#[derive(Debug, serde::Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_validation_accepts_known_values() {
        let filter = NotificationFilter {
            notification_type: Some("expiry_alert".into()),
            priority: Some("high".into()),
            is_read: Some(false),
        };
        assert!(validate_filter(&filter).is_ok());
    }

    #[test]
    fn filter_validation_rejects_unknown_type() {
        let filter = NotificationFilter {
            notification_type: Some("price_drop".into()),
            priority: None,
            is_read: None,
        };
        assert!(matches!(validate_filter(&filter), Err(AppError::Validation(_))));
    }

    #[test]
    fn filter_validation_rejects_unknown_priority() {
        let filter = NotificationFilter {
            notification_type: None,
            priority: Some("urgent".into()),
            is_read: None,
        };
        assert!(matches!(validate_filter(&filter), Err(AppError::Validation(_))));
    }
}
