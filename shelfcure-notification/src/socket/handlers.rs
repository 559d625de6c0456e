use std::sync::Arc;

use serde::Serialize;
use socketioxide::extract::{Data, SocketRef};
use uuid::Uuid;

use crate::AppState;

/// Authenticated identity attached to a connected socket.
#[derive(Debug, Clone, Copy)]
pub struct SocketAuth {
    pub user_id: Uuid,
    pub store_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

fn get_auth(socket: &SocketRef) -> Option<SocketAuth> {
    socket.extensions.get::<SocketAuth>()
}

pub async fn on_connect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let auth = match authenticate_socket(&socket, &state) {
        Ok(auth) => auth,
        Err(msg) => {
            tracing::warn!(error = %msg, "notification socket auth failed");
            let _ = socket.emit(
                "error",
                &ErrorPayload {
                    code: "AUTH_FAILED".into(),
                    message: msg,
                },
            );
            socket.disconnect().ok();
            return;
        }
    };

    socket.extensions.insert(auth);

    tracing::info!(user_id = %auth.user_id, sid = %socket.id, "notification socket connected");

    let _ = socket.emit(
        "connected",
        &serde_json::json!({ "user_id": auth.user_id, "store_id": auth.store_id }),
    );

    // Subscribe to a store's notification stream
    socket.on("join-store", {
        let state = state.clone();
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let state = state.clone();
            async move { on_join_store(socket, payload, &state).await; }
        }
    });

    socket.on("leave-store", {
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                state.channels.leave(&socket.id.to_string());
                let _ = socket.emit("store-left", &serde_json::json!({}));
            }
        }
    });

    socket.on_disconnect({
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                state.channels.leave(&socket.id.to_string());
                if let Some(auth) = get_auth(&socket) {
                    tracing::info!(user_id = %auth.user_id, sid = %socket.id, "notification socket disconnected");
                }
            }
        }
    });
}

async fn on_join_store(socket: SocketRef, payload: serde_json::Value, state: &Arc<AppState>) {
    let auth = match get_auth(&socket) {
        Some(auth) => auth,
        None => return,
    };

    let store_id = match payload
        .get("store_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(id) => id,
        None => {
            tracing::warn!(sid = %socket.id, "join-store missing or invalid store_id");
            let _ = socket.emit(
                "error",
                &ErrorPayload {
                    code: "INVALID_PAYLOAD".into(),
                    message: "join-store requires a store_id".into(),
                },
            );
            return;
        }
    };

    // A client may only subscribe to the store its token is scoped to.
    if store_id != auth.store_id {
        tracing::warn!(
            user_id = %auth.user_id,
            requested = %store_id,
            scoped = %auth.store_id,
            "join-store rejected: outside caller's store scope"
        );
        let _ = socket.emit(
            "error",
            &ErrorPayload {
                code: "STORE_SCOPE".into(),
                message: "cannot join a store outside your scope".into(),
            },
        );
        return;
    }

    let mut rx = state.channels.join(&socket.id.to_string(), store_id);

    // Forward registry messages to this socket. The task ends when the
    // channel is replaced (re-join), the client leaves, or it disconnects.
    let forward_socket = socket.clone();
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if forward_socket.emit("new-notification", &payload).is_err() {
                break;
            }
        }
    });

    let _ = socket.emit("store-joined", &serde_json::json!({ "store_id": store_id }));

    tracing::info!(user_id = %auth.user_id, store_id = %store_id, sid = %socket.id, "joined store channel");
}

fn authenticate_socket(socket: &SocketRef, state: &Arc<AppState>) -> Result<SocketAuth, String> {
    let connect_info = socket.req_parts();

    // Extract token from query string ?token=xxx
    let query = connect_info.uri.query().unwrap_or_default();
    let token = query
        .split('&')
        .find_map(|pair| {
            let mut split = pair.splitn(2, '=');
            let key = split.next()?;
            let value = split.next()?;
            if key == "token" {
                Some(value.to_string())
            } else {
                None
            }
        })
        .ok_or_else(|| "missing token query parameter".to_string())?;

    // Validate JWT
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = jsonwebtoken::decode::<shelfcure_shared::types::auth::Claims>(
        &token,
        &jsonwebtoken::DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("invalid token: {e}"))?;

    if token_data.claims.is_expired() {
        return Err("token has expired".into());
    }

    Ok(SocketAuth {
        user_id: token_data.claims.sub,
        store_id: token_data.claims.store_id,
    })
}
