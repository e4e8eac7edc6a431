//! The minimal HTTP control surface: existence check, creation, listing.
//!
//! This is the discovery side-channel the browser client hits before it
//! opens a WebSocket — "does this room exist", "make me a room", "what
//! rooms are there". It shares the registry queue with the WebSocket
//! traffic, so creation and lookup are ordered with everything else.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cardroom_protocol::RoomId;
use cardroom_session::{RegistryError, RegistryHandle};

/// Builds the control-surface router.
pub fn control_router(registry: RegistryHandle) -> Router {
    Router::new()
        .route("/rooms", get(list_rooms_handler))
        .route("/create/{roomid}", get(create_room_handler))
        .route("/{roomid}", get(room_exists_handler))
        .with_state(registry)
}

/// `GET /rooms` — every room with its player count, creation order.
async fn list_rooms_handler(
    State(registry): State<RegistryHandle>,
) -> Response {
    match registry.list().await {
        Ok(rooms) => Json(rooms).into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// `GET /create/{roomid}` — `false` if the room already exists, else the
/// created room id.
async fn create_room_handler(
    State(registry): State<RegistryHandle>,
    Path(roomid): Path<String>,
) -> Response {
    let room_id = RoomId::new(roomid);
    match registry.create(room_id.clone()).await {
        Ok(()) => Json(serde_json::json!(room_id)).into_response(),
        Err(RegistryError::AlreadyExists(_)) => {
            Json(serde_json::json!(false)).into_response()
        }
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// `GET /{roomid}` — boolean existence check, used by the client to
/// validate a room link before connecting.
async fn room_exists_handler(
    State(registry): State<RegistryHandle>,
    Path(roomid): Path<String>,
) -> Response {
    match registry.exists(RoomId::new(roomid)).await {
        Ok(exists) => Json(exists).into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use cardroom_session::spawn_registry;
    use tower::ServiceExt;

    async fn get_json(
        app: &Router,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_exists_false_for_unknown_room() {
        let app = control_router(spawn_registry());

        let (status, json) = get_json(&app, "/nowhere").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_create_then_exists_true() {
        let app = control_router(spawn_registry());

        let (status, json) = get_json(&app, "/create/R1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!("R1"));

        let (_, json) = get_json(&app, "/R1").await;
        assert_eq!(json, serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_create_duplicate_returns_false() {
        let app = control_router(spawn_registry());

        let _ = get_json(&app, "/create/R1").await;
        let (status, json) = get_json(&app, "/create/R1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_rooms_lists_created_rooms_in_order() {
        let app = control_router(spawn_registry());
        let _ = get_json(&app, "/create/first").await;
        let _ = get_json(&app, "/create/second").await;

        let (status, json) = get_json(&app, "/rooms").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!([
                {"roomid": "first", "playerCount": 0},
                {"roomid": "second", "playerCount": 0},
            ])
        );
    }

    #[tokio::test]
    async fn test_rooms_empty_registry() {
        let app = control_router(spawn_registry());

        let (status, json) = get_json(&app, "/rooms").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }
}
