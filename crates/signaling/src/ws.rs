//! WebSocket-Endpunkte des Signaling-Service
//!
//! `GET /ws` und `GET /socket.io/` fuehren beide das Upgrade durch. Der
//! Host-Header der Upgrade-Anfrage wird fuer den TURN-Eintrag gemerkt.

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};

use crate::connection::verbindung_bedienen;
use crate::server_state::SignalingState;

/// Router mit den WebSocket-Endpunkten
pub fn signaling_router(state: SignalingState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/socket.io/", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(State(state): State<SignalingState>, ws: WebSocketUpgrade, headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    ws.max_message_size(state.codec.max_frame_size())
        .on_upgrade(move |socket| verbindung_bedienen(socket, state, host))
}
