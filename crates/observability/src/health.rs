//! Health-Check-Endpunkt fuer Lobbyfunk
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Uptime, Verbindungsanzahl, oeffentlicher Adresse,
//! Servername und unterstuetzten Client-Versionen.
//!
//! Die Daten stammen aus einer [`StatusQuelle`], typischerweise dem
//! Signaling-Koordinator. Der Endpunkt liest nur, er veraendert nichts.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Momentaufnahme des Serverzustands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub uptime_sek: u64,
    pub verbindungen: i64,
    pub name: String,
    pub versionen: Vec<String>,
}

/// Liefert den aktuellen Serverzustand
pub trait StatusQuelle: Send + Sync + 'static {
    fn status(&self) -> StatusSnapshot;
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub uptime: u64,
    #[serde(rename = "connectionCount")]
    pub connection_count: i64,
    pub address: String,
    pub name: String,
    #[serde(rename = "supportedVersions")]
    pub supported_versions: Vec<String>,
}

impl HealthResponse {
    pub fn aus_snapshot(snapshot: StatusSnapshot, address: String) -> Self {
        Self {
            uptime: snapshot.uptime_sek,
            connection_count: snapshot.verbindungen,
            address,
            name: snapshot.name,
            supported_versions: snapshot.versionen,
        }
    }
}

/// Baut `<schema>://<host>` aus dem Host-Header der Anfrage
pub fn anfrage_adresse(tls: bool, headers: &HeaderMap) -> String {
    let schema = if tls { "https" } else { "http" };
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("{schema}://{host}")
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub quelle: Arc<dyn StatusQuelle>,
    pub tls: bool,
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(quelle: Arc<dyn StatusQuelle>, tls: bool) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(HealthState { quelle, tls })
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>, headers: HeaderMap) -> impl IntoResponse {
    let address = anfrage_adresse(state.tls, &headers);
    Json(HealthResponse::aus_snapshot(state.quelle.status(), address))
}
