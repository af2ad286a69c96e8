//! Prometheus-kompatible Metriken fuer Lobbyfunk
//!
//! Registrierte Metriken:
//! - `lobbyfunk_connected_clients` – Gauge: Aktuell verbundene Clients
//! - `lobbyfunk_room_joins_total` – Counter: Raum-Beitritte
//! - `lobbyfunk_signals_forwarded_total` – Counter: Zugestellte Signale
//! - `lobbyfunk_signals_dropped_total` – Counter: Verworfene Signale
//! - `lobbyfunk_relay_credentials_issued_total` – Counter: Ausgegebene TURN-Zugangsdaten
//! - `lobbyfunk_relay_credential_failures_total` – Counter: Fehlgeschlagene Ausgaben
//! - `lobbyfunk_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `lobbyfunk_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Alle Lobbyfunk-Prometheus-Metriken
#[derive(Clone)]
pub struct LobbyfunkMetrics {
    pub registry: Arc<Registry>,

    // Signaling-Metriken
    pub connected_clients: IntGauge,
    pub room_joins_total: IntCounter,
    pub signals_forwarded_total: IntCounter,
    pub signals_dropped_total: IntCounter,

    // Relay-Metriken
    pub relay_credentials_issued_total: IntCounter,
    pub relay_credential_failures_total: IntCounter,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl LobbyfunkMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Signaling ---
        let connected_clients = IntGauge::with_opts(Opts::new(
            "lobbyfunk_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let room_joins_total = IntCounter::with_opts(Opts::new(
            "lobbyfunk_room_joins_total",
            "Gesamtanzahl der Raum-Beitritte",
        ))?;
        registry.register(Box::new(room_joins_total.clone()))?;

        let signals_forwarded_total = IntCounter::with_opts(Opts::new(
            "lobbyfunk_signals_forwarded_total",
            "Gesamtanzahl zugestellter Signale",
        ))?;
        registry.register(Box::new(signals_forwarded_total.clone()))?;

        let signals_dropped_total = IntCounter::with_opts(Opts::new(
            "lobbyfunk_signals_dropped_total",
            "Gesamtanzahl verworfener Signale (fremder Raum, unbekanntes Ziel)",
        ))?;
        registry.register(Box::new(signals_dropped_total.clone()))?;

        // --- Relay ---
        let relay_credentials_issued_total = IntCounter::with_opts(Opts::new(
            "lobbyfunk_relay_credentials_issued_total",
            "Gesamtanzahl ausgegebener TURN-Zugangsdaten",
        ))?;
        registry.register(Box::new(relay_credentials_issued_total.clone()))?;

        let relay_credential_failures_total = IntCounter::with_opts(Opts::new(
            "lobbyfunk_relay_credential_failures_total",
            "Fehlgeschlagene Ausgaben von TURN-Zugangsdaten",
        ))?;
        registry.register(Box::new(relay_credential_failures_total.clone()))?;

        // --- HTTP ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("lobbyfunk_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "lobbyfunk_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            room_joins_total,
            signals_forwarded_total,
            signals_dropped_total,
            relay_credentials_issued_total,
            relay_credential_failures_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: LobbyfunkMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<LobbyfunkMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
