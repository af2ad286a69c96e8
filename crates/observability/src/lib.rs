//! # lobbyfunk-observability
//!
//! Observability-Crate fuer Lobbyfunk:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, StatusQuelle, StatusSnapshot};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, LobbyfunkMetrics};
pub use middleware::{metriken_middleware, request_timing_layer, timing_middleware};
