//! Fehlertypen fuer Lobbyfunk
//!
//! Fehler, die beim Start des Servers auftreten und den Prozess beenden.
//! Laufzeitfehler der Signaling-Schicht liegen in `lobbyfunk-signaling`.

use thiserror::Error;

/// Globaler Result-Alias fuer Lobbyfunk
pub type Result<T> = std::result::Result<T, LobbyfunkError>;

/// Startfehler aus Konfiguration und TLS
#[derive(Debug, Error)]
pub enum LobbyfunkError {
    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- TLS ---
    #[error("TLS-Fehler: {0}")]
    Tls(String),
}
