//! Fehlertypen fuer den Signaling-Service
//!
//! Ereignis-Handler melden keine Fehler an den Client zurueck; diese Typen
//! beschreiben Fehler beim Aufbau und Betrieb des WebSocket-Transports.

use lobbyfunk_protocol::ProtocolError;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Frame nicht dekodierbar oder Nachricht nicht kodierbar
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),

    /// WebSocket-Fehler
    #[error("WebSocket-Fehler: {0}")]
    WebSocket(String),

    /// Keepalive-Timeout
    #[error("Keine Lebenszeichen seit {0} Sekunden")]
    Timeout(u64),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
