//! Eingehende Ereignisse
//!
//! Alle Ereignisarten, die der Signaling-Koordinator verarbeitet. `Connect`
//! und `Disconnect` stammen vom Transport selbst, die uebrigen Varianten
//! werden aus Client-Frames dekodiert (siehe [`crate::wire`]).

use lobbyfunk_core::types::{ConnectionId, PlayerId, RoomCode};
use serde::{Deserialize, Serialize};

/// Inhalt eines `signal`-Ereignisses vom Client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    /// Opake WebRTC-Nutzlast (Offer/Answer/ICE-Kandidat)
    pub data: serde_json::Value,
    /// Ziel-Verbindung
    pub to: ConnectionId,
}

/// Feste Menge eingehender Ereignisarten
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Verbindung aufgebaut; `host` ist der Host-Header der Upgrade-Anfrage
    Connect { host: Option<String> },
    /// Verbindung beendet
    Disconnect,
    /// Raum betreten
    Join { code: RoomCode, player_id: PlayerId },
    /// Aktuellen Raum verlassen
    Leave,
    /// Spieler-ID setzen oder aendern (Drahtname `id`)
    Identify { player_id: PlayerId },
    /// Signaling-Nutzlast an eine andere Verbindung weiterleiten
    Signal(SignalRequest),
}

impl InboundEvent {
    /// Kurzname fuer Logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect => "disconnect",
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Identify { .. } => "id",
            Self::Signal(_) => "signal",
        }
    }
}
