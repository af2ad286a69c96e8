//! Ausgehende Nachrichten an Clients

use std::collections::HashMap;

use lobbyfunk_core::types::{ConnectionId, PlayerId};
use serde::{Deserialize, Serialize};

use crate::peer::PeerConfig;

/// Weitergeleitete Signaling-Nutzlast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    pub data: serde_json::Value,
    pub from: ConnectionId,
}

/// Alle Nachrichten, die der Server an einen Client sendet
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// STUN/TURN-Konfiguration, einmal pro Verbindung
    PeerConfig(PeerConfig),
    /// Ein neues Mitglied hat den Raum betreten
    Join(ConnectionId, PlayerId),
    /// Spieler-IDs aller bereits anwesenden Mitglieder
    SetIds(HashMap<ConnectionId, PlayerId>),
    /// Ein Mitglied hat seine Spieler-ID gesetzt
    SetId(ConnectionId, PlayerId),
    /// Weitergeleitetes Signal
    Signal(SignalPayload),
}

impl ServerMessage {
    /// Ereignisname auf dem Draht
    pub fn ereignis_name(&self) -> &'static str {
        match self {
            Self::PeerConfig(_) => "peerConfig",
            Self::Join(..) => "join",
            Self::SetIds(_) => "setIds",
            Self::SetId(..) => "setId",
            Self::Signal(_) => "signal",
        }
    }
}
