//! Gemeinsamer Zustand fuer den Signaling-Service
//!
//! Haelt Konfiguration, Koordinator und Codec als Arc-Referenzen, die sicher
//! zwischen den WebSocket-Tasks geteilt werden koennen.

use std::sync::Arc;
use std::time::Duration;

use lobbyfunk_protocol::{FrameCodec, PeerConfig};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::broadcast::EventBroadcaster;
use crate::coordinator::SignalingCoordinator;

/// Umgang mit `id`-Ereignissen von Verbindungen ohne Raum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdOhneRaum {
    /// Spieler-ID speichern, aber nichts senden
    #[default]
    Speichern,
    /// Spieler-ID verwerfen, bis ein Raum betreten wurde
    Verwerfen,
}

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Unterstuetzte Client-Versionen (nur fuer /health)
    pub versionen: Vec<String>,
    pub id_ohne_raum: IdOhneRaum,
    /// Statische Peer-Konfiguration
    pub peer_config: Option<PeerConfig>,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Lobbyfunk".to_string(),
            versionen: Vec::new(),
            id_ohne_raum: IdOhneRaum::default(),
            peer_config: None,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

impl SignalingConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_sek)
    }

    pub fn verbindungs_timeout(&self) -> Duration {
        Duration::from_secs(self.verbindungs_timeout_sek)
    }
}

/// Gemeinsamer Zustand der WebSocket-Handler
///
/// Clone gibt eine Referenz auf denselben Koordinator.
#[derive(Clone)]
pub struct SignalingState {
    pub koordinator: Arc<SignalingCoordinator<EventBroadcaster>>,
    pub codec: FrameCodec,
    /// Wechselt auf `true` beim Herunterfahren
    pub shutdown: watch::Receiver<bool>,
}

impl SignalingState {
    pub fn neu(koordinator: Arc<SignalingCoordinator<EventBroadcaster>>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            koordinator,
            codec: FrameCodec::new(),
            shutdown,
        }
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        self.koordinator.transport()
    }
}
