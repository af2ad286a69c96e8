//! Peer-Konfiguration (STUN/TURN) fuer die WebRTC-Verbindungen der Clients
//!
//! Feldnamen folgen dem Client-Format (`forceRelayOnly`, `stunServers`,
//! `turnServers`). Die gleiche Struktur wird aus der Peer-Konfigurationsdatei
//! gelesen.

use serde::{Deserialize, Serialize};

/// Ein einzelner ICE-Server-Eintrag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credential: String,
}

impl IceServer {
    /// STUN-Eintrag ohne Zugangsdaten
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// TURN-Eintrag fuer `turn:<host>:<port>` mit Zugangsdaten
    pub fn turn(host: &str, port: u16, username: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            url: format!("turn:{host}:{port}"),
            username: username.into(),
            credential: credential.into(),
        }
    }
}

/// Peer-Konfiguration wie sie als `peerConfig` an den Client geht
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerConfig {
    pub force_relay_only: bool,
    pub stun_servers: Vec<IceServer>,
    pub turn_servers: Vec<IceServer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_config_feldnamen() {
        let config = PeerConfig {
            force_relay_only: true,
            stun_servers: vec![IceServer::stun("stun:stun.l.google.com:19302")],
            turn_servers: vec![IceServer::turn("voice.example.org", 3478, "abc", "geheim")],
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["forceRelayOnly"], true);
        assert_eq!(json["stunServers"][0]["url"], "stun:stun.l.google.com:19302");
        assert!(json["stunServers"][0].get("username").is_none());
        assert_eq!(json["turnServers"][0]["url"], "turn:voice.example.org:3478");
        assert_eq!(json["turnServers"][0]["username"], "abc");
        assert_eq!(json["turnServers"][0]["credential"], "geheim");
    }

    #[test]
    fn fehlende_felder_nutzen_standardwerte() {
        let config: PeerConfig =
            serde_json::from_str(r#"{"stunServers":[{"url":"stun:a"}]}"#).unwrap();
        assert!(!config.force_relay_only);
        assert_eq!(config.stun_servers.len(), 1);
        assert!(config.turn_servers.is_empty());
    }
}
