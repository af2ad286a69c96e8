//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Einige Werte lassen sich per Umgebungsvariable
//! ueberschreiben (`LF_ADDRESS`, `LF_NAME`, `LF_VERSIONS`).

use std::path::Path;

use anyhow::Context;
use lobbyfunk_core::LobbyfunkError;
use lobbyfunk_observability::logging::{log_format_gueltig, log_level_gueltig};
use lobbyfunk_protocol::PeerConfig;
use lobbyfunk_relay::RelayConfig;
use lobbyfunk_signaling::{IdOhneRaum, SignalingConfig};
use serde::{Deserialize, Serialize};

pub const ENV_ADRESSE: &str = "LF_ADDRESS";
pub const ENV_NAME: &str = "LF_NAME";
pub const ENV_VERSIONEN: &str = "LF_VERSIONS";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Statische Peer-Konfiguration
    pub peer: PeerEinstellungen,
    /// Ausgabe von TURN-Zugangsdaten
    pub relay: RelayEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Unterstuetzte Client-Versionen, nur informativ fuer /health
    pub versionen: Vec<String>,
    /// Umgang mit `id` vor dem ersten `join`
    pub id_ohne_raum: IdOhneRaum,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Lobbyfunk".into(),
            versionen: Vec::new(),
            id_ohne_raum: IdOhneRaum::default(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub adresse: String,
    /// Verzeichnis mit TLS-Zertifikat und Schluessel (leer = kein TLS)
    pub zertifikat_pfad: Option<String>,
    /// Verzeichnis mit statischen Web-Dateien
    pub daten_pfad: Option<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            adresse: "0.0.0.0:9736".into(),
            zertifikat_pfad: None,
            daten_pfad: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerEinstellungen {
    /// Peer-Konfigurationsdatei (.toml oder .json)
    pub konfig_datei: Option<String>,
}

/// Einstellungen fuer TURN-Zugangsdaten pro Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    pub aktiviert: bool,
    /// Realm, muss mit dem TURN-Server uebereinstimmen
    pub realm: String,
    /// Host fuer den TURN-Eintrag, falls die Anfrage keinen Host-Header hat
    pub oeffentliche_adresse: Option<String>,
    pub port: u16,
    /// Clients verbinden ausschliesslich ueber das Relay
    pub nur_relay: bool,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        let standard = RelayConfig::default();
        Self {
            aktiviert: false,
            realm: standard.realm,
            oeffentliche_adresse: None,
            port: standard.port,
            nur_relay: false,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
    /// Jede HTTP-Anfrage mit Dauer protokollieren
    pub anfragen_protokollieren: bool,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            anfragen_protokollieren: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// `/metrics` ausliefern
    pub metriken: bool,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self { metriken: true }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei und wendet
    /// Umgebungsvariablen an.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.umgebung_anwenden(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Ueberschreibt Werte aus der Umgebung; leere Werte werden ignoriert
    pub fn umgebung_anwenden(&mut self, lesen: impl Fn(&str) -> Option<String>) {
        let wert = |name: &str| lesen(name).filter(|w| !w.trim().is_empty());

        if let Some(adresse) = wert(ENV_ADRESSE) {
            self.netzwerk.adresse = adresse;
        }
        if let Some(name) = wert(ENV_NAME) {
            self.server.name = name;
        }
        if let Some(versionen) = wert(ENV_VERSIONEN) {
            self.server.versionen = versionen
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Prueft die Konfiguration vor dem Start
    pub fn pruefen(&self) -> Result<(), LobbyfunkError> {
        if !log_level_gueltig(&self.logging.level) {
            return Err(LobbyfunkError::Konfiguration(format!(
                "Unbekanntes Log-Level '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(LobbyfunkError::Konfiguration(format!(
                "Unbekanntes Log-Format '{}'",
                self.logging.format
            )));
        }
        if self.relay.aktiviert {
            self.relay_config()
                .pruefen()
                .map_err(|e| LobbyfunkError::Konfiguration(e.to_string()))?;
        }
        Ok(())
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            realm: self.relay.realm.clone(),
            port: self.relay.port,
            oeffentliche_adresse: self.relay.oeffentliche_adresse.clone(),
            nur_relay: self.relay.nur_relay,
            ..RelayConfig::default()
        }
    }

    /// Baut die Signaling-Konfiguration; die Peer-Konfiguration wird
    /// separat geladen
    pub fn signaling_config(&self, peer_config: Option<PeerConfig>) -> SignalingConfig {
        SignalingConfig {
            server_name: self.server.name.clone(),
            versionen: self.server.versionen.clone(),
            id_ohne_raum: self.server.id_ohne_raum,
            peer_config,
            ..SignalingConfig::default()
        }
    }

    /// TLS ist aktiv, sobald ein Zertifikatsverzeichnis angegeben ist
    pub fn tls_aktiv(&self) -> bool {
        self.netzwerk
            .zertifikat_pfad
            .as_deref()
            .is_some_and(|p| !p.is_empty())
    }
}

/// Laedt eine Peer-Konfiguration; das Format ergibt sich aus der Dateiendung
pub fn peer_config_laden(pfad: impl AsRef<Path>) -> anyhow::Result<PeerConfig> {
    let pfad = pfad.as_ref();
    let inhalt = std::fs::read_to_string(pfad)
        .with_context(|| format!("Peer-Konfiguration '{}' nicht lesbar", pfad.display()))?;

    let endung = pfad
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let config = match endung.as_deref() {
        Some("json") => serde_json::from_str(&inhalt)
            .with_context(|| format!("Ungueltiges JSON in '{}'", pfad.display()))?,
        Some("toml") => toml::from_str(&inhalt)
            .with_context(|| format!("Ungueltiges TOML in '{}'", pfad.display()))?,
        _ => anyhow::bail!(
            "Peer-Konfiguration '{}' muss auf .toml oder .json enden",
            pfad.display()
        ),
    };
    Ok(config)
}
