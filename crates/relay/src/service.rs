//! Relay Credential Service
//!
//! Haelt pro Verbindung genau einen abgeleiteten Schluessel. Schreibzugriffe
//! (Ausgabe, Widerruf) sind exklusiv, Authentifizierungen laufen parallel
//! unter einer kurzen Lesesperre.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use lobbyfunk_core::types::ConnectionId;
use parking_lot::RwLock;

use crate::config::RelayConfig;
use crate::error::RelayResult;
use crate::schluessel::{auth_key_ableiten, AuthKey};
use crate::secret::{secret_generieren, EntropieQuelle, OsEntropie};

/// Callback-Schnittstelle fuer einen externen TURN-Server
pub trait RelayAuthHandler: Send + Sync {
    /// Liefert den Schluessel fuer `username` oder `None` zum Ablehnen
    fn authentifizieren(&self, username: &str, realm: &str, quelle: SocketAddr) -> Option<AuthKey>;
}

pub struct RelayCredentialService {
    config: RelayConfig,
    quelle: Arc<dyn EntropieQuelle>,
    /// username -> abgeleiteter Schluessel
    benutzer: RwLock<HashMap<String, AuthKey>>,
}

impl RelayCredentialService {
    /// Erstellt den Dienst mit der Betriebssystem-Zufallsquelle
    pub fn neu(config: RelayConfig) -> Self {
        Self::mit_quelle(config, Arc::new(OsEntropie))
    }

    /// Erstellt den Dienst mit einer eigenen Zufallsquelle
    pub fn mit_quelle(config: RelayConfig, quelle: Arc<dyn EntropieQuelle>) -> Self {
        Self {
            config,
            quelle,
            benutzer: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn realm(&self) -> &str {
        &self.config.realm
    }

    /// Gibt neue Zugangsdaten fuer eine Verbindung aus
    ///
    /// Gibt das Klartext-Secret zurueck. Ein vorhandener Eintrag wird ersetzt.
    /// Schlaegt die Zufallsquelle fehl, wird auch ein alter Eintrag entfernt.
    pub fn benutzer_hinzufuegen(&self, id: &ConnectionId) -> RelayResult<String> {
        let secret = match secret_generieren(self.quelle.as_ref(), self.config.secret_laenge) {
            Ok(secret) => secret,
            Err(e) => {
                self.benutzer.write().remove(id.as_str());
                tracing::warn!(verbindung = %id, fehler = %e, "TURN-Zugangsdaten nicht ausgegeben");
                return Err(e);
            }
        };
        let key = auth_key_ableiten(id.as_str(), &self.config.realm, &secret);

        let ersetzt = self.benutzer.write().insert(id.as_str().to_string(), key).is_some();
        tracing::debug!(verbindung = %id, ersetzt, "TURN-Zugangsdaten ausgegeben");
        Ok(secret)
    }

    /// Widerruft die Zugangsdaten einer Verbindung
    pub fn benutzer_entfernen(&self, id: &ConnectionId) -> bool {
        let entfernt = self.benutzer.write().remove(id.as_str()).is_some();
        if entfernt {
            tracing::debug!(verbindung = %id, "TURN-Zugangsdaten widerrufen");
        }
        entfernt
    }

    /// Schluessel-Lookup fuer den TURN-Server; fremde Realms werden abgelehnt
    pub fn authentifizieren(&self, username: &str, realm: &str, quelle: SocketAddr) -> Option<AuthKey> {
        if realm != self.config.realm {
            tracing::debug!(username, realm, quelle = %quelle, "TURN-Anfrage mit fremdem Realm abgelehnt");
            return None;
        }
        let key = self.benutzer.read().get(username).copied();
        if key.is_none() {
            tracing::debug!(username, quelle = %quelle, "TURN-Anfrage fuer unbekannten Benutzer");
        }
        key
    }

    /// Anzahl aktiver Zugangsdaten
    pub fn anzahl(&self) -> usize {
        self.benutzer.read().len()
    }
}

impl RelayAuthHandler for RelayCredentialService {
    fn authentifizieren(&self, username: &str, realm: &str, quelle: SocketAddr) -> Option<AuthKey> {
        RelayCredentialService::authentifizieren(self, username, realm, quelle)
    }
}

impl std::fmt::Debug for RelayCredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCredentialService")
            .field("realm", &self.config.realm)
            .field("benutzer", &self.anzahl())
            .finish()
    }
}
