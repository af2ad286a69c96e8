//! Konfiguration der TURN-Zugangsdaten

use lobbyfunk_protocol::peer::IceServer;

use crate::error::{RelayError, RelayResult};
use crate::secret::SECRET_LAENGE;

/// Einstellungen fuer die Ausgabe von TURN-Zugangsdaten
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Realm fuer die Schluesselableitung, muss mit dem TURN-Server uebereinstimmen
    pub realm: String,
    /// UDP-Port des TURN-Servers
    pub port: u16,
    /// Oeffentliche Adresse, falls kein Host-Header vorliegt
    pub oeffentliche_adresse: Option<String>,
    /// Clients sollen ausschliesslich ueber das Relay verbinden
    pub nur_relay: bool,
    /// Laenge der ausgegebenen Secrets
    pub secret_laenge: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            realm: "lobbyfunk".into(),
            port: 3478,
            oeffentliche_adresse: None,
            nur_relay: false,
            secret_laenge: SECRET_LAENGE,
        }
    }
}

impl RelayConfig {
    pub fn neu(realm: impl Into<String>, port: u16) -> Self {
        Self {
            realm: realm.into(),
            port,
            ..Self::default()
        }
    }

    /// Prueft die Konfiguration beim Start
    pub fn pruefen(&self) -> RelayResult<()> {
        if self.realm.is_empty() {
            return Err(RelayError::Konfiguration("Realm darf nicht leer sein".into()));
        }
        if self.secret_laenge < 16 {
            return Err(RelayError::Konfiguration(format!(
                "Secret-Laenge {} ist zu kurz (mindestens 16)",
                self.secret_laenge
            )));
        }
        Ok(())
    }

    /// Baut den TURN-Eintrag fuer eine Verbindung
    ///
    /// Der Host stammt aus dem Host-Header der Anfrage (ohne Port), sonst aus
    /// der oeffentlichen Adresse. Ohne beides gibt es keinen Eintrag.
    pub fn turn_eintrag(&self, anfrage_host: Option<&str>, username: &str, secret: &str) -> Option<IceServer> {
        let host = anfrage_host
            .map(host_ohne_port)
            .filter(|h| !h.is_empty())
            .or(self.oeffentliche_adresse.as_deref())?;
        Some(IceServer::turn(host, self.port, username, secret))
    }
}

/// Entfernt einen Port-Suffix aus einem Host-Header; IPv6-Klammern bleiben erhalten
pub fn host_ohne_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(ende) => &host[..=ende],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
