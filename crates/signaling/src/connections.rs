//! Connection Registry – Welche Verbindung ist in welchem Raum?
//!
//! Haelt den ephemeren Zustand aller verbundenen Clients. Viele parallele
//! Leser, exklusive Schreiber. Lookups fuer bereits getrennte Verbindungen
//! sind ein erwartetes Rennen und liefern `None`, keinen Fehler.

use std::collections::HashMap;
use std::time::Instant;

use lobbyfunk_core::types::{ConnectionId, RoomCode};
use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// VerbindungsZustand
// ---------------------------------------------------------------------------

/// Zustand einer verbundenen Sitzung
#[derive(Debug, Clone)]
pub struct VerbindungsZustand {
    /// Aktueller Raum; `None` solange kein Raum betreten wurde
    pub raum: Option<RoomCode>,
    /// Host-Header der Upgrade-Anfrage
    pub host: Option<String>,
    pub verbunden_seit: Instant,
}

impl VerbindungsZustand {
    pub fn neu(host: Option<String>) -> Self {
        Self {
            raum: None,
            host,
            verbunden_seit: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    verbindungen: RwLock<HashMap<ConnectionId, VerbindungsZustand>>,
}

impl ConnectionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt eine Verbindung nur ein, wenn sie noch nicht existiert
    pub fn einfuegen_falls_neu(&self, id: ConnectionId, zustand: VerbindungsZustand) -> bool {
        let mut verbindungen = self.verbindungen.write();
        if verbindungen.contains_key(&id) {
            return false;
        }
        verbindungen.insert(id, zustand);
        true
    }

    /// Gibt eine Kopie des Zustands zurueck
    pub fn holen(&self, id: &ConnectionId) -> Option<VerbindungsZustand> {
        self.verbindungen.read().get(id).cloned()
    }

    /// Aktueller Raum einer Verbindung (`None` wenn unbekannt oder in keinem Raum)
    pub fn raum_von(&self, id: &ConnectionId) -> Option<RoomCode> {
        self.verbindungen.read().get(id).and_then(|z| z.raum.clone())
    }

    /// Setzt den Raum atomar und gibt den vorherigen Raum zurueck.
    ///
    /// Aeusseres `None`: Verbindung unbekannt, nichts geaendert.
    pub fn raum_setzen(&self, id: &ConnectionId, raum: Option<RoomCode>) -> Option<Option<RoomCode>> {
        let mut verbindungen = self.verbindungen.write();
        let zustand = verbindungen.get_mut(id)?;
        Some(std::mem::replace(&mut zustand.raum, raum))
    }

    pub fn entfernen(&self, id: &ConnectionId) -> Option<VerbindungsZustand> {
        self.verbindungen.write().remove(id)
    }

    pub fn ist_verbunden(&self, id: &ConnectionId) -> bool {
        self.verbindungen.read().contains_key(id)
    }

    pub fn anzahl(&self) -> usize {
        self.verbindungen.read().len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
