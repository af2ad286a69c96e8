//! Event-Broadcaster – In-Process-Transport fuer WebSocket-Verbindungen
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen Clients
//! und die Raum-Gruppen. Jede WebSocket-Task liest aus ihrer eigenen Queue
//! und schreibt auf den Socket.
//!
//! ## Selektives Broadcasting
//! - An eine Verbindung: `an_verbindung_senden`
//! - An einen Raum ausser einer Verbindung: `an_raum_ausser_senden`

use std::sync::Arc;

use dashmap::DashMap;
use lobbyfunk_core::types::{ConnectionId, RoomCode};
use lobbyfunk_protocol::ServerMessage;
use tokio::sync::mpsc;

use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub id: ConnectionId,
    pub tx: mpsc::Sender<ServerMessage>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: ServerMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(n)) => {
                tracing::warn!(
                    verbindung = %self.id,
                    ereignis = n.ereignis_name(),
                    "Send-Queue voll – Nachricht verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach ConnectionId
    clients: DashMap<ConnectionId, ClientSender>,
    /// Raum-Mitgliedschaft: raum -> Vec<ConnectionId>
    raum_mitglieder: DashMap<RoomCode, Vec<ConnectionId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                raum_mitglieder: DashMap::new(),
            }),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die WebSocket-Task liest aus dieser Queue und sendet ueber den Socket.
    pub fn client_registrieren(&self, id: ConnectionId) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { id: id.clone(), tx };
        self.inner.clients.insert(id.clone(), sender);
        tracing::debug!(verbindung = %id, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Client aus dem Broadcaster und allen Raeumen
    pub fn client_entfernen(&self, id: &ConnectionId) {
        self.inner.clients.remove(id);
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|m| m != id);
        });
        // Leere Raum-Eintraege aufraeumen
        self.inner.raum_mitglieder.retain(|_, mitglieder| !mitglieder.is_empty());
        tracing::debug!(verbindung = %id, "Client aus Broadcaster entfernt");
    }

    /// Fuegt einen registrierten Client einer Raum-Gruppe hinzu
    pub fn raum_beitreten(&self, id: &ConnectionId, raum: &RoomCode) -> bool {
        if !self.ist_registriert(id) {
            return false;
        }
        {
            let mut mitglieder = self.inner.raum_mitglieder.entry(raum.clone()).or_default();
            if !mitglieder.contains(id) {
                mitglieder.push(id.clone());
            }
        }
        // Paralleles client_entfernen zwischen Pruefung und Einfuegen
        if !self.ist_registriert(id) {
            self.raum_verlassen(id, raum);
            return false;
        }
        true
    }

    /// Entfernt einen Client aus einer Raum-Gruppe
    pub fn raum_verlassen(&self, id: &ConnectionId, raum: &RoomCode) {
        let leer = match self.inner.raum_mitglieder.get_mut(raum) {
            Some(mut mitglieder) => {
                mitglieder.retain(|m| m != id);
                mitglieder.is_empty()
            }
            None => false,
        };
        if leer {
            self.inner.raum_mitglieder.remove_if(raum, |_, m| m.is_empty());
        }
    }

    /// Sendet eine Nachricht an einen einzelnen Client
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und die Nachricht eingereiht wurde.
    pub fn an_verbindung_senden(&self, id: &ConnectionId, nachricht: ServerMessage) -> bool {
        match self.inner.clients.get(id) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(verbindung = %id, "Senden an unbekannten Client");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Clients in einem Raum ausser einem
    ///
    /// Nuetzlich um Join-Events zu verteilen ohne den Ausloeser zu informieren.
    pub fn an_raum_ausser_senden(
        &self,
        raum: &RoomCode,
        ausgeschlossen: &ConnectionId,
        nachricht: ServerMessage,
    ) -> usize {
        let mitglieder = self.mitglieder(raum);
        self.an_mitglieder_senden(mitglieder.iter().filter(|m| *m != ausgeschlossen), nachricht)
    }

    fn an_mitglieder_senden<'a>(
        &self,
        mitglieder: impl Iterator<Item = &'a ConnectionId>,
        nachricht: ServerMessage,
    ) -> usize {
        let mut gesendet = 0;
        for id in mitglieder {
            if let Some(sender) = self.inner.clients.get(id) {
                if sender.senden(nachricht.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, id: &ConnectionId) -> bool {
        self.inner.clients.contains_key(id)
    }

    /// Gibt alle registrierten Verbindungen in einem Raum zurueck
    pub fn mitglieder(&self, raum: &RoomCode) -> Vec<ConnectionId> {
        let ids = self
            .inner
            .raum_mitglieder
            .get(raum)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        ids.into_iter().filter(|id| self.ist_registriert(id)).collect()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

impl Transport for EventBroadcaster {
    fn an_verbindung_senden(&self, id: &ConnectionId, nachricht: ServerMessage) -> bool {
        EventBroadcaster::an_verbindung_senden(self, id, nachricht)
    }

    fn gruppe_beitreten(&self, id: &ConnectionId, raum: &RoomCode) -> bool {
        self.raum_beitreten(id, raum)
    }

    fn gruppe_verlassen(&self, id: &ConnectionId, raum: &RoomCode) {
        self.raum_verlassen(id, raum)
    }

    fn an_gruppe_ausser_senden(
        &self,
        raum: &RoomCode,
        ausgeschlossen: &ConnectionId,
        nachricht: ServerMessage,
    ) -> usize {
        self.an_raum_ausser_senden(raum, ausgeschlossen, nachricht)
    }

    fn gruppen_mitglieder(&self, raum: &RoomCode) -> Vec<ConnectionId> {
        self.mitglieder(raum)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
