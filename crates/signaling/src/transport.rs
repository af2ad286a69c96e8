//! Transport-Schnittstelle des Koordinators
//!
//! Der Koordinator kennt weder Sockets noch Framing. Er braucht nur
//! Unicast, Gruppenmitgliedschaft und Gruppen-Broadcast. Alle Operationen
//! sind nicht-blockierend; Zustellung wird nicht bestaetigt.

use lobbyfunk_core::types::{ConnectionId, RoomCode};
use lobbyfunk_protocol::ServerMessage;

pub trait Transport: Send + Sync + 'static {
    /// Sendet an genau eine Verbindung. `false` wenn die Verbindung fehlt
    /// oder ihre Queue voll ist.
    fn an_verbindung_senden(&self, id: &ConnectionId, nachricht: ServerMessage) -> bool;

    /// Abonniert die Broadcast-Gruppe eines Raums. `false` wenn die
    /// Verbindung dem Transport nicht (mehr) bekannt ist.
    fn gruppe_beitreten(&self, id: &ConnectionId, raum: &RoomCode) -> bool;

    fn gruppe_verlassen(&self, id: &ConnectionId, raum: &RoomCode);

    /// Sendet an alle Gruppenmitglieder ausser `ausgeschlossen` und gibt die
    /// Anzahl eingereihter Nachrichten zurueck.
    fn an_gruppe_ausser_senden(
        &self,
        raum: &RoomCode,
        ausgeschlossen: &ConnectionId,
        nachricht: ServerMessage,
    ) -> usize;

    /// Momentaufnahme der Gruppenmitglieder
    fn gruppen_mitglieder(&self, raum: &RoomCode) -> Vec<ConnectionId>;
}
