//! Signaling-Koordinator – Ereignisgesteuerter Kern
//!
//! Reagiert auf connect, disconnect, join, leave, id und signal. Jede
//! Ereignisart hat genau eine Methode; [`SignalingCoordinator::ereignis_verarbeiten`]
//! verteilt exhaustiv darauf.
//!
//! ## Zustaende pro Verbindung
//! ```text
//!            join                 disconnect
//! Verbunden ──────► ImRaum ─────────────────► Weg
//!     ▲               │
//!     └───── leave ───┘
//!     │
//!     └────────────── disconnect ────────────► Weg
//! ```
//!
//! Raum-Feld in der Registry und Gruppenmitgliedschaft im Transport werden
//! nur ueber `raum_betreten` / `raum_verlassen_intern` geaendert.
//! Registries werden nie verschachtelt gesperrt.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use lobbyfunk_core::types::{ConnectionId, PlayerId, RoomCode};
use lobbyfunk_observability::{LobbyfunkMetrics, StatusQuelle, StatusSnapshot};
use lobbyfunk_protocol::{InboundEvent, PeerConfig, ServerMessage, SignalPayload, SignalRequest};
use lobbyfunk_relay::RelayCredentialService;

use crate::connections::{ConnectionRegistry, VerbindungsZustand};
use crate::players::PlayerRegistry;
use crate::server_state::{IdOhneRaum, SignalingConfig};
use crate::transport::Transport;

pub struct SignalingCoordinator<T: Transport> {
    config: SignalingConfig,
    transport: T,
    verbindungen: ConnectionRegistry,
    spieler: PlayerRegistry,
    relay: Option<Arc<RelayCredentialService>>,
    metriken: Option<LobbyfunkMetrics>,
    /// Ungefaehre Anzahl verbundener Clients, nur fuer Statusanzeigen
    verbunden: AtomicI64,
    start_time: Instant,
}

impl<T: Transport> SignalingCoordinator<T> {
    pub fn neu(config: SignalingConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            verbindungen: ConnectionRegistry::neu(),
            spieler: PlayerRegistry::neu(),
            relay: None,
            metriken: None,
            verbunden: AtomicI64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Aktiviert die Ausgabe von TURN-Zugangsdaten beim Verbinden
    pub fn mit_relay(mut self, relay: Arc<RelayCredentialService>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn mit_metriken(mut self, metriken: LobbyfunkMetrics) -> Self {
        self.metriken = Some(metriken);
        self
    }

    pub fn config(&self) -> &SignalingConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn relay(&self) -> Option<&Arc<RelayCredentialService>> {
        self.relay.as_ref()
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Verarbeitet ein eingehendes Ereignis einer Verbindung
    pub fn ereignis_verarbeiten(&self, id: &ConnectionId, ereignis: InboundEvent) {
        tracing::trace!(verbindung = %id, ereignis = ereignis.name(), "Ereignis empfangen");
        match ereignis {
            InboundEvent::Connect { host } => self.verbinden(id, host),
            InboundEvent::Disconnect => self.trennen(id),
            InboundEvent::Join { code, player_id } => self.beitreten(id, code, player_id),
            InboundEvent::Leave => self.verlassen(id),
            InboundEvent::Identify { player_id } => self.identifizieren(id, player_id),
            InboundEvent::Signal(anfrage) => self.signal_weiterleiten(id, anfrage),
        }
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Registriert eine neue Verbindung und sendet ggf. die Peer-Konfiguration
    pub fn verbinden(&self, id: &ConnectionId, host: Option<String>) {
        if !self
            .verbindungen
            .einfuegen_falls_neu(id.clone(), VerbindungsZustand::neu(host.clone()))
        {
            tracing::warn!(verbindung = %id, "Verbindung bereits registriert, connect ignoriert");
            return;
        }

        let anzahl = self.verbunden.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(m) = &self.metriken {
            m.connected_clients.inc();
        }
        tracing::info!(verbindung = %id, verbunden = anzahl, "Client verbunden");

        if let Some(peer_config) = self.peer_config_fuer(id, host.as_deref()) {
            self.transport
                .an_verbindung_senden(id, ServerMessage::PeerConfig(peer_config));
        }
    }

    /// Entfernt eine Verbindung aus allen Registries. Mehrfacher Aufruf ist harmlos.
    pub fn trennen(&self, id: &ConnectionId) {
        let Some(zustand) = self.verbindungen.entfernen(id) else {
            tracing::debug!(verbindung = %id, "Verbindung bereits getrennt");
            return;
        };

        let anzahl = self.verbunden.fetch_sub(1, Ordering::SeqCst) - 1;
        if let Some(m) = &self.metriken {
            m.connected_clients.dec();
        }

        if let Some(raum) = &zustand.raum {
            self.transport.gruppe_verlassen(id, raum);
        }
        self.spieler.entfernen(id);
        if let Some(relay) = &self.relay {
            relay.benutzer_entfernen(id);
        }

        tracing::info!(
            verbindung = %id,
            verbunden = anzahl,
            dauer_sek = zustand.verbunden_seit.elapsed().as_secs(),
            "Client getrennt"
        );
    }

    // -----------------------------------------------------------------------
    // Raeume
    // -----------------------------------------------------------------------

    /// Tritt einem Raum bei, meldet den Beitritt und sendet `setIds`
    pub fn beitreten(&self, id: &ConnectionId, code: RoomCode, player_id: PlayerId) {
        if !self.raum_betreten(id, &code) {
            tracing::debug!(verbindung = %id, raum = %code, "join fuer unbekannte Verbindung ignoriert");
            return;
        }
        if let Some(m) = &self.metriken {
            m.room_joins_total.inc();
        }
        tracing::debug!(verbindung = %id, raum = %code, spieler = player_id.inner(), "Client betritt Raum");

        self.transport
            .an_gruppe_ausser_senden(&code, id, ServerMessage::Join(id.clone(), player_id));

        let andere: Vec<ConnectionId> = self
            .transport
            .gruppen_mitglieder(&code)
            .into_iter()
            .filter(|m| m != id)
            .collect();
        let ids = self.spieler.map_von(&andere);
        self.transport.an_verbindung_senden(id, ServerMessage::SetIds(ids));
    }

    /// Verlaesst den aktuellen Raum; ohne Raum passiert nichts
    pub fn verlassen(&self, id: &ConnectionId) {
        match self.raum_verlassen_intern(id) {
            Some(raum) => tracing::debug!(verbindung = %id, raum = %raum, "Client verlaesst Raum"),
            None => tracing::debug!(verbindung = %id, "leave ohne Raum ignoriert"),
        }
    }

    /// Setzt Raum-Feld und Gruppenmitgliedschaft gemeinsam.
    /// Ein vorheriger anderer Raum wird dabei verlassen.
    fn raum_betreten(&self, id: &ConnectionId, code: &RoomCode) -> bool {
        let Some(vorher) = self.verbindungen.raum_setzen(id, Some(code.clone())) else {
            return false;
        };
        if let Some(alt) = vorher.filter(|alt| alt != code) {
            self.transport.gruppe_verlassen(id, &alt);
        }
        if !self.transport.gruppe_beitreten(id, code) {
            self.verbindungen.raum_setzen(id, None);
            return false;
        }
        true
    }

    /// Loescht Raum-Feld und Gruppenmitgliedschaft gemeinsam
    fn raum_verlassen_intern(&self, id: &ConnectionId) -> Option<RoomCode> {
        let alt = self.verbindungen.raum_setzen(id, None).flatten()?;
        self.transport.gruppe_verlassen(id, &alt);
        Some(alt)
    }

    // -----------------------------------------------------------------------
    // Identitaet und Signale
    // -----------------------------------------------------------------------

    /// Setzt die Spieler-ID und meldet sie dem Raum
    pub fn identifizieren(&self, id: &ConnectionId, player_id: PlayerId) {
        let Some(zustand) = self.verbindungen.holen(id) else {
            tracing::debug!(verbindung = %id, "id fuer unbekannte Verbindung ignoriert");
            return;
        };

        if zustand.raum.is_none() && self.config.id_ohne_raum == IdOhneRaum::Verwerfen {
            tracing::debug!(verbindung = %id, "id ohne Raum verworfen");
            return;
        }

        self.spieler.setzen(id.clone(), player_id);
        // Paralleles Trennen darf keinen verwaisten Eintrag hinterlassen
        if !self.verbindungen.ist_verbunden(id) {
            self.spieler.entfernen(id);
            return;
        }
        tracing::debug!(verbindung = %id, spieler = player_id.inner(), "Spieler-ID gesetzt");

        if let Some(raum) = &zustand.raum {
            self.transport
                .an_gruppe_ausser_senden(raum, id, ServerMessage::SetId(id.clone(), player_id));
        }
    }

    /// Leitet ein Signal weiter, wenn Absender und Ziel im selben Raum sind
    pub fn signal_weiterleiten(&self, von: &ConnectionId, anfrage: SignalRequest) {
        let SignalRequest { data, to } = anfrage;

        let zugestellt = match self.verbindungen.raum_von(von) {
            Some(raum) if self.verbindungen.raum_von(&to).as_ref() == Some(&raum) => self
                .transport
                .an_verbindung_senden(&to, ServerMessage::Signal(SignalPayload { data, from: von.clone() })),
            Some(_) => {
                tracing::debug!(verbindung = %von, ziel = %to, "Signal an Ziel ausserhalb des Raums verworfen");
                false
            }
            None => {
                tracing::debug!(verbindung = %von, "Signal ohne Raum verworfen");
                false
            }
        };

        if let Some(m) = &self.metriken {
            if zugestellt {
                m.signals_forwarded_total.inc();
            } else {
                m.signals_dropped_total.inc();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Peer-Konfiguration
    // -----------------------------------------------------------------------

    fn peer_config_fuer(&self, id: &ConnectionId, host: Option<&str>) -> Option<PeerConfig> {
        let Some(relay) = &self.relay else {
            return self.config.peer_config.clone();
        };

        let mut peer_config = self.config.peer_config.clone().unwrap_or_default();
        peer_config.force_relay_only |= relay.config().nur_relay;
        peer_config.turn_servers.clear();

        match relay.benutzer_hinzufuegen(id) {
            Ok(secret) => {
                if let Some(m) = &self.metriken {
                    m.relay_credentials_issued_total.inc();
                }
                match relay.config().turn_eintrag(host, id.as_str(), &secret) {
                    Some(eintrag) => peer_config.turn_servers.push(eintrag),
                    None => tracing::warn!(verbindung = %id, "Kein Host fuer TURN-Eintrag bekannt"),
                }
            }
            Err(e) => {
                if let Some(m) = &self.metriken {
                    m.relay_credential_failures_total.inc();
                }
                tracing::warn!(verbindung = %id, fehler = %e, "Verbindung erhaelt kein Relay");
            }
        }
        Some(peer_config)
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn verbunden_anzahl(&self) -> i64 {
        self.verbunden.load(Ordering::SeqCst)
    }

    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn ist_verbunden(&self, id: &ConnectionId) -> bool {
        self.verbindungen.ist_verbunden(id)
    }

    pub fn raum_von(&self, id: &ConnectionId) -> Option<RoomCode> {
        self.verbindungen.raum_von(id)
    }

    pub fn spieler_von(&self, id: &ConnectionId) -> Option<PlayerId> {
        self.spieler.holen(id)
    }

    /// Anzahl gespeicherter Spieler-IDs
    pub fn spieler_anzahl(&self) -> usize {
        self.spieler.anzahl()
    }
}

impl<T: Transport> StatusQuelle for SignalingCoordinator<T> {
    fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            uptime_sek: self.uptime_sek(),
            verbindungen: self.verbunden_anzahl(),
            name: self.config.server_name.clone(),
            versionen: self.config.versionen.clone(),
        }
    }
}
