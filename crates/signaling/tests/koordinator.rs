//! Integrationstests fuer den Signaling-Koordinator
//!
//! Die Clients werden direkt am [`EventBroadcaster`] registriert; ihre
//! Send-Queues werden per `try_recv` ausgelesen.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lobbyfunk_core::types::{ConnectionId, PlayerId, RoomCode};
use lobbyfunk_protocol::{
    IceServer, InboundEvent, PeerConfig, ServerMessage, SignalPayload, SignalRequest,
};
use lobbyfunk_relay::{
    EntropieQuelle, OsEntropie, RelayConfig, RelayCredentialService, RelayError, RelayResult,
};
use lobbyfunk_signaling::{EventBroadcaster, IdOhneRaum, SignalingConfig, SignalingCoordinator};
use serde_json::json;
use tokio::sync::mpsc;

type Koordinator = SignalingCoordinator<EventBroadcaster>;

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn koordinator() -> Koordinator {
    SignalingCoordinator::neu(SignalingConfig::default(), EventBroadcaster::neu())
}

/// Registriert die Queue und liefert das connect-Ereignis
fn verbinden(k: &Koordinator, name: &str) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
    let id = ConnectionId::from(name);
    let rx = k.transport().client_registrieren(id.clone());
    k.ereignis_verarbeiten(&id, InboundEvent::Connect { host: None });
    (id, rx)
}

fn trennen(k: &Koordinator, id: &ConnectionId) {
    k.ereignis_verarbeiten(id, InboundEvent::Disconnect);
    k.transport().client_entfernen(id);
}

fn beitreten(k: &Koordinator, id: &ConnectionId, code: &str, spieler: u64) {
    let code = RoomCode::neu(code).expect("Raumcode darf nicht leer sein");
    k.ereignis_verarbeiten(
        id,
        InboundEvent::Join {
            code,
            player_id: PlayerId(spieler),
        },
    );
}

fn identifizieren(k: &Koordinator, id: &ConnectionId, spieler: u64) {
    k.ereignis_verarbeiten(id, InboundEvent::Identify { player_id: PlayerId(spieler) });
}

fn signal(k: &Koordinator, von: &ConnectionId, an: &str, data: serde_json::Value) {
    k.ereignis_verarbeiten(
        von,
        InboundEvent::Signal(SignalRequest {
            data,
            to: ConnectionId::from(an),
        }),
    );
}

fn abholen(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut nachrichten = Vec::new();
    while let Ok(n) = rx.try_recv() {
        nachrichten.push(n);
    }
    nachrichten
}

fn ids(paare: &[(&ConnectionId, u64)]) -> HashMap<ConnectionId, PlayerId> {
    paare.iter().map(|(id, p)| ((*id).clone(), PlayerId(*p))).collect()
}

/// Zufallsquelle, die sich per Schalter zum Fehlschlagen bringen laesst
struct SchaltbareQuelle {
    defekt: AtomicBool,
}

impl EntropieQuelle for SchaltbareQuelle {
    fn fuellen(&self, puffer: &mut [u8]) -> RelayResult<()> {
        if self.defekt.load(Ordering::SeqCst) {
            return Err(RelayError::entropie("Entropie erschoepft"));
        }
        OsEntropie.fuellen(puffer)
    }
}

// ---------------------------------------------------------------------------
// Lebenszyklus
// ---------------------------------------------------------------------------

#[test]
fn verbindung_ist_bis_zum_trennen_registriert() {
    let k = koordinator();
    let (a, _rx) = verbinden(&k, "A");
    assert!(k.ist_verbunden(&a));
    assert_eq!(k.verbunden_anzahl(), 1);

    trennen(&k, &a);
    assert!(!k.ist_verbunden(&a));
    trennen(&k, &a);
    assert!(!k.ist_verbunden(&a));
}

#[test]
fn doppeltes_trennen_aendert_nichts() {
    let k = koordinator();
    let (a, mut rx_a) = verbinden(&k, "A");
    let (b, _rx_b) = verbinden(&k, "B");
    beitreten(&k, &a, "ABCDE", 1);
    identifizieren(&k, &a, 1);
    abholen(&mut rx_a);

    k.ereignis_verarbeiten(&a, InboundEvent::Disconnect);
    k.ereignis_verarbeiten(&a, InboundEvent::Disconnect);

    assert_eq!(k.verbunden_anzahl(), 1, "Zaehler darf nur einmal sinken");
    assert_eq!(k.spieler_von(&a), None);
    assert_eq!(k.raum_von(&a), None);
    assert_eq!(k.spieler_anzahl(), 0);
    assert!(k.ist_verbunden(&b));
}

#[test]
fn doppeltes_connect_wird_ignoriert() {
    let k = koordinator();
    let (a, _rx) = verbinden(&k, "A");
    beitreten(&k, &a, "ABCDE", 1);

    k.ereignis_verarbeiten(&a, InboundEvent::Connect { host: None });
    assert_eq!(k.verbunden_anzahl(), 1);
    assert_eq!(k.raum_von(&a).as_ref().map(RoomCode::as_str), Some("ABCDE"));
}

#[test]
fn ohne_peer_config_wird_beim_connect_nichts_gesendet() {
    let k = koordinator();
    let (_a, mut rx) = verbinden(&k, "A");
    assert!(abholen(&mut rx).is_empty());
}

#[test]
fn statische_peer_config_wird_beim_connect_gesendet() {
    let peer_config = PeerConfig {
        force_relay_only: false,
        stun_servers: vec![IceServer::stun("stun:stun.example.org:3478")],
        turn_servers: Vec::new(),
    };
    let config = SignalingConfig {
        peer_config: Some(peer_config.clone()),
        ..SignalingConfig::default()
    };
    let k = SignalingCoordinator::neu(config, EventBroadcaster::neu());
    let (_a, mut rx) = verbinden(&k, "A");

    assert_eq!(abholen(&mut rx), vec![ServerMessage::PeerConfig(peer_config)]);
}

// ---------------------------------------------------------------------------
// Raeume
// ---------------------------------------------------------------------------

#[test]
fn ablauf_zwei_clients_im_selben_raum() {
    let k = koordinator();
    let (a, mut rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");

    beitreten(&k, &a, "ABCDE", 1);
    assert_eq!(abholen(&mut rx_a), vec![ServerMessage::SetIds(HashMap::new())]);

    beitreten(&k, &b, "ABCDE", 2);
    assert_eq!(
        abholen(&mut rx_b),
        vec![ServerMessage::SetIds(HashMap::new())],
        "A hat noch keine Identitaet"
    );
    assert_eq!(abholen(&mut rx_a), vec![ServerMessage::Join(b.clone(), PlayerId(2))]);

    identifizieren(&k, &a, 1);
    assert_eq!(abholen(&mut rx_b), vec![ServerMessage::SetId(a.clone(), PlayerId(1))]);
    assert!(abholen(&mut rx_a).is_empty(), "setId geht nicht an den Absender");
}

#[test]
fn set_ids_enthaelt_identifizierte_andere_aber_nicht_sich_selbst() {
    let k = koordinator();
    let (a, mut rx_a) = verbinden(&k, "A");
    let (b, _rx_b) = verbinden(&k, "B");
    let (c, _rx_c) = verbinden(&k, "C");

    beitreten(&k, &b, "X", 0);
    identifizieren(&k, &b, 7);
    beitreten(&k, &c, "X", 0);
    identifizieren(&k, &a, 3);

    beitreten(&k, &a, "X", 3);
    assert_eq!(abholen(&mut rx_a), vec![ServerMessage::SetIds(ids(&[(&b, 7)]))]);
}

#[test]
fn join_ohne_verbindung_wird_ignoriert() {
    let k = koordinator();
    let (a, mut rx_a) = verbinden(&k, "A");
    beitreten(&k, &a, "X", 1);
    abholen(&mut rx_a);

    let geist = ConnectionId::from("geist");
    beitreten(&k, &geist, "X", 9);

    assert!(abholen(&mut rx_a).is_empty());
    assert_eq!(k.raum_von(&geist), None);
    assert!(k.transport().mitglieder(&RoomCode::neu("X").unwrap()).len() == 1);
}

#[test]
fn raumwechsel_verlaesst_den_alten_raum() {
    let k = koordinator();
    let (a, _rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");
    beitreten(&k, &a, "ALT", 1);
    beitreten(&k, &b, "ALT", 2);
    abholen(&mut rx_b);

    beitreten(&k, &a, "NEU", 1);
    identifizieren(&k, &a, 1);

    assert!(abholen(&mut rx_b).is_empty(), "alter Raum erhaelt nichts mehr");
    assert_eq!(k.transport().mitglieder(&RoomCode::neu("ALT").unwrap()), vec![b.clone()]);
    assert_eq!(k.raum_von(&a).as_ref().map(RoomCode::as_str), Some("NEU"));
}

#[test]
fn leave_behaelt_die_identitaet() {
    let k = koordinator();
    let (a, _rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");
    beitreten(&k, &a, "X", 1);
    beitreten(&k, &b, "X", 2);
    identifizieren(&k, &a, 1);
    abholen(&mut rx_b);

    k.ereignis_verarbeiten(&a, InboundEvent::Leave);
    assert_eq!(k.raum_von(&a), None);
    assert_eq!(k.spieler_von(&a), Some(PlayerId(1)));

    // Ohne Raum wird nichts mehr gemeldet
    identifizieren(&k, &a, 5);
    assert!(abholen(&mut rx_b).is_empty());
    assert_eq!(k.spieler_von(&a), Some(PlayerId(5)));
}

#[test]
fn leave_ohne_raum_ist_harmlos() {
    let k = koordinator();
    let (a, mut rx_a) = verbinden(&k, "A");
    k.ereignis_verarbeiten(&a, InboundEvent::Leave);
    assert!(k.ist_verbunden(&a));
    assert!(abholen(&mut rx_a).is_empty());
}

#[test]
fn id_ohne_raum_wird_je_nach_einstellung_verworfen() {
    let config = SignalingConfig {
        id_ohne_raum: IdOhneRaum::Verwerfen,
        ..SignalingConfig::default()
    };
    let k = SignalingCoordinator::neu(config, EventBroadcaster::neu());
    let (a, _rx_a) = verbinden(&k, "A");

    identifizieren(&k, &a, 4);
    assert_eq!(k.spieler_von(&a), None);

    beitreten(&k, &a, "X", 4);
    identifizieren(&k, &a, 4);
    assert_eq!(k.spieler_von(&a), Some(PlayerId(4)));
}

#[test]
fn id_fuer_unbekannte_verbindung_wird_nicht_gespeichert() {
    let k = koordinator();
    let geist = ConnectionId::from("geist");
    identifizieren(&k, &geist, 1);
    assert_eq!(k.spieler_anzahl(), 0);
}

// ---------------------------------------------------------------------------
// Signale
// ---------------------------------------------------------------------------

#[test]
fn signal_im_selben_raum_wird_zugestellt() {
    let k = koordinator();
    let (a, _rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");
    beitreten(&k, &a, "X", 1);
    beitreten(&k, &b, "X", 2);
    abholen(&mut rx_b);

    let data = json!({"type": "offer", "sdp": "v=0"});
    signal(&k, &a, "B", data.clone());

    assert_eq!(
        abholen(&mut rx_b),
        vec![ServerMessage::Signal(SignalPayload { data, from: a.clone() })]
    );
}

#[test]
fn signal_in_fremden_raum_wird_verworfen() {
    let k = koordinator();
    let (a, _rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");
    let (c, mut rx_c) = verbinden(&k, "C");
    beitreten(&k, &a, "X", 1);
    beitreten(&k, &b, "Y", 2);
    abholen(&mut rx_b);
    abholen(&mut rx_c);

    signal(&k, &a, "B", json!({"x": 1}));
    signal(&k, &a, "C", json!({"x": 1}));
    // Absender ohne Raum
    signal(&k, &c, "A", json!({"x": 1}));

    assert!(abholen(&mut rx_b).is_empty());
    assert!(abholen(&mut rx_c).is_empty());
}

#[test]
fn signal_an_nie_verbundenes_ziel_ist_harmlos() {
    let k = koordinator();
    let (a, mut rx_a) = verbinden(&k, "A");
    beitreten(&k, &a, "X", 1);
    abholen(&mut rx_a);

    signal(&k, &a, "B", json!({"x": 1}));
    assert!(k.ist_verbunden(&a));
    assert!(abholen(&mut rx_a).is_empty());
}

#[test]
fn signal_nach_trennen_des_ziels_wird_verworfen() {
    let k = koordinator();
    let (a, _rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");
    beitreten(&k, &a, "X", 1);
    beitreten(&k, &b, "X", 2);
    abholen(&mut rx_b);

    k.ereignis_verarbeiten(&b, InboundEvent::Disconnect);
    signal(&k, &a, "B", json!({"x": 1}));
    assert!(abholen(&mut rx_b).is_empty());
}

#[test]
fn signal_nach_leave_des_ziels_wird_verworfen() {
    let k = koordinator();
    let (a, _rx_a) = verbinden(&k, "A");
    let (b, mut rx_b) = verbinden(&k, "B");
    beitreten(&k, &a, "X", 1);
    beitreten(&k, &b, "X", 2);
    abholen(&mut rx_b);

    k.ereignis_verarbeiten(&b, InboundEvent::Leave);
    signal(&k, &a, "B", json!({"x": 1}));

    assert!(k.ist_verbunden(&b), "leave trennt nicht");
    assert!(abholen(&mut rx_b).is_empty());
}

// ---------------------------------------------------------------------------
// Relay-Zugangsdaten
// ---------------------------------------------------------------------------

fn mit_relay(quelle: Arc<SchaltbareQuelle>, config: SignalingConfig) -> (Koordinator, Arc<RelayCredentialService>) {
    let relay_config = RelayConfig {
        oeffentliche_adresse: Some("relay.example.org".into()),
        ..RelayConfig::neu("crew", 3478)
    };
    let relay = Arc::new(RelayCredentialService::mit_quelle(relay_config, quelle));
    let k = SignalingCoordinator::neu(config, EventBroadcaster::neu()).mit_relay(Arc::clone(&relay));
    (k, relay)
}

fn peer_config_aus(nachrichten: Vec<ServerMessage>) -> PeerConfig {
    match nachrichten.as_slice() {
        [ServerMessage::PeerConfig(config)] => config.clone(),
        andere => panic!("genau eine peerConfig erwartet, erhalten: {andere:?}"),
    }
}

#[test]
fn connect_mit_relay_liefert_turn_eintrag() {
    let quelle = Arc::new(SchaltbareQuelle { defekt: AtomicBool::new(false) });
    let basis = PeerConfig {
        stun_servers: vec![IceServer::stun("stun:stun.example.org:3478")],
        turn_servers: vec![IceServer::turn("alt.example.org", 1, "x", "y")],
        ..PeerConfig::default()
    };
    let config = SignalingConfig {
        peer_config: Some(basis.clone()),
        ..SignalingConfig::default()
    };
    let (k, relay) = mit_relay(quelle, config);

    let id = ConnectionId::from("A");
    let mut rx = k.transport().client_registrieren(id.clone());
    k.ereignis_verarbeiten(&id, InboundEvent::Connect { host: Some("voice.example.org:9736".into()) });

    let peer_config = peer_config_aus(abholen(&mut rx));
    assert_eq!(peer_config.stun_servers, basis.stun_servers);
    assert_eq!(peer_config.turn_servers.len(), 1, "statische TURN-Eintraege werden ersetzt");
    let turn = &peer_config.turn_servers[0];
    assert_eq!(turn.url, "turn:voice.example.org:3478");
    assert_eq!(turn.username, "A");
    assert_eq!(turn.credential.len(), 64);
    assert_eq!(relay.anzahl(), 1);

    trennen(&k, &id);
    assert_eq!(relay.anzahl(), 0, "Zugangsdaten werden beim Trennen widerrufen");
}

#[test]
fn connect_ohne_host_nutzt_oeffentliche_adresse() {
    let quelle = Arc::new(SchaltbareQuelle { defekt: AtomicBool::new(false) });
    let (k, _relay) = mit_relay(quelle, SignalingConfig::default());
    let (_a, mut rx) = verbinden(&k, "A");

    let peer_config = peer_config_aus(abholen(&mut rx));
    assert_eq!(peer_config.turn_servers[0].url, "turn:relay.example.org:3478");
}

#[test]
fn entropiefehler_liefert_peer_config_ohne_turn() {
    let quelle = Arc::new(SchaltbareQuelle { defekt: AtomicBool::new(true) });
    let (k, relay) = mit_relay(Arc::clone(&quelle), SignalingConfig::default());
    let (a, mut rx) = verbinden(&k, "A");

    let peer_config = peer_config_aus(abholen(&mut rx));
    assert!(peer_config.turn_servers.is_empty());
    assert_eq!(relay.anzahl(), 0, "kein halb angelegter Eintrag");
    assert!(k.ist_verbunden(&a), "Verbindung bleibt bestehen");
}

// ---------------------------------------------------------------------------
// Nebenlaeufigkeit
// ---------------------------------------------------------------------------

#[test]
fn paralleles_beitreten_und_trennen_hinterlaesst_leere_registries() {
    let k = Arc::new(koordinator());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let k = Arc::clone(&k);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let (id, _rx) = verbinden(&k, &format!("c-{t}-{i}"));
                    beitreten(&k, &id, "X", i);
                    identifizieren(&k, &id, i);
                    signal(&k, &id, &format!("c-{}-{i}", (t + 1) % 8), json!({"n": i}));
                    trennen(&k, &id);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("Thread darf nicht paniken");
    }

    assert_eq!(k.verbunden_anzahl(), 0);
    assert_eq!(k.spieler_anzahl(), 0);
    assert_eq!(k.transport().client_anzahl(), 0);
    assert!(k.transport().mitglieder(&RoomCode::neu("X").unwrap()).is_empty());
}
