//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung laeuft in einer eigenen tokio-Task. Eingehende Frames
//! werden dekodiert und an den Koordinator gegeben; ausgehende Nachrichten
//! kommen aus der Broadcaster-Queue der Verbindung.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Kommt innerhalb von `verbindungs_timeout_sek` kein Frame, wird getrennt

use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use lobbyfunk_core::types::ConnectionId;
use lobbyfunk_protocol::{FrameCodec, InboundEvent, ServerMessage};

use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Bedient eine WebSocket-Verbindung bis zum Trennen oder Shutdown
pub async fn verbindung_bedienen(socket: WebSocket, state: SignalingState, host: Option<String>) {
    let id = ConnectionId::neu();
    let koordinator = &state.koordinator;
    let config = koordinator.config();

    // Queue zuerst registrieren, damit peerConfig beim connect zustellbar ist
    let mut ausgehend = state.broadcaster().client_registrieren(id.clone());
    koordinator.ereignis_verarbeiten(&id, InboundEvent::Connect { host });

    let (mut sender, mut empfaenger) = socket.split();
    let mut shutdown = state.shutdown.clone();

    let mut keepalive = tokio::time::interval(config.keepalive());
    keepalive.tick().await;
    let mut letzter_empfang = Instant::now();

    loop {
        tokio::select! {
            // Eingehender Frame vom Client
            frame = empfaenger.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        letzter_empfang = Instant::now();
                        match state.codec.dekodieren(&text) {
                            Ok(ereignis) => koordinator.ereignis_verarbeiten(&id, ereignis),
                            Err(e) => {
                                tracing::debug!(verbindung = %id, fehler = %e, "Ungueltiger Frame verworfen");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(verbindung = %id, "Verbindung vom Client geschlossen");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping, Pong, Binary
                        letzter_empfang = Instant::now();
                    }
                    Some(Err(e)) => {
                        tracing::warn!(verbindung = %id, fehler = %e, "WebSocket-Lesefehler");
                        break;
                    }
                }
            }

            // Ausgehende Nachricht aus dem Broadcaster
            Some(nachricht) = ausgehend.recv() => {
                match nachricht_senden(&mut sender, &state.codec, &nachricht).await {
                    Ok(()) => {}
                    Err(SignalingError::Protokoll(e)) => {
                        tracing::warn!(
                            verbindung = %id,
                            ereignis = nachricht.ereignis_name(),
                            fehler = %e,
                            "Nachricht nicht kodierbar"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(verbindung = %id, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }
            }

            // Keepalive-Ping
            _ = keepalive.tick() => {
                if let Err(e) = lebenszeichen_pruefen(letzter_empfang, config.verbindungs_timeout()) {
                    tracing::warn!(verbindung = %id, fehler = %e, "Verbindung wird getrennt");
                    break;
                }
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // Server faehrt herunter
            _ = shutdown.changed() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    koordinator.ereignis_verarbeiten(&id, InboundEvent::Disconnect);
    state.broadcaster().client_entfernen(&id);
}

async fn nachricht_senden(
    sender: &mut SplitSink<WebSocket, Message>,
    codec: &FrameCodec,
    nachricht: &ServerMessage,
) -> SignalingResult<()> {
    let text = codec.kodieren(nachricht)?;
    sender
        .send(Message::Text(text))
        .await
        .map_err(|e| SignalingError::WebSocket(e.to_string()))
}

fn lebenszeichen_pruefen(letzter_empfang: Instant, timeout: Duration) -> SignalingResult<()> {
    if letzter_empfang.elapsed() > timeout {
        return Err(SignalingError::Timeout(timeout.as_secs()));
    }
    Ok(())
}
