//! lobbyfunk-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod http;
pub mod tls;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use config::{peer_config_laden, ServerConfig};
use hyper_util::rt::{TokioExecutor, TokioIo};
use lobbyfunk_observability::LobbyfunkMetrics;
use lobbyfunk_relay::RelayCredentialService;
use lobbyfunk_signaling::{EventBroadcaster, SignalingCoordinator, SignalingState};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;

use crate::http::{router_bauen, HttpKontext};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Baut den Koordinator mit Relay und Metriken laut Konfiguration
    pub fn koordinator_bauen(
        &self,
        metriken: Option<LobbyfunkMetrics>,
    ) -> Result<SignalingCoordinator<EventBroadcaster>> {
        let peer_config = match self.config.peer.konfig_datei.as_deref() {
            Some(pfad) if !pfad.is_empty() => {
                let peer_config = peer_config_laden(pfad)?;
                tracing::info!(
                    pfad = pfad,
                    stun = peer_config.stun_servers.len(),
                    turn = peer_config.turn_servers.len(),
                    "Peer-Konfiguration geladen"
                );
                Some(peer_config)
            }
            _ => None,
        };

        let mut koordinator = SignalingCoordinator::neu(
            self.config.signaling_config(peer_config),
            EventBroadcaster::neu(),
        );

        if self.config.relay.aktiviert {
            let relay = RelayCredentialService::neu(self.config.relay_config());
            tracing::info!(
                realm = %relay.realm(),
                port = self.config.relay.port,
                nur_relay = self.config.relay.nur_relay,
                "TURN-Zugangsdaten pro Verbindung aktiviert"
            );
            koordinator = koordinator.mit_relay(Arc::new(relay));
        }
        if let Some(metriken) = metriken {
            koordinator = koordinator.mit_metriken(metriken);
        }
        Ok(koordinator)
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Konfiguration pruefen
    /// 2. Koordinator, Relay und Metriken aufbauen
    /// 3. TLS laden (falls konfiguriert)
    /// 4. Listener binden und bedienen
    /// 5. Auf Ctrl-C warten, offene WebSockets schliessen
    pub async fn starten(self) -> Result<()> {
        self.config.pruefen()?;

        let metriken = if self.config.observability.metriken {
            Some(LobbyfunkMetrics::neu()?)
        } else {
            None
        };
        let koordinator = Arc::new(self.koordinator_bauen(metriken.clone())?);

        let tls = match self.config.netzwerk.zertifikat_pfad.as_deref() {
            Some(pfad) if self.config.tls_aktiv() => Some(tls::tls_acceptor_laden(pfad)?),
            _ => None,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let router = router_bauen(HttpKontext {
            signaling: SignalingState::neu(koordinator, shutdown_rx.clone()),
            metriken,
            tls: tls.is_some(),
            daten_pfad: self.config.netzwerk.daten_pfad.as_deref().map(PathBuf::from),
            anfragen_protokollieren: self.config.logging.anfragen_protokollieren,
        });

        let adresse = &self.config.netzwerk.adresse;
        let listener = TcpListener::bind(adresse)
            .await
            .with_context(|| format!("Adresse '{adresse}' kann nicht gebunden werden"))?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %adresse,
            tls = tls.is_some(),
            "Server lauscht"
        );

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
                // Sender am Leben halten, sonst endet jede Verbindung sofort
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = shutdown_tx.send(true);
        });

        match tls {
            Some(acceptor) => tls_bedienen(listener, acceptor, router, shutdown_rx).await,
            None => {
                let mut shutdown = shutdown_rx;
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.wait_for(|beendet| *beendet).await;
                    })
                    .await?;
                Ok(())
            }
        }
    }
}

/// Accept-Schleife fuer TLS: Handshake pro Verbindung in eigener Task,
/// danach HTTP/1.1 mit Upgrade-Unterstuetzung
async fn tls_bedienen(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let (stream, peer_addr) = tokio::select! {
            ergebnis = listener.accept() => match ergebnis {
                Ok(verbindung) => verbindung,
                Err(e) => {
                    tracing::warn!(fehler = %e, "Accept fehlgeschlagen");
                    continue;
                }
            },
            _ = shutdown.wait_for(|beendet| *beendet) => break,
        };

        let acceptor = acceptor.clone();
        let router = router.clone();

        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(tls_stream) => tls_stream,
                Err(e) => {
                    tracing::debug!(peer = %peer_addr, fehler = %e, "TLS-Handshake fehlgeschlagen");
                    return;
                }
            };

            let service = hyper::service::service_fn(move |anfrage: hyper::Request<hyper::body::Incoming>| {
                router.clone().oneshot(anfrage)
            });

            if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(TokioIo::new(tls_stream), service)
                .await
            {
                tracing::debug!(peer = %peer_addr, fehler = %e, "HTTPS-Verbindung beendet");
            }
        });
    }

    tracing::info!("TLS-Listener beendet");
    Ok(())
}
