//! TLS fuer den HTTP/WebSocket-Listener
//!
//! Zertifikat und Schluessel liegen in einem Verzeichnis. Gesucht wird in
//! dieser Reihenfolge:
//! 1. `fullchain.pem` / `privkey.pem` (Let's Encrypt)
//! 2. `server.crt` / `server.key`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lobbyfunk_core::LobbyfunkError;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use rustls_pemfile::{certs, private_key};
use tokio_rustls::TlsAcceptor;

/// Bekannte Dateinamen-Paare (Zertifikat, Schluessel)
const DATEIPAARE: [(&str, &str); 2] = [("fullchain.pem", "privkey.pem"), ("server.crt", "server.key")];

/// Pfade zu Zertifikatskette und privatem Schluessel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZertifikatDateien {
    pub zertifikat: PathBuf,
    pub schluessel: PathBuf,
}

/// Sucht das erste vollstaendige Dateipaar im Verzeichnis
pub fn zertifikate_finden(verzeichnis: impl AsRef<Path>) -> Result<ZertifikatDateien, LobbyfunkError> {
    let verzeichnis = verzeichnis.as_ref();
    if !verzeichnis.is_dir() {
        return Err(LobbyfunkError::Tls(format!(
            "Zertifikatsverzeichnis '{}' existiert nicht",
            verzeichnis.display()
        )));
    }

    DATEIPAARE
        .iter()
        .map(|(zertifikat, schluessel)| ZertifikatDateien {
            zertifikat: verzeichnis.join(zertifikat),
            schluessel: verzeichnis.join(schluessel),
        })
        .find(|dateien| dateien.zertifikat.is_file() && dateien.schluessel.is_file())
        .ok_or_else(|| {
            LobbyfunkError::Tls(format!(
                "Kein Zertifikat in '{}' gefunden (erwartet fullchain.pem/privkey.pem oder server.crt/server.key)",
                verzeichnis.display()
            ))
        })
}

/// Baut den TLS-Acceptor aus einem Zertifikatsverzeichnis
pub fn tls_acceptor_laden(verzeichnis: impl AsRef<Path>) -> Result<TlsAcceptor, LobbyfunkError> {
    let dateien = zertifikate_finden(verzeichnis)?;
    let zertifikat_pem = datei_lesen(&dateien.zertifikat)?;
    let schluessel_pem = datei_lesen(&dateien.schluessel)?;

    let config = server_config(&zertifikat_pem, &schluessel_pem)?;
    tracing::info!(zertifikat = %dateien.zertifikat.display(), "TLS-Zertifikat geladen");
    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn datei_lesen(pfad: &Path) -> Result<String, LobbyfunkError> {
    std::fs::read_to_string(pfad)
        .map_err(|e| LobbyfunkError::Tls(format!("'{}' nicht lesbar: {e}", pfad.display())))
}

/// rustls-Konfiguration mit ring-Provider, ohne Client-Zertifikate
fn server_config(zertifikat_pem: &str, schluessel_pem: &str) -> Result<ServerConfig, LobbyfunkError> {
    let kette = zertifikate_parsen(zertifikat_pem)?;
    if kette.is_empty() {
        return Err(LobbyfunkError::Tls("Keine Zertifikate in der PEM-Datei".into()));
    }
    let schluessel = schluessel_parsen(schluessel_pem)?;

    let mut config = ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| LobbyfunkError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(kette, schluessel)
        .map_err(|e| LobbyfunkError::Tls(e.to_string()))?;
    // WebSocket-Upgrades nur ueber HTTP/1.1
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

fn zertifikate_parsen(pem: &str) -> Result<Vec<CertificateDer<'static>>, LobbyfunkError> {
    let mut cursor = std::io::Cursor::new(pem.as_bytes());
    certs(&mut cursor)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LobbyfunkError::Tls(format!("Zertifikat-Parsing fehlgeschlagen: {e}")))
}

fn schluessel_parsen(pem: &str) -> Result<PrivateKeyDer<'static>, LobbyfunkError> {
    let mut cursor = std::io::Cursor::new(pem.as_bytes());
    private_key(&mut cursor)
        .map_err(|e| LobbyfunkError::Tls(format!("Schluessel-Parsing fehlgeschlagen: {e}")))?
        .ok_or_else(|| LobbyfunkError::Tls("Kein privater Schluessel gefunden".into()))
}
