//! Erzeugung der Einmal-Secrets
//!
//! Secrets bestehen ausschliesslich aus `[A-Za-z0-9]`. Die Zeichen werden per
//! Rejection-Sampling aus kryptografisch sicheren Zufallsbytes gezogen, damit
//! jedes Zeichen gleich wahrscheinlich ist.

use rand::{rngs::OsRng, RngCore};

use crate::error::{RelayError, RelayResult};

/// Standardlaenge eines Secrets
pub const SECRET_LAENGE: usize = 64;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Groesstes Vielfaches von 62 unterhalb von 256
const ANNAHME_GRENZE: u8 = 248;

/// Obergrenze fuer Nachfuellrunden bevor die Quelle als defekt gilt
const MAX_RUNDEN: usize = 64;

/// Quelle kryptografisch sicherer Zufallsbytes
pub trait EntropieQuelle: Send + Sync {
    /// Fuellt den Puffer vollstaendig oder meldet einen Fehler
    fn fuellen(&self, puffer: &mut [u8]) -> RelayResult<()>;
}

/// Betriebssystem-Zufallsquelle (`getrandom`)
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropie;

impl EntropieQuelle for OsEntropie {
    fn fuellen(&self, puffer: &mut [u8]) -> RelayResult<()> {
        OsRng
            .try_fill_bytes(puffer)
            .map_err(|e| RelayError::entropie(e.to_string()))
    }
}

/// Erzeugt ein alphanumerisches Secret der gegebenen Laenge
pub fn secret_generieren(quelle: &dyn EntropieQuelle, laenge: usize) -> RelayResult<String> {
    let mut secret = String::with_capacity(laenge);
    let mut puffer = [0u8; 64];

    for _ in 0..MAX_RUNDEN {
        if secret.len() == laenge {
            return Ok(secret);
        }
        quelle.fuellen(&mut puffer)?;
        for &byte in puffer.iter().filter(|&&b| b < ANNAHME_GRENZE) {
            if secret.len() == laenge {
                break;
            }
            secret.push(ALPHABET[usize::from(byte % 62)] as char);
        }
    }

    if secret.len() == laenge {
        Ok(secret)
    } else {
        Err(RelayError::entropie("Zufallsquelle liefert keine verwertbaren Bytes"))
    }
}
