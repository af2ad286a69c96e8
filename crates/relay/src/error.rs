//! Fehlertypen des Relay-Dienstes

use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Entropiequelle fehlgeschlagen: {0}")]
    Entropie(String),

    #[error("Ungueltige Relay-Konfiguration: {0}")]
    Konfiguration(String),
}

impl RelayError {
    pub fn entropie(msg: impl Into<String>) -> Self {
        Self::Entropie(msg.into())
    }
}
