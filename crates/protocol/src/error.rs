//! Fehlertypen des Drahtprotokolls

use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Frame zu gross: {groesse} Bytes (Maximum {maximum})")]
    FrameZuGross { groesse: usize, maximum: usize },

    #[error("Kein gueltiges JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame ist kein JSON-Array mit Ereignisnamen")]
    KeinEreignisArray,

    #[error("Unbekanntes Ereignis: {0}")]
    UnbekanntesEreignis(String),

    #[error("Ungueltiges Argument {index} fuer '{ereignis}': {grund}")]
    UngueltigesArgument {
        ereignis: &'static str,
        index: usize,
        grund: String,
    },
}

impl ProtocolError {
    pub(crate) fn argument(ereignis: &'static str, index: usize, grund: impl Into<String>) -> Self {
        Self::UngueltigesArgument {
            ereignis,
            index,
            grund: grund.into(),
        }
    }
}
