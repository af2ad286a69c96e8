//! lobbyfunk-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Lobbyfunk-Crates gemeinsam genutzt werden: Verbindungs-IDs, Raum-Codes,
//! Spieler-IDs und der zentrale Fehler-Enum.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{LobbyfunkError, Result};
pub use types::{ConnectionId, PlayerId, RoomCode};
