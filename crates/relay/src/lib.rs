//! # lobbyfunk-relay
//!
//! Gibt pro Verbindung kurzlebige TURN-Zugangsdaten aus und beantwortet die
//! Authentifizierungsanfragen eines externen TURN-Servers.
//!
//! ## Ablauf
//!
//! ```text
//! Koordinator ──benutzer_hinzufuegen(id)──► RelayCredentialService ──► Secret (einmalig an Client)
//!                                            │
//!                                            └─ speichert nur MD5(id:realm:secret)
//!
//! TURN-Server ──authentifizieren(user, realm, addr)──► Option<AuthKey>
//! ```
//!
//! Das Klartext-Secret wird nie gespeichert. Jede Ausgabe ersetzt den
//! vorherigen Eintrag derselben Verbindung.

pub mod config;
pub mod error;
pub mod schluessel;
pub mod secret;
pub mod service;

pub use config::{host_ohne_port, RelayConfig};
pub use error::{RelayError, RelayResult};
pub use schluessel::{auth_key_ableiten, AuthKey};
pub use secret::{secret_generieren, EntropieQuelle, OsEntropie};
pub use service::{RelayAuthHandler, RelayCredentialService};
