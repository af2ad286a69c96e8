//! # lobbyfunk-signaling
//!
//! Raum-Koordination fuer Voice-Chat-Overlays: Clients verbinden sich per
//! WebSocket, betreten einen Raum (Code aus dem Spiel) und tauschen
//! WebRTC-Signale mit anderen Mitgliedern desselben Raums aus.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket ──► connection.rs ──► SignalingCoordinator ──► ConnectionRegistry
//!    ▲              (Frames)            │                  PlayerRegistry
//!    │                                  │                  RelayCredentialService
//!    │                                  ▼
//!    └──────── Send-Queue ◄──── EventBroadcaster (Transport)
//! ```
//!
//! Signale werden nur zugestellt, wenn Absender und Ziel im selben
//! nicht-leeren Raum sind.

pub mod broadcast;
pub mod connection;
pub mod connections;
pub mod coordinator;
pub mod error;
pub mod players;
pub mod server_state;
pub mod transport;
pub mod ws;

pub use broadcast::EventBroadcaster;
pub use connections::{ConnectionRegistry, VerbindungsZustand};
pub use coordinator::SignalingCoordinator;
pub use error::{SignalingError, SignalingResult};
pub use players::PlayerRegistry;
pub use server_state::{IdOhneRaum, SignalingConfig, SignalingState};
pub use transport::Transport;
pub use ws::signaling_router;
