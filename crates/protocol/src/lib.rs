//! lobbyfunk-protocol – Protokoll-Definitionen
//!
//! Dieses Crate definiert alle Ereignisse und Nachrichten, die zwischen
//! Client und Signaling-Server ausgetauscht werden, sowie die
//! Peer-Konfiguration (STUN/TURN) und das JSON-Array-Drahtformat.

pub mod error;
pub mod events;
pub mod messages;
pub mod peer;
pub mod wire;

pub use error::{ProtocolError, ProtocolResult};
pub use events::{InboundEvent, SignalRequest};
pub use messages::{ServerMessage, SignalPayload};
pub use peer::{IceServer, PeerConfig};
pub use wire::FrameCodec;
