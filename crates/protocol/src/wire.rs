//! Drahtformat fuer WebSocket-Textframes
//!
//! Jeder Frame ist ein JSON-Array: Ereignisname gefolgt von den Argumenten.
//!
//! ## Frame-Format
//!
//! ```text
//! ["join", "ABCDEF", 5]
//! ["leave"]
//! ["id", 5]
//! ["signal", {"to": "<verbindung>", "data": {...}}]
//! ```
//!
//! Ausgehend werden `peerConfig`, `join`, `setIds`, `setId` und `signal`
//! im gleichen Schema kodiert. Ueberzaehlige Argumente werden ignoriert.

use lobbyfunk_core::types::{PlayerId, RoomCode};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};
use crate::events::{InboundEvent, SignalRequest};
use crate::messages::ServerMessage;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (1 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// Kodiert und dekodiert Signaling-Frames
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximale erlaubte Frame-Groesse in Bytes
    max_frame_size: usize,
}

impl FrameCodec {
    /// Erstellt einen neuen `FrameCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen `FrameCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    fn groesse_pruefen(&self, groesse: usize) -> ProtocolResult<()> {
        if groesse > self.max_frame_size {
            return Err(ProtocolError::FrameZuGross {
                groesse,
                maximum: self.max_frame_size,
            });
        }
        Ok(())
    }

    /// Dekodiert einen Client-Frame in ein eingehendes Ereignis
    pub fn dekodieren(&self, frame: &str) -> ProtocolResult<InboundEvent> {
        self.groesse_pruefen(frame.len())?;

        let Value::Array(teile) = serde_json::from_str::<Value>(frame)? else {
            return Err(ProtocolError::KeinEreignisArray);
        };
        let Some((Value::String(name), args)) = teile.split_first() else {
            return Err(ProtocolError::KeinEreignisArray);
        };

        match name.as_str() {
            "join" => {
                let code = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProtocolError::argument("join", 0, "Raum-Code fehlt"))?;
                let code = RoomCode::neu(code)
                    .ok_or_else(|| ProtocolError::argument("join", 0, "leerer Raum-Code"))?;
                let player_id = spieler_argument("join", args, 1)?;
                Ok(InboundEvent::Join { code, player_id })
            }
            "leave" => Ok(InboundEvent::Leave),
            "id" => Ok(InboundEvent::Identify {
                player_id: spieler_argument("id", args, 0)?,
            }),
            "signal" => {
                let arg = args
                    .first()
                    .cloned()
                    .ok_or_else(|| ProtocolError::argument("signal", 0, "Nutzlast fehlt"))?;
                let anfrage: SignalRequest = serde_json::from_value(arg)
                    .map_err(|e| ProtocolError::argument("signal", 0, e.to_string()))?;
                Ok(InboundEvent::Signal(anfrage))
            }
            andere => Err(ProtocolError::UnbekanntesEreignis(andere.to_string())),
        }
    }

    /// Kodiert eine Server-Nachricht als Textframe
    pub fn kodieren(&self, nachricht: &ServerMessage) -> ProtocolResult<String> {
        let mut frame = vec![Value::from(nachricht.ereignis_name())];
        match nachricht {
            ServerMessage::PeerConfig(config) => frame.push(serde_json::to_value(config)?),
            ServerMessage::Join(id, player_id) | ServerMessage::SetId(id, player_id) => {
                frame.push(serde_json::to_value(id)?);
                frame.push(serde_json::to_value(player_id)?);
            }
            ServerMessage::SetIds(ids) => frame.push(serde_json::to_value(ids)?),
            ServerMessage::Signal(payload) => frame.push(serde_json::to_value(payload)?),
        }

        let text = serde_json::to_string(&Value::Array(frame))?;
        self.groesse_pruefen(text.len())?;
        Ok(text)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn spieler_argument(ereignis: &'static str, args: &[Value], index: usize) -> ProtocolResult<PlayerId> {
    args.get(index)
        .and_then(Value::as_u64)
        .map(PlayerId)
        .ok_or_else(|| ProtocolError::argument(ereignis, index, "Spieler-ID muss eine positive Ganzzahl sein"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lobbyfunk_core::types::ConnectionId;
    use serde_json::json;

    use super::*;
    use crate::messages::SignalPayload;

    #[test]
    fn join_frame_dekodieren() {
        let codec = FrameCodec::new();
        let ereignis = codec.dekodieren(r#"["join","ABCDEF",5]"#).unwrap();
        assert_eq!(
            ereignis,
            InboundEvent::Join {
                code: RoomCode::neu("ABCDEF").unwrap(),
                player_id: PlayerId(5),
            }
        );
    }

    #[test]
    fn leave_und_id_dekodieren() {
        let codec = FrameCodec::new();
        assert_eq!(codec.dekodieren(r#"["leave"]"#).unwrap(), InboundEvent::Leave);
        assert_eq!(
            codec.dekodieren(r#"["id",12,"ueberzaehlig"]"#).unwrap(),
            InboundEvent::Identify { player_id: PlayerId(12) }
        );
    }

    #[test]
    fn signal_dekodieren_behaelt_nutzlast() {
        let codec = FrameCodec::new();
        let ereignis = codec
            .dekodieren(r#"["signal",{"to":"b","data":{"sdp":"v=0","type":"offer"}}]"#)
            .unwrap();
        let InboundEvent::Signal(anfrage) = ereignis else {
            panic!("Signal-Ereignis erwartet");
        };
        assert_eq!(anfrage.to, ConnectionId::from("b"));
        assert_eq!(anfrage.data, json!({"sdp": "v=0", "type": "offer"}));
    }

    #[test]
    fn ungueltige_frames_abgelehnt() {
        let codec = FrameCodec::new();
        assert!(matches!(codec.dekodieren("kein json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            codec.dekodieren(r#"{"event":"join"}"#),
            Err(ProtocolError::KeinEreignisArray)
        ));
        assert!(matches!(codec.dekodieren("[]"), Err(ProtocolError::KeinEreignisArray)));
        assert!(matches!(
            codec.dekodieren(r#"["tanzen"]"#),
            Err(ProtocolError::UnbekanntesEreignis(name)) if name == "tanzen"
        ));
    }

    #[test]
    fn falsche_argumente_abgelehnt() {
        let codec = FrameCodec::new();
        assert!(matches!(
            codec.dekodieren(r#"["join","",1]"#),
            Err(ProtocolError::UngueltigesArgument { index: 0, .. })
        ));
        assert!(matches!(
            codec.dekodieren(r#"["join","ABC",-1]"#),
            Err(ProtocolError::UngueltigesArgument { index: 1, .. })
        ));
        assert!(matches!(
            codec.dekodieren(r#"["id","7"]"#),
            Err(ProtocolError::UngueltigesArgument { ereignis: "id", .. })
        ));
        assert!(matches!(
            codec.dekodieren(r#"["signal",{"data":1}]"#),
            Err(ProtocolError::UngueltigesArgument { ereignis: "signal", .. })
        ));
    }

    #[test]
    fn zu_grosser_frame_abgelehnt() {
        let codec = FrameCodec::with_max_size(8);
        assert!(matches!(
            codec.dekodieren(r#"["join","ABCDEF",5]"#),
            Err(ProtocolError::FrameZuGross { maximum: 8, .. })
        ));
    }

    #[test]
    fn nachrichten_kodieren() {
        let codec = FrameCodec::new();
        let a = ConnectionId::from("a");

        let join = codec.kodieren(&ServerMessage::Join(a.clone(), PlayerId(3))).unwrap();
        assert_eq!(join, r#"["join","a",3]"#);

        let set_id = codec.kodieren(&ServerMessage::SetId(a.clone(), PlayerId(4))).unwrap();
        assert_eq!(set_id, r#"["setId","a",4]"#);

        let mut ids = HashMap::new();
        ids.insert(a.clone(), PlayerId(9));
        let set_ids = codec.kodieren(&ServerMessage::SetIds(ids)).unwrap();
        assert_eq!(set_ids, r#"["setIds",{"a":9}]"#);

        let leer = codec.kodieren(&ServerMessage::SetIds(HashMap::new())).unwrap();
        assert_eq!(leer, r#"["setIds",{}]"#);
    }

    #[test]
    fn signal_kodieren_enthaelt_absender() {
        let codec = FrameCodec::new();
        let text = codec
            .kodieren(&ServerMessage::Signal(SignalPayload {
                data: json!({"x": 1}),
                from: ConnectionId::from("a"),
            }))
            .unwrap();
        let wert: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(wert, json!(["signal", {"data": {"x": 1}, "from": "a"}]));
    }
}
