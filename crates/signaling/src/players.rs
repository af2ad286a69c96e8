//! Player Identity Registry – Verbindungs-ID zu Spieler-ID
//!
//! Die Spieler-ID stammt aus der Spielsitzung und wird vom Client per `id`
//! gesetzt. Eintraege ueberleben einen Raumwechsel und verschwinden erst
//! beim Trennen der Verbindung.

use std::collections::HashMap;

use lobbyfunk_core::types::{ConnectionId, PlayerId};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct PlayerRegistry {
    spieler: RwLock<HashMap<ConnectionId, PlayerId>>,
}

impl PlayerRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Setzt oder ueberschreibt die Spieler-ID einer Verbindung
    pub fn setzen(&self, id: ConnectionId, spieler: PlayerId) -> Option<PlayerId> {
        self.spieler.write().insert(id, spieler)
    }

    pub fn holen(&self, id: &ConnectionId) -> Option<PlayerId> {
        self.spieler.read().get(id).copied()
    }

    pub fn entfernen(&self, id: &ConnectionId) -> Option<PlayerId> {
        self.spieler.write().remove(id)
    }

    /// Spieler-IDs fuer alle uebergebenen Verbindungen unter einer einzigen
    /// Lesesperre. Verbindungen ohne Spieler-ID fehlen im Ergebnis.
    pub fn map_von<'a, I>(&self, ids: I) -> HashMap<ConnectionId, PlayerId>
    where
        I: IntoIterator<Item = &'a ConnectionId>,
    {
        let spieler = self.spieler.read();
        ids.into_iter()
            .filter_map(|id| spieler.get(id).map(|p| (id.clone(), *p)))
            .collect()
    }

    pub fn anzahl(&self) -> usize {
        self.spieler.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setzen_ueberschreibt() {
        let registry = PlayerRegistry::neu();
        let id = ConnectionId::from("a");

        assert_eq!(registry.setzen(id.clone(), PlayerId(1)), None);
        assert_eq!(registry.setzen(id.clone(), PlayerId(2)), Some(PlayerId(1)));
        assert_eq!(registry.holen(&id), Some(PlayerId(2)));
        assert_eq!(registry.anzahl(), 1);
    }

    #[test]
    fn map_von_laesst_unbekannte_aus() {
        let registry = PlayerRegistry::neu();
        let a = ConnectionId::from("a");
        let b = ConnectionId::from("b");
        let c = ConnectionId::from("c");
        registry.setzen(a.clone(), PlayerId(7));
        registry.setzen(c.clone(), PlayerId(9));

        let ids = registry.map_von(&[a.clone(), b.clone()]);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get(&a), Some(&PlayerId(7)));
        assert!(!ids.contains_key(&b));
        assert!(!ids.contains_key(&c));
    }

    #[test]
    fn map_von_leerer_eingabe() {
        let registry = PlayerRegistry::neu();
        registry.setzen(ConnectionId::from("a"), PlayerId(1));
        assert!(registry.map_von(Vec::<ConnectionId>::new().iter()).is_empty());
    }

    #[test]
    fn entfernen() {
        let registry = PlayerRegistry::neu();
        let id = ConnectionId::from("a");
        registry.setzen(id.clone(), PlayerId(1));
        assert_eq!(registry.entfernen(&id), Some(PlayerId(1)));
        assert_eq!(registry.entfernen(&id), None);
        assert!(registry.holen(&id).is_none());
    }
}
