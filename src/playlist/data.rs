//! PlaylistData : la liste ordonnée des morceaux d'une playlist
//!
//! Matérialisée à la demande depuis le fichier de la playlist, possédée par
//! le cache et susceptible d'en être évincée. Les identifiants de morceaux
//! sont frappés par un générateur propre à chaque instance : ils sont
//! re-frappés à chaque chargement et ne survivent donc pas à un redémarrage
//! du processus.

use crate::didl;
use crate::error::{Error, Result};
use crate::ids::{IdGenerator, PlaylistId, TrackId};
use crate::ordered::OrderedList;
use crate::track::Track;

/// Nombre maximal de morceaux par playlist.
pub const MAX_TRACKS: usize = 1000;

pub struct PlaylistData {
    id: PlaylistId,
    tracks: OrderedList<TrackId, Track>,
    id_gen: IdGenerator,
}

impl PlaylistData {
    pub(crate) fn new(id: PlaylistId) -> Self {
        Self {
            id,
            tracks: OrderedList::new(),
            id_gen: IdGenerator::default(),
        }
    }

    pub(crate) fn playlist_id(&self) -> PlaylistId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Concaténation grand-boutiste des identifiants de morceaux, dans
    /// l'ordre de la liste. Quatre octets par morceau, vide sans morceau.
    pub fn id_array(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 * self.tracks.len());
        for track in self.tracks.values() {
            out.extend_from_slice(&track.id().get().to_be_bytes());
        }
        out
    }

    pub fn read(&self, track_id: TrackId) -> Result<(&str, &str)> {
        self.tracks
            .get(&track_id)
            .map(|t| (t.udn(), t.metadata()))
            .ok_or(Error::TrackNotFound(track_id.get()))
    }

    pub(crate) fn get(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Insère un morceau après `after` (`None` = en tête de liste).
    ///
    /// Échoue avec [`Error::PlaylistFull`] à la capacité maximale, avec
    /// [`Error::TrackNotFound`] si `after` n'existe pas. Les métadonnées
    /// sont condensées avant stockage.
    pub fn insert_after(
        &mut self,
        after: Option<TrackId>,
        udn: &str,
        metadata: &str,
    ) -> Result<TrackId> {
        if self.tracks.len() >= MAX_TRACKS {
            return Err(Error::PlaylistFull);
        }
        if let Some(anchor) = after {
            if !self.tracks.contains(&anchor) {
                return Err(Error::TrackNotFound(anchor.get()));
            }
        }

        let id = self.id_gen.next_track_id();
        let track = Track::new(id, udn, metadata);
        match after {
            None => self.tracks.insert_first(id, track),
            Some(anchor) => {
                let _ = self.tracks.insert_after(&anchor, id, track);
            }
        }
        Ok(id)
    }

    /// Supprime un morceau; un identifiant inconnu est sans effet.
    pub fn delete(&mut self, track_id: TrackId) -> bool {
        self.tracks.remove(&track_id).is_some()
    }

    pub fn delete_all(&mut self) {
        self.tracks.clear();
    }

    /// Point d'entrée du chargeur : ajoute en fin de liste un morceau lu
    /// depuis le fichier, avec un identifiant fraîchement frappé. Rend
    /// `false` une fois la capacité atteinte.
    pub(crate) fn push_loaded(&mut self, udn: &str, metadata: &str) -> bool {
        if self.tracks.len() >= MAX_TRACKS {
            return false;
        }
        let id = self.id_gen.next_track_id();
        self.tracks.push_back(id, Track::new(id, udn, metadata));
        true
    }

    /// Sérialise la section morceaux du fichier de playlist, métadonnées
    /// échappées.
    pub(crate) fn to_xml(&self, out: &mut String) {
        for track in self.tracks.values() {
            out.push_str("  <Track>\n");
            out.push_str("    <Udn>");
            out.push_str(track.udn());
            out.push_str("</Udn>\n");
            out.push_str("    <Metadata>");
            out.push_str(&didl::xml_escape(track.metadata()));
            out.push_str("</Metadata>\n");
            out.push_str("  </Track>\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> PlaylistData {
        PlaylistData::new(PlaylistId::new(1).unwrap())
    }

    fn ids(data: &PlaylistData) -> Vec<u32> {
        data.id_array()
            .chunks(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_insert_prepend_and_after() {
        let mut data = data();
        let t1 = data.insert_after(None, "u1", "<m/>").unwrap();
        let t2 = data.insert_after(Some(t1), "u2", "<m/>").unwrap();
        let t3 = data.insert_after(None, "u3", "<m/>").unwrap();
        assert_eq!(ids(&data), vec![t3.get(), t1.get(), t2.get()]);
        assert_eq!(data.read(t2).unwrap(), ("u2", "<m/>"));
    }

    #[test]
    fn test_insert_after_unknown_track() {
        let mut data = data();
        let err = data
            .insert_after(TrackId::new(42), "u", "<m/>")
            .unwrap_err();
        assert!(matches!(err, Error::TrackNotFound(42)));
        assert!(data.is_empty());
    }

    #[test]
    fn test_full_at_capacity() {
        let mut data = data();
        for i in 0..MAX_TRACKS {
            data.insert_after(None, &format!("u{}", i), "<m/>").unwrap();
        }
        assert_eq!(data.len(), MAX_TRACKS);

        let err = data.insert_after(None, "extra", "<m/>").unwrap_err();
        assert!(matches!(err, Error::PlaylistFull));
        assert_eq!(data.len(), MAX_TRACKS);
    }

    #[test]
    fn test_delete_is_noop_when_absent() {
        let mut data = data();
        let t1 = data.insert_after(None, "u1", "<m/>").unwrap();
        assert!(!data.delete(TrackId::new(999).unwrap()));
        assert!(data.delete(t1));
        assert!(data.is_empty());
    }

    #[test]
    fn test_delete_all_then_read_fails() {
        let mut data = data();
        let t1 = data.insert_after(None, "u1", "<m/>").unwrap();
        data.insert_after(Some(t1), "u2", "<m/>").unwrap();
        data.delete_all();
        assert!(data.is_empty());
        assert!(data.id_array().is_empty());
        assert!(matches!(
            data.read(t1).unwrap_err(),
            Error::TrackNotFound(_)
        ));
    }

    #[test]
    fn test_ids_never_reused() {
        let mut data = data();
        let t1 = data.insert_after(None, "u1", "<m/>").unwrap();
        data.delete(t1);
        let t2 = data.insert_after(None, "u2", "<m/>").unwrap();
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_id_array_length_invariant() {
        let mut data = data();
        for i in 0..5 {
            data.insert_after(None, &format!("u{}", i), "<m/>").unwrap();
        }
        assert_eq!(data.id_array().len(), 4 * data.len());
    }
}
