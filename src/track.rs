//! Track : objet valeur immuable référencé par une playlist

use crate::didl;
use crate::ids::TrackId;

/// Taille maximale d'un UDN en octets.
pub const MAX_UDN_BYTES: usize = 1024;

/// Taille maximale des métadonnées DIDL-Lite d'un morceau en octets.
pub const MAX_METADATA_BYTES: usize = 4096;

/// Référence immuable vers un morceau : l'UDN du serveur qui l'héberge et
/// ses métadonnées DIDL-Lite. Aucun contenu audio n'est stocké ici.
///
/// Les bornes de taille sont appliquées à la construction : l'UDN est
/// tronqué à [`MAX_UDN_BYTES`], des métadonnées trop volumineuses sont
/// remplacées par la sentinelle de condensation (voir
/// [`condense_metadata`]).
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    udn: String,
    metadata: String,
}

impl Track {
    pub(crate) fn new(id: TrackId, udn: &str, metadata: &str) -> Self {
        Self {
            id,
            udn: truncate_to_boundary(udn, MAX_UDN_BYTES).to_string(),
            metadata: condense_metadata(metadata).to_string(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn udn(&self) -> &str {
        &self.udn
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }
}

/// Condense des métadonnées de morceau : au-delà de [`MAX_METADATA_BYTES`]
/// octets elles sont remplacées par l'enveloppe DIDL-Lite fixe
/// "Metadata too large", sinon elles sont conservées telles quelles.
pub fn condense_metadata(raw: &str) -> &str {
    if raw.len() > MAX_METADATA_BYTES {
        didl::METADATA_TOO_LARGE
    } else {
        raw
    }
}

/// Tronque à `max` octets sans couper un caractère UTF-8.
pub(crate) fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdGenerator;

    #[test]
    fn test_small_metadata_kept_verbatim() {
        let mut gen = IdGenerator::default();
        let track = Track::new(gen.next_track_id(), "udn-1", "<m val=\"x\"/>");
        assert_eq!(track.udn(), "udn-1");
        assert_eq!(track.metadata(), "<m val=\"x\"/>");
    }

    #[test]
    fn test_oversized_metadata_condensed() {
        let big = "x".repeat(MAX_METADATA_BYTES + 1);
        assert_eq!(condense_metadata(&big), didl::METADATA_TOO_LARGE);

        let exact = "x".repeat(MAX_METADATA_BYTES);
        assert_eq!(condense_metadata(&exact), exact.as_str());
    }

    #[test]
    fn test_udn_truncated_on_char_boundary() {
        let mut gen = IdGenerator::default();
        // 'é' fait deux octets; la coupure ne doit pas tomber au milieu
        let udn = "é".repeat(MAX_UDN_BYTES);
        let track = Track::new(gen.next_track_id(), &udn, "<m/>");
        assert!(track.udn().len() <= MAX_UDN_BYTES);
        assert!(track.udn().chars().all(|c| c == 'é'));
    }
}
