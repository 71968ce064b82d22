//! Puits de notification de changements
//!
//! Le répartiteur UPnP implémente ce trait pour republier les propriétés
//! éventées (`Metadata`, `IdArray`, `TokenArray`). Les méthodes sont
//! invoquées après relâchement du verrou du catalogue : une implémentation
//! peut donc relire le catalogue pour sérialiser le nouvel état. Elles
//! doivent rester rapides et idempotentes.

/// Les trois arêtes de notification du catalogue.
pub trait PlaylistManagerListener: Send + Sync {
    /// Le nom de l'appareil ou son adaptateur a changé.
    fn metadata_changed(&self);

    /// L'ensemble des playlists a changé (insertion, suppression,
    /// déplacement).
    fn playlists_changed(&self);

    /// Le contenu ou l'en-tête d'une playlist a changé.
    fn playlist_changed(&self);
}

/// Évènement diffusé sur le canal broadcast, en miroir du trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEvent {
    MetadataChanged,
    PlaylistsChanged,
    PlaylistChanged,
}
