//! Surface d'actions du service `av.openhome.org:PlaylistManager`
//!
//! Le répartiteur SOAP n'a qu'à relier chaque action à la fonction du même
//! nom : la validation des listes d'identifiants (décimaux séparés par des
//! espaces, bornés par le maximum déclaré) et la conversion des sentinelles
//! zéro se font ici, le reste est délégué au [`PlaylistManager`]. Le code de
//! faute à renvoyer sur une erreur est donné par [`crate::Error::upnp_code`].

use crate::error::{Error, Result};
use crate::manager::PlaylistManager;
use crate::playlist::data::MAX_TRACKS;

/// Nombre maximal de playlists annoncé par l'action `PlaylistsMax`.
pub const PLAYLISTS_MAX: u32 = 500;

/// Nombre maximal de morceaux par playlist annoncé par `TracksMax`.
pub const TRACKS_MAX: u32 = MAX_TRACKS as u32;

/// Analyse une liste d'identifiants décimaux séparés par des espaces.
///
/// Les segments vides sont ignorés; un segment non décimal ou une liste plus
/// longue que `max` vaut [`Error::InvalidRequest`].
pub fn parse_id_list(raw: &str, max: u32) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for part in raw.split(' ') {
        if part.is_empty() {
            continue;
        }
        let id: u32 = part.parse().map_err(|_| Error::InvalidRequest)?;
        ids.push(id);
        if ids.len() > max as usize {
            return Err(Error::InvalidRequest);
        }
    }
    Ok(ids)
}

pub async fn metadata(manager: &PlaylistManager) -> String {
    manager.metadata().await
}

pub fn images_xml(manager: &PlaylistManager) -> String {
    manager.images_xml()
}

pub async fn playlist_read_array(manager: &PlaylistManager, id: u32) -> Result<Vec<u8>> {
    manager.id_array_of(id).await
}

pub async fn playlist_read_list(manager: &PlaylistManager, id_list: &str) -> Result<String> {
    let ids = parse_id_list(id_list, PLAYLISTS_MAX)?;
    Ok(manager.playlist_read_list(&ids).await)
}

pub async fn playlist_read(manager: &PlaylistManager, id: u32) -> Result<(String, String, u32)> {
    manager.playlist_read(id).await
}

pub async fn playlist_set_name(manager: &PlaylistManager, id: u32, name: &str) -> Result<()> {
    manager.playlist_set_name(id, name).await
}

pub async fn playlist_set_description(
    manager: &PlaylistManager,
    id: u32,
    description: &str,
) -> Result<()> {
    manager.playlist_set_description(id, description).await
}

pub async fn playlist_set_image_id(
    manager: &PlaylistManager,
    id: u32,
    image_id: u32,
) -> Result<()> {
    manager.playlist_set_image_id(id, image_id).await
}

pub async fn playlist_insert(
    manager: &PlaylistManager,
    after_id: u32,
    name: &str,
    description: &str,
    image_id: u32,
) -> Result<u32> {
    manager.playlist_insert(after_id, name, description, image_id).await
}

pub async fn playlist_delete_id(manager: &PlaylistManager, id: u32) -> Result<()> {
    manager.playlist_delete(id).await
}

pub async fn playlist_move(manager: &PlaylistManager, id: u32, after_id: u32) -> Result<()> {
    manager.playlist_move(id, after_id).await
}

pub fn playlists_max(_manager: &PlaylistManager) -> u32 {
    PLAYLISTS_MAX
}

pub fn tracks_max(_manager: &PlaylistManager) -> u32 {
    TRACKS_MAX
}

pub async fn playlist_arrays(manager: &PlaylistManager) -> (u32, Vec<u8>, Vec<u8>) {
    manager.playlist_arrays().await
}

pub async fn playlist_arrays_changed(manager: &PlaylistManager, token: u32) -> bool {
    manager.playlist_arrays_changed(token).await
}

pub async fn read(manager: &PlaylistManager, id: u32, track_id: u32) -> Result<(String, String)> {
    manager.read(id, track_id).await
}

pub async fn read_list(
    manager: &PlaylistManager,
    id: u32,
    track_id_list: &str,
) -> Result<String> {
    let track_ids = parse_id_list(track_id_list, TRACKS_MAX)?;
    manager.read_list(id, &track_ids).await
}

pub async fn insert(
    manager: &PlaylistManager,
    id: u32,
    after_track_id: u32,
    udn: &str,
    metadata: &str,
) -> Result<u32> {
    manager.insert(id, after_track_id, udn, metadata).await
}

pub async fn delete_id(manager: &PlaylistManager, id: u32, track_id: u32) -> Result<()> {
    manager.delete(id, track_id).await
}

pub async fn delete_all(manager: &PlaylistManager, id: u32) -> Result<()> {
    manager.delete_all(id).await
}
