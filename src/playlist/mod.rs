//! Playlist : en-tête, jeton de révision et poignée vers les données en cache

pub mod data;
pub mod header;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::cache::Cache;
use crate::didl;
use crate::error::Result;
use crate::ids::{PlaylistId, TrackId};
use self::data::PlaylistData;
use self::header::PlaylistHeader;

struct PlaylistState {
    header: PlaylistHeader,
    token: u32,
    data: Option<Arc<RwLock<PlaylistData>>>,
}

/// Une playlist du catalogue.
///
/// L'identifiant et le nom de fichier sont immuables; l'en-tête, le jeton et
/// la poignée de données vivent sous le verrou interne. Les opérations sur
/// les morceaux suivent toutes le même schéma : prendre le verrou, résoudre
/// la poignée via le cache si elle est vide, déléguer aux données. Le crochet
/// d'éviction du cache vide la poignée sous ce même verrou.
pub struct Playlist {
    id: PlaylistId,
    filename: String,
    cache: Arc<Cache>,
    state: Mutex<PlaylistState>,
}

impl Playlist {
    pub(crate) fn new(cache: Arc<Cache>, id: PlaylistId, header: PlaylistHeader) -> Self {
        Self {
            id,
            filename: format!("{}.txt", id),
            cache,
            state: Mutex::new(PlaylistState {
                header,
                token: 0,
                data: None,
            }),
        }
    }

    pub fn id(&self) -> PlaylistId {
        self.id
    }

    /// Nom du fichier de persistance, dérivé de l'identifiant.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Jeton de révision courant; incrémenté par toute mutation d'en-tête
    /// ou de contenu.
    pub async fn token(&self) -> u32 {
        self.state.lock().await.token
    }

    /// Copie de l'en-tête : `(nom, description, identifiant d'image)`.
    pub async fn read_header(&self) -> (String, String, u32) {
        let st = self.state.lock().await;
        (
            st.header.name().to_string(),
            st.header.description().to_string(),
            st.header.image_id(),
        )
    }

    pub(crate) async fn set_name(&self, name: &str) {
        let mut st = self.state.lock().await;
        st.header.set_name(name);
        st.token = st.token.wrapping_add(1);
    }

    pub(crate) async fn set_description(&self, description: &str) {
        let mut st = self.state.lock().await;
        st.header.set_description(description);
        st.token = st.token.wrapping_add(1);
    }

    pub(crate) async fn set_image_id(&self, image_id: u32) {
        let mut st = self.state.lock().await;
        st.header.set_image_id(image_id);
        st.token = st.token.wrapping_add(1);
    }

    /// Résout la poignée de données, en la redemandant au cache après une
    /// éviction.
    async fn data(self: &Arc<Self>, st: &mut PlaylistState) -> Arc<RwLock<PlaylistData>> {
        if let Some(data) = &st.data {
            return data.clone();
        }
        let data = self.cache.data_for(self).await;
        st.data = Some(data.clone());
        data
    }

    /// Attache des données fraîchement installées dans le cache (playlist
    /// nouvellement créée).
    pub(crate) async fn attach_data(&self, data: Arc<RwLock<PlaylistData>>) {
        let mut st = self.state.lock().await;
        st.data = Some(data);
    }

    /// Crochet d'éviction du cache : la poignée devient invalide.
    pub(crate) async fn data_evicted(&self) {
        let mut st = self.state.lock().await;
        st.data = None;
    }

    pub async fn id_array(self: &Arc<Self>) -> Vec<u8> {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        let result = data.read().await.id_array();
        result
    }

    pub async fn track_count(self: &Arc<Self>) -> usize {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        let result = data.read().await.len();
        result
    }

    pub async fn read(self: &Arc<Self>, track_id: TrackId) -> Result<(String, String)> {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        let guard = data.read().await;
        let (udn, metadata) = guard.read(track_id)?;
        Ok((udn.to_string(), metadata.to_string()))
    }

    /// Corps d'une réponse `ReadList` : une `<Entry>` par identifiant connu,
    /// les inconnus sont passés sous silence.
    pub async fn track_list(self: &Arc<Self>, track_ids: &[u32]) -> String {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        let guard = data.read().await;

        let mut out = String::from("<TrackList>");
        for raw in track_ids {
            let Some(track_id) = TrackId::new(*raw) else {
                continue;
            };
            if let Some(track) = guard.get(track_id) {
                didl::write_track_entry(&mut out, track.id(), track.udn(), track.metadata());
            }
        }
        out.push_str("</TrackList>");
        out
    }

    pub(crate) async fn insert_after(
        self: &Arc<Self>,
        after: Option<TrackId>,
        udn: &str,
        metadata: &str,
    ) -> Result<TrackId> {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        let new_id = data.write().await.insert_after(after, udn, metadata)?;
        st.token = st.token.wrapping_add(1);
        Ok(new_id)
    }

    /// Supprime un morceau. Identifiant inconnu ou nul : sans effet sur la
    /// liste, mais le jeton avance quand même.
    pub(crate) async fn delete(self: &Arc<Self>, track_id: Option<TrackId>) {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        if let Some(track_id) = track_id {
            data.write().await.delete(track_id);
        }
        st.token = st.token.wrapping_add(1);
    }

    pub(crate) async fn delete_all(self: &Arc<Self>) {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        data.write().await.delete_all();
        st.token = st.token.wrapping_add(1);
    }

    /// Sérialise la playlist complète au format de persistance.
    pub(crate) async fn to_xml(self: &Arc<Self>) -> String {
        let mut st = self.state.lock().await;
        let data = self.data(&mut st).await;
        let guard = data.read().await;

        let mut out = String::from("<Playlist>\n");
        st.header.to_xml(&mut out);
        guard.to_xml(&mut out);
        out.push_str("</Playlist>\n");
        out
    }
}
