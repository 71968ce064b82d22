//! PlaylistManager : le catalogue ordonné des playlists de l'appareil
//!
//! Toutes les mutations passent par ici : le verrou du catalogue sérialise
//! la liste ordonnée, le jeton global, le générateur d'identifiants et la
//! persistance. Chaque mutation écrit ses fichiers puis fait avancer les
//! jetons sous le verrou; les notifications partent une fois le verrou
//! relâché, si bien qu'un abonné qui relit le catalogue observe toujours un
//! jeton au moins égal à celui de la mutation.
//!
//! L'ordre d'acquisition des verrous est fixe : catalogue, puis playlist,
//! puis cache. Le crochet d'éviction du cache prend le verrou de la playlist
//! évincée; c'est sûr parce que la sérialisation au niveau du catalogue
//! garantit qu'aucune autre opération de données n'est en cours.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};

use tokio::sync::{broadcast, Mutex};

use crate::cache::Cache;
use crate::config::Config;
use crate::didl;
use crate::error::{Error, Result};
use crate::ids::{IdGenerator, PlaylistId, TrackId};
use crate::listener::{CatalogEvent, PlaylistManagerListener};
use crate::ordered::OrderedList;
use crate::persistence::Store;
use crate::playlist::data::PlaylistData;
use crate::playlist::header::PlaylistHeader;
use crate::playlist::Playlist;
use crate::track::truncate_to_boundary;

/// Taille maximale du nom convivial de l'appareil en octets.
const MAX_DEVICE_NAME_BYTES: usize = 100;

struct CatalogState {
    playlists: OrderedList<PlaylistId, Arc<Playlist>>,
    id_gen: IdGenerator,
    token: u32,
    name: String,
    adapter: IpAddr,
}

struct ManagerInner {
    state: Mutex<CatalogState>,
    cache: Arc<Cache>,
    store: Arc<Store>,
    listeners: StdRwLock<HashMap<u64, Arc<dyn PlaylistManagerListener>>>,
    listener_seq: AtomicU64,
    event_tx: broadcast::Sender<CatalogEvent>,
}

/// Catalogue de playlists de l'appareil (une instance par processus).
#[derive(Clone)]
pub struct PlaylistManager {
    inner: Arc<ManagerInner>,
}

impl PlaylistManager {
    /// Ouvre le répertoire de travail et reconstruit le catalogue depuis la
    /// table des matières.
    ///
    /// La reconstruction est tolérante : une table absente ou tronquée donne
    /// un catalogue partiel, jamais une erreur. Le générateur d'identifiants
    /// repart au-delà du plus grand identifiant observé, de sorte qu'un
    /// identifiant de playlist n'est jamais réutilisé d'un démarrage à
    /// l'autre.
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(Store::new(&config.directory)?);
        let cache = Arc::new(Cache::new(store.clone(), config.cache_capacity));

        let mut playlists = OrderedList::new();
        let mut last_id = 0u32;

        match store.read_toc().await {
            Ok(filenames) => {
                for filename in filenames {
                    let Some(raw) = filename
                        .split('.')
                        .next()
                        .and_then(|s| s.parse::<u32>().ok())
                    else {
                        tracing::warn!(filename = %filename, "Malformed catalog entry, stopping reconstruction");
                        break;
                    };
                    let Some(id) = PlaylistId::new(raw) else {
                        tracing::warn!(filename = %filename, "Zero playlist id, stopping reconstruction");
                        break;
                    };
                    if raw > last_id {
                        last_id = raw;
                    }
                    if playlists.contains(&id) {
                        continue;
                    }
                    match store.load_header(&filename).await {
                        Ok(Some(header)) => {
                            let playlist = Arc::new(Playlist::new(cache.clone(), id, header));
                            playlists.push_back(id, playlist);
                        }
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::warn!(
                                filename = %filename,
                                "Reading playlist file failed, stopping reconstruction: {}",
                                e
                            );
                            break;
                        }
                    }
                }
                tracing::info!(count = playlists.len(), "Playlist catalog reconstructed");
            }
            Err(e) => {
                tracing::info!("No table of contents, starting with an empty catalog: {}", e);
            }
        }

        let (event_tx, _) = broadcast::channel(64);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                state: Mutex::new(CatalogState {
                    playlists,
                    id_gen: IdGenerator::new(last_id),
                    token: 0,
                    name: truncate_to_boundary(&config.friendly_name, MAX_DEVICE_NAME_BYTES)
                        .to_string(),
                    adapter: config.adapter,
                }),
                cache,
                store,
                listeners: StdRwLock::new(HashMap::new()),
                listener_seq: AtomicU64::new(1),
                event_tx,
            }),
        })
    }

    // ------------------------------------------------------------------
    // Identité de l'appareil
    // ------------------------------------------------------------------

    pub async fn name(&self) -> String {
        self.inner.state.lock().await.name.clone()
    }

    /// Renomme l'appareil. Ne fait pas avancer le jeton du catalogue : seul
    /// l'état `Metadata` est republié.
    pub async fn set_name(&self, name: &str) {
        {
            let mut state = self.inner.state.lock().await;
            state.name = truncate_to_boundary(name, MAX_DEVICE_NAME_BYTES).to_string();
        }
        self.notify(CatalogEvent::MetadataChanged);
    }

    pub async fn adapter(&self) -> IpAddr {
        self.inner.state.lock().await.adapter
    }

    pub async fn set_adapter(&self, adapter: IpAddr) {
        {
            let mut state = self.inner.state.lock().await;
            state.adapter = adapter;
        }
        self.notify(CatalogEvent::MetadataChanged);
    }

    /// Propriété `Metadata` : l'item DIDL-Lite décrivant l'appareil.
    pub async fn metadata(&self) -> String {
        let state = self.inner.state.lock().await;
        didl::device_metadata(&state.name, state.adapter)
    }

    /// Le catalogue ne gère pas d'images téléversées; la liste est vide.
    pub fn images_xml(&self) -> String {
        String::new()
    }

    // ------------------------------------------------------------------
    // Jetons et tableaux
    // ------------------------------------------------------------------

    pub async fn token(&self) -> u32 {
        self.inner.state.lock().await.token
    }

    /// Vrai si le jeton du client diffère du jeton courant.
    pub async fn token_changed(&self, token: u32) -> bool {
        self.inner.state.lock().await.token != token
    }

    /// Identifiants de playlists en grand-boutiste, dans l'ordre du
    /// catalogue. Quatre octets par playlist.
    pub async fn id_array(&self) -> Vec<u8> {
        let state = self.inner.state.lock().await;
        let mut out = Vec::with_capacity(4 * state.playlists.len());
        for playlist in state.playlists.values() {
            out.extend_from_slice(&playlist.id().get().to_be_bytes());
        }
        out
    }

    /// Jetons de playlists en grand-boutiste, alignés sur [`Self::id_array`].
    pub async fn token_array(&self) -> Vec<u8> {
        let state = self.inner.state.lock().await;
        let mut out = Vec::with_capacity(4 * state.playlists.len());
        for playlist in state.playlists.values() {
            out.extend_from_slice(&playlist.token().await.to_be_bytes());
        }
        out
    }

    /// Réponse composite `PlaylistArrays` : `(jeton, IdArray, TokenArray)`
    /// pris sous un seul passage de verrou.
    pub async fn playlist_arrays(&self) -> (u32, Vec<u8>, Vec<u8>) {
        let state = self.inner.state.lock().await;
        let mut ids = Vec::with_capacity(4 * state.playlists.len());
        let mut tokens = Vec::with_capacity(4 * state.playlists.len());
        for playlist in state.playlists.values() {
            ids.extend_from_slice(&playlist.id().get().to_be_bytes());
            tokens.extend_from_slice(&playlist.token().await.to_be_bytes());
        }
        (state.token, ids, tokens)
    }

    pub async fn playlist_arrays_changed(&self, token: u32) -> bool {
        self.token_changed(token).await
    }

    /// Identifiants de morceaux d'une playlist, en grand-boutiste.
    pub async fn id_array_of(&self, id: u32) -> Result<Vec<u8>> {
        let state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?;
        Ok(playlist.id_array().await)
    }

    // ------------------------------------------------------------------
    // Lectures
    // ------------------------------------------------------------------

    pub async fn playlist_read(&self, id: u32) -> Result<(String, String, u32)> {
        let state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?;
        Ok(playlist.read_header().await)
    }

    /// Enveloppe DIDL-Lite contenant un `<container>` par identifiant
    /// résolu; les identifiants inconnus sont passés sous silence.
    pub async fn playlist_read_list(&self, ids: &[u32]) -> String {
        let state = self.inner.state.lock().await;
        let mut out = String::from(didl::DIDL_LITE_OPEN);
        for raw in ids {
            let Some(id) = PlaylistId::new(*raw) else {
                continue;
            };
            if let Some(playlist) = state.playlists.get(&id) {
                let (name, _, image_id) = playlist.read_header().await;
                didl::write_playlist_container(&mut out, id, &name, image_id);
            }
        }
        out.push_str(didl::DIDL_LITE_CLOSE);
        out
    }

    pub async fn read(&self, id: u32, track_id: u32) -> Result<(String, String)> {
        let state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?;
        let track_id = TrackId::new(track_id).ok_or(Error::TrackNotFound(track_id))?;
        playlist.read(track_id).await
    }

    /// `<TrackList>` contenant une `<Entry>` par morceau résolu; les
    /// identifiants inconnus de la playlist sont passés sous silence.
    pub async fn read_list(&self, id: u32, track_ids: &[u32]) -> Result<String> {
        let state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?;
        Ok(playlist.track_list(track_ids).await)
    }

    pub async fn playlist_count(&self) -> usize {
        self.inner.state.lock().await.playlists.len()
    }

    /// Nombre de listes de morceaux actuellement matérialisées en mémoire.
    pub async fn cached_playlists(&self) -> usize {
        self.inner.cache.len().await
    }

    // ------------------------------------------------------------------
    // Mutations de catalogue
    // ------------------------------------------------------------------

    /// Crée une playlist, en tête si `after` vaut zéro, sinon juste après
    /// la playlist `after`. Rend l'identifiant frappé.
    pub async fn playlist_insert(
        &self,
        after: u32,
        name: &str,
        description: &str,
        image_id: u32,
    ) -> Result<u32> {
        let mut state = self.inner.state.lock().await;

        let anchor = match PlaylistId::new(after) {
            None => None,
            Some(anchor) => {
                if !state.playlists.contains(&anchor) {
                    return Err(Error::PlaylistNotFound(after));
                }
                Some(anchor)
            }
        };

        let id = state.id_gen.next_playlist_id();
        let header = PlaylistHeader::new(name, description, image_id);
        let playlist = Arc::new(Playlist::new(self.inner.cache.clone(), id, header));

        // une playlist neuve démarre avec des données vides déjà en cache,
        // son fichier n'existe pas encore
        let data = self.inner.cache.install(&playlist, PlaylistData::new(id)).await;
        playlist.attach_data(data).await;

        match anchor {
            None => state.playlists.insert_first(id, playlist.clone()),
            Some(anchor) => {
                if let Err(playlist) = state.playlists.insert_after(&anchor, id, playlist.clone()) {
                    state.playlists.insert_first(id, playlist);
                }
            }
        }

        let persisted = match self.persist_toc(&state).await {
            Ok(()) => self.persist_playlist(&playlist).await,
            Err(e) => Err(e),
        };

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistsChanged);

        persisted?;
        Ok(id.get())
    }

    /// Supprime une playlist. Identifiant nul ou inconnu : sans effet, ni
    /// jeton ni notification.
    pub async fn playlist_delete(&self, id: u32) -> Result<()> {
        let Some(playlist_id) = PlaylistId::new(id) else {
            return Ok(());
        };

        let mut state = self.inner.state.lock().await;
        let Some(playlist) = state.playlists.remove(&playlist_id) else {
            return Ok(());
        };

        self.inner.cache.discard(playlist_id).await;
        let persisted = self.persist_toc(&state).await;
        self.inner.store.remove_playlist(playlist.filename()).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistsChanged);

        persisted
    }

    /// Déplace une playlist juste après `after` (zéro = en tête). Les deux
    /// identifiants doivent exister; se déplacer après soi-même est sans
    /// effet sur l'ordre.
    pub async fn playlist_move(&self, id: u32, after: u32) -> Result<()> {
        let playlist_id = PlaylistId::new(id).ok_or(Error::PlaylistNotFound(id))?;

        let mut state = self.inner.state.lock().await;
        if !state.playlists.contains(&playlist_id) {
            return Err(Error::PlaylistNotFound(id));
        }
        let anchor = match PlaylistId::new(after) {
            None => None,
            Some(anchor) => {
                if !state.playlists.contains(&anchor) {
                    return Err(Error::PlaylistNotFound(after));
                }
                Some(anchor)
            }
        };

        if anchor != Some(playlist_id) {
            if let Some(playlist) = state.playlists.remove(&playlist_id) {
                match anchor {
                    None => state.playlists.insert_first(playlist_id, playlist),
                    Some(anchor) => {
                        if let Err(playlist) =
                            state.playlists.insert_after(&anchor, playlist_id, playlist)
                        {
                            state.playlists.insert_first(playlist_id, playlist);
                        }
                    }
                }
            }
        }

        let persisted = self.persist_toc(&state).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistsChanged);

        persisted
    }

    // ------------------------------------------------------------------
    // Mutations d'en-tête
    // ------------------------------------------------------------------

    pub async fn playlist_set_name(&self, id: u32, name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?.clone();
        playlist.set_name(name).await;
        let persisted = self.persist_playlist(&playlist).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistChanged);

        persisted
    }

    pub async fn playlist_set_description(&self, id: u32, description: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?.clone();
        playlist.set_description(description).await;
        let persisted = self.persist_playlist(&playlist).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistChanged);

        persisted
    }

    pub async fn playlist_set_image_id(&self, id: u32, image_id: u32) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?.clone();
        playlist.set_image_id(image_id).await;
        let persisted = self.persist_playlist(&playlist).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistChanged);

        persisted
    }

    // ------------------------------------------------------------------
    // Mutations de morceaux
    // ------------------------------------------------------------------

    /// Insère un morceau dans une playlist, en tête si `after_track` vaut
    /// zéro. Rend l'identifiant de morceau frappé.
    pub async fn insert(
        &self,
        id: u32,
        after_track: u32,
        udn: &str,
        metadata: &str,
    ) -> Result<u32> {
        let mut state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?.clone();

        let new_id = playlist
            .insert_after(TrackId::new(after_track), udn, metadata)
            .await?;
        let persisted = self.persist_playlist(&playlist).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistChanged);

        persisted?;
        Ok(new_id.get())
    }

    /// Supprime un morceau. Un identifiant de morceau inconnu est sans effet
    /// sur la liste, mais la playlist est réécrite et les jetons avancent.
    pub async fn delete(&self, id: u32, track_id: u32) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?.clone();

        playlist.delete(TrackId::new(track_id)).await;
        let persisted = self.persist_playlist(&playlist).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistChanged);

        persisted
    }

    pub async fn delete_all(&self, id: u32) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let playlist = resolve(&state, id)?.clone();

        playlist.delete_all().await;
        let persisted = self.persist_playlist(&playlist).await;

        state.token = state.token.wrapping_add(1);
        drop(state);
        self.notify(CatalogEvent::PlaylistChanged);

        persisted
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Enregistre un puits de notification; rend un jeton de
    /// désenregistrement.
    pub fn register_listener(&self, listener: Arc<dyn PlaylistManagerListener>) -> u64 {
        let token = self.inner.listener_seq.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.inner.listeners.write().unwrap();
        guard.insert(token, listener);
        token
    }

    pub fn unregister_listener(&self, token: u64) {
        let mut guard = self.inner.listeners.write().unwrap();
        guard.remove(&token);
    }

    /// Souscrit au flux d'évènements du catalogue.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CatalogEvent> {
        self.inner.event_tx.subscribe()
    }

    fn notify(&self, event: CatalogEvent) {
        let listeners: Vec<Arc<dyn PlaylistManagerListener>> = {
            let guard = self.inner.listeners.read().unwrap();
            guard.values().cloned().collect()
        };
        for listener in listeners {
            match event {
                CatalogEvent::MetadataChanged => listener.metadata_changed(),
                CatalogEvent::PlaylistsChanged => listener.playlists_changed(),
                CatalogEvent::PlaylistChanged => listener.playlist_changed(),
            }
        }

        // diffusion interne, ignorée sans abonné
        let _ = self.inner.event_tx.send(event);
    }

    // ------------------------------------------------------------------
    // Persistance
    // ------------------------------------------------------------------

    async fn persist_toc(&self, state: &CatalogState) -> Result<()> {
        let filenames: Vec<String> = state
            .playlists
            .values()
            .map(|p| p.filename().to_string())
            .collect();
        self.inner.store.write_toc(&filenames).await
    }

    async fn persist_playlist(&self, playlist: &Arc<Playlist>) -> Result<()> {
        let xml = playlist.to_xml().await;
        self.inner.store.write_playlist(playlist.filename(), &xml).await
    }
}

fn resolve<'a>(state: &'a CatalogState, id: u32) -> Result<&'a Arc<Playlist>> {
    PlaylistId::new(id)
        .and_then(|playlist_id| state.playlists.get(&playlist_id))
        .ok_or(Error::PlaylistNotFound(id))
}
