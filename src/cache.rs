//! Cache LRU borné des listes de morceaux matérialisées
//!
//! Le cache est le propriétaire exclusif de chaque [`PlaylistData`]; une
//! playlist n'en retient qu'une poignée optionnelle, invalidée à l'éviction
//! via la référence arrière portée par l'entrée. L'éviction est strictement
//! LRU, un accès réussi promeut l'entrée en queue.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, RwLock};

use crate::ids::PlaylistId;
use crate::persistence::Store;
use crate::playlist::data::PlaylistData;
use crate::playlist::Playlist;

struct CacheEntry {
    data: Arc<RwLock<PlaylistData>>,
    owner: Weak<Playlist>,
}

struct CacheInner {
    entries: HashMap<PlaylistId, CacheEntry>,
    // tête = moins récemment utilisé, queue = plus récemment utilisé
    lru: Vec<PlaylistId>,
}

pub(crate) struct Cache {
    store: Arc<Store>,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl Cache {
    pub fn new(store: Arc<Store>, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                lru: Vec::new(),
            }),
        }
    }

    /// Rend les données d'une playlist, en les matérialisant depuis son
    /// fichier si nécessaire.
    ///
    /// Un échec de chargement dégrade en liste vide : une lecture partielle
    /// vaut mieux qu'une opération indéfinie, et la prochaine écriture
    /// régénérera le fichier.
    pub async fn data_for(&self, playlist: &Arc<Playlist>) -> Arc<RwLock<PlaylistData>> {
        let mut inner = self.inner.lock().await;
        let id = playlist.id();

        if let Some(entry) = inner.entries.get(&id) {
            let data = entry.data.clone();
            promote(&mut inner.lru, id);
            return data;
        }

        self.evict_to_fit(&mut inner).await;

        let data = match self.store.load_data(id, playlist.filename()).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(playlist = %id, "Loading playlist data failed, starting empty: {}", e);
                PlaylistData::new(id)
            }
        };
        let data = Arc::new(RwLock::new(data));
        inner.entries.insert(
            id,
            CacheEntry {
                data: data.clone(),
                owner: Arc::downgrade(playlist),
            },
        );
        inner.lru.push(id);
        data
    }

    /// Insère des données déjà construites pour une playlist fraîchement
    /// créée, sans passer par un chargement de fichier.
    pub async fn install(
        &self,
        playlist: &Arc<Playlist>,
        data: PlaylistData,
    ) -> Arc<RwLock<PlaylistData>> {
        let mut inner = self.inner.lock().await;
        let id = data.playlist_id();
        self.evict_to_fit(&mut inner).await;

        let data = Arc::new(RwLock::new(data));
        inner.entries.insert(
            id,
            CacheEntry {
                data: data.clone(),
                owner: Arc::downgrade(playlist),
            },
        );
        promote(&mut inner.lru, id);
        data
    }

    /// Oublie une playlist supprimée du catalogue.
    pub async fn discard(&self, id: PlaylistId) {
        let mut inner = self.inner.lock().await;
        inner.entries.remove(&id);
        inner.lru.retain(|entry| *entry != id);
    }

    /// Nombre de listes actuellement matérialisées.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Évince les entrées les moins récemment utilisées jusqu'à laisser une
    /// place libre, en prévenant chaque propriétaire avant de lâcher les
    /// données. Sûr : l'éviction ne survient que pendant un accès issu d'une
    /// autre playlist, sérialisé au niveau du catalogue.
    async fn evict_to_fit(&self, inner: &mut CacheInner) {
        while inner.entries.len() >= self.capacity && !inner.lru.is_empty() {
            let victim = inner.lru.remove(0);
            if let Some(entry) = inner.entries.remove(&victim) {
                if let Some(owner) = entry.owner.upgrade() {
                    owner.data_evicted().await;
                }
                tracing::debug!(playlist = %victim, "Playlist data evicted from cache");
            }
        }
    }
}

/// Déplace `id` en position la plus récemment utilisée.
fn promote(lru: &mut Vec<PlaylistId>, id: PlaylistId) {
    lru.retain(|entry| *entry != id);
    lru.push(id);
}
