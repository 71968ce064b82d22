//! # pmoplaylistmanager - Catalogue de playlists pour le service OpenHome PlaylistManager
//!
//! Cette crate fournit le cœur serveur du service
//! `av.openhome.org:PlaylistManager` : un catalogue ordonné de playlists de
//! morceaux, persisté sur le système de fichiers et notifiant ses abonnés à
//! chaque changement. Elle couvre :
//! - Le modèle de données (playlists ordonnées, morceaux ordonnés, bornes de
//!   taille) et la frappe d'identifiants jamais réutilisés
//! - Les jetons de révision qui pilotent le protocole de notification
//!   (`Token`, `IdArray`, `TokenArray`)
//! - Un cache LRU borné des listes de morceaux matérialisées, avec éviction
//!   notifiée au propriétaire
//! - La persistance `Toc.txt` + un fichier XML par playlist, reconstruite au
//!   démarrage
//! - La surface d'actions du service ([`api`]) et le puits de notification
//!   ([`PlaylistManagerListener`])
//!
//! La pile réseau (SOAP, SSDP, annonce de l'appareil) est à la charge du
//! répartiteur qui consomme cette crate.
//!
//! # Exemples
//!
//! ```no_run
//! use pmoplaylistmanager::{Config, PlaylistManager};
//!
//! # #[tokio::main]
//! # async fn main() -> pmoplaylistmanager::Result<()> {
//! let manager = PlaylistManager::new(Config::with_directory("./playlists")).await?;
//!
//! // Créer une playlist en tête de catalogue, puis y insérer un morceau
//! let id = manager.playlist_insert(0, "Jazz", "Du swing au bebop", 7).await?;
//! let track = manager.insert(id, 0, "4c494e4e-0026-0f21", "<DIDL-Lite/>").await?;
//!
//! let (udn, metadata) = manager.read(id, track).await?;
//! println!("{} -> {}", udn, metadata);
//!
//! // Quatre octets grand-boutistes par playlist
//! assert_eq!(manager.id_array().await.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod didl;
pub mod error;
pub mod ids;
pub mod listener;
pub mod manager;
pub mod playlist;
pub mod track;

mod cache;
mod ordered;
mod persistence;

pub use api::{PLAYLISTS_MAX, TRACKS_MAX};
pub use config::Config;
pub use error::{Error, Result};
pub use ids::{IdGenerator, PlaylistId, TrackId};
pub use listener::{CatalogEvent, PlaylistManagerListener};
pub use manager::PlaylistManager;
pub use playlist::data::MAX_TRACKS;
pub use playlist::header::{MAX_DESCRIPTION_BYTES, MAX_NAME_BYTES};
pub use track::{Track, MAX_METADATA_BYTES, MAX_UDN_BYTES};
