//! Configuration du service

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration du catalogue de playlists.
///
/// Chargée depuis un fichier YAML ou construite en mémoire; chaque champ a
/// une valeur par défaut raisonnable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Répertoire de travail exclusif contenant `Toc.txt` et les fichiers
    /// de playlists. Possédé par le processus.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Nom convivial annoncé dans la propriété `Metadata`.
    #[serde(default = "default_friendly_name")]
    pub friendly_name: String,

    /// Adresse de l'adaptateur réseau servant l'icône de l'appareil.
    #[serde(default = "default_adapter")]
    pub adapter: IpAddr,

    /// Nombre maximal de listes de morceaux matérialisées en mémoire.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_directory() -> PathBuf {
    PathBuf::from("playlists")
}

fn default_friendly_name() -> String {
    "PlaylistManager".to_string()
}

fn default_adapter() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_cache_capacity() -> usize {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            friendly_name: default_friendly_name(),
            adapter: default_adapter(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Charge la configuration depuis un fichier YAML.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Variante pratique : répertoire donné, le reste par défaut.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }
}
