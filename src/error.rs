//! Types d'erreurs pour pmoplaylistmanager

/// Erreurs du catalogue de playlists
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(u32),

    #[error("Track not found: {0}")]
    TrackNotFound(u32),

    #[error("Playlist full")]
    PlaylistFull,

    #[error("Space separated id request list invalid")]
    InvalidRequest,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Code de faute UPnP associé, tel qu'attendu par les points de contrôle.
    ///
    /// Les échecs de persistance et d'analyse sont rapportés comme 800,
    /// le seul code que les clients historiques savent interpréter.
    pub fn upnp_code(&self) -> u32 {
        match self {
            Error::PlaylistNotFound(_) | Error::TrackNotFound(_) => 800,
            Error::PlaylistFull => 801,
            Error::InvalidRequest => 802,
            Error::Persistence(_) | Error::Parse(_) | Error::Other(_) => 800,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

/// Type Result spécialisé pour pmoplaylistmanager
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upnp_codes() {
        assert_eq!(Error::PlaylistNotFound(4).upnp_code(), 800);
        assert_eq!(Error::TrackNotFound(9).upnp_code(), 800);
        assert_eq!(Error::PlaylistFull.upnp_code(), 801);
        assert_eq!(Error::InvalidRequest.upnp_code(), 802);
        assert_eq!(Error::Persistence("disk".into()).upnp_code(), 800);
    }
}
