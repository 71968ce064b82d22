//! Persistance du catalogue sur le système de fichiers
//!
//! Le répertoire de travail contient `Toc.txt` (nombre d'entrées puis un nom
//! de fichier par ligne, dans l'ordre du catalogue) et un fichier
//! `<id>.txt` par playlist. Chaque mutation réécrit le fichier concerné en
//! entier : le format doit rester stable à l'octet près pour que la
//! reconstruction au démarrage retrouve exactement le catalogue.

use std::path::{Path, PathBuf};

use crate::didl;
use crate::error::Result;
use crate::ids::PlaylistId;
use crate::playlist::data::PlaylistData;
use crate::playlist::header::PlaylistHeader;

/// Nom du fichier table des matières.
pub(crate) const TOC_FILENAME: &str = "Toc.txt";

/// Lecteur de balises minimal pour le format de fichier maison.
///
/// Le format ne s'appuie que sur `<` et `>` comme délimiteurs; le contenu
/// textuel n'est échappé que pour les métadonnées. Un vrai analyseur XML
/// serait à la fois trop strict et trop laxiste ici.
pub(crate) struct TagScanner<'a> {
    rest: &'a str,
}

impl<'a> TagScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// Avance jusqu'à la prochaine balise et rend son contenu
    /// (`"Name"`, `"/Name"`, ...), ou `None` en fin d'entrée.
    pub fn next_tag(&mut self) -> Option<&'a str> {
        let start = self.rest.find('<')?;
        let after = &self.rest[start + 1..];
        let end = after.find('>')?;
        let tag = &after[..end];
        self.rest = &after[end + 1..];
        Some(tag)
    }

    /// Rend le texte courant jusqu'à la prochaine balise, sans la consommer.
    pub fn read_text(&mut self) -> &'a str {
        match self.rest.find('<') {
            Some(pos) => {
                let text = &self.rest[..pos];
                self.rest = &self.rest[pos..];
                text
            }
            None => {
                let text = self.rest;
                self.rest = "";
                text
            }
        }
    }
}

/// Accès exclusif au répertoire de persistance.
pub(crate) struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Réécrit la table des matières : le nombre d'entrées puis les noms de
    /// fichiers dans l'ordre du catalogue.
    pub async fn write_toc(&self, filenames: &[String]) -> Result<()> {
        let mut out = String::with_capacity(16 + filenames.len() * 12);
        out.push_str(&filenames.len().to_string());
        out.push('\n');
        for filename in filenames {
            out.push_str(filename);
            out.push('\n');
        }
        tokio::fs::write(self.path_of(TOC_FILENAME), out).await?;
        Ok(())
    }

    /// Lit la table des matières. Si le fichier annonce plus d'entrées qu'il
    /// n'en contient, seules les lignes présentes sont rendues.
    pub async fn read_toc(&self) -> Result<Vec<String>> {
        let raw = tokio::fs::read_to_string(self.path_of(TOC_FILENAME)).await?;
        let mut lines = raw.lines();
        let count: usize = lines
            .next()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(0);
        Ok(lines
            .take(count)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn write_playlist(&self, filename: &str, xml: &str) -> Result<()> {
        tokio::fs::write(self.path_of(filename), xml).await?;
        Ok(())
    }

    /// Suppression au mieux; l'absence du fichier n'est pas une erreur.
    pub async fn remove_playlist(&self, filename: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path_of(filename)).await {
            tracing::debug!(filename = %filename, "Could not remove playlist file: {}", e);
        }
    }

    /// Charge l'en-tête d'un fichier de playlist.
    ///
    /// Rend `Ok(None)` si le fichier ne commence pas par `<Playlist>` (il est
    /// alors ignoré par la reconstruction), une erreur sur un échec d'E/S.
    pub async fn load_header(&self, filename: &str) -> Result<Option<PlaylistHeader>> {
        let raw = tokio::fs::read_to_string(self.path_of(filename)).await?;
        let mut scanner = TagScanner::new(&raw);
        if scanner.next_tag() != Some("Playlist") {
            return Ok(None);
        }
        Ok(Some(PlaylistHeader::from_scanner(&mut scanner)))
    }

    /// Matérialise la liste des morceaux d'un fichier de playlist.
    ///
    /// L'en-tête est sauté jusqu'à `</ImageId>` inclus, puis les triplets
    /// `<Track><Udn>…</Udn><Metadata>…</Metadata></Track>` sont lus un à un.
    /// Toute malformation termine la boucle proprement avec les morceaux
    /// déjà lus; chaque morceau reçoit un identifiant fraîchement frappé.
    pub async fn load_data(&self, id: PlaylistId, filename: &str) -> Result<PlaylistData> {
        let raw = tokio::fs::read_to_string(self.path_of(filename)).await?;
        let mut data = PlaylistData::new(id);
        let mut scanner = TagScanner::new(&raw);

        loop {
            match scanner.next_tag() {
                Some("/ImageId") => break,
                Some(_) => continue,
                None => return Ok(data),
            }
        }

        while scanner.next_tag() == Some("Track") {
            if scanner.next_tag() != Some("Udn") {
                break;
            }
            let udn = scanner.read_text();
            if scanner.next_tag() != Some("/Udn") || scanner.next_tag() != Some("Metadata") {
                break;
            }
            let metadata = match didl::xml_unescape(scanner.read_text()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(playlist = %id, "Stopping track load on bad metadata: {}", e);
                    break;
                }
            };
            if !data.push_loaded(udn, &metadata) {
                break;
            }
            if scanner.next_tag() != Some("/Metadata") || scanner.next_tag() != Some("/Track") {
                break;
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_tags_and_text() {
        let mut scanner = TagScanner::new("<Playlist>\n  <Name>Jazz</Name>\n");
        assert_eq!(scanner.next_tag(), Some("Playlist"));
        assert_eq!(scanner.next_tag(), Some("Name"));
        assert_eq!(scanner.read_text(), "Jazz");
        assert_eq!(scanner.next_tag(), Some("/Name"));
        assert_eq!(scanner.next_tag(), None);
    }

    #[tokio::test]
    async fn test_toc_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();

        store
            .write_toc(&["3.txt".to_string(), "1.txt".to_string()])
            .await
            .unwrap();
        let raw = std::fs::read_to_string(dir.path().join("Toc.txt")).unwrap();
        assert_eq!(raw, "2\n3.txt\n1.txt\n");

        let entries = store.read_toc().await.unwrap();
        assert_eq!(entries, vec!["3.txt".to_string(), "1.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_toc_truncated_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("Toc.txt"), "5\n1.txt\n2.txt\n").unwrap();
        let entries = store.read_toc().await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_load_data_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let xml = "<Playlist>\n  <Name>n</Name>\n  <Description>d</Description>\n  <ImageId>0</ImageId>\n  <Track>\n    <Udn>udn-1</Udn>\n    <Metadata>&lt;m val=&quot;a&amp;b&quot;/&gt;</Metadata>\n  </Track>\n</Playlist>\n";
        store.write_playlist("1.txt", xml).await.unwrap();

        let id = PlaylistId::new(1).unwrap();
        let data = store.load_data(id, "1.txt").await.unwrap();
        assert_eq!(data.len(), 1);
        let ids = data.id_array();
        let track_id = crate::ids::TrackId::new(u32::from_be_bytes([
            ids[0], ids[1], ids[2], ids[3],
        ]))
        .unwrap();
        assert_eq!(data.read(track_id).unwrap(), ("udn-1", "<m val=\"a&b\"/>"));
    }

    #[tokio::test]
    async fn test_load_data_stops_on_malformed_track() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let xml = "<Playlist>\n  <Name>n</Name>\n  <Description>d</Description>\n  <ImageId>0</ImageId>\n  <Track>\n    <Udn>good</Udn>\n    <Metadata>ok</Metadata>\n  </Track>\n  <Track>\n    <Oops>bad</Oops>\n";
        store.write_playlist("2.txt", xml).await.unwrap();

        let data = store
            .load_data(PlaylistId::new(2).unwrap(), "2.txt")
            .await
            .unwrap();
        assert_eq!(data.len(), 1);
    }
}
