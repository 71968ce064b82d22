//! PlaylistHeader : métadonnées mutables d'une playlist

use crate::persistence::TagScanner;
use crate::track::truncate_to_boundary;

/// Taille maximale du nom d'une playlist en octets.
pub const MAX_NAME_BYTES: usize = 100;

/// Taille maximale de la description d'une playlist en octets.
pub const MAX_DESCRIPTION_BYTES: usize = 100;

/// Nom, description et identifiant d'image d'une playlist.
///
/// Les mutateurs ne touchent pas aux jetons de révision : c'est la playlist
/// qui incrémente son jeton et le catalogue qui persiste, sous leurs verrous
/// respectifs.
#[derive(Debug, Clone)]
pub struct PlaylistHeader {
    name: String,
    description: String,
    image_id: u32,
}

impl PlaylistHeader {
    pub fn new(name: &str, description: &str, image_id: u32) -> Self {
        Self {
            name: truncate_to_boundary(name, MAX_NAME_BYTES).to_string(),
            description: truncate_to_boundary(description, MAX_DESCRIPTION_BYTES).to_string(),
            image_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_id(&self) -> u32 {
        self.image_id
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_to_boundary(name, MAX_NAME_BYTES).to_string();
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = truncate_to_boundary(description, MAX_DESCRIPTION_BYTES).to_string();
    }

    pub fn set_image_id(&mut self, image_id: u32) {
        self.image_id = image_id;
    }

    /// Sérialise l'en-tête dans le corps d'un fichier de playlist.
    pub(crate) fn to_xml(&self, out: &mut String) {
        out.push_str("  <Name>");
        out.push_str(&self.name);
        out.push_str("</Name>\n");
        out.push_str("  <Description>");
        out.push_str(&self.description);
        out.push_str("</Description>\n");
        out.push_str("  <ImageId>");
        out.push_str(&self.image_id.to_string());
        out.push_str("</ImageId>\n");
    }

    /// Analyse la forme réciproque de [`Self::to_xml`].
    ///
    /// Analyse tolérante : dès qu'une balise attendue manque, les champs
    /// restants gardent leurs valeurs par défaut.
    pub(crate) fn from_scanner(scanner: &mut TagScanner<'_>) -> Self {
        let mut header = Self::new("", "", 0);

        if scanner.next_tag() == Some("Name") {
            header.set_name(scanner.read_text());
            scanner.next_tag(); // </Name>
            if scanner.next_tag() == Some("Description") {
                header.set_description(scanner.read_text());
                scanner.next_tag(); // </Description>
                if scanner.next_tag() == Some("ImageId") {
                    if let Ok(image_id) = scanner.read_text().trim().parse() {
                        header.set_image_id(image_id);
                    }
                    scanner.next_tag(); // </ImageId>
                }
            }
        }

        header
    }
}
