//! Émission DIDL-Lite et échappement XML
//!
//! Les points de contrôle OpenHome comparent ces charges utiles à l'octet
//! près : les enveloppes sont assemblées à la main plutôt que via un
//! sérialiseur, et seul l'échappement passe par `quick_xml`.

use std::borrow::Cow;
use std::net::IpAddr;

use quick_xml::escape::{escape, unescape};

use crate::error::{Error, Result};
use crate::ids::PlaylistId;

/// Ouverture de l'enveloppe DIDL-Lite canonique.
pub const DIDL_LITE_OPEN: &str = "<DIDL-Lite xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:upnp=\"urn:schemas-upnp-org:metadata-1-0/upnp/\" xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\">";

/// Fermeture de l'enveloppe DIDL-Lite.
pub const DIDL_LITE_CLOSE: &str = "</DIDL-Lite>";

/// Sentinelle substituée aux métadonnées dépassant la taille maximale.
pub const METADATA_TOO_LARGE: &str = "<DIDL-Lite xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:upnp=\"urn:schemas-upnp-org:metadata-1-0/upnp/\" xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\"><item id=\"\" parentID=\"\" restricted=\"True\"><dc:title>Metadata too large</dc:title><upnp:class>object.item</upnp:class></item></DIDL-Lite>";

/// Remplace `& < > " '` par leurs références d'entités canoniques.
pub fn xml_escape(raw: &str) -> Cow<'_, str> {
    escape(raw)
}

/// Résout les entités XML. Une entité malformée est une erreur d'analyse.
pub fn xml_unescape(raw: &str) -> Result<Cow<'_, str>> {
    unescape(raw).map_err(|e| Error::Parse(e.to_string()))
}

/// Propriété `Metadata` du catalogue : l'item container qui décrit l'appareil
/// auprès des abonnés (nom échappé, icône servie par l'adaptateur).
pub fn device_metadata(name: &str, adapter: IpAddr) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(DIDL_LITE_OPEN);
    out.push_str("<item id=\"\" parentID=\"\" restricted=\"True\"><dc:title>");
    out.push_str(&xml_escape(name));
    out.push_str("</dc:title><upnp:albumArtURI>http://");
    out.push_str(&adapter.to_string());
    out.push_str("/images/Icon.png</upnp:albumArtURI><upnp:class>object.container</upnp:class></item>");
    out.push_str(DIDL_LITE_CLOSE);
    out
}

/// Ajoute le `<container>` d'une playlist à une réponse `PlaylistReadList`.
///
/// L'attribut `id` est émis sans guillemets et le titre est porté tel quel,
/// au format historique qu'attendent les clients.
pub fn write_playlist_container(out: &mut String, id: PlaylistId, name: &str, image_id: u32) {
    out.push_str("<container id=");
    out.push_str(&id.to_string());
    out.push_str(" restricted=\"True\">");
    out.push_str("<dc:title>");
    out.push_str(name);
    out.push_str("</dc:title>");
    out.push_str("<upnp:albumArtURI>image:");
    out.push_str(&image_id.to_string());
    out.push_str("</upnp:albumArtURI>");
    out.push_str("</container>");
}

/// Ajoute une `<Entry>` de morceau à une réponse `ReadList`.
///
/// L'UDN est porté verbatim, les métadonnées (du XML imbriqué) sont
/// échappées.
pub fn write_track_entry(out: &mut String, id: crate::ids::TrackId, udn: &str, metadata: &str) {
    out.push_str("<Entry><Id>");
    out.push_str(&id.to_string());
    out.push_str("</Id><Udn>");
    out.push_str(udn);
    out.push_str("</Udn><Metadata>");
    out.push_str(&xml_escape(metadata));
    out.push_str("</Metadata></Entry>");
}
