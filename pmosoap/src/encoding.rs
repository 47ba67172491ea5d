//! Content-Type et jeu de caractères des réponses SOAP

use crate::error::SoapError;
use encoding_rs::Encoding;

/// Media type accepté pour le corps d'une réponse SOAP
pub const XML_MEDIA_TYPE: &str = "text/xml";

/// Jeu de caractères supposé quand la réponse n'en annonce pas
pub const DEFAULT_CHARSET: &str = "utf-8";

const CHARSET_PARAM: &str = "charset=";
const QUOTE_CHARS: [char; 2] = ['"', '\''];

/// En-tête `Content-Type` découpé
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub media_type: String,
    pub charset: String,
}

impl ContentType {
    /// Comparaison avec `text/xml`, sans tenir compte de la casse
    pub fn is_xml(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(XML_MEDIA_TYPE)
    }
}

/// Sépare un `Content-Type` en media type et jeu de caractères.
///
/// Le media type est tout ce qui précède le premier `;`. Les paramètres sont
/// parcourus à la recherche de `charset=` (comparaison sensible à la casse) ;
/// le dernier l'emporte. Un en-tête absent ou vide donne un media type vide
/// et UTF-8.
pub fn resolve(content_type: Option<&str>) -> ContentType {
    let header = content_type.unwrap_or("");

    let mut parts = header.split(';');
    let media_type = parts.next().unwrap_or("").trim().to_string();

    let mut charset = DEFAULT_CHARSET.to_string();
    for param in parts {
        if let Some(value) = param.trim().strip_prefix(CHARSET_PARAM) {
            charset = value
                .trim_start_matches(QUOTE_CHARS)
                .trim_end_matches(QUOTE_CHARS)
                .to_string();
        }
    }

    ContentType {
        media_type,
        charset,
    }
}

/// Décode le corps d'une réponse selon `charset`.
///
/// Tout label connu d'encoding_rs est accepté (`windows-1252`, `utf-16`,
/// `iso-8859-1`...). Un BOM en tête du corps l'emporte sur le label. Un
/// label inconnu ou une séquence invalide fait échouer l'appel.
pub fn decode(body: &[u8], charset: &str) -> Result<String, SoapError> {
    let encoding = Encoding::for_label(charset.trim().as_bytes()).ok_or_else(|| {
        SoapError::serialization(format!("unsupported response charset '{}'", charset))
    })?;

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(SoapError::serialization(format!(
            "response body is not valid {}",
            used.name()
        )));
    }
    Ok(text.into_owned())
}
