//! Constantes dépendant de la version du protocole SOAP

use crate::qname::QualifiedName;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SOAP11_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const SOAP11_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const SOAP12_ENCODING_NS: &str = "http://www.w3.org/2003/05/soap-encoding";

pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Préfixe utilisé pour les éléments de l'enveloppe à l'écriture
pub const ENVELOPE_PREFIX: &str = "soap";

/// Version du protocole SOAP d'un appel.
///
/// Fixée à la construction du [`CallMessage`](crate::CallMessage), elle
/// gouverne tous les choix de namespace de l'appel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SoapVersion {
    #[default]
    #[serde(rename = "1.1")]
    Soap11,
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    pub fn envelope_namespace(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_ENVELOPE_NS,
            SoapVersion::Soap12 => SOAP12_ENVELOPE_NS,
        }
    }

    pub fn encoding_namespace(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_ENCODING_NS,
            SoapVersion::Soap12 => SOAP12_ENCODING_NS,
        }
    }

    pub fn is_soap12(self) -> bool {
        self == SoapVersion::Soap12
    }

    /// Version correspondant à un namespace d'enveloppe, s'il est connu.
    pub fn from_envelope_namespace(ns: &str) -> Option<Self> {
        match ns {
            SOAP11_ENVELOPE_NS => Some(SoapVersion::Soap11),
            SOAP12_ENVELOPE_NS => Some(SoapVersion::Soap12),
            _ => None,
        }
    }

    /// Code de fault `VersionMismatch` dans le namespace de cette version
    pub fn version_mismatch_code(self) -> QualifiedName {
        QualifiedName::new(self.envelope_namespace(), "VersionMismatch")
    }

    /// Code de fault `MustUnderstand`
    pub fn must_understand_code(self) -> QualifiedName {
        QualifiedName::new(self.envelope_namespace(), "MustUnderstand")
    }

    /// Code de fault côté client (`Client` en 1.1, `Sender` en 1.2)
    pub fn client_code(self) -> QualifiedName {
        match self {
            SoapVersion::Soap11 => QualifiedName::new(SOAP11_ENVELOPE_NS, "Client"),
            SoapVersion::Soap12 => QualifiedName::new(SOAP12_ENVELOPE_NS, "Sender"),
        }
    }

    /// Code de fault côté serveur (`Server` en 1.1, `Receiver` en 1.2)
    pub fn server_code(self) -> QualifiedName {
        match self {
            SoapVersion::Soap11 => QualifiedName::new(SOAP11_ENVELOPE_NS, "Server"),
            SoapVersion::Soap12 => QualifiedName::new(SOAP12_ENVELOPE_NS, "Receiver"),
        }
    }

    /// Valeur de l'attribut `mustUnderstand` pour cette version
    pub fn must_understand_value(self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "1",
            SoapVersion::Soap12 => "true",
        }
    }

    /// Content-Type de la requête HTTP.
    ///
    /// En SOAP 1.2 l'action voyage dans le paramètre `action` du media type,
    /// en SOAP 1.1 elle passe par l'en-tête `SOAPAction`.
    pub fn request_content_type(self, action: &str) -> String {
        match self {
            SoapVersion::Soap11 => "text/xml; charset=utf-8".to_string(),
            SoapVersion::Soap12 if action.is_empty() => {
                "application/soap+xml; charset=utf-8".to_string()
            }
            SoapVersion::Soap12 => {
                format!("application/soap+xml; charset=utf-8; action=\"{}\"", action)
            }
        }
    }
}

impl fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoapVersion::Soap11 => write!(f, "SOAP 1.1"),
            SoapVersion::Soap12 => write!(f, "SOAP 1.2"),
        }
    }
}

impl FromStr for SoapVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.1" => Ok(SoapVersion::Soap11),
            "1.2" => Ok(SoapVersion::Soap12),
            other => Err(format!("unknown SOAP version '{}'", other)),
        }
    }
}

/// Accepte `"1.2"` comme `1.2` : une valeur YAML ou une variable
/// d'environnement non quotée se lit comme un flottant.
impl<'de> Deserialize<'de> for SoapVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(f64),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text,
            Repr::Number(n) => format!("{:.1}", n),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces() {
        assert_eq!(
            SoapVersion::Soap11.envelope_namespace(),
            "http://schemas.xmlsoap.org/soap/envelope/"
        );
        assert_eq!(
            SoapVersion::Soap12.encoding_namespace(),
            "http://www.w3.org/2003/05/soap-encoding"
        );
        assert_eq!(
            SoapVersion::from_envelope_namespace(SOAP12_ENVELOPE_NS),
            Some(SoapVersion::Soap12)
        );
        assert_eq!(SoapVersion::from_envelope_namespace("urn:other"), None);
    }

    #[test]
    fn test_version_mismatch_code_follows_version() {
        let code = SoapVersion::Soap12.version_mismatch_code();
        assert_eq!(code.name, "VersionMismatch");
        assert_eq!(code.namespace(), Some(SOAP12_ENVELOPE_NS));
    }

    #[test]
    fn test_request_content_type() {
        assert_eq!(
            SoapVersion::Soap11.request_content_type("urn:x/Add"),
            "text/xml; charset=utf-8"
        );
        assert_eq!(
            SoapVersion::Soap12.request_content_type("urn:x/Add"),
            "application/soap+xml; charset=utf-8; action=\"urn:x/Add\""
        );
    }

    #[test]
    fn test_version_from_text_and_number() {
        assert_eq!("1.2".parse(), Ok(SoapVersion::Soap12));
        assert!("2.0".parse::<SoapVersion>().is_err());

        let quoted: SoapVersion = serde_yaml::from_str("\"1.1\"").unwrap();
        assert_eq!(quoted, SoapVersion::Soap11);
        let bare: SoapVersion = serde_yaml::from_str("1.2").unwrap();
        assert_eq!(bare, SoapVersion::Soap12);
        assert!(serde_yaml::from_str::<SoapVersion>("1.3").is_err());
    }
}
