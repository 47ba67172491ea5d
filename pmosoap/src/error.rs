//! Erreurs du client SOAP
//!
//! Chaque appel se termine soit par un résultat complet, soit par exactement
//! une [`SoapError`]. [`SoapError::kind`] ramène chaque variante à l'une des
//! quatre issues qu'un appelant doit traiter.

use crate::qname::QualifiedName;
use crate::soap::SoapFault;
use thiserror::Error;

/// Type Result personnalisé pour pmosoap
pub type Result<T> = std::result::Result<T, SoapError>;

/// Erreurs levées par la couche transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// Statut HTTP hors de 200/202/500
    #[error("The request failed with HTTP status {code}: {reason}")]
    Status { code: u16, reason: String },

    /// Échec de connexion, DNS, TLS ou timeout
    #[error("Connection error: {0}")]
    Connection(String),

    /// Erreur d'E/S à la lecture du corps de réponse
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Proxy mal formé dans la configuration
    #[error("Invalid proxy '{0}'")]
    InvalidProxy(String),
}

impl TransportError {
    pub fn from_status(code: u16) -> Self {
        let reason = ureq::http::StatusCode::from_u16(code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();
        TransportError::Status { code, reason }
    }

    /// Code HTTP porté par l'erreur, s'il y en a un
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Erreurs possibles lors d'un appel SOAP
#[derive(Error, Debug)]
pub enum SoapError {
    /// Aucune méthode de ce nom dans le contrat
    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Media type de la réponse différent de text/xml
    #[error("Not supported Content-Type in the response: '{0}'")]
    UnsupportedContentType(String),

    /// Namespace d'enveloppe ne correspondant pas à la version de l'appel
    #[error("SOAP version mismatch. Namespace '{namespace}' is not supported ({code})")]
    VersionMismatch {
        namespace: String,
        code: QualifiedName,
    },

    /// Le serveur a répondu par un SOAP Fault
    #[error("SOAP fault {}: {}", .0.code, .0.reason)]
    Fault(SoapFault),

    /// XML invalide ou non conforme au contrat
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("XML write error: {0}")]
    XmlWrite(#[from] xmltree::Error),

    /// Une extension a interrompu l'appel
    #[error("Extension {extension} failed: {message}")]
    Extension { extension: String, message: String },
}

/// Issue d'un appel en échec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Méthode inconnue, non récupérable
    Lookup,
    /// Statut HTTP inattendu ou erreur de connexion
    Transport,
    /// Réponse SOAP reçue mais refusée : fault, version, content-type
    Protocol,
    /// Erreur de (dé)sérialisation ou d'extension
    Fatal,
}

impl SoapError {
    pub fn serialization(message: impl Into<String>) -> Self {
        SoapError::Serialization(message.into())
    }

    pub fn extension(extension: impl Into<String>, message: impl Into<String>) -> Self {
        SoapError::Extension {
            extension: extension.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SoapError::UnknownMethod(_) => ErrorKind::Lookup,
            SoapError::Transport(_) => ErrorKind::Transport,
            SoapError::UnsupportedContentType(_)
            | SoapError::VersionMismatch { .. }
            | SoapError::Fault(_) => ErrorKind::Protocol,
            SoapError::Serialization(_)
            | SoapError::Xml(_)
            | SoapError::XmlWrite(_)
            | SoapError::Extension { .. } => ErrorKind::Fatal,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, SoapError::Fault(_))
    }

    /// Le fault SOAP reçu, si l'appel s'est terminé ainsi
    pub fn fault(&self) -> Option<&SoapFault> {
        match self {
            SoapError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<SoapFault> for SoapError {
    fn from(fault: SoapFault) -> Self {
        SoapError::Fault(fault)
    }
}
