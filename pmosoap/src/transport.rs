//! Transport HTTP de l'enveloppe sérialisée.
//!
//! Le moteur ne dépend que du trait [`Transport`] ; [`HttpTransport`] en est
//! l'implémentation sur un [`Agent`] ureq.

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::version::SoapVersion;
use std::io::{Cursor, Read};
use tracing::{debug, trace};
use ureq::Agent;
use ureq::config::AutoHeaderValue;

/// Un POST d'enveloppe sérialisée
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub endpoint: String,
    pub body: Vec<u8>,
    /// `Content-Type` complet, paramètre `action` de la 1.2 compris
    pub content_type: String,
    /// Valeur de `SOAPAction`, sans guillemets ; envoyée en SOAP 1.1 seulement
    pub soap_action: Option<String>,
}

impl TransportRequest {
    pub fn new(endpoint: &str, version: SoapVersion, action: &str, body: Vec<u8>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            body,
            content_type: version.request_content_type(action),
            soap_action: (!version.is_soap12()).then(|| action.to_string()),
        }
    }
}

/// Réponse HTTP brute, quel que soit son statut
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: Box::new(Cursor::new(body.into())),
        }
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Envoie une enveloppe et renvoie la réponse brute.
///
/// Une implémentation ne doit pas changer les statuts d'erreur HTTP en
/// erreurs : le moteur lit les réponses 500 pour en extraire le fault.
pub trait Transport: Send + Sync {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Transport HTTP(S) avec ureq
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let proxy = match &config.proxy {
            Some(url) => Some(
                ureq::Proxy::new(url).map_err(|e| TransportError::InvalidProxy(e.to_string()))?,
            ),
            None => None,
        };

        // 4xx/5xx ne doivent pas devenir des Error::StatusCode : un fault
        // SOAP arrive avec un statut 500
        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .user_agent(config.user_agent.as_str())
            .proxy(proxy);
        if !config.enable_decompression {
            builder = builder.accept_encoding(AutoHeaderValue::None);
        }

        let agent: Agent = builder.build().into();
        Ok(Self { agent })
    }

    /// Reprend un agent déjà configuré
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        debug!(
            endpoint = %request.endpoint,
            bytes = request.body.len(),
            "Sending SOAP request"
        );

        let mut builder = self
            .agent
            .post(&request.endpoint)
            .header("Content-Type", &request.content_type);
        if let Some(action) = &request.soap_action {
            builder = builder.header("SOAPAction", &format!("\"{}\"", action));
        }

        let mut response = builder.send(&request.body[..]).map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        // read_to_vec() seul plafonne à 10 MiB
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(map_ureq_error)?;

        trace!(
            status,
            content_type = content_type.as_deref().unwrap_or(""),
            bytes = body.len(),
            "SOAP response received"
        );

        Ok(TransportResponse {
            status,
            content_type,
            body: Box::new(Cursor::new(body)),
        })
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Io(e) => TransportError::Io(e),
        ureq::Error::StatusCode(code) => TransportError::from_status(code),
        ureq::Error::InvalidProxyUrl | ureq::Error::ConnectProxyFailed(_) => {
            TransportError::InvalidProxy(err.to_string())
        }
        other => TransportError::Connection(other.to_string()),
    }
}
