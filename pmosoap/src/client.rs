//! Moteur d'invocation.
//!
//! [`SoapClient::invoke`] conduit un appel de bout en bout : recherche du
//! descripteur, écriture de l'enveloppe, étapes des extensions, échange
//! HTTP, contrôle du statut et du Content-Type, puis lecture de la réponse.

use crate::config::ClientConfig;
use crate::descriptor::{HeaderValues, MethodLookup, ServiceContract};
use crate::encoding;
use crate::error::{Result, SoapError, TransportError};
use crate::extension::ExtensionChain;
use crate::message::{CallMessage, MessageStage};
use crate::soap::{self, ResponseBody};
use crate::transport::{HttpTransport, Transport, TransportRequest};
use crate::value::Value;
use crate::version::SoapVersion;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Résultat d'un appel réussi
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallResult {
    /// Valeurs de sortie, dans l'ordre des résultats déclarés
    pub values: Vec<Value>,
    /// En-têtes lus dans la réponse (liaisons `Out`/`InOut`)
    pub headers: HeaderValues,
}

impl CallResult {
    /// Première valeur de sortie, la valeur de retour habituelle
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Client SOAP synchrone lié à un service.
///
/// Le client ne garde qu'un état partagé en lecture seule ; chaque appel
/// possède son [`CallMessage`] et sa chaîne d'extensions. Un même client
/// sert donc plusieurs appelants concurrents.
#[derive(Clone)]
pub struct SoapClient {
    lookup: Arc<dyn MethodLookup>,
    transport: Arc<dyn Transport>,
    url: String,
    version: SoapVersion,
}

impl std::fmt::Debug for SoapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapClient")
            .field("url", &self.url)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl SoapClient {
    /// Client de `contract`, sur son endpoint et sa version SOAP.
    pub fn new(contract: Arc<ServiceContract>, transport: Arc<dyn Transport>) -> Self {
        let url = contract.url.clone();
        let version = contract.version;
        Self {
            lookup: contract,
            transport,
            url,
            version,
        }
    }

    /// Client sur un registre de méthodes quelconque
    pub fn with_lookup(
        lookup: Arc<dyn MethodLookup>,
        transport: Arc<dyn Transport>,
        url: impl Into<String>,
        version: SoapVersion,
    ) -> Self {
        Self {
            lookup,
            transport,
            url: url.into(),
            version,
        }
    }

    /// Client sur un [`HttpTransport`] construit depuis `config`.
    pub fn from_config(contract: Arc<ServiceContract>, config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        let mut client = Self::new(contract, Arc::new(transport));
        if let Some(version) = config.version {
            client.version = version;
        }
        Ok(client)
    }

    /// Remplace l'endpoint du contrat
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Remplace la version SOAP du contrat
    pub fn with_version(mut self, version: SoapVersion) -> Self {
        self.version = version;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    /// Appelle `method` avec `arguments`, sans valeur d'en-tête.
    pub fn invoke(&self, method: &str, arguments: Vec<Value>) -> Result<CallResult> {
        self.invoke_with_headers(method, arguments, HeaderValues::new())
    }

    /// Appelle `method` avec `arguments` ; `headers` fournit les valeurs
    /// des liaisons d'en-tête `In`/`InOut`.
    ///
    /// Un fault SOAP est renvoyé en [`SoapError::Fault`], une fois les
    /// en-têtes de la réponse lus et les extensions notifiées.
    pub fn invoke_with_headers(
        &self,
        method: &str,
        arguments: Vec<Value>,
        headers: HeaderValues,
    ) -> Result<CallResult> {
        let descriptor = self
            .lookup
            .lookup(method)
            .ok_or_else(|| SoapError::UnknownMethod(method.to_string()))?;

        info!(
            method,
            endpoint = %self.url,
            version = %self.version,
            "Invoking SOAP method"
        );

        let mut chain = ExtensionChain::build(
            self.lookup.high_priority_extensions(),
            &descriptor,
            self.lookup.low_priority_extensions(),
        );
        let mut message = CallMessage::new(descriptor, &self.url, self.version, arguments, headers);

        let body = Self::serialize(&mut chain, &mut message)?;
        let request = TransportRequest::new(
            message.url(),
            message.version(),
            message.action(),
            body,
        );

        let mut response = self.transport.send(&request)?;
        let status = response.status;
        debug!(method, status, "SOAP transport response");

        if !matches!(status, 200 | 202 | 500) {
            warn!(method, status, "Unexpected HTTP status for SOAP call");
            return Err(TransportError::from_status(status).into());
        }

        let mut raw = Vec::new();
        response
            .body
            .read_to_end(&mut raw)
            .map_err(TransportError::Io)?;

        if message.one_way() && matches!(status, 200 | 202) && raw.is_empty() {
            debug!(method, status, "One-way call acknowledged");
            return Ok(CallResult::default());
        }

        let content = encoding::resolve(response.content_type.as_deref());
        if !content.is_xml() {
            return Err(SoapError::UnsupportedContentType(
                response.content_type.unwrap_or_default(),
            ));
        }
        message.set_content(content.media_type, content.charset);

        Self::deserialize(&mut chain, &mut message, raw)?;

        if let Some(fault) = message.take_fault() {
            warn!(method, code = %fault.code, reason = %fault.reason, "SOAP fault");
            return Err(SoapError::Fault(fault));
        }

        Ok(CallResult {
            values: message.take_out_parameters(),
            headers: message.take_response_headers(),
        })
    }

    fn serialize(chain: &mut ExtensionChain, message: &mut CallMessage) -> Result<Vec<u8>> {
        message.set_stage(MessageStage::BeforeSerialize);
        chain.process(message)?;

        let xml = soap::write_request(message)?;
        message.set_stream(xml);

        message.set_stage(MessageStage::AfterSerialize);
        chain.process(message)?;

        chain.chain_request(message.take_stream())
    }

    fn deserialize(
        chain: &mut ExtensionChain,
        message: &mut CallMessage,
        raw: Vec<u8>,
    ) -> Result<()> {
        let raw = chain.chain_response(raw)?;
        message.set_stream(raw);

        message.set_stage(MessageStage::BeforeDeserialize);
        chain.process(message)?;

        let charset = message.content_encoding().unwrap_or(encoding::DEFAULT_CHARSET);
        let text = encoding::decode(message.stream(), charset)?;
        let response = soap::read_response(&text, message.method(), message.version())?;

        message.set_response_headers(response.headers);
        match response.body {
            ResponseBody::Fault(fault) => message.set_fault(fault),
            ResponseBody::Values(values) => message.set_out_parameters(values),
        }

        message.set_stage(MessageStage::AfterDeserialize);
        chain.process(message)
    }
}
