//! État d'un appel en cours, partagé avec les extensions

use crate::descriptor::{HeaderValues, MethodDescriptor};
use crate::soap::SoapFault;
use crate::value::Value;
use crate::version::SoapVersion;
use std::sync::Arc;

/// Étape de traitement d'un [`CallMessage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStage {
    /// Créé, rien n'est encore sérialisé
    Created,
    BeforeSerialize,
    AfterSerialize,
    BeforeDeserialize,
    AfterDeserialize,
}

/// Une invocation, des arguments jusqu'aux résultats.
///
/// Les extensions reçoivent `&mut CallMessage` mais ne touchent qu'aux
/// en-têtes, au flux d'octets actif et aux métadonnées de la réponse. La
/// méthode, l'endpoint et la version n'ont pas de setter.
#[derive(Debug)]
pub struct CallMessage {
    method: Arc<MethodDescriptor>,
    url: String,
    version: SoapVersion,
    stage: MessageStage,
    parameters: Vec<Value>,
    headers: HeaderValues,
    response_headers: HeaderValues,
    out_parameters: Option<Vec<Value>>,
    fault: Option<SoapFault>,
    content_type: Option<String>,
    content_encoding: Option<String>,
    stream: Vec<u8>,
}

impl CallMessage {
    pub fn new(
        method: Arc<MethodDescriptor>,
        url: impl Into<String>,
        version: SoapVersion,
        parameters: Vec<Value>,
        headers: HeaderValues,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            version,
            stage: MessageStage::Created,
            parameters,
            headers,
            response_headers: HeaderValues::new(),
            out_parameters: None,
            fault: None,
            content_type: None,
            content_encoding: None,
            stream: Vec::new(),
        }
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn is_soap12(&self) -> bool {
        self.version.is_soap12()
    }

    pub fn action(&self) -> &str {
        &self.method.action
    }

    pub fn one_way(&self) -> bool {
        self.method.one_way
    }

    pub fn stage(&self) -> MessageStage {
        self.stage
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// En-têtes envoyés avec la requête
    pub fn headers(&self) -> &HeaderValues {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderValues {
        &mut self.headers
    }

    /// En-têtes lus dans la réponse
    pub fn response_headers(&self) -> &HeaderValues {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderValues {
        &mut self.response_headers
    }

    pub fn out_parameters(&self) -> Option<&[Value]> {
        self.out_parameters.as_deref()
    }

    pub fn fault(&self) -> Option<&SoapFault> {
        self.fault.as_ref()
    }

    /// Media type de la réponse, une fois résolu
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Jeu de caractères de la réponse, une fois résolu
    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }

    /// Octets du flux actif : la requête sérialisée après
    /// `AfterSerialize`, le corps de la réponse dès `BeforeDeserialize`.
    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut Vec<u8> {
        &mut self.stream
    }

    pub(crate) fn set_stage(&mut self, stage: MessageStage) {
        self.stage = stage;
    }

    pub(crate) fn set_stream(&mut self, stream: Vec<u8>) {
        self.stream = stream;
    }

    pub(crate) fn take_stream(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.stream)
    }

    pub(crate) fn set_content(&mut self, content_type: String, content_encoding: String) {
        self.content_type = Some(content_type);
        self.content_encoding = Some(content_encoding);
    }

    pub(crate) fn set_out_parameters(&mut self, values: Vec<Value>) {
        self.out_parameters = Some(values);
    }

    pub(crate) fn set_fault(&mut self, fault: SoapFault) {
        self.fault = Some(fault);
    }

    pub(crate) fn set_response_headers(&mut self, headers: HeaderValues) {
        self.response_headers = headers;
    }

    pub(crate) fn take_fault(&mut self) -> Option<SoapFault> {
        self.fault.take()
    }

    pub(crate) fn take_out_parameters(&mut self) -> Vec<Value> {
        self.out_parameters.take().unwrap_or_default()
    }

    pub(crate) fn take_response_headers(&mut self) -> HeaderValues {
        std::mem::take(&mut self.response_headers)
    }
}
