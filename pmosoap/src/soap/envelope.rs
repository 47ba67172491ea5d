//! Structures de l'enveloppe SOAP

use super::fault::{SoapFault, envelope_element};
use crate::error::Result;
use crate::version::{ENVELOPE_PREFIX, SoapVersion, XSD_NS, XSI_NS};
use xmltree::{Element, EmitterConfig, Namespace, XMLNode};

/// Enveloppe SOAP complète
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    pub version: SoapVersion,

    /// Blocs d'en-tête ; `None` si l'enveloppe n'a pas de `Header`
    pub header: Option<Vec<Element>>,

    /// Corps SOAP : contenu applicatif ou fault
    pub body: SoapBody,

    /// Ajoute `soap:encodingStyle` sur le `Body` (liaison Encoded)
    pub encoding_style: bool,
}

/// Corps SOAP
#[derive(Debug, Clone)]
pub enum SoapBody {
    /// Éléments enfants de `Body`, dans l'ordre du document
    Content(Vec<Element>),
    Fault(SoapFault),
}

impl SoapBody {
    pub fn is_fault(&self) -> bool {
        matches!(self, SoapBody::Fault(_))
    }
}

impl SoapEnvelope {
    /// Crée une nouvelle enveloppe SOAP sans en-tête
    pub fn new(version: SoapVersion, body: SoapBody) -> Self {
        Self {
            version,
            header: None,
            body,
            encoding_style: false,
        }
    }

    /// Ajoute des blocs d'en-tête
    pub fn with_header(mut self, header: Vec<Element>) -> Self {
        self.header = Some(header);
        self
    }

    /// Construit l'arbre XML `soap:Envelope`.
    pub fn to_element(&self) -> Element {
        let version = self.version;

        let mut namespaces = Namespace::empty();
        namespaces.put(ENVELOPE_PREFIX, version.envelope_namespace());
        namespaces.put("xsi", XSI_NS);
        namespaces.put("xsd", XSD_NS);

        let mut envelope = envelope_element("Envelope", version);
        envelope.namespaces = Some(namespaces);

        if let Some(blocks) = &self.header {
            let mut header = envelope_element("Header", version);
            header
                .children
                .extend(blocks.iter().cloned().map(XMLNode::Element));
            envelope.children.push(XMLNode::Element(header));
        }

        let mut body = envelope_element("Body", version);
        if self.encoding_style {
            body.attributes.insert(
                format!("{}:encodingStyle", ENVELOPE_PREFIX),
                version.encoding_namespace().to_string(),
            );
            let mut namespaces = Namespace::empty();
            namespaces.put("soapenc", version.encoding_namespace());
            body.namespaces = Some(namespaces);
        }
        match &self.body {
            SoapBody::Content(elements) => body
                .children
                .extend(elements.iter().cloned().map(XMLNode::Element)),
            SoapBody::Fault(fault) => body
                .children
                .push(XMLNode::Element(fault.to_element(version))),
        }
        envelope.children.push(XMLNode::Element(body));

        envelope
    }

    /// Sérialise l'enveloppe en UTF-8, déclaration XML comprise.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(true)
            .perform_indent(false);
        self.to_element().write_with_config(&mut buf, config)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SOAP12_ENVELOPE_NS;

    #[test]
    fn test_to_xml_declares_namespaces() {
        let mut payload = Element::new("Ping");
        payload.namespace = Some("urn:test".to_string());
        let mut ns = Namespace::empty();
        ns.put("", "urn:test");
        payload.namespaces = Some(ns);

        let envelope = SoapEnvelope::new(SoapVersion::Soap12, SoapBody::Content(vec![payload]));
        let xml = String::from_utf8(envelope.to_xml().unwrap()).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(&format!("xmlns:soap=\"{}\"", SOAP12_ENVELOPE_NS)));
        assert!(xml.contains("xmlns:xsi="));
        assert!(xml.contains("<soap:Body>"));
        assert!(!xml.contains("Header"));
        assert!(!xml.contains("encodingStyle"));
    }

    #[test]
    fn test_encoding_style_on_body() {
        let mut envelope = SoapEnvelope::new(SoapVersion::Soap11, SoapBody::Content(Vec::new()))
            .with_header(Vec::new());
        envelope.encoding_style = true;
        let xml = String::from_utf8(envelope.to_xml().unwrap()).unwrap();

        assert!(xml.contains("Header"));
        assert!(xml.contains(
            "soap:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\""
        ));
    }
}
