//! Écriture de l'enveloppe d'une requête

use super::envelope::{SoapBody, SoapEnvelope};
use crate::descriptor::{BindingUse, HeaderDirection};
use crate::error::Result;
use crate::message::CallMessage;
use tracing::debug;
use xmltree::{Element, XMLNode};

/// Sérialise la requête décrite par `message`.
///
/// Le `Header` n'est émis que si au moins un en-tête `In` a une valeur ; un
/// en-tête requis sans valeur fait échouer l'appel avant tout envoi.
pub fn write_request(message: &CallMessage) -> Result<Vec<u8>> {
    let method = message.method();
    let version = message.version();

    let bound = method.header_values(HeaderDirection::In, message.headers())?;
    let header = if bound.is_empty() {
        None
    } else {
        let mut header = Element::new("Header");
        method
            .header_serializer(HeaderDirection::In)
            .serialize(&mut header, &bound, version)?;
        Some(into_elements(header))
    };

    let mut body = Element::new("Body");
    method
        .body_serializer(HeaderDirection::In, version)
        .serialize(&mut body, message.parameters())?;

    let envelope = SoapEnvelope {
        version,
        header,
        body: SoapBody::Content(into_elements(body)),
        encoding_style: method.binding_use == BindingUse::Encoded,
    };

    let xml = envelope.to_xml()?;
    debug!(
        method = %method.name,
        %version,
        bytes = xml.len(),
        "SOAP request serialized"
    );
    Ok(xml)
}

fn into_elements(parent: Element) -> Vec<Element> {
    parent
        .children
        .into_iter()
        .filter_map(|node| match node {
            XMLNode::Element(e) => Some(e),
            _ => None,
        })
        .collect()
}
