//! Lecture de l'enveloppe d'une réponse

use super::envelope::{SoapBody, SoapEnvelope};
use super::fault::SoapFault;
use crate::descriptor::{HeaderDirection, HeaderValues, MethodDescriptor};
use crate::error::{Result, SoapError};
use crate::serializer::{HeaderSerializer, child_elements};
use crate::value::Value;
use crate::version::SoapVersion;
use tracing::{debug, warn};
use xmltree::{Element, ParserConfig};

/// Réponse décodée selon le descripteur de la méthode
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    /// En-têtes liés lus dans le `Header`
    pub headers: HeaderValues,
    pub body: ResponseBody,
}

#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// Valeurs de sortie, dans l'ordre des résultats déclarés
    Values(Vec<Value>),
    Fault(SoapFault),
}

/// Retire la déclaration XML : le texte est déjà décodé, l'encodage
/// annoncé ne doit plus être interprété.
fn strip_declaration(xml: &str) -> &str {
    let trimmed = xml.trim_start_matches('\u{feff}').trim_start();
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if rest.starts_with(char::is_whitespace) || rest.starts_with("?>") {
            if let Some(end) = rest.find("?>") {
                return &rest[end + 2..];
            }
        }
    }
    trimmed
}

/// Les nœuds texte blancs sont gardés : une chaîne `"   "` est une valeur
fn parser_config() -> ParserConfig {
    ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(true)
}

/// Analyse une enveloppe SOAP attendue dans la version `version`.
///
/// Le namespace de l'élément racine est vérifié avant toute lecture du
/// `Body` : un namespace différent est un `VersionMismatch`.
pub fn parse_envelope(xml: &str, version: SoapVersion) -> Result<SoapEnvelope> {
    let root = Element::parse_with_config(
        strip_declaration(xml).as_bytes(),
        parser_config(),
    )?;

    let env_ns = version.envelope_namespace();
    let namespace = root.namespace.as_deref().unwrap_or("");
    if namespace != env_ns {
        warn!(
            expected = env_ns,
            found = namespace,
            "SOAP envelope namespace mismatch"
        );
        return Err(SoapError::VersionMismatch {
            namespace: namespace.to_string(),
            code: version.version_mismatch_code(),
        });
    }

    if root.name != "Envelope" {
        return Err(SoapError::serialization(format!(
            "expected Envelope root element, found {}",
            root.name
        )));
    }

    let in_envelope = |e: &&Element, name: &str| e.name == name && e.namespace.as_deref() == Some(env_ns);

    let header = child_elements(&root)
        .find(|e| in_envelope(e, "Header"))
        .map(|h| child_elements(h).cloned().collect::<Vec<_>>());

    let body = child_elements(&root)
        .find(|e| in_envelope(e, "Body"))
        .ok_or_else(|| SoapError::serialization("SOAP envelope without Body"))?;

    let encoding_style = body.attributes.contains_key("encodingStyle");
    let content: Vec<&Element> = child_elements(body).collect();

    let body = match content.first() {
        Some(first) if in_envelope(first, "Fault") => {
            SoapBody::Fault(SoapFault::parse(first, version)?)
        }
        _ => SoapBody::Content(content.into_iter().cloned().collect()),
    };

    Ok(SoapEnvelope {
        version,
        header,
        body,
        encoding_style,
    })
}

/// Lit la réponse de `method` : en-têtes liés et valeurs de sortie, ou
/// fault.
///
/// Les en-têtes liés en `Fault` ne sont lus qu'accompagnés d'un fault.
pub fn read_response(
    xml: &str,
    method: &MethodDescriptor,
    version: SoapVersion,
) -> Result<ResponseMessage> {
    let envelope = parse_envelope(xml, version)?;

    let mut bindings = method
        .header_serializer(HeaderDirection::Out)
        .bindings()
        .to_vec();
    if envelope.body.is_fault() {
        bindings.extend_from_slice(method.header_serializer(HeaderDirection::Fault).bindings());
    }
    let serializer = HeaderSerializer::new(bindings);

    let mut headers = HeaderValues::new();
    if let Some(blocks) = &envelope.header {
        let mut header = Element::new("Header");
        header
            .children
            .extend(blocks.iter().cloned().map(xmltree::XMLNode::Element));
        headers = serializer.deserialize(&header)?;
    }

    let body = match envelope.body {
        SoapBody::Fault(fault) => {
            debug!(method = %method.name, code = %fault.code, "SOAP fault received");
            ResponseBody::Fault(fault)
        }
        SoapBody::Content(elements) => {
            let elements: Vec<&Element> = elements.iter().collect();
            let values = method
                .body_serializer(HeaderDirection::Out, version)
                .deserialize(&elements)?;
            ResponseBody::Values(values)
        }
    };

    Ok(ResponseMessage { headers, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::HeaderBinding;
    use crate::qname::QualifiedName;
    use crate::value::ValueKind;
    use crate::version::{SOAP11_ENVELOPE_NS, SOAP12_ENVELOPE_NS};

    const NS: &str = "http://tempuri.org/";

    fn add_method() -> MethodDescriptor {
        MethodDescriptor::builder(NS, "Add")
            .param("a", ValueKind::Int)
            .param("b", ValueKind::Int)
            .result("AddResult", ValueKind::Int)
            .header(HeaderBinding::new(
                "session",
                QualifiedName::new(NS, "Session"),
                ValueKind::String,
                HeaderDirection::Out,
            ))
            .build()
    }

    #[test]
    fn test_strip_declaration() {
        assert_eq!(
            strip_declaration("<?xml version=\"1.0\" encoding=\"iso-8859-1\"?>\n<a/>"),
            "\n<a/>"
        );
        assert_eq!(strip_declaration("\u{feff}<a/>"), "<a/>");
        assert_eq!(
            strip_declaration("<?xml-stylesheet href=\"x\"?><a/>"),
            "<?xml-stylesheet href=\"x\"?><a/>"
        );
    }

    #[test]
    fn test_read_values_and_headers() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
        <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
          <soap:Header>
            <Session xmlns="http://tempuri.org/">abc</Session>
            <Other xmlns="urn:other">ignored</Other>
          </soap:Header>
          <soap:Body>
            <AddResponse xmlns="http://tempuri.org/"><AddResult>5</AddResult></AddResponse>
          </soap:Body>
        </soap:Envelope>"#;

        let response = read_response(xml, &add_method(), SoapVersion::Soap11).unwrap();
        assert_eq!(response.headers.get("session"), Some(&Value::from("abc")));
        assert_eq!(response.headers.len(), 1);
        match response.body {
            ResponseBody::Values(values) => assert_eq!(values, vec![Value::Int(5)]),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_fault_is_detected_before_results() {
        let xml = format!(
            r#"<s:Envelope xmlns:s="{}"><s:Body><s:Fault>
               <faultcode>s:Server</faultcode><faultstring>boom</faultstring>
               </s:Fault></s:Body></s:Envelope>"#,
            SOAP11_ENVELOPE_NS
        );
        let response = read_response(&xml, &add_method(), SoapVersion::Soap11).unwrap();
        match response.body {
            ResponseBody::Fault(fault) => {
                assert_eq!(fault.code, SoapVersion::Soap11.server_code());
                assert_eq!(fault.reason, "boom");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_version_mismatch_uses_expected_version_code() {
        let xml = format!(
            r#"<env:Envelope xmlns:env="{}"><env:Body/></env:Envelope>"#,
            SOAP12_ENVELOPE_NS
        );
        let err = parse_envelope(&xml, SoapVersion::Soap11).unwrap_err();
        match err {
            SoapError::VersionMismatch { namespace, code } => {
                assert_eq!(namespace, SOAP12_ENVELOPE_NS);
                assert_eq!(code, SoapVersion::Soap11.version_mismatch_code());
            }
            other => panic!("unexpected error {:?}", other),
        }

        let xml = format!(
            r#"<s:Envelope xmlns:s="{}"><s:Body/></s:Envelope>"#,
            SOAP11_ENVELOPE_NS
        );
        let err = parse_envelope(&xml, SoapVersion::Soap12).unwrap_err();
        assert!(matches!(
            err,
            SoapError::VersionMismatch { ref code, .. } if *code == SoapVersion::Soap12.version_mismatch_code()
        ));
    }

    #[test]
    fn test_missing_body_and_malformed_xml() {
        let xml = format!(r#"<s:Envelope xmlns:s="{}"/>"#, SOAP11_ENVELOPE_NS);
        assert!(matches!(
            parse_envelope(&xml, SoapVersion::Soap11),
            Err(SoapError::Serialization(_))
        ));
        assert!(matches!(
            parse_envelope("<s:Envelope", SoapVersion::Soap11),
            Err(SoapError::Xml(_))
        ));
    }
}
