//! SOAP Faults (1.1 et 1.2)

use crate::error::{Result, SoapError};
use crate::qname::QualifiedName;
use crate::serializer::child_elements;
use crate::version::{ENVELOPE_PREFIX, SoapVersion};
use std::fmt;
use xmltree::{Element, Namespace, XMLNode};

/// Préfixe déclaré pour un code de fault hors du namespace de l'enveloppe
const CODE_PREFIX: &str = "c";

/// Erreur SOAP (Fault)
#[derive(Debug, Clone, PartialEq)]
pub struct SoapFault {
    /// Code du fault (ex: `soap:Client`, `env:Sender`)
    pub code: QualifiedName,

    /// Sous-code SOAP 1.2
    pub subcode: Option<QualifiedName>,

    /// Description de l'erreur
    pub reason: String,

    /// URI de l'acteur (1.1 `faultactor`, 1.2 `Role`)
    pub actor: Option<String>,

    /// Nœud SOAP 1.2 ayant produit l'erreur
    pub node: Option<String>,

    /// Contenu opaque de `detail` / `Detail`
    pub detail: Option<Element>,
}

impl SoapFault {
    /// Crée un fault SOAP simple
    pub fn new(code: QualifiedName, reason: impl Into<String>) -> Self {
        Self {
            code,
            subcode: None,
            reason: reason.into(),
            actor: None,
            node: None,
            detail: None,
        }
    }

    pub fn with_subcode(mut self, subcode: QualifiedName) -> Self {
        self.subcode = Some(subcode);
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_detail(mut self, detail: Element) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Texte du premier descendant de `detail` portant ce nom local.
    ///
    /// Pratique pour les détails applicatifs du type UPnP
    /// (`<UPnPError><errorCode>401</errorCode>…`).
    pub fn detail_text(&self, name: &str) -> Option<String> {
        fn find<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
            child_elements(element).find_map(|child| {
                if child.name == name {
                    Some(child)
                } else {
                    find(child, name)
                }
            })
        }

        let detail = self.detail.as_ref()?;
        find(detail, name).and_then(|e| e.get_text().map(|t| t.trim().to_string()))
    }

    /// Lit un élément `Fault` selon la forme propre à `version`.
    pub fn parse(fault: &Element, version: SoapVersion) -> Result<Self> {
        match version {
            SoapVersion::Soap11 => Self::parse_soap11(fault),
            SoapVersion::Soap12 => Self::parse_soap12(fault),
        }
    }

    fn parse_soap11(fault: &Element) -> Result<Self> {
        let env_ns = SoapVersion::Soap11.envelope_namespace();
        // les enfants d'un Fault 1.1 sont normalement non qualifiés, mais
        // certains serveurs les placent dans le namespace de l'enveloppe
        let child = |name: &str| {
            child_elements(fault).find(|c| {
                let ns = c.namespace.as_deref().unwrap_or("");
                c.name == name && (ns.is_empty() || ns == env_ns)
            })
        };

        let code_elem = child("faultcode")
            .ok_or_else(|| SoapError::serialization("SOAP 1.1 fault without faultcode"))?;
        let code_text = code_elem.get_text().unwrap_or_default();

        Ok(Self {
            code: QualifiedName::resolve(&code_text, code_elem),
            subcode: None,
            reason: text_of(child("faultstring")),
            actor: child("faultactor").map(|e| text_of(Some(e))),
            node: None,
            detail: child("detail").cloned(),
        })
    }

    fn parse_soap12(fault: &Element) -> Result<Self> {
        let env_ns = SoapVersion::Soap12.envelope_namespace();
        let child = |parent: &Element, name: &str| -> Option<Element> {
            child_elements(parent)
                .find(|c| c.name == name && c.namespace.as_deref() == Some(env_ns))
                .cloned()
        };

        let code = child(fault, "Code")
            .ok_or_else(|| SoapError::serialization("SOAP 1.2 fault without Code"))?;
        let value = child(&code, "Value")
            .ok_or_else(|| SoapError::serialization("SOAP 1.2 fault Code without Value"))?;
        let subcode = child(&code, "Subcode")
            .and_then(|sub| child(&sub, "Value"))
            .map(|v| QualifiedName::resolve(&v.get_text().unwrap_or_default(), &v));

        let reason = child(fault, "Reason")
            .and_then(|r| child(&r, "Text"))
            .map(|t| text_of(Some(&t)))
            .unwrap_or_default();

        Ok(Self {
            code: QualifiedName::resolve(&value.get_text().unwrap_or_default(), &value),
            subcode,
            reason,
            actor: child(fault, "Role").map(|e| text_of(Some(&e))),
            node: child(fault, "Node").map(|e| text_of(Some(&e))),
            detail: child(fault, "Detail"),
        })
    }

    /// Construit l'élément `Fault` pour `version`.
    ///
    /// Les éléments de l'enveloppe utilisent le préfixe `soap`, qui doit être
    /// déclaré par un ancêtre (voir [`SoapEnvelope`](super::SoapEnvelope)).
    pub fn to_element(&self, version: SoapVersion) -> Element {
        let mut fault = envelope_element("Fault", version);

        match version {
            SoapVersion::Soap11 => {
                let mut code = Element::new("faultcode");
                let text = qname_text(&self.code, version, &mut code);
                push_text(&mut code, text);
                fault.children.push(XMLNode::Element(code));

                fault
                    .children
                    .push(XMLNode::Element(text_element("faultstring", &self.reason)));

                if let Some(actor) = &self.actor {
                    fault
                        .children
                        .push(XMLNode::Element(text_element("faultactor", actor)));
                }

                if let Some(detail) = &self.detail {
                    let mut elem = Element::new("detail");
                    elem.children = detail.children.clone();
                    fault.children.push(XMLNode::Element(elem));
                }
            }
            SoapVersion::Soap12 => {
                let mut code = envelope_element("Code", version);
                let mut value = envelope_element("Value", version);
                let text = qname_text(&self.code, version, &mut value);
                push_text(&mut value, text);
                code.children.push(XMLNode::Element(value));

                if let Some(subcode) = &self.subcode {
                    let mut sub = envelope_element("Subcode", version);
                    let mut value = envelope_element("Value", version);
                    let text = qname_text(subcode, version, &mut value);
                    push_text(&mut value, text);
                    sub.children.push(XMLNode::Element(value));
                    code.children.push(XMLNode::Element(sub));
                }
                fault.children.push(XMLNode::Element(code));

                let mut reason = envelope_element("Reason", version);
                let mut text = envelope_element("Text", version);
                text.attributes
                    .insert("xml:lang".to_string(), "en".to_string());
                push_text(&mut text, self.reason.clone());
                reason.children.push(XMLNode::Element(text));
                fault.children.push(XMLNode::Element(reason));

                if let Some(node) = &self.node {
                    let mut elem = envelope_element("Node", version);
                    push_text(&mut elem, node.clone());
                    fault.children.push(XMLNode::Element(elem));
                }
                if let Some(actor) = &self.actor {
                    let mut elem = envelope_element("Role", version);
                    push_text(&mut elem, actor.clone());
                    fault.children.push(XMLNode::Element(elem));
                }
                if let Some(detail) = &self.detail {
                    let mut elem = envelope_element("Detail", version);
                    elem.children = detail.children.clone();
                    fault.children.push(XMLNode::Element(elem));
                }
            }
        }

        fault
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.reason)
    }
}

impl std::error::Error for SoapFault {}

/// Élément du namespace de l'enveloppe, préfixé `soap`
pub(crate) fn envelope_element(name: &str, version: SoapVersion) -> Element {
    let mut element = Element::new(name);
    element.prefix = Some(ENVELOPE_PREFIX.to_string());
    element.namespace = Some(version.envelope_namespace().to_string());
    element
}

fn text_element(name: &str, text: &str) -> Element {
    let mut element = Element::new(name);
    push_text(&mut element, text.to_string());
    element
}

fn push_text(element: &mut Element, text: String) {
    if !text.is_empty() {
        element.children.push(XMLNode::Text(text));
    }
}

fn text_of(element: Option<&Element>) -> String {
    element
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Forme textuelle d'un QName, en déclarant au besoin son namespace sur
/// `holder`.
fn qname_text(qname: &QualifiedName, version: SoapVersion, holder: &mut Element) -> String {
    match qname.namespace() {
        None => qname.name.clone(),
        Some(ns) if ns == version.envelope_namespace() => {
            format!("{}:{}", ENVELOPE_PREFIX, qname.name)
        }
        Some(ns) => {
            holder
                .namespaces
                .get_or_insert_with(Namespace::empty)
                .put(CODE_PREFIX, ns);
            format!("{}:{}", CODE_PREFIX, qname.name)
        }
    }
}
