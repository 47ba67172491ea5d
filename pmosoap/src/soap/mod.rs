//! # Module SOAP - enveloppes, faults et lecture/écriture
//!
//! Ce module produit l'enveloppe d'une requête à partir d'un
//! [`CallMessage`](crate::CallMessage) et lit l'enveloppe de réponse.
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`] : enveloppe SOAP complète (1.1 ou 1.2)
//! - [`SoapFault`] : erreur SOAP, sous ses deux formes
//! - [`write_request`] : sérialisation d'un appel
//! - [`parse_envelope`] / [`read_response`] : lecture d'une réponse
//!
//! ## Example
//!
//! ```ignore
//! use pmosoap::soap::parse_envelope;
//! use pmosoap::SoapVersion;
//!
//! let body = r#"<?xml version="1.0"?>
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <s:Fault><faultcode>s:Server</faultcode><faultstring>boom</faultstring></s:Fault>
//!   </s:Body>
//! </s:Envelope>"#;
//!
//! let envelope = parse_envelope(body, SoapVersion::Soap11).unwrap();
//! assert!(envelope.body.is_fault());
//! ```

mod envelope;
mod fault;
mod reader;
mod writer;

pub use envelope::{SoapBody, SoapEnvelope};
pub use fault::SoapFault;
pub use reader::{ResponseBody, ResponseMessage, parse_envelope, read_response};
pub use writer::write_request;
