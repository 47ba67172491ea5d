//! # pmosoap - client RPC SOAP 1.1 / 1.2
//!
//! Cette crate invoque des opérations distantes décrites statiquement :
//! un [`ServiceContract`] rassemble les [`MethodDescriptor`] d'un service,
//! le [`SoapClient`] sérialise les arguments dans une enveloppe SOAP, passe
//! par la chaîne d'extensions, envoie la requête et relit la réponse.
//!
//! ## Fonctionnalités
//!
//! - ✅ Enveloppes SOAP 1.1 et 1.2, liaisons Literal et Encoded
//! - ✅ En-têtes SOAP liés (`In`, `Out`, `InOut`, `Fault`), `mustUnderstand`
//! - ✅ Faults typés dans les deux versions, détection du `VersionMismatch`
//! - ✅ Extensions ordonnées par groupe et priorité
//! - ✅ Transport HTTP ureq configurable (YAML + environnement)
//!
//! ## Example
//!
//! ```no_run
//! use pmosoap::{ClientConfig, ServiceContract, SoapClient, Value, ValueKind};
//! use std::sync::Arc;
//!
//! let contract = ServiceContract::builder("http://tempuri.org/")
//!     .url("http://localhost:8080/calculator.asmx")
//!     .describe("Add", |m| {
//!         m.param("a", ValueKind::Int)
//!             .param("b", ValueKind::Int)
//!             .result("AddResult", ValueKind::Int)
//!     })
//!     .build();
//!
//! let client = SoapClient::from_config(Arc::new(contract), &ClientConfig::default())?;
//! let result = client.invoke("Add", vec![Value::from(2), Value::from(3)])?;
//! assert_eq!(result.value(), Some(&Value::Int(5)));
//! # Ok::<(), pmosoap::SoapError>(())
//! ```

pub mod client;
pub mod config;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod extension;
pub mod message;
pub mod qname;
pub mod serializer;
pub mod soap;
pub mod transport;
pub mod value;
pub mod version;

pub use client::{CallResult, SoapClient};
pub use config::ClientConfig;
pub use descriptor::{
    BindingUse, HeaderBinding, HeaderDirection, HeaderValues, MethodDescriptor,
    MethodDescriptorBuilder, MethodLookup, ServiceContract, ServiceContractBuilder,
};
pub use error::{ErrorKind, SoapError, TransportError};
pub use extension::{ExtensionChain, ExtensionConfig, ExtensionFactory, PriorityGroup, SoapExtension};
pub use message::{CallMessage, MessageStage};
pub use qname::QualifiedName;
pub use serializer::{BodySerializer, HeaderSerializer, WrappedSerializer};
pub use soap::{SoapBody, SoapEnvelope, SoapFault};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
pub use value::{Part, Value, ValueKind};
pub use version::SoapVersion;
