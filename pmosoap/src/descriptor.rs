//! Méthodes d'un service SOAP et registre du contrat
//!
//! Les descripteurs sont construits une fois au démarrage, puis partagés en
//! lecture seule (`Arc`) par tous les appels. Aucune découverte dynamique
//! n'a lieu pendant un appel.

use crate::error::{Result, SoapError};
use crate::extension::ExtensionConfig;
use crate::qname::QualifiedName;
use crate::serializer::{BodySerializer, HeaderSerializer, WrappedSerializer};
use crate::value::{Part, Value, ValueKind};
use crate::version::SoapVersion;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Style de liaison du corps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingUse {
    #[default]
    Literal,
    Encoded,
}

/// Sens d'un en-tête SOAP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDirection {
    In,
    Out,
    InOut,
    Fault,
}

impl HeaderDirection {
    /// Vrai si un en-tête déclaré dans ce sens circule dans `direction`.
    pub fn includes(self, direction: HeaderDirection) -> bool {
        match direction {
            HeaderDirection::In => matches!(self, HeaderDirection::In | HeaderDirection::InOut),
            HeaderDirection::Out => matches!(self, HeaderDirection::Out | HeaderDirection::InOut),
            HeaderDirection::InOut => self == HeaderDirection::InOut,
            HeaderDirection::Fault => self == HeaderDirection::Fault,
        }
    }
}

/// Liaison entre un membre nommé du client et un élément d'en-tête
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBinding {
    /// Nom du membre côté appelant (clé dans [`HeaderValues`])
    pub member: String,
    /// Élément XML de l'en-tête
    pub element: QualifiedName,
    pub kind: ValueKind,
    pub direction: HeaderDirection,
    pub must_understand: bool,
    /// Un en-tête `In` requis sans valeur fait échouer l'appel
    pub required: bool,
}

impl HeaderBinding {
    pub fn new(
        member: impl Into<String>,
        element: QualifiedName,
        kind: ValueKind,
        direction: HeaderDirection,
    ) -> Self {
        Self {
            member: member.into(),
            element,
            kind,
            direction,
            must_understand: false,
            required: false,
        }
    }

    pub fn must_understand(mut self) -> Self {
        self.must_understand = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Valeurs d'en-têtes indexées par nom de membre
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderValues {
    values: BTreeMap<String, Value>,
}

impl HeaderValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, member: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(member, value);
        self
    }

    pub fn set(&mut self, member: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(member.into(), value.into());
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.values.get(member)
    }

    pub fn remove(&mut self, member: &str) -> Option<Value> {
        self.values.remove(member)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Recopie les valeurs de `other`, en écrasant les membres existants
    pub fn merge(&mut self, other: HeaderValues) {
        self.values.extend(other.values);
    }
}

/// Métadonnées immuables d'une opération distante
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub action: String,
    pub binding_use: BindingUse,
    pub one_way: bool,
    pub request_element: QualifiedName,
    pub response_element: QualifiedName,
    pub params: Vec<Part>,
    pub results: Vec<Part>,
    pub headers: Vec<HeaderBinding>,
    pub extensions: Vec<ExtensionConfig>,
    body_serializer: Option<Arc<dyn BodySerializer>>,
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("binding_use", &self.binding_use)
            .field("one_way", &self.one_way)
            .field("params", &self.params.len())
            .field("results", &self.results.len())
            .field("headers", &self.headers.len())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

impl MethodDescriptor {
    /// Commence la description d'une opération du namespace `namespace`.
    pub fn builder(namespace: &str, name: &str) -> MethodDescriptorBuilder {
        MethodDescriptorBuilder::new(namespace, name)
    }

    /// Sérialiseur du corps pour ce sens et cette version.
    ///
    /// Les faults ne passent pas par là : le lecteur d'enveloppe les
    /// reconnaît avant de consulter le descripteur.
    pub fn body_serializer(
        &self,
        direction: HeaderDirection,
        version: SoapVersion,
    ) -> Arc<dyn BodySerializer> {
        if let Some(custom) = &self.body_serializer {
            return custom.clone();
        }
        let (wrapper, parts) = match direction {
            HeaderDirection::Out | HeaderDirection::Fault => {
                (self.response_element.clone(), self.results.clone())
            }
            HeaderDirection::In | HeaderDirection::InOut => {
                (self.request_element.clone(), self.params.clone())
            }
        };
        let binding_use = match direction {
            HeaderDirection::Fault => BindingUse::Literal,
            _ => self.binding_use,
        };
        Arc::new(WrappedSerializer::new(
            wrapper,
            parts,
            binding_use,
            version,
            self.one_way,
        ))
    }

    /// Sérialiseur des en-têtes liés dans ce sens
    pub fn header_serializer(&self, direction: HeaderDirection) -> HeaderSerializer {
        HeaderSerializer::new(
            self.headers
                .iter()
                .filter(|b| b.direction.includes(direction))
                .cloned()
                .collect(),
        )
    }

    /// Valeurs à émettre pour les en-têtes liés dans ce sens, dans l'ordre
    /// de déclaration.
    ///
    /// Un en-tête requis sans valeur est une erreur : l'appel n'est pas
    /// envoyé à moitié renseigné.
    pub fn header_values(
        &self,
        direction: HeaderDirection,
        values: &HeaderValues,
    ) -> Result<Vec<(HeaderBinding, Value)>> {
        let mut bound = Vec::new();
        for binding in self.headers.iter().filter(|b| b.direction.includes(direction)) {
            match values.get(&binding.member) {
                Some(value) => bound.push((binding.clone(), value.clone())),
                None if binding.required => {
                    return Err(SoapError::serialization(format!(
                        "missing value for required header '{}' of {}",
                        binding.member, self.name
                    )));
                }
                None => {}
            }
        }
        Ok(bound)
    }
}

/// Constructeur de [`MethodDescriptor`]
pub struct MethodDescriptorBuilder {
    descriptor: MethodDescriptor,
}

impl MethodDescriptorBuilder {
    fn new(namespace: &str, name: &str) -> Self {
        let action = if namespace.ends_with('/') {
            format!("{}{}", namespace, name)
        } else {
            format!("{}/{}", namespace, name)
        };
        Self {
            descriptor: MethodDescriptor {
                name: name.to_string(),
                action,
                binding_use: BindingUse::Literal,
                one_way: false,
                request_element: QualifiedName::new(namespace, name),
                response_element: QualifiedName::new(namespace, format!("{}Response", name)),
                params: Vec::new(),
                results: Vec::new(),
                headers: Vec::new(),
                extensions: Vec::new(),
                body_serializer: None,
            },
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.descriptor.action = action.into();
        self
    }

    pub fn encoded(mut self) -> Self {
        self.descriptor.binding_use = BindingUse::Encoded;
        self
    }

    pub fn one_way(mut self) -> Self {
        self.descriptor.one_way = true;
        self
    }

    pub fn request_element(mut self, element: QualifiedName) -> Self {
        self.descriptor.request_element = element;
        self
    }

    pub fn response_element(mut self, element: QualifiedName) -> Self {
        self.descriptor.response_element = element;
        self
    }

    pub fn param(mut self, name: &str, kind: ValueKind) -> Self {
        self.descriptor.params.push(Part::new(name, kind));
        self
    }

    pub fn result(mut self, name: &str, kind: ValueKind) -> Self {
        self.descriptor.results.push(Part::new(name, kind));
        self
    }

    pub fn header(mut self, binding: HeaderBinding) -> Self {
        self.descriptor.headers.push(binding);
        self
    }

    pub fn extension(mut self, config: ExtensionConfig) -> Self {
        self.descriptor.extensions.push(config);
        self
    }

    /// Remplace le sérialiseur de corps par défaut (wrapper document/literal
    /// ou rpc/encoded) par une implémentation propre au service.
    pub fn body_serializer(mut self, serializer: Arc<dyn BodySerializer>) -> Self {
        self.descriptor.body_serializer = Some(serializer);
        self
    }

    pub fn build(self) -> MethodDescriptor {
        self.descriptor
    }
}

/// Résolution d'un nom de méthode en descripteur
pub trait MethodLookup: Send + Sync {
    fn lookup(&self, method: &str) -> Option<Arc<MethodDescriptor>>;

    /// Extensions configurées au niveau du service, groupe haute priorité
    fn high_priority_extensions(&self) -> &[ExtensionConfig] {
        &[]
    }

    /// Extensions configurées au niveau du service, groupe basse priorité
    fn low_priority_extensions(&self) -> &[ExtensionConfig] {
        &[]
    }
}

/// Registre des méthodes d'un service, peuplé une fois à l'initialisation
#[derive(Debug, Clone)]
pub struct ServiceContract {
    pub namespace: String,
    pub url: String,
    pub version: SoapVersion,
    methods: HashMap<String, Arc<MethodDescriptor>>,
    high_priority: Vec<ExtensionConfig>,
    low_priority: Vec<ExtensionConfig>,
}

impl ServiceContract {
    pub fn builder(namespace: impl Into<String>) -> ServiceContractBuilder {
        ServiceContractBuilder {
            contract: ServiceContract {
                namespace: namespace.into(),
                url: String::new(),
                version: SoapVersion::Soap11,
                methods: HashMap::new(),
                high_priority: Vec::new(),
                low_priority: Vec::new(),
            },
        }
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl MethodLookup for ServiceContract {
    fn lookup(&self, method: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(method).cloned()
    }

    fn high_priority_extensions(&self) -> &[ExtensionConfig] {
        &self.high_priority
    }

    fn low_priority_extensions(&self) -> &[ExtensionConfig] {
        &self.low_priority
    }
}

/// Constructeur de [`ServiceContract`]
pub struct ServiceContractBuilder {
    contract: ServiceContract,
}

impl ServiceContractBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.contract.url = url.into();
        self
    }

    pub fn version(mut self, version: SoapVersion) -> Self {
        self.contract.version = version;
        self
    }

    /// Extension de niveau service, rangée dans son groupe de priorité
    pub fn extension(mut self, config: ExtensionConfig) -> Self {
        if config.is_high_priority() {
            self.contract.high_priority.push(config);
        } else {
            self.contract.low_priority.push(config);
        }
        self
    }

    pub fn method(mut self, descriptor: MethodDescriptor) -> Self {
        self.contract
            .methods
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        self
    }

    /// Raccourci : décrit une méthode dans le namespace du contrat
    pub fn describe<F>(self, name: &str, f: F) -> Self
    where
        F: FnOnce(MethodDescriptorBuilder) -> MethodDescriptorBuilder,
    {
        let builder = MethodDescriptor::builder(&self.contract.namespace, name);
        let descriptor = f(builder).build();
        self.method(descriptor)
    }

    pub fn build(self) -> ServiceContract {
        self.contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> ServiceContract {
        ServiceContract::builder("http://tempuri.org/")
            .url("http://localhost/calc.asmx")
            .describe("Add", |m| {
                m.param("intA", ValueKind::Int)
                    .param("intB", ValueKind::Int)
                    .result("AddResult", ValueKind::Int)
                    .header(
                        HeaderBinding::new(
                            "auth",
                            QualifiedName::new("http://tempuri.org/", "AuthHeader"),
                            ValueKind::String,
                            HeaderDirection::In,
                        )
                        .required(),
                    )
                    .header(HeaderBinding::new(
                        "session",
                        QualifiedName::new("http://tempuri.org/", "Session"),
                        ValueKind::String,
                        HeaderDirection::InOut,
                    ))
            })
            .build()
    }

    #[test]
    fn test_lookup_and_defaults() {
        let contract = contract();
        let add = contract.lookup("Add").unwrap();
        assert_eq!(add.action, "http://tempuri.org/Add");
        assert_eq!(add.response_element.name, "AddResponse");
        assert_eq!(add.binding_use, BindingUse::Literal);
        assert!(contract.lookup("Sub").is_none());
    }

    #[test]
    fn test_direction_includes() {
        assert!(HeaderDirection::InOut.includes(HeaderDirection::In));
        assert!(HeaderDirection::InOut.includes(HeaderDirection::Out));
        assert!(!HeaderDirection::In.includes(HeaderDirection::Out));
        assert!(!HeaderDirection::Fault.includes(HeaderDirection::Out));
    }

    #[test]
    fn test_header_values_by_direction() {
        let contract = contract();
        let add = contract.lookup("Add").unwrap();
        let values = HeaderValues::new()
            .with("auth", "secret")
            .with("session", "42");

        let bound = add.header_values(HeaderDirection::In, &values).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].0.member, "auth");

        let out = add.header_values(HeaderDirection::Out, &values).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, Value::from("42"));
    }

    #[test]
    fn test_missing_required_header_fails() {
        let contract = contract();
        let add = contract.lookup("Add").unwrap();
        let err = add
            .header_values(HeaderDirection::In, &HeaderValues::new())
            .unwrap_err();
        assert!(matches!(err, SoapError::Serialization(_)));
    }
}
