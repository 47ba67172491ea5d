//! Sérialiseurs du corps et des en-têtes.
//!
//! Le sérialiseur par défaut suit la convention « wrapped » : un élément
//! nommé d'après l'opération (ou `<nom>Response`) dont les enfants sont les
//! parties, dans l'ordre de déclaration. En Literal les parties sont
//! qualifiées dans le namespace du service ; en Encoded elles ne le sont pas
//! et chaque valeur porte un `xsi:type`.

use crate::descriptor::{BindingUse, HeaderBinding, HeaderValues};
use crate::error::{Result, SoapError};
use crate::qname::QualifiedName;
use crate::value::{Part, Value, ValueKind};
use crate::version::{SoapVersion, ENVELOPE_PREFIX};
use tracing::trace;
use xmltree::{Element, Namespace, XMLNode};

/// Préfixe de l'élément d'opération en Encoded
const ENCODED_PREFIX: &str = "q1";

/// Convertit les valeurs positionnelles en contenu du `Body`, et retour.
pub trait BodySerializer: Send + Sync {
    /// Ajoute le contenu de `values` sous `body`.
    fn serialize(&self, body: &mut Element, values: &[Value]) -> Result<()>;

    /// Décode les éléments enfants du `Body` en valeurs positionnelles.
    fn deserialize(&self, body: &[&Element]) -> Result<Vec<Value>>;
}

/// Enfants éléments de `element`, sans texte ni commentaires
pub fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

/// Élément déclarant le namespace de `name`, par défaut ou sous `prefix`.
pub(crate) fn declared_element(name: &QualifiedName, prefix: Option<&str>) -> Element {
    let mut element = Element::new(&name.name);
    element.namespace = name.namespace.clone();
    if let Some(ns) = name.namespace() {
        let mut namespaces = Namespace::empty();
        namespaces.put(prefix.unwrap_or(""), ns);
        element.namespaces = Some(namespaces);
        element.prefix = prefix.map(str::to_string);
    }
    element
}

fn qualified_child(name: &str, namespace: Option<&str>) -> Element {
    let mut element = Element::new(name);
    element.namespace = namespace.map(str::to_string);
    element
}

fn part_matches(element: &Element, name: &str, namespace: Option<&str>) -> bool {
    element.name == name
        && (element.namespace.is_none() || element.namespace.as_deref() == namespace)
}

fn kind_mismatch(value: &Value, kind: &ValueKind) -> SoapError {
    SoapError::serialization(format!("value {} does not match declared type {:?}", value, kind))
}

/// Écrit `value` comme contenu de `element`.
pub(crate) fn write_value(
    element: &mut Element,
    value: &Value,
    kind: &ValueKind,
    encoded: bool,
    namespace: Option<&str>,
) -> Result<()> {
    if value.is_null() {
        element
            .attributes
            .insert("xsi:nil".to_string(), "true".to_string());
        return Ok(());
    }

    if encoded {
        element
            .attributes
            .insert("xsi:type".to_string(), kind.xsd_type().to_string());
    }

    match (kind, value) {
        (ValueKind::Array(item_kind), Value::Array(items)) => {
            if encoded {
                element.attributes.insert(
                    "soapenc:arrayType".to_string(),
                    format!("{}[{}]", item_kind.xsd_type(), items.len()),
                );
            }
            for item in items {
                let mut child = qualified_child(item_kind.item_name(), namespace);
                write_value(&mut child, item, item_kind, encoded, namespace)?;
                element.children.push(XMLNode::Element(child));
            }
            Ok(())
        }
        (ValueKind::Struct(parts), Value::Struct(fields)) => {
            if let Some((name, _)) = fields
                .iter()
                .find(|(name, _)| !parts.iter().any(|p| &p.name == name))
            {
                return Err(SoapError::serialization(format!(
                    "field '{}' is not declared",
                    name
                )));
            }
            for part in parts {
                let field = value.field(&part.name).ok_or_else(|| {
                    SoapError::serialization(format!("missing struct field '{}'", part.name))
                })?;
                let mut child = qualified_child(&part.name, namespace);
                write_value(&mut child, field, &part.kind, encoded, namespace)?;
                element.children.push(XMLNode::Element(child));
            }
            Ok(())
        }
        (ValueKind::Bool, Value::Bool(_))
        | (ValueKind::Int, Value::Int(_))
        | (ValueKind::Double, Value::Double(_) | Value::Int(_))
        | (ValueKind::String, Value::String(_))
        | (ValueKind::DateTime, Value::DateTime(_)) => {
            let text = value.to_text().unwrap_or_default();
            let text = match (kind, value) {
                (ValueKind::Double, Value::Int(i)) => (*i as f64).to_string(),
                _ => text,
            };
            element.children.push(XMLNode::Text(text));
            Ok(())
        }
        _ => Err(kind_mismatch(value, kind)),
    }
}

/// Lit le contenu de `element` comme une valeur de type `kind`.
pub(crate) fn read_value(element: &Element, kind: &ValueKind) -> Result<Value> {
    if element.attributes.get("nil").map(String::as_str) == Some("true") {
        return Ok(Value::Null);
    }

    match kind {
        ValueKind::String => Ok(Value::String(
            element.get_text().map(|t| t.into_owned()).unwrap_or_default(),
        )),
        ValueKind::Array(item_kind) => child_elements(element)
            .map(|child| read_value(child, item_kind))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        ValueKind::Struct(parts) => {
            let mut fields = Vec::with_capacity(parts.len());
            for part in parts {
                let child = child_elements(element)
                    .find(|c| c.name == part.name)
                    .ok_or_else(|| {
                        SoapError::serialization(format!(
                            "missing field '{}' in <{}>",
                            part.name, element.name
                        ))
                    })?;
                fields.push((part.name.clone(), read_value(child, &part.kind)?));
            }
            Ok(Value::Struct(fields))
        }
        scalar => {
            let text = element.get_text().unwrap_or_default();
            scalar.parse_text(&text).ok_or_else(|| {
                SoapError::serialization(format!(
                    "invalid {:?} value '{}' in <{}>",
                    scalar, text, element.name
                ))
            })
        }
    }
}

/// Sérialiseur par défaut : un élément d'opération contenant les parties.
#[derive(Debug, Clone)]
pub struct WrappedSerializer {
    wrapper: QualifiedName,
    parts: Vec<Part>,
    binding_use: BindingUse,
    version: SoapVersion,
    allow_empty: bool,
}

impl WrappedSerializer {
    pub fn new(
        wrapper: QualifiedName,
        parts: Vec<Part>,
        binding_use: BindingUse,
        version: SoapVersion,
        allow_empty: bool,
    ) -> Self {
        Self {
            wrapper,
            parts,
            binding_use,
            version,
            allow_empty,
        }
    }

    fn encoded(&self) -> bool {
        self.binding_use == BindingUse::Encoded
    }

    /// Namespace des parties : qualifiées en Literal, aucun en Encoded
    fn part_namespace(&self) -> Option<&str> {
        if self.encoded() {
            None
        } else {
            self.wrapper.namespace()
        }
    }
}

impl BodySerializer for WrappedSerializer {
    fn serialize(&self, body: &mut Element, values: &[Value]) -> Result<()> {
        if values.len() != self.parts.len() {
            return Err(SoapError::serialization(format!(
                "{} expects {} argument(s), got {}",
                self.wrapper.name,
                self.parts.len(),
                values.len()
            )));
        }

        let prefix = self.encoded().then_some(ENCODED_PREFIX);
        let mut wrapper = declared_element(&self.wrapper, prefix);
        if self.encoded() {
            let namespaces = wrapper.namespaces.get_or_insert_with(Namespace::empty);
            namespaces.put("soapenc", self.version.encoding_namespace());
        }

        for (part, value) in self.parts.iter().zip(values) {
            let mut child = qualified_child(&part.name, self.part_namespace());
            write_value(
                &mut child,
                value,
                &part.kind,
                self.encoded(),
                self.part_namespace(),
            )?;
            wrapper.children.push(XMLNode::Element(child));
        }

        body.children.push(XMLNode::Element(wrapper));
        Ok(())
    }

    fn deserialize(&self, body: &[&Element]) -> Result<Vec<Value>> {
        let Some(wrapper) = body.first() else {
            if self.parts.is_empty() || self.allow_empty {
                return Ok(Vec::new());
            }
            return Err(SoapError::serialization(format!(
                "empty Body, expected <{}>",
                self.wrapper
            )));
        };

        if !self.wrapper.matches(wrapper) {
            return Err(SoapError::serialization(format!(
                "unexpected body element {}, expected {}",
                QualifiedName {
                    namespace: wrapper.namespace.clone(),
                    name: wrapper.name.clone(),
                },
                self.wrapper
            )));
        }

        let namespace = self.wrapper.namespace();
        let mut values = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let child = child_elements(wrapper)
                .find(|c| part_matches(c, &part.name, namespace))
                .ok_or_else(|| {
                    SoapError::serialization(format!(
                        "missing part '{}' in <{}>",
                        part.name, self.wrapper.name
                    ))
                })?;
            values.push(read_value(child, &part.kind)?);
        }
        Ok(values)
    }
}

/// Sérialiseur des liaisons d'en-tête d'une direction
#[derive(Debug, Clone, Default)]
pub struct HeaderSerializer {
    bindings: Vec<HeaderBinding>,
}

impl HeaderSerializer {
    pub fn new(bindings: Vec<HeaderBinding>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[HeaderBinding] {
        &self.bindings
    }

    /// Ajoute un élément par valeur liée sous `header`.
    pub fn serialize(
        &self,
        header: &mut Element,
        values: &[(HeaderBinding, Value)],
        version: SoapVersion,
    ) -> Result<()> {
        for (binding, value) in values {
            let mut element = declared_element(&binding.element, None);
            if binding.must_understand {
                element.attributes.insert(
                    format!("{}:mustUnderstand", ENVELOPE_PREFIX),
                    version.must_understand_value().to_string(),
                );
            }
            write_value(
                &mut element,
                value,
                &binding.kind,
                false,
                binding.element.namespace(),
            )?;
            header.children.push(XMLNode::Element(element));
        }
        Ok(())
    }

    /// Lit les enfants d'un élément `Header`. Les éléments sans liaison
    /// sont ignorés.
    pub fn deserialize(&self, header: &Element) -> Result<HeaderValues> {
        let mut values = HeaderValues::new();
        for child in child_elements(header) {
            match self.bindings.iter().find(|b| b.element.matches(child)) {
                Some(binding) => {
                    values.set(binding.member.clone(), read_value(child, &binding.kind)?);
                }
                None => {
                    trace!(
                        element = %child.name,
                        namespace = child.namespace.as_deref().unwrap_or(""),
                        "Ignoring unbound SOAP header"
                    );
                }
            }
        }
        Ok(values)
    }
}
