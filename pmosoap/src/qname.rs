//! Noms XML qualifiés (namespace + nom local)

use std::fmt;
use xmltree::Element;

/// Nom XML qualifié, comparé sur le couple (namespace, nom local).
///
/// Le préfixe n'intervient jamais dans la comparaison : `s:Fault` et
/// `soap:Fault` désignent le même élément s'ils pointent vers le même
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace)
            },
            name: name.into(),
        }
    }

    /// Nom sans namespace
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Vrai si l'élément porte ce nom local dans ce namespace.
    pub fn matches(&self, element: &Element) -> bool {
        element.name == self.name && element.namespace.as_deref() == self.namespace()
    }

    /// Résout un QName textuel (`prefix:local`) dans le contexte de
    /// namespaces de `scope`, comme le contenu d'un `faultcode`.
    ///
    /// Un préfixe inconnu laisse le namespace vide plutôt que d'échouer :
    /// certains serveurs renvoient des codes non déclarés.
    pub fn resolve(text: &str, scope: &Element) -> Self {
        let text = text.trim();
        let (prefix, local) = match text.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", text),
        };

        let namespace = scope
            .namespaces
            .as_ref()
            .and_then(|ns| ns.get(prefix))
            .filter(|uri| !uri.is_empty())
            .map(str::to_string);

        Self {
            namespace,
            name: local.to_string(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
