//! Valeurs typées des arguments et des résultats.
//!
//! Une [`Value`] est ce que l'appelant passe en argument positionnel et ce
//! que le moteur rend en résultat. Relire un texte en valeur demande le
//! [`ValueKind`] déclaré de la partie, porté par le descripteur.

use chrono::{DateTime, FixedOffset};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Array(Vec<Value>),
    /// Champs nommés, ordonnés
    Struct(Vec<(String, Value)>),
}

/// Type XML Schema déclaré d'une partie
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Bool,
    Int,
    Double,
    String,
    DateTime,
    Array(Box<ValueKind>),
    Struct(Vec<Part>),
}

/// Emplacement nommé et typé d'une opération, d'un en-tête ou d'une structure
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub kind: ValueKind,
}

impl Part {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl ValueKind {
    pub fn array_of(kind: ValueKind) -> Self {
        ValueKind::Array(Box::new(kind))
    }

    /// Valeur de `xsi:type` utilisée en Encoded
    pub fn xsd_type(&self) -> &'static str {
        match self {
            ValueKind::Bool => "xsd:boolean",
            ValueKind::Int => "xsd:long",
            ValueKind::Double => "xsd:double",
            ValueKind::String => "xsd:string",
            ValueKind::DateTime => "xsd:dateTime",
            ValueKind::Array(_) => "soapenc:Array",
            ValueKind::Struct(_) => "soapenc:Struct",
        }
    }

    /// Nom d'élément d'un item de tableau
    pub fn item_name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "boolean",
            ValueKind::Int => "long",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::DateTime => "dateTime",
            ValueKind::Array(_) | ValueKind::Struct(_) => "item",
        }
    }

    /// Lit le texte d'un élément en valeur scalaire de ce type.
    pub fn parse_text(&self, text: &str) -> Option<Value> {
        let text = text.trim();
        match self {
            ValueKind::Bool => match text {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueKind::Int => text.parse().ok().map(Value::Int),
            ValueKind::Double => match text {
                "INF" => Some(Value::Double(f64::INFINITY)),
                "-INF" => Some(Value::Double(f64::NEG_INFINITY)),
                "NaN" => Some(Value::Double(f64::NAN)),
                _ => text.parse().ok().map(Value::Double),
            },
            ValueKind::DateTime => DateTime::parse_from_rfc3339(text).ok().map(Value::DateTime),
            // le texte d'une chaîne n'est pas normalisé
            ValueKind::String => None,
            ValueKind::Array(_) | ValueKind::Struct(_) => None,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Forme lexicale d'un scalaire ; `None` pour tableaux, structures et null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Double(d) if d.is_nan() => Some("NaN".to_string()),
            Value::Double(d) if d.is_infinite() => {
                Some(if *d > 0.0 { "INF" } else { "-INF" }.to_string())
            }
            Value::Double(d) => Some(d.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::DateTime(dt) => Some(dt.to_rfc3339()),
            Value::Null | Value::Array(_) | Value::Struct(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Champ d'une valeur structure
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            scalar => write!(f, "{}", scalar.to_text().unwrap_or_default()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
