//! FHIR R4 complex datatypes shared by the resource builders.
//!
//! Only the elements the builders emit are modelled. Every optional element is skipped when
//! empty so rendered resources never contain `null`.

use serde::Serialize;

/// System URI for UCUM units.
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// A code defined by a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: Option<&str>, code: &str, display: &str) -> Self {
        Self {
            system: system.map(str::to_string),
            code: Some(code.to_string()),
            display: Some(display.to_string()),
        }
    }
}

/// A concept with optional codings and free text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// A concept carrying only free text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    /// A literal reference of the form `<resource_type>/<id>`.
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: format!("{resource_type}/{id}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

/// A measured amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quantity {
    pub value: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// The `value[x]` choice of an extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ExtensionValue {
    #[serde(rename = "valueDecimal")]
    Decimal(u64),
    #[serde(rename = "valueIdentifier")]
    Identifier(IdentifierValue),
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueAge")]
    Age(Quantity),
}

/// An identifier used as an extension value, which carries no system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdentifierValue {
    pub value: String,
}

/// An extension, either simple (`url` + `value[x]`) or complex (nested `extension`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Extension {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    pub url: String,

    #[serde(flatten)]
    pub value: Option<ExtensionValue>,
}

impl Extension {
    pub fn simple(url: impl Into<String>, value: ExtensionValue) -> Self {
        Self {
            extension: Vec::new(),
            url: url.into(),
            value: Some(value),
        }
    }

    pub fn complex(url: impl Into<String>, extension: Vec<Extension>) -> Self {
        Self {
            extension,
            url: url.into(),
            value: None,
        }
    }
}
