use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::RegistryError;

/// Section an extension configures when its descriptor does not say.
pub const DEFAULT_SECTION: &str = "notebook";
/// Compatibility string assumed when a descriptor does not declare one.
pub const DEFAULT_COMPATIBILITY: &str = "?.x";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Declared extension descriptor, as served by the list endpoint or read from yaml.
pub struct ExtensionDescriptor {
    pub require: String,
    #[serde(rename = "Section", default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Parameters", default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ParameterSpec>>,
    #[serde(rename = "Compatibility", default, skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unconfigurable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtensionDescriptor {
    pub fn new(require: impl Into<String>) -> Self {
        Self {
            require: require.into(),
            section: None,
            name: None,
            description: None,
            parameters: None,
            compatibility: None,
            tags: Vec::new(),
            icon: None,
            readme: None,
            unconfigurable: false,
            duplicate: false,
            extra: Map::new(),
        }
    }

    /// The declared section, or `notebook`.
    pub fn section_or_default(&self) -> &str {
        self.section
            .as_deref()
            .filter(|section| !section.is_empty())
            .unwrap_or(DEFAULT_SECTION)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Public struct `ParameterSpec` describing one editable parameter of an extension.
pub struct ParameterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(
        default,
        alias = "list_element_param",
        skip_serializing_if = "Option::is_none"
    )]
    pub list_element: Option<Box<ParameterSpec>>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub step: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads a numeric input attribute the way a browser would.
///
/// Numbers and numeric strings are kept; anything else, such as `step: any`,
/// means "no constraint".
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite()))
}

impl ParameterSpec {
    pub fn named(name: impl Into<String>, input_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
            input_type: Some(input_type.into()),
            default: None,
            list_element: None,
            min: None,
            max: None,
            step: None,
            extra: Map::new(),
        }
    }

    /// Label shown next to the input: the description, falling back to the name.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Normalized extension entry produced by the registry merge.
pub struct MergedExtension {
    pub require: String,
    #[serde(rename = "Section")]
    pub section: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Parameters")]
    pub parameters: Vec<ParameterSpec>,
    #[serde(rename = "Compatibility", skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    pub unconfigurable: bool,
    pub duplicate: bool,
    pub is_compatible: bool,
    pub enabled: bool,
    pub filter_txt: String,
}

impl MergedExtension {
    /// Compatibility text as displayed, defaulting to `?.x`.
    pub fn compatibility_text(&self) -> &str {
        self.compatibility
            .as_deref()
            .unwrap_or(DEFAULT_COMPATIBILITY)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `TagCategory` values, in display order.
pub enum TagCategory {
    Section,
    Tag,
}

impl TagCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Tag => "tag",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "section" => Some(Self::Section),
            "tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Filter facet derived from extension sections and declared tags.
pub struct Tag {
    pub category: TagCategory,
    pub value: String,
}

impl Tag {
    pub fn new(category: TagCategory, value: impl Into<String>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}: {}", self.category.as_str(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A list entry that could not be read as a descriptor.
pub struct InvalidListEntry {
    pub require: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Declared descriptors plus the entries that were skipped.
pub struct ExtensionListing {
    pub descriptors: Vec<ExtensionDescriptor>,
    pub invalid: Vec<InvalidListEntry>,
}

impl ExtensionListing {
    pub fn new(descriptors: Vec<ExtensionDescriptor>) -> Self {
        Self {
            descriptors,
            invalid: Vec::new(),
        }
    }
}

/// Converts the list endpoint payload entry by entry.
///
/// A malformed entry is recorded in `invalid` and the rest of the list is kept.
pub fn parse_extension_list(payload: Value) -> Result<ExtensionListing, RegistryError> {
    let Value::Array(entries) = payload else {
        return Err(RegistryError::InvalidDescriptor(
            "nbextension list is not a JSON array".to_string(),
        ));
    };
    let mut listing = ExtensionListing::default();
    for entry in entries {
        let require = entry
            .get("require")
            .and_then(Value::as_str)
            .map(str::to_string);
        match serde_json::from_value::<ExtensionDescriptor>(entry) {
            Ok(descriptor) => listing.descriptors.push(descriptor),
            Err(error) => {
                tracing::warn!(
                    require = require.as_deref().unwrap_or("?"),
                    error = %error,
                    "skipping malformed nbextension descriptor"
                );
                listing.invalid.push(InvalidListEntry {
                    require,
                    error: error.to_string(),
                });
            }
        }
    }
    Ok(listing)
}
