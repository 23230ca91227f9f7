//! Per-input-type behavior for extension parameters.

use std::sync::OnceLock;

use nbext_config::ConfigSection;
use regex::Regex;
use serde_json::{Number, Value};

use crate::{ParameterSpec, RegistryError};

#[derive(Debug, Clone, PartialEq)]
/// One variant per parameter input kind.
pub enum ParameterInput {
    Text,
    Textarea,
    Number {
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    Checkbox,
    Color,
    Hotkey,
    List {
        element: Box<ParameterSpec>,
    },
    /// Any other HTML input type (`date`, `email`, `range`, ...), stored as text.
    Html(String),
}

impl ParameterInput {
    pub fn from_spec(spec: &ParameterSpec) -> Self {
        let input_type = spec
            .input_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("text")
            .to_ascii_lowercase();
        match input_type.as_str() {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "number" => Self::Number {
                min: spec.min,
                max: spec.max,
                step: spec.step,
            },
            "checkbox" => Self::Checkbox,
            "color" => Self::Color,
            "hotkey" => Self::Hotkey,
            "list" => Self::List {
                element: spec
                    .list_element
                    .clone()
                    .unwrap_or_else(|| Box::new(ParameterSpec::named("", "text"))),
            },
            _ => Self::Html(input_type),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number { .. } => "number",
            Self::Checkbox => "checkbox",
            Self::Color => "color",
            Self::Hotkey => "hotkey",
            Self::List { .. } => "list",
            Self::Html(name) => name,
        }
    }

    /// Converts user-entered text into the JSON value stored in the config.
    pub fn parse_value(&self, parameter: &str, raw: &str) -> Result<Value, RegistryError> {
        match self {
            Self::Text | Self::Textarea | Self::Html(_) => Ok(Value::String(raw.to_string())),
            Self::Hotkey => Ok(Value::String(raw.trim().to_string())),
            Self::Checkbox => parse_checkbox(raw)
                .map(Value::Bool)
                .ok_or_else(|| self.invalid(parameter, "expected true or false")),
            Self::Number { min, max, .. } => self.parse_number(parameter, raw, *min, *max),
            Self::Color => expand_color(raw)
                .map(Value::String)
                .ok_or_else(|| self.invalid(parameter, "expected #rgb or #rrggbb")),
            Self::List { element } => {
                let trimmed = raw.trim();
                if trimmed.starts_with('[') {
                    let parsed: Value = serde_json::from_str(trimmed)
                        .map_err(|error| self.invalid(parameter, &error.to_string()))?;
                    return self.coerce_value(parameter, parsed);
                }
                let element_input = Self::from_spec(element);
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| element_input.parse_value(parameter, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }
    }

    /// Validates an already-typed JSON value, parsing strings through `parse_value`.
    pub fn coerce_value(&self, parameter: &str, value: Value) -> Result<Value, RegistryError> {
        match (self, value) {
            (_, Value::String(raw)) if !matches!(self, Self::List { .. }) => {
                self.parse_value(parameter, &raw)
            }
            (Self::Checkbox, Value::Bool(flag)) => Ok(Value::Bool(flag)),
            (Self::Number { min, max, .. }, Value::Number(number)) => {
                let as_float = number.as_f64().unwrap_or(f64::NAN);
                check_bounds(as_float, *min, *max)
                    .map(|_| Value::Number(number))
                    .map_err(|reason| self.invalid(parameter, &reason))
            }
            (Self::List { element }, Value::Array(items)) => {
                let element_input = Self::from_spec(element);
                items
                    .into_iter()
                    .map(|item| element_input.coerce_value(parameter, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            (Self::List { .. }, Value::String(raw)) => self.parse_value(parameter, &raw),
            (_, other) => Err(self.invalid(
                parameter,
                &format!("unsupported value {other}"),
            )),
        }
    }

    /// Displays a stored value the way the matching input would show it.
    pub fn render_value(&self, value: &Value) -> String {
        match (self, value) {
            (Self::Checkbox, _) => is_truthy(value).to_string(),
            (Self::List { element }, Value::Array(items)) => {
                let element_input = Self::from_spec(element);
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| element_input.render_value(item))
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            (Self::Color, Value::String(raw)) => expand_color(raw).unwrap_or_else(|| raw.clone()),
            (_, Value::String(raw)) => raw.clone(),
            (_, other) => other.to_string(),
        }
    }

    fn parse_number(
        &self,
        parameter: &str,
        raw: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Value, RegistryError> {
        let trimmed = raw.trim();
        let number = if let Ok(integer) = trimmed.parse::<i64>() {
            Number::from(integer)
        } else {
            let float = trimmed
                .parse::<f64>()
                .map_err(|error| self.invalid(parameter, &error.to_string()))?;
            Number::from_f64(float)
                .ok_or_else(|| self.invalid(parameter, "value must be finite"))?
        };
        check_bounds(number.as_f64().unwrap_or(f64::NAN), min, max)
            .map_err(|reason| self.invalid(parameter, &reason))?;
        Ok(Value::Number(number))
    }

    fn invalid(&self, parameter: &str, reason: &str) -> RegistryError {
        RegistryError::InvalidParameterValue {
            parameter: parameter.to_string(),
            input_type: self.type_name().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn check_bounds(value: f64, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if !value.is_finite() {
        return Err("value must be finite".to_string());
    }
    if let Some(min) = min.filter(|min| value < *min) {
        return Err(format!("value {value} is below minimum {min}"));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(format!("value {value} is above maximum {max}"));
    }
    Ok(())
}

fn parse_checkbox(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn short_color() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*#([\da-f])([\da-f])([\da-f])\s*$").expect("valid regex")
    })
}

fn long_color() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\s*#[\da-f]{6}\s*$").expect("valid regex"))
}

/// Expands `#abc` to `#aabbcc`; six-digit colors pass through trimmed.
fn expand_color(raw: &str) -> Option<String> {
    if let Some(captures) = short_color().captures(raw) {
        let channels: String = (1..=3)
            .filter_map(|index| captures.get(index))
            .map(|channel| channel.as_str().repeat(2))
            .collect();
        return Some(format!("#{channels}"));
    }
    long_color()
        .is_match(raw)
        .then(|| raw.trim().to_string())
}

#[derive(Debug, Clone, PartialEq)]
/// Parameter spec paired with its input kind and current value.
pub struct ResolvedParameter {
    pub name: String,
    pub label: String,
    pub input: ParameterInput,
    pub value: Option<Value>,
    pub from_config: bool,
}

impl ResolvedParameter {
    /// Resolves the value shown for `spec`: the config value when set, else the default.
    pub fn resolve(
        require: &str,
        index: usize,
        spec: &ParameterSpec,
        section: Option<&ConfigSection>,
    ) -> Result<Self, RegistryError> {
        let name = spec
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RegistryError::MalformedParameter {
                require: require.to_string(),
                index,
            })?;
        let from_config = section.is_some_and(|section| section.exists(name));
        Ok(Self {
            name: name.to_string(),
            label: spec.label().to_string(),
            input: ParameterInput::from_spec(spec),
            value: match section {
                Some(section) => initial_value(section.data(), spec),
                None => spec.default.clone(),
            },
            from_config,
        })
    }

    pub fn rendered_value(&self) -> String {
        self.value
            .as_ref()
            .map(|value| self.input.render_value(value))
            .unwrap_or_else(|| "(unset)".to_string())
    }
}

/// The configured value at the parameter's dot-path, else its declared default.
pub fn initial_value(section_data: &Value, spec: &ParameterSpec) -> Option<Value> {
    let name = spec.name.as_deref().filter(|name| !name.is_empty())?;
    nbext_config::get(section_data, name)
        .ok()
        .cloned()
        .or_else(|| spec.default.clone())
}
