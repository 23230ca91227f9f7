use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
/// Enumerates registry, policy and parameter failures.
pub enum RegistryError {
    #[error("invalid version format '{version}'")]
    InvalidVersionFormat { version: String },
    #[error("nbextension '{require}' declares parameter #{index} without a name")]
    MalformedParameter { require: String, index: usize },
    #[error("invalid value for parameter '{parameter}' ({input_type}): {reason}")]
    InvalidParameterValue {
        parameter: String,
        input_type: String,
        reason: String,
    },
    #[error("unknown nbextension '{0}'")]
    UnknownExtension(String),
    #[error("nbextension '{require}' has no parameter '{parameter}'")]
    UnknownParameter { require: String, parameter: String },
    #[error("nbextension '{0}' provides a descriptor and cannot be forgotten")]
    NotForgettable(String),
    #[error("invalid nbextension descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("invalid filter tag '{0}': expected section:<name> or tag:<name>")]
    InvalidFilterTag(String),
}
