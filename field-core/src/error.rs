use crate::color::ParseColorError;
use thiserror::Error;

/// Errors raised while building or loading a [`crate::config::FieldConfig`].
///
/// The engine itself never fails: it accepts any configuration and degrades
/// quietly. These errors only surface where a host asks for validation.
#[derive(Error, Debug)]
pub enum FieldError {
    /// A numeric parameter is outside its usable range.
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    /// The tint color is not a 3- or 6-digit hex string.
    #[error("invalid color: {0}")]
    Color(#[from] ParseColorError),

    /// The configuration document could not be deserialized.
    #[error("failed to parse field config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read field config: {0}")]
    Io(#[from] std::io::Error),
}
