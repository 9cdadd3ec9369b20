use thiserror::Error;

/// Errors raised while building or loading scroll settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A value was present but out of range.
    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },

    /// A value could not be parsed from its textual form.
    #[error("Could not parse setting '{key}' from value '{value}'")]
    Parse { key: &'static str, value: String },
}
