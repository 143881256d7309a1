use thiserror::Error;

/// Top-level error type for the Morse decoder.
///
/// Only construction, configuration and I/O at the edges can fail. Once a
/// decoder is running, malformed key input and untranslatable symbols are
/// recovered locally and never surface as an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecoderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DecoderError {
    fn from(err: toml::de::Error) -> Self {
        DecoderError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DecoderError {
    fn from(err: toml::ser::Error) -> Self {
        DecoderError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DecoderError {
    fn from(err: serde_json::Error) -> Self {
        DecoderError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for decoder operations.
pub type Result<T> = std::result::Result<T, DecoderError>;
