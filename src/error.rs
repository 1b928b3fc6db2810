//! Error types for the stabilization core

use thiserror::Error;

/// Result type alias for stabilization operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Container or raw stream error
    #[error("Format error: {0}")]
    Format(String),

    /// Fatal setup error naming the offending parameter
    #[error("Configuration error ({param}): {message}")]
    Config {
        param: &'static str,
        message: String,
    },

    /// Unsupported pixel format or feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid pipeline state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Fatal failure while analysing a frame
    #[error("Frame {index}: {source}")]
    Frame {
        index: u64,
        #[source]
        source: Box<Error>,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// End of stream
    #[error("End of stream")]
    EndOfStream,

    /// Library initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

impl Error {
    /// Create a format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a configuration error for `param`
    pub fn config<S: Into<String>>(param: &'static str, msg: S) -> Self {
        Error::Config {
            param,
            message: msg.into(),
        }
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Wrap an error raised while processing frame `index`
    pub fn in_frame(index: u64, source: Error) -> Self {
        Error::Frame {
            index,
            source: Box::new(source),
        }
    }

    /// Whether this error was raised during setup rather than per frame
    pub fn is_setup(&self) -> bool {
        matches!(self, Error::Config { .. } | Error::Unsupported(_) | Error::Io(_))
    }
}
