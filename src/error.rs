use thiserror::Error;

/// Crate-wide error type.
///
/// Proxies never return this for data-quality problems (those become undefined
/// outcomes); it is reserved for contract violations on inputs, bad
/// configuration and I/O at the edges.
#[derive(Debug, Error)]
pub enum NumaxError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("regression model error: {0}")]
    Model(String),
}

impl NumaxError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code used by the `numax` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            NumaxError::InvalidConfig(_)
            | NumaxError::Io { .. }
            | NumaxError::Csv(_)
            | NumaxError::Json(_) => 2,
            NumaxError::InvalidInput(_) => 3,
            NumaxError::Model(_) => 4,
        }
    }
}
