use std::path::PathBuf;

/// Failures of the acquisition pipeline.
///
/// Resolver and fetcher return these as values; [`crate::Pipeline`] is the
/// boundary that logs them and carries on with its fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Location not found: no geocoding match for '{query}'")]
    NotFound { query: String },

    #[error("{}", provider_message(*status, message))]
    Provider { status: Option<u16>, message: String },

    #[error("Forecast provider returned no data")]
    NoData,

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Persisted document {} could not be parsed: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Provider {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedResponse(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status carried by a provider error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Provider { status, .. } => *status,
            _ => None,
        }
    }
}

fn provider_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Request failed with status code {code}: {message}"),
        None => format!("Provider request failed: {message}"),
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
