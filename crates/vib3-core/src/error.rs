use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A document's `type` tag did not match what the importer expects.
    InvalidFormat { expected: String, found: String },
    Malformed(String),
    EmptyScenes,
    UnknownPreset(String),
    BuiltinPresetName(String),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFormat { expected, found } => {
                write!(f, "invalid format: expected {expected:?}, found {found:?}")
            }
            Error::Malformed(msg) => write!(f, "malformed document: {msg}"),
            Error::EmptyScenes => write!(f, "choreography has no scenes"),
            Error::UnknownPreset(name) => write!(f, "unknown preset: {name}"),
            Error::BuiltinPresetName(name) => {
                write!(f, "{name:?} is a built-in preset and cannot be replaced")
            }
            Error::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Check a document's `type` tag before anything else is read from it.
pub(crate) fn check_format(expected: &str, found: &str) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}
