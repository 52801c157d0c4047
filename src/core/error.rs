use std::{fmt, path::PathBuf};

use super::host::ClientLanguage;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    JsonParseError(serde_json::Error),
    DataFileNotFound(PathBuf),
    PluginDirUnknown,
    SheetUnavailable(ClientLanguage),
    AllocationFailed(usize),
    ListenerRegistration(String)
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(error) => {
                write!(f, "I/O error: {}", error)
            }
            Error::JsonParseError(error) => {
                write!(f, "Failed to parse JSON: {}", error)
            }
            Error::DataFileNotFound(path) => {
                write!(f, "Data file not found: {}", path.display())
            }
            Error::PluginDirUnknown => {
                write!(f, "Unable to determine plugin directory")
            }
            Error::SheetUnavailable(language) => {
                write!(f, "Action sheet unavailable for language: {}", language)
            }
            Error::AllocationFailed(size) => {
                write!(f, "Failed to allocate {} bytes for node text", size)
            }
            Error::ListenerRegistration(addon_name) => {
                write!(f, "Failed to register listener for addon: {}", addon_name)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonParseError(e)
    }
}
