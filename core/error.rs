use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON Serialization Error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Root Not Found: '{}' does not exist or is not a directory", path.display())]
    RootNotFound { path: PathBuf },

    #[error("Root Inaccessible: Path '{}', Error: {source}", path.display())]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Read Error: Path '{}', Error: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{}', Error: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing extensions: {0}")]
    ExtensionParse(String),

    #[error("WalkDir Error: {0}")]
    WalkDir(String),

    #[error("Pattern Error: {0}")]
    Pattern(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("Clipboard Error: {0}")]
    Clipboard(String),
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Pattern(format!("Regex error: {}", err))
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        AppError::WalkDir(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::TomlParse(err.to_string())
    }
}
