use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Result type for pack encryption operations
pub type Result<T> = std::result::Result<T, PackError>;

/// Unified error type for all pack encryption operations
#[derive(Debug, Error)]
pub enum PackError {
    // Validation errors
    #[error("Master key must be {expected} bytes, got {actual}")]
    InvalidMasterKeyLength { expected: usize, actual: usize },

    #[error("Content id too long: {0} bytes (max 255)")]
    ContentIdTooLong(usize),

    #[error("Invalid cipher key: {0}")]
    InvalidCipherKey(String),

    // Archive errors
    #[error("Archive read error: {0}")]
    ArchiveRead(#[source] ZipError),

    #[error("Archive write error: {0}")]
    ArchiveWrite(#[source] ZipError),

    // Contents index errors
    #[error("Invalid contents index: {0}")]
    InvalidIndex(String),

    #[error("Invalid magic number in contents index header")]
    InvalidMagic,

    // I/O errors
    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl PackError {
    /// Wrap an I/O error raised while reading the input archive
    pub fn read(err: impl Into<ZipError>) -> Self {
        PackError::ArchiveRead(err.into())
    }

    /// Wrap an I/O error raised while writing the output archive
    pub fn write(err: impl Into<ZipError>) -> Self {
        PackError::ArchiveWrite(err.into())
    }

    pub fn file_system(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PackError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// True for a user-initiated stop rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PackError::Cancelled)
    }
}

impl From<toml::de::Error> for PackError {
    fn from(err: toml::de::Error) -> Self {
        PackError::Config(err.to_string())
    }
}
