//! respack-crypt: resource pack encryption
//!
//! Repackages a resource pack ZIP into an encrypted distributable archive:
//! - Every root file outside the exclusion set, and every subpack file, is
//!   encrypted with AES-256-CFB8 under its own random 32-character key
//! - Each pack and subpack root gets a `contents.json` index listing the
//!   per-file keys, itself encrypted under a master key
//! - The master key is written to a separate key file, with an info file
//!   naming the pack UUID and output archive
//!
//! # Example
//!
//! ```no_run
//! use respack_crypt::{EncryptorConfig, PackEncryptor, generate_key};
//! use std::path::Path;
//!
//! let config = EncryptorConfig::default();
//! let job = config.job_for(Path::new("forest.zip"), Path::new("out"), generate_key());
//! let report = PackEncryptor::new(job).run()?;
//! println!("key file: {}", report.key_file.display());
//! # Ok::<(), respack_crypt::PackError>(())
//! ```

// Core modules
pub mod archive;
pub mod cipher;
pub mod config;
pub mod contents;
pub mod encryptor;
pub mod error;
pub mod job;
pub mod keys;
pub mod manifest;
pub mod progress;

// Re-export commonly used types
pub use archive::{PackLayout, PackReader, PackWriter, SubpackGroup};
pub use config::{EncryptorConfig, LoggingConfig, PackConfig};
pub use contents::{
    build_index, read_index, ContentEntry, ContentsIndex, IndexHeader, CONTENTS_FILE_NAME,
    INDEX_HEADER_SIZE, INDEX_MAGIC, INDEX_VERSION, MAX_CONTENT_ID_LENGTH,
};
pub use encryptor::{EncryptionReport, PackEncryptor};
pub use error::{PackError, Result};
pub use job::{EncryptionJob, DEFAULT_EXCLUDED_FILES};
pub use keys::{generate_key, KEY_LENGTH};
pub use manifest::{read_uuid, NIL_UUID};
pub use progress::{CancelToken, Phase, Progress};
