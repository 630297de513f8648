use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Root files copied unencrypted unless the caller says otherwise
pub const DEFAULT_EXCLUDED_FILES: [&str; 3] = ["manifest.json", "pack_icon.png", "bug_pack_icon.png"];

/// Suffix appended to the key file name for the info file
pub const INFO_FILE_SUFFIX: &str = ".info.txt";

/// Input configuration for one encryption run
#[derive(Debug, Clone)]
pub struct EncryptionJob {
    input: PathBuf,
    output: PathBuf,
    key_file: PathBuf,
    master_key: String,
    excluded: HashSet<String>,
}

impl EncryptionJob {
    /// Create a job. The master key is validated when the job runs.
    pub fn new<I, S>(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        key_file: impl Into<PathBuf>,
        master_key: impl Into<String>,
        excluded: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into(),
            output: output.into(),
            key_file: key_file.into(),
            master_key: master_key.into(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    pub fn master_key(&self) -> &str {
        &self.master_key
    }

    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    /// Exact-match test against the exclusion set (root files only)
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// `<key_file>.info.txt`
    pub fn info_file(&self) -> PathBuf {
        let mut name = OsString::from(self.key_file.as_os_str());
        name.push(INFO_FILE_SUFFIX);
        PathBuf::from(name)
    }
}
