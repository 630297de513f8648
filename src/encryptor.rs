//! Pack encryption pipeline
//!
//! A run copies directory members, encrypts every root file not in the
//! exclusion set and every subpack file under a fresh per-file key, and writes
//! one contents index for the pack plus one per subpack. The archive, key file
//! and info file are staged as temporary siblings of their targets and renamed
//! into place only once all three are complete, so a failed or cancelled run
//! leaves existing outputs untouched.
//!
//! ```no_run
//! use respack_crypt::{generate_key, EncryptionJob, PackEncryptor, DEFAULT_EXCLUDED_FILES};
//!
//! let job = EncryptionJob::new(
//!     "forest.zip",
//!     "forest_encrypted.zip",
//!     "forest.zip.key",
//!     generate_key(),
//!     DEFAULT_EXCLUDED_FILES,
//! );
//! let report = PackEncryptor::new(job)
//!     .with_progress(|p| println!("{}/{} {}", p.completed, p.total, p.label()))
//!     .run()?;
//! println!("pack {} done", report.uuid);
//! # Ok::<(), respack_crypt::PackError>(())
//! ```

use crate::archive::{PackLayout, PackReader, PackWriter};
use crate::cipher;
use crate::contents::{build_index, ContentEntry, CONTENTS_FILE_NAME, MAX_CONTENT_ID_LENGTH};
use crate::error::{PackError, Result};
use crate::job::EncryptionJob;
use crate::keys::{generate_key, validate_master_key};
use crate::manifest;
use crate::progress::{CancelToken, LogFn, Phase, Progress, ProgressFn};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct EncryptionReport {
    pub uuid: String,
    pub output: PathBuf,
    pub key_file: PathBuf,
    pub info_file: PathBuf,
    pub directories: usize,
    pub encrypted_files: usize,
    pub copied_files: usize,
    pub subpacks: usize,
}

/// Position of a run, for progress events and cancellation logs
struct RunState {
    phase: Phase,
    completed: usize,
    total: usize,
}

/// Orchestrates one encryption run over an [`EncryptionJob`]
pub struct PackEncryptor {
    job: EncryptionJob,
    log: Option<LogFn>,
    progress: Option<ProgressFn>,
    cancel: CancelToken,
}

impl PackEncryptor {
    pub fn new(job: EncryptionJob) -> Self {
        Self {
            job,
            log: None,
            progress: None,
            cancel: CancelToken::new(),
        }
    }

    /// Receive human-readable log lines
    pub fn with_log(mut self, log: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    /// Receive `(completed, total, phase)` after every unit of work
    pub fn with_progress(mut self, progress: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Stop cooperatively once `token` is cancelled
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn job(&self) -> &EncryptionJob {
        &self.job
    }

    /// Run the pipeline to completion.
    ///
    /// On any error (including [`PackError::Cancelled`]) the staged files are
    /// removed and nothing at the output, key file or info file paths changes.
    pub fn run(self) -> Result<EncryptionReport> {
        let job = &self.job;
        let mut state = RunState {
            phase: Phase::Initializing,
            completed: 0,
            total: 0,
        };

        // Fail before any I/O
        validate_master_key(job.master_key())?;

        let mut reader = PackReader::open(job.input())?;
        let uuid = manifest::read_uuid(&mut reader);
        info!(uuid = %uuid, input = %job.input().display(), "manifest uuid resolved");
        self.log(&format!("Manifest UUID: {}", uuid));
        if uuid.len() > MAX_CONTENT_ID_LENGTH {
            return Err(PackError::ContentIdTooLong(uuid.len()));
        }

        let staged_archive = stage_beside(job.output()).map_err(PackError::write)?;
        let mut writer = PackWriter::new(BufWriter::new(staged_archive));

        state.phase = Phase::ClassifyingArchive;
        let layout = PackLayout::classify(reader.member_names());
        state.total = layout.total_units();
        debug!(
            directories = layout.directories.len(),
            root_files = layout.root_files.len(),
            subpacks = layout.subpacks.len(),
            "archive classified"
        );

        for dir in &layout.directories {
            self.checkpoint(&state)?;
            writer.add_directory(dir)?;
        }

        for name in &layout.orphans {
            warn!(path = %name, "member outside any subpack root, skipped");
            self.log(&format!("Skipped: {}", name));
        }

        let mut report = EncryptionReport {
            uuid: uuid.clone(),
            output: job.output().to_path_buf(),
            key_file: job.key_file().to_path_buf(),
            info_file: job.info_file(),
            directories: layout.directories.len(),
            encrypted_files: 0,
            copied_files: 0,
            subpacks: layout.subpacks.len(),
        };

        state.phase = Phase::EncryptingRootFiles;
        self.log(&format!("Processing {} root files", layout.root_files.len()));

        let mut root_entries = Vec::with_capacity(layout.root_files.len());
        for name in &layout.root_files {
            self.checkpoint(&state)?;
            let data = reader.read(name)?;

            let entry = if job.is_excluded(name) {
                writer.add_file(name, &data)?;
                report.copied_files += 1;
                debug!(path = %name, "copied");
                self.log(&format!("Copied: {}", name));
                ContentEntry::plain(name.as_str())
            } else {
                let key = self.encrypt_member(&mut writer, name, &data)?;
                report.encrypted_files += 1;
                ContentEntry::encrypted(name.as_str(), key)
            };

            root_entries.push(entry);
            self.advance(&mut state);
        }

        state.phase = Phase::WritingRootIndex;
        self.checkpoint(&state)?;
        self.write_index(&mut writer, CONTENTS_FILE_NAME, &uuid, &root_entries)?;
        self.advance(&mut state);

        for (i, group) in layout.subpacks.iter().enumerate() {
            state.phase = Phase::EncryptingSubpack(i);
            self.checkpoint(&state)?;
            self.log(&format!(
                "Processing subpack {} ({} files)",
                group.root,
                group.files.len()
            ));

            // Exclusions never apply inside subpacks
            let mut entries = Vec::with_capacity(group.files.len());
            for name in &group.files {
                self.checkpoint(&state)?;
                let data = reader.read(name)?;
                let key = self.encrypt_member(&mut writer, name, &data)?;
                report.encrypted_files += 1;
                entries.push(ContentEntry::encrypted(group.relative_path(name), key));
                self.advance(&mut state);
            }

            state.phase = Phase::WritingSubpackIndex(i);
            self.checkpoint(&state)?;
            self.write_index(&mut writer, &group.index_path(), &uuid, &entries)?;
            self.advance(&mut state);
        }

        state.phase = Phase::FinalizingOutputs;
        self.checkpoint(&state)?;
        let archive = writer
            .finish()?
            .into_inner()
            .map_err(|e| PackError::write(e.into_error()))?;
        drop(reader);

        let output_name = job
            .output()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key_file = stage_file(job.key_file(), job.master_key().as_bytes())?;
        let info_file = stage_file(
            &report.info_file,
            format!("UUID: {}\nEncrypted file: {}\n", uuid, output_name).as_bytes(),
        )?;

        // Archive first: a key file never replaces the key of an older archive alone
        commit(archive, job.output())?;
        commit(key_file, job.key_file())?;
        commit(info_file, &report.info_file)?;

        state.phase = Phase::Done;
        self.emit_progress(&state);
        info!(
            output = %report.output.display(),
            encrypted = report.encrypted_files,
            copied = report.copied_files,
            subpacks = report.subpacks,
            "pack encrypted"
        );
        self.log("Done");
        self.log(&format!("Output archive: {}", output_name));
        self.log(&format!("Key file: {}", report.key_file.display()));
        self.log(&format!("Info file: {}", report.info_file.display()));

        Ok(report)
    }

    /// Encrypt one member under a fresh key and write it under its own name
    fn encrypt_member<W: Write + Seek>(
        &self,
        writer: &mut PackWriter<W>,
        name: &str,
        data: &[u8],
    ) -> Result<String> {
        let key = generate_key();
        let ciphertext = cipher::encrypt(data, &key)?;
        writer.add_file(name, &ciphertext)?;
        debug!(path = %name, bytes = data.len(), "encrypted");
        self.log(&format!("Encrypted: {}", name));
        Ok(key)
    }

    fn write_index<W: Write + Seek>(
        &self,
        writer: &mut PackWriter<W>,
        path: &str,
        uuid: &str,
        entries: &[ContentEntry],
    ) -> Result<()> {
        let blob = build_index(uuid, self.job.master_key(), entries)?;
        writer.add_file(path, &blob)?;
        debug!(path = %path, entries = entries.len(), "contents index written");
        self.log(&format!("Wrote {}", path));
        Ok(())
    }

    fn checkpoint(&self, state: &RunState) -> Result<()> {
        if self.cancel.is_cancelled() {
            info!(phase = %state.phase, completed = state.completed, "run cancelled");
            self.log("Cancelled");
            return Err(PackError::Cancelled);
        }
        Ok(())
    }

    fn advance(&self, state: &mut RunState) {
        state.completed += 1;
        self.emit_progress(state);
    }

    fn emit_progress(&self, state: &RunState) {
        if let Some(cb) = &self.progress {
            cb(&Progress {
                completed: state.completed,
                total: state.total,
                phase: state.phase,
            });
        }
    }

    fn log(&self, line: &str) {
        if let Some(cb) = &self.log {
            cb(line);
        }
    }
}

/// Create an empty temporary file in the directory `target` will live in
fn stage_beside(target: &Path) -> io::Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".respack-")
        .suffix(".tmp")
        .tempfile_in(dir)
}

/// Stage `data` for `target`; I/O errors are attributed to `target`
fn stage_file(target: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let mut staged = stage_beside(target).map_err(|e| PackError::file_system(target, e))?;
    staged
        .write_all(data)
        .and_then(|_| staged.flush())
        .map_err(|e| PackError::file_system(target, e))?;
    Ok(staged)
}

/// Atomically replace `target` with a staged file
fn commit(staged: NamedTempFile, target: &Path) -> Result<()> {
    staged
        .persist(target)
        .map_err(|e| PackError::file_system(target, e.error))?;
    Ok(())
}
