use crate::error::{PackError, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Input archive reader preserving member enumeration order
pub struct PackReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    names: Vec<String>,
}

impl PackReader<BufReader<File>> {
    /// Open a ZIP archive on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(PackError::read)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> PackReader<R> {
    /// Wrap any seekable ZIP source
    pub fn new(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).map_err(PackError::ArchiveRead)?;

        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(PackError::ArchiveRead)?;
            names.push(entry.name().to_string());
        }

        Ok(Self { archive, names })
    }

    /// Member names in archive order
    pub fn member_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Read a member's full (decompressed) payload
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name).map_err(PackError::ArchiveRead)?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data).map_err(PackError::read)?;
        Ok(data)
    }
}
