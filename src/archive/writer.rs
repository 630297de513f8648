use crate::error::{PackError, Result};
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Output archive writer, every member deflate-compressed
pub struct PackWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PackWriter<W> {
    /// Write into any seekable sink, e.g. a staged temporary file
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Add a directory member with no payload
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        self.zip
            .add_directory(name, self.options)
            .map_err(PackError::ArchiveWrite)
    }

    /// Add a file member
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.zip
            .start_file(name, self.options)
            .map_err(PackError::ArchiveWrite)?;
        self.zip.write_all(data).map_err(PackError::write)
    }

    /// Write the central directory and return the underlying sink
    pub fn finish(self) -> Result<W> {
        self.zip.finish().map_err(PackError::ArchiveWrite)
    }
}
