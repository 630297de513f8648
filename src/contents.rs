//! Contents index (`contents.json`)
//!
//! Despite its name, the index is a binary blob:
//!
//! ```text
//! 0x00  version     4 bytes, all zero
//! 0x04  magic       FC B9 CF 9B
//! 0x08  reserved    zero up to 0x10
//! 0x10  id length   1 byte
//! 0x11  content id  UTF-8, zero padded up to 0x100
//! 0x100 body        AES-CFB8({"content": [...]}) under the master key
//! ```
//!
//! A content id longer than 239 bytes pushes the body past 0x100; no padding
//! is added in that case.
//!
//! The body is written with `", "` and `": "` separators and no other
//! whitespace, byte-identical to what existing pack tooling produces.

use crate::cipher;
use crate::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;

/// Member name of an index inside a pack or subpack root
pub const CONTENTS_FILE_NAME: &str = "contents.json";

/// Format version written by this crate
pub const INDEX_VERSION: [u8; 4] = [0, 0, 0, 0];

pub const INDEX_MAGIC: [u8; 4] = [0xFC, 0xB9, 0xCF, 0x9B];

/// Offset of the content id length byte
pub const CONTENT_ID_OFFSET: usize = 0x10;

/// Minimum size of the header region; the encrypted body starts here
pub const INDEX_HEADER_SIZE: usize = 0x100;

/// Maximum content id length in bytes (UTF-8)
pub const MAX_CONTENT_ID_LENGTH: usize = 255;

/// One file of a pack and the key it was encrypted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Path relative to the pack or subpack root
    pub path: String,

    /// `None` (serialized as `null`) for files copied unencrypted
    pub key: Option<String>,
}

impl ContentEntry {
    pub fn encrypted(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: Some(key.into()),
        }
    }

    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }
}

/// JSON body of a contents index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentsIndex {
    pub content: Vec<ContentEntry>,
}

/// Plaintext header of a contents index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: [u8; 4],
    pub content_id: String,
}

impl IndexHeader {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            version: INDEX_VERSION,
            content_id: content_id.into(),
        }
    }

    /// Serialize the header, padded to at least [`INDEX_HEADER_SIZE`] bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let id = self.content_id.as_bytes();
        if id.len() > MAX_CONTENT_ID_LENGTH {
            return Err(PackError::ContentIdTooLong(id.len()));
        }

        let mut buf = Vec::with_capacity(INDEX_HEADER_SIZE);
        buf.extend_from_slice(&self.version);
        buf.extend_from_slice(&INDEX_MAGIC);
        buf.resize(CONTENT_ID_OFFSET, 0);

        buf.push(id.len() as u8);
        buf.extend_from_slice(id);
        if buf.len() < INDEX_HEADER_SIZE {
            buf.resize(INDEX_HEADER_SIZE, 0);
        }

        Ok(buf)
    }

    /// Parse a header, returning it with the offset of the encrypted body
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < INDEX_HEADER_SIZE {
            return Err(PackError::InvalidIndex(format!(
                "index is {} bytes, header needs {}",
                data.len(),
                INDEX_HEADER_SIZE
            )));
        }

        if data[4..8] != INDEX_MAGIC {
            return Err(PackError::InvalidMagic);
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[..4]);
        if version != INDEX_VERSION {
            return Err(PackError::InvalidIndex(format!(
                "unsupported version {:02x?}",
                version
            )));
        }

        let id_len = data[CONTENT_ID_OFFSET] as usize;
        let id_start = CONTENT_ID_OFFSET + 1;
        let id_end = id_start + id_len;
        let id_bytes = data.get(id_start..id_end).ok_or_else(|| {
            PackError::InvalidIndex(format!("content id of {} bytes is truncated", id_len))
        })?;
        let content_id = String::from_utf8(id_bytes.to_vec())
            .map_err(|e| PackError::InvalidIndex(format!("content id is not UTF-8: {}", e)))?;

        Ok((Self { version, content_id }, id_end.max(INDEX_HEADER_SIZE)))
    }
}

/// Single-line JSON with a space after every `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn encode_body(index: &ContentsIndex) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, SpacedFormatter);
    index.serialize(&mut serializer)?;
    Ok(body)
}

/// Build a contents index blob for `entries`, encrypted under `master_key`
pub fn build_index(content_id: &str, master_key: &str, entries: &[ContentEntry]) -> Result<Vec<u8>> {
    let mut blob = IndexHeader::new(content_id).to_bytes()?;

    let body = encode_body(&ContentsIndex {
        content: entries.to_vec(),
    })?;
    blob.extend_from_slice(&cipher::encrypt(&body, master_key)?);

    Ok(blob)
}

/// Parse and decrypt a contents index blob
pub fn read_index(data: &[u8], master_key: &str) -> Result<(IndexHeader, ContentsIndex)> {
    let (header, body_offset) = IndexHeader::parse(data)?;
    let body = cipher::decrypt(&data[body_offset..], master_key)?;
    let index: ContentsIndex = serde_json::from_slice(&body)?;
    Ok((header, index))
}
