//! Pack manifest lookup
//!
//! Only `header.uuid` is read from the pack's `manifest.json`. It becomes the
//! content id of every contents index written for the pack. The lookup is
//! best-effort: any failure yields [`NIL_UUID`].

use crate::archive::PackReader;
use serde::Deserialize;
use std::io::{Read, Seek};
use tracing::{debug, warn};

/// Content id used when no usable manifest exists
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Deserialize)]
struct PackManifest {
    header: ManifestHeader,
}

#[derive(Debug, Deserialize)]
struct ManifestHeader {
    uuid: String,
}

/// Pick the manifest closest to the pack root.
///
/// Candidates are members ending in `manifest.json`; fewest `/` wins, then
/// the shortest name. Ties keep archive order.
pub fn find_manifest_member<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| name.ends_with(MANIFEST_FILE_NAME))
        .min_by_key(|name| (name.matches('/').count(), name.len()))
}

/// Extract `header.uuid` from manifest bytes
pub fn parse_uuid(data: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(data).ok()?;
    let manifest: PackManifest = serde_json::from_str(text).ok()?;
    Some(manifest.header.uuid)
}

/// Resolve the pack UUID, falling back to [`NIL_UUID`]
pub fn read_uuid<R: Read + Seek>(reader: &mut PackReader<R>) -> String {
    let Some(name) = find_manifest_member(reader.member_names()).map(str::to_string) else {
        debug!("no manifest.json in archive");
        return NIL_UUID.to_string();
    };

    let data = match reader.read(&name) {
        Ok(data) => data,
        Err(e) => {
            warn!(manifest = %name, error = %e, "manifest unreadable, using nil uuid");
            return NIL_UUID.to_string();
        }
    };

    match parse_uuid(&data) {
        Some(uuid) => uuid,
        None => {
            warn!(manifest = %name, "manifest has no header.uuid, using nil uuid");
            NIL_UUID.to_string()
        }
    }
}
