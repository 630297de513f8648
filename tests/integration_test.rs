//! End-to-end tests for pack encryption

use respack_crypt::cipher::decrypt;
use respack_crypt::{
    read_index, ContentEntry, EncryptionJob, PackEncryptor, Phase, Progress,
    DEFAULT_EXCLUDED_FILES, NIL_UUID,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const MASTER_KEY: &str = "M4sterKeyM4sterKeyM4sterKey12345";
const PACK_UUID: &str = "5c1f3a2e-8d4b-4f6a-9e7c-1b2d3e4f5a6b";

/// Helper: Write a ZIP with the given members (names ending in `/` become directories)
fn write_pack(path: &Path, members: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in members {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Helper: Read every member of an output archive, in order
fn read_members(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

fn member<'a>(members: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    members
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, d)| d.as_slice())
        .unwrap_or_else(|| panic!("missing member {}", name))
}

fn manifest_json() -> Vec<u8> {
    format!(
        r#"{{"format_version": 2, "header": {{"name": "Alt Pack", "uuid": "{}", "version": [1, 0, 0]}}}}"#,
        PACK_UUID
    )
    .into_bytes()
}

fn job_in(dir: &TempDir, excluded: &[&str]) -> EncryptionJob {
    EncryptionJob::new(
        dir.path().join("pack.zip"),
        dir.path().join("pack_encrypted.zip"),
        dir.path().join("pack.zip.key"),
        MASTER_KEY,
        excluded.iter().copied(),
    )
}

#[test]
fn test_end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let manifest = manifest_json();
    let icon = b"\x89PNG\r\n\x1a\nicon".to_vec();
    let x_png = b"root texture x".repeat(50);
    let sub_manifest = br#"{"header": {"uuid": "sub"}}"#.to_vec();
    let y_png = b"subpack texture y".repeat(20);

    write_pack(
        &dir.path().join("pack.zip"),
        &[
            ("manifest.json", &manifest),
            ("pack_icon.png", &icon),
            ("textures/x.png", &x_png),
            ("subpacks/alt/manifest.json", &sub_manifest),
            ("subpacks/alt/textures/y.png", &y_png),
        ],
    );

    let job = job_in(&dir, &["manifest.json", "pack_icon.png"]);
    let report = PackEncryptor::new(job).run().unwrap();

    assert_eq!(report.uuid, PACK_UUID);
    assert_eq!(report.copied_files, 2);
    assert_eq!(report.encrypted_files, 3);
    assert_eq!(report.subpacks, 1);

    let out = read_members(&dir.path().join("pack_encrypted.zip"));
    let names: Vec<&str> = out.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "manifest.json",
            "pack_icon.png",
            "textures/x.png",
            "contents.json",
            "subpacks/alt/manifest.json",
            "subpacks/alt/textures/y.png",
            "subpacks/alt/contents.json",
        ]
    );

    // Excluded files are copied verbatim
    assert_eq!(member(&out, "manifest.json"), &manifest[..]);
    assert_eq!(member(&out, "pack_icon.png"), &icon[..]);

    // Root index
    let (header, root) = read_index(member(&out, "contents.json"), MASTER_KEY).unwrap();
    assert_eq!(header.content_id, PACK_UUID);
    assert_eq!(root.content.len(), 3);
    assert_eq!(root.content[0], ContentEntry::plain("manifest.json"));
    assert_eq!(root.content[1], ContentEntry::plain("pack_icon.png"));
    assert_eq!(root.content[2].path, "textures/x.png");

    let x_key = root.content[2].key.as_deref().unwrap();
    assert_eq!(x_key.len(), 32);
    let x_cipher = member(&out, "textures/x.png");
    assert_eq!(x_cipher.len(), x_png.len());
    assert_ne!(x_cipher, &x_png[..]);
    assert_eq!(decrypt(x_cipher, x_key).unwrap(), x_png);

    // Subpack index: exclusions never apply, paths are relative to the subpack root
    let (sub_header, sub) =
        read_index(member(&out, "subpacks/alt/contents.json"), MASTER_KEY).unwrap();
    assert_eq!(sub_header.content_id, PACK_UUID);
    let paths: Vec<&str> = sub.content.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["manifest.json", "textures/y.png"]);
    assert!(sub.content.iter().all(ContentEntry::is_encrypted));

    let sub_manifest_key = sub.content[0].key.as_deref().unwrap();
    assert_eq!(
        decrypt(member(&out, "subpacks/alt/manifest.json"), sub_manifest_key).unwrap(),
        sub_manifest
    );
    let y_key = sub.content[1].key.as_deref().unwrap();
    assert_eq!(
        decrypt(member(&out, "subpacks/alt/textures/y.png"), y_key).unwrap(),
        y_png
    );

    // Key file holds the raw master key, no newline
    let key_bytes = std::fs::read(dir.path().join("pack.zip.key")).unwrap();
    assert_eq!(key_bytes.len(), 32);
    assert_eq!(key_bytes, MASTER_KEY.as_bytes());

    let info = std::fs::read_to_string(dir.path().join("pack.zip.key.info.txt")).unwrap();
    assert_eq!(
        info,
        format!("UUID: {}\nEncrypted file: pack_encrypted.zip\n", PACK_UUID)
    );
}

#[test]
fn test_directories_copied_and_unlisted() {
    let dir = TempDir::new().unwrap();
    write_pack(
        &dir.path().join("pack.zip"),
        &[
            ("textures/", b""),
            ("textures/a.png", b"aaaa"),
            ("subpacks/", b""),
            ("subpacks/swamp/", b""),
            ("subpacks/swamp/textures/", b""),
            ("subpacks/swamp/textures/a.png", b"swamp a"),
        ],
    );

    let report = PackEncryptor::new(job_in(&dir, &DEFAULT_EXCLUDED_FILES))
        .run()
        .unwrap();
    assert_eq!(report.directories, 4);
    assert_eq!(report.uuid, NIL_UUID);

    let out = read_members(&dir.path().join("pack_encrypted.zip"));
    for d in ["textures/", "subpacks/", "subpacks/swamp/", "subpacks/swamp/textures/"] {
        assert!(member(&out, d).is_empty());
    }

    let (header, root) = read_index(member(&out, "contents.json"), MASTER_KEY).unwrap();
    assert_eq!(header.content_id, NIL_UUID);
    assert_eq!(root.content.len(), 1);
    assert_eq!(root.content[0].path, "textures/a.png");

    let (_, swamp) = read_index(member(&out, "subpacks/swamp/contents.json"), MASTER_KEY).unwrap();
    assert_eq!(swamp.content.len(), 1);
    assert_eq!(swamp.content[0].path, "textures/a.png");
}

#[test]
fn test_every_entry_gets_fresh_key() {
    let dir = TempDir::new().unwrap();
    let files: Vec<(String, Vec<u8>)> = (0..20)
        .map(|i| (format!("data/file{}.json", i), b"same bytes".to_vec()))
        .collect();
    let members: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    write_pack(&dir.path().join("pack.zip"), &members);

    PackEncryptor::new(job_in(&dir, &[])).run().unwrap();

    let out = read_members(&dir.path().join("pack_encrypted.zip"));
    let (_, root) = read_index(member(&out, "contents.json"), MASTER_KEY).unwrap();
    let keys: HashSet<&str> = root
        .content
        .iter()
        .map(|e| e.key.as_deref().unwrap())
        .collect();
    assert_eq!(keys.len(), 20);
    assert!(!keys.contains(MASTER_KEY));

    // Identical plaintexts encrypt differently under independent keys
    let ciphertexts: HashSet<&[u8]> = (0..20)
        .map(|i| member(&out, &format!("data/file{}.json", i)))
        .collect();
    assert_eq!(ciphertexts.len(), 20);
}

#[test]
fn test_progress_and_log_events() {
    let dir = TempDir::new().unwrap();
    let manifest = manifest_json();
    write_pack(
        &dir.path().join("pack.zip"),
        &[
            ("manifest.json", &manifest),
            ("a.txt", b"a"),
            ("subpacks/one/", b""),
            ("subpacks/one/b.txt", b"b"),
            ("subpacks/two/", b""),
            ("subpacks/two/c.txt", b"c"),
            ("subpacks/two/d.txt", b"d"),
        ],
    );

    let events: Arc<Mutex<Vec<Progress>>> = Arc::default();
    let lines: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = events.clone();
    let log_sink = lines.clone();

    PackEncryptor::new(job_in(&dir, &DEFAULT_EXCLUDED_FILES))
        .with_progress(move |p| sink.lock().unwrap().push(*p))
        .with_log(move |line| log_sink.lock().unwrap().push(line.to_string()))
        .run()
        .unwrap();

    let events = events.lock().unwrap();
    // 2 root files + 3 subpack files + 1 root index + 2 subpack indexes
    assert!(events.iter().all(|p| p.total == 8));
    let completed: Vec<usize> = events.iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![1, 2, 3, 4, 5, 6, 7, 8, 8]);

    let phases: Vec<Phase> = events.iter().map(|p| p.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::EncryptingRootFiles,
            Phase::EncryptingRootFiles,
            Phase::WritingRootIndex,
            Phase::EncryptingSubpack(0),
            Phase::WritingSubpackIndex(0),
            Phase::EncryptingSubpack(1),
            Phase::EncryptingSubpack(1),
            Phase::WritingSubpackIndex(1),
            Phase::Done,
        ]
    );
    assert_eq!(events[2].label(), "writing metadata");

    let lines = lines.lock().unwrap();
    assert_eq!(lines[0], format!("Manifest UUID: {}", PACK_UUID));
    assert!(lines.contains(&"Copied: manifest.json".to_string()));
    assert!(lines.contains(&"Encrypted: subpacks/two/d.txt".to_string()));
    assert_eq!(lines.iter().filter(|l| *l == "Done").count(), 1);
}

#[test]
fn test_exclusion_does_not_reach_subpacks() {
    let dir = TempDir::new().unwrap();
    let icon = b"icon bytes".to_vec();
    write_pack(
        &dir.path().join("pack.zip"),
        &[
            ("pack_icon.png", &icon),
            ("subpacks/alt/", b""),
            ("subpacks/alt/pack_icon.png", &icon),
        ],
    );

    PackEncryptor::new(job_in(&dir, &DEFAULT_EXCLUDED_FILES))
        .run()
        .unwrap();

    let out = read_members(&dir.path().join("pack_encrypted.zip"));
    assert_eq!(member(&out, "pack_icon.png"), &icon[..]);
    assert_ne!(member(&out, "subpacks/alt/pack_icon.png"), &icon[..]);

    let (_, sub) = read_index(member(&out, "subpacks/alt/contents.json"), MASTER_KEY).unwrap();
    assert!(sub.content[0].is_encrypted());
}

#[test]
fn test_manifest_errors_fall_back_to_nil_uuid() {
    let dir = TempDir::new().unwrap();
    write_pack(
        &dir.path().join("pack.zip"),
        &[("manifest.json", b"{ this is not json"), ("a.txt", b"a")],
    );

    let report = PackEncryptor::new(job_in(&dir, &[])).run().unwrap();
    assert_eq!(report.uuid, NIL_UUID);

    let info = std::fs::read_to_string(report.info_file).unwrap();
    assert!(info.starts_with(&format!("UUID: {}\n", NIL_UUID)));
}

#[test]
fn test_rerun_overwrites_outputs() {
    let dir = TempDir::new().unwrap();
    write_pack(&dir.path().join("pack.zip"), &[("a.txt", b"a")]);

    let first = PackEncryptor::new(job_in(&dir, &[])).run().unwrap();
    let second = PackEncryptor::new(job_in(&dir, &[])).run().unwrap();
    assert_eq!(first.output, second.output);

    let out = read_members(&dir.path().join("pack_encrypted.zip"));
    let names: Vec<&str> = out.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "contents.json"]);
}
