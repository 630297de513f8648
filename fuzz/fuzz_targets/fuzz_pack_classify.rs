#![no_main]

use libfuzzer_sys::fuzz_target;
use respack_crypt::{PackEncryptor, EncryptionJob, PackLayout};
use std::io::Write;
use tempfile::TempDir;

const MASTER_KEY: &str = "FuzzMasterKeyFuzzMasterKey012345";

fuzz_target!(|data: &[u8]| {
    // Member names: one per line
    if let Ok(text) = std::str::from_utf8(data) {
        let names: Vec<&str> = text.lines().collect();
        let layout = PackLayout::classify(&names);
        let placed = layout.directories.len()
            + layout.root_files.len()
            + layout.subpack_file_count()
            + layout.orphans.len();
        assert_eq!(placed, names.len());
    }

    // Arbitrary bytes as an input archive: every failure is a returned error
    let dir = match TempDir::new() {
        Ok(d) => d,
        Err(_) => return,
    };
    let input = dir.path().join("pack.zip");
    let mut file = match std::fs::File::create(&input) {
        Ok(f) => f,
        Err(_) => return,
    };
    if file.write_all(data).is_err() {
        return;
    }
    drop(file);

    let job = EncryptionJob::new(
        &input,
        dir.path().join("pack_encrypted.zip"),
        dir.path().join("pack.zip.key"),
        MASTER_KEY,
        ["manifest.json"],
    );
    let _ = PackEncryptor::new(job).run();
});
