#![no_main]

use libfuzzer_sys::fuzz_target;
use respack_crypt::{read_index, IndexHeader, INDEX_HEADER_SIZE};

const MASTER_KEY: &str = "FuzzMasterKeyFuzzMasterKey012345";

fuzz_target!(|data: &[u8]| {
    // Header parsing must reject short or foreign blobs without panicking
    if let Ok((header, offset)) = IndexHeader::parse(data) {
        assert!(offset >= INDEX_HEADER_SIZE);
        assert!(offset <= data.len());
        let _ = header.content_id.len();
    }

    // Body decryption yields garbage JSON for random input; only errors are expected
    let _ = read_index(data, MASTER_KEY);
});
