#![no_main]

use std::io::Write;

use labelpack_core::SegmentLayout;
use labelpack_storage::FileReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary files to the indexer. Broken chains, links past EOF and
    // bad record headers must surface as errors.
    let Ok(mut file) = tempfile::NamedTempFile::new() else {
        return;
    };
    if file.write_all(data).is_err() || file.flush().is_err() {
        return;
    }

    let layout = SegmentLayout { capacity: 4, align: 64 };
    let Ok(mut reader) = FileReader::open_with_layout(file.path(), layout) else {
        return;
    };

    if let Ok(locators) = reader.scan() {
        for loc in locators.iter().take(64) {
            assert!(loc.end() <= reader.len());
            let _ = reader.read_record(loc);
        }
    }
    let _ = reader.segments();
});
