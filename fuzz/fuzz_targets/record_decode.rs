#![no_main]

use bytes::Bytes;
use labelpack_core::{RecordView, SegmentHeader, SegmentLayout};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoders:
    // - Truncated record headers
    // - Field counts outside 1..=2
    // - Field sizes running past the buffer
    // - Segment record counts over capacity
    if let Ok(view) = RecordView::decode(Bytes::copy_from_slice(data)) {
        let total: usize = view.fields().iter().map(|f| f.len()).sum();
        assert!(total <= data.len());
        let _ = view.to_record().encode();
    }

    for layout in [SegmentLayout::DEFAULT, SegmentLayout { capacity: 4, align: 64 }] {
        if let Ok(header) = SegmentHeader::decode(data, &layout, 0) {
            assert!(header.record_count as usize <= layout.capacity);
            let _ = header.payload_len();
        }
    }
});
