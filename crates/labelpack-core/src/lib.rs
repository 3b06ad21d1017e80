pub mod error;
pub mod locator;
pub mod record;
pub mod segment;

pub use error::{Error, Result};
pub use locator::Locator;
pub use record::{FieldDescriptor, Record, RecordHeader, RecordView, MAX_FIELDS, RECORD_HEADER_SIZE};
pub use segment::{SegmentHeader, SegmentInfo, SegmentLayout, MAX_SEGMENT_RECORDS, RECORD_ALIGN};

/// Maximum number of stratification categories (labels 0..2000)
pub const MAX_CATEGORIES: u32 = 2000;
