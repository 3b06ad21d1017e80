//! Segmented Container Files
//!
//! This module implements the append-only file format that stores labeled
//! samples on local disk.
//!
//! ## Container File Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Segment header (8KB with the default layout)                │
//! │ - Record count (4 bytes)                                    │
//! │ - Labels: f32 × 1020                                        │
//! │ - Padded sizes: u32 × 1020                                  │
//! │ - Link to next segment header (8 bytes)                     │
//! │ - Zero padding to 4KB boundary                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Record 0 (header + fields, zero-padded to 4KB)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Record 1                                                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ ...                                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Segment header (next segment, at the previous link)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ ...                                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why This Design?
//!
//! ### Linked Segments
//! - A segment header is reserved before its records are written and patched
//!   in place once the segment fills up, so appending never rewrites earlier
//!   data
//! - The reader walks the chain by following `link` offsets
//!
//! ### Labels in Segment Headers
//! - Indexing a file only reads headers: one 8KB read per 1020 records
//! - Stratified sampling needs labels before any payload is fetched
//!
//! ### 4KB Alignment
//! - Every record starts on a page boundary, so a random-access read of one
//!   record touches the fewest pages
//! - Padding is written as explicit zero bytes rather than relying on sparse
//!   files
//!
//! ## Usage
//!
//! ### Writing a Container
//! ```ignore
//! let mut writer = FileWriter::create("train.pack")?;
//! for (label, path) in samples {
//!     writer.append(&Record::from_file(label, path, None)?)?;
//! }
//! writer.close()?;
//! ```
//!
//! ### Indexing a Container
//! ```ignore
//! let mut reader = FileReader::open("train.pack")?;
//! let locators = reader.scan()?;
//! let first = reader.read_record(&locators[0])?;
//! ```

mod reader;
mod writer;

pub use reader::FileReader;
pub use writer::{ContainerSink, FileWriter};
