//! File Reader - Indexing and Fetching Records
//!
//! `FileReader` walks the segment chain of a closed container and turns the
//! headers into a flat list of `Locator`s. Payloads are only read on demand,
//! one record per `read_record` call.
//!
//! ## Chain Validation
//!
//! For every segment the reader checks that:
//! - the header fits inside the file
//! - the record count does not exceed the layout capacity
//! - `link` equals the end of the segment's records
//! - `link` does not point past the end of the file
//!
//! Any violation is reported as `Error::MalformedFile` with the offset of the
//! offending header. A file that fails these checks was either not closed or
//! not produced by `FileWriter` with the same layout.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use labelpack_core::{
    Error, Locator, RecordView, Result, SegmentHeader, SegmentInfo, SegmentLayout,
};
use tracing::{debug, info};

/// Reads a closed container file
pub struct FileReader {
    file: File,
    path: PathBuf,
    layout: SegmentLayout,
    len: u64,
}

impl FileReader {
    /// Open with the default layout
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_layout(path, SegmentLayout::DEFAULT)
    }

    pub fn open_with_layout(path: impl AsRef<Path>, layout: SegmentLayout) -> Result<Self> {
        layout.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            path,
            layout,
            len,
        })
    }

    /// Build one locator per record, in file order
    pub fn scan(&mut self) -> Result<Vec<Locator>> {
        let mut locators = Vec::new();
        self.walk(|_, records_start, header| {
            let mut offset = records_start;
            for (label, size) in header.entries() {
                locators.push(Locator::new(label, offset, size));
                offset += size as u64;
            }
        })?;

        info!(
            path = %self.path.display(),
            records = locators.len(),
            "Indexed container"
        );

        Ok(locators)
    }

    /// Summaries of every segment in the chain
    pub fn segments(&mut self) -> Result<Vec<SegmentInfo>> {
        let mut segments = Vec::new();
        self.walk(|offset, _, header| {
            segments.push(SegmentInfo {
                offset,
                record_count: header.record_count,
                link: header.link,
            });
        })?;
        Ok(segments)
    }

    /// Fetch and decode the record a locator points at
    ///
    /// The returned view shares one buffer with its fields.
    pub fn read_record(&mut self, locator: &Locator) -> Result<RecordView> {
        if locator.end() > self.len {
            return Err(Error::DataCorruption(format!(
                "record at {} ends at {}, past end of file {}",
                locator.offset,
                locator.end(),
                self.len
            )));
        }

        let mut buf = BytesMut::zeroed(locator.size as usize);
        self.file.seek(SeekFrom::Start(locator.offset))?;
        self.file.read_exact(&mut buf)?;

        RecordView::decode(buf.freeze())
    }

    /// File length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Visit every segment header along the chain
    ///
    /// The callback receives the header offset, the offset of the segment's
    /// first record and the decoded header.
    fn walk(&mut self, mut visit: impl FnMut(u64, u64, &SegmentHeader)) -> Result<()> {
        let header_size = self.layout.header_size();
        let mut offset = 0u64;
        let mut buf = vec![0u8; header_size as usize];

        while offset < self.len {
            let records_start = offset + header_size;
            if records_start > self.len {
                return Err(Error::malformed(
                    offset,
                    format!(
                        "segment header extends to {}, past end of file {}",
                        records_start, self.len
                    ),
                ));
            }

            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(&mut buf)?;
            let header = SegmentHeader::decode(&buf, &self.layout, offset)?;

            let expected = records_start + header.payload_len();
            if header.link != expected {
                return Err(Error::malformed(
                    offset,
                    format!(
                        "link {} does not match end of records {}",
                        header.link, expected
                    ),
                ));
            }
            if header.link > self.len {
                return Err(Error::malformed(
                    offset,
                    format!("link {} past end of file {}", header.link, self.len),
                ));
            }

            debug!(
                path = %self.path.display(),
                offset,
                records = header.record_count,
                link = header.link,
                "Read segment header"
            );

            visit(offset, records_start, &header);
            offset = header.link;
        }

        Ok(())
    }
}
