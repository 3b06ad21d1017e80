//! File Writer - Appending Records into a Segmented Container
//!
//! This module implements `FileWriter`, which appends encoded records to a
//! container file, one aligned record at a time, inside a chain of segments.
//!
//! ## What Does FileWriter Do?
//!
//! 1. **Creates the file exclusively** (fails if the path already exists)
//! 2. **Reserves a zeroed segment header** at the start of each segment
//! 3. **Writes each record** followed by zero padding to the alignment boundary
//! 4. **Tracks labels and padded sizes** in the in-memory segment header
//! 5. **Patches the header in place** when the segment fills up, linking it to
//!    the next one
//! 6. **Finalizes on close**: patches the last header, truncates to the final
//!    offset, and syncs
//!
//! ## Technical Details
//!
//! ### Alignment Invariant
//! The write offset is checked before and after every record. Both must be
//! multiples of the layout alignment. A violation means the file is no longer
//! trustworthy and surfaces as `Error::Misaligned`.
//!
//! ### Segment Rollover
//! When the current header already describes `capacity` records, the next
//! append first writes the header back with `link` set to the current offset,
//! then reserves a fresh header right there.
//!
//! ### Failed Writes
//! An I/O error part way through a record leaves the sink position ahead of
//! the tracked offset. The writer is poisoned: buffered bytes are discarded,
//! the sink is released, and every later `append` or `close` fails. Errors
//! raised before any byte is written (such as `FieldTooLarge`) leave the
//! writer usable.
//!
//! ## Thread Safety
//!
//! FileWriter is NOT thread-safe and a container is NOT readable while a writer
//! holds it open: the chain is only well-formed after `close()`.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use labelpack_core::{Error, Record, Result, SegmentHeader, SegmentLayout};
use tracing::{debug, info, warn};

/// Destination a `FileWriter` appends to
pub trait ContainerSink: Write + Seek {
    /// Cut the sink to `len` bytes and make it durable
    fn truncate_and_sync(&mut self, len: u64) -> io::Result<()>;
}

impl ContainerSink for File {
    fn truncate_and_sync(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_all()
    }
}

/// Appends records to a new container file
pub struct FileWriter<S: ContainerSink = File> {
    /// Output sink, `None` once closed or poisoned
    sink: Option<BufWriter<S>>,

    /// Path, kept for logging
    path: PathBuf,

    layout: SegmentLayout,

    /// Current write offset
    offset: u64,

    /// Offset of the current segment's header
    segment_offset: u64,

    /// Header of the segment being filled
    header: SegmentHeader,

    /// Records appended over the writer's lifetime
    records_written: u64,

    /// Segments opened over the writer's lifetime
    segments_written: u64,

    /// Set after a write failed part way through
    poisoned: bool,
}

impl FileWriter<File> {
    /// Create a new container with the default layout
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_layout(path, SegmentLayout::DEFAULT)
    }

    /// Create a new container with a custom layout
    ///
    /// The same layout must be passed to the reader.
    pub fn create_with_layout(path: impl AsRef<Path>, layout: SegmentLayout) -> Result<Self> {
        layout.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;

        Self::with_sink(file, path, layout)
    }
}

impl<S: ContainerSink> FileWriter<S> {
    /// Start a container at the beginning of an empty sink
    ///
    /// `path` only names the container in log lines.
    pub fn with_sink(sink: S, path: impl Into<PathBuf>, layout: SegmentLayout) -> Result<Self> {
        layout.validate()?;
        let mut writer = Self {
            sink: Some(BufWriter::new(sink)),
            path: path.into(),
            layout,
            offset: 0,
            segment_offset: 0,
            header: SegmentHeader::new(&layout),
            records_written: 0,
            segments_written: 0,
            poisoned: false,
        };
        writer.open_segment()?;

        Ok(writer)
    }

    /// Append a record, returning the offset it was written at
    pub fn append(&mut self, record: &Record) -> Result<u64> {
        self.sink()?;

        let bytes = record.encode()?;
        let too_large = |len| Error::FieldTooLarge { index: 0, len };
        let padded = self
            .layout
            .align_up(bytes.len() as u64)
            .ok_or_else(|| too_large(bytes.len() as u64))?;
        let size = u32::try_from(padded).map_err(|_| too_large(padded))?;

        self.write_record(record.label(), size, &bytes, padded)
            .map_err(|e| self.poison(e))
    }

    /// Finalize the last segment, truncate and sync the file
    pub fn close(mut self) -> Result<()> {
        let result = self.finish();
        self.sink = None;
        result
    }

    /// Get the number of records appended so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Get the number of segments opened so far
    pub fn segments_written(&self) -> u64 {
        self.segments_written
    }

    /// Get the current write offset
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether an earlier write failed part way through
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sink(&mut self) -> io::Result<&mut BufWriter<S>> {
        let poisoned = self.poisoned;
        self.sink.as_mut().ok_or_else(|| unusable(poisoned))
    }

    /// Drop the sink without flushing, so nothing lands at a stale position
    fn poison(&mut self, error: Error) -> Error {
        if let Some(writer) = self.sink.take() {
            let (_sink, _unflushed) = writer.into_parts();
        }
        self.poisoned = true;
        warn!(
            path = %self.path.display(),
            offset = self.offset,
            error = %error,
            "Container write failed, writer poisoned"
        );
        error
    }

    fn write_record(&mut self, label: f32, size: u32, bytes: &[u8], padded: u64) -> Result<u64> {
        if self.header.is_full() {
            self.finalize_segment()?;
            self.open_segment()?;
        }

        self.check_aligned()?;
        let begin = self.offset;

        let sink = self.sink()?;
        sink.write_all(bytes)?;
        io::copy(&mut io::repeat(0).take(padded - bytes.len() as u64), sink)?;

        self.offset += padded;
        self.check_aligned()?;

        if !self.header.push(label, size) {
            return Err(Error::malformed(
                self.segment_offset,
                "segment header overflow",
            ));
        }
        self.records_written += 1;

        Ok(begin)
    }

    fn check_aligned(&self) -> Result<()> {
        if self.layout.is_aligned(self.offset) {
            Ok(())
        } else {
            Err(Error::Misaligned {
                offset: self.offset,
                align: self.layout.align,
            })
        }
    }

    /// Reserve a zeroed header at the current offset
    fn open_segment(&mut self) -> Result<()> {
        self.check_aligned()?;
        self.segment_offset = self.offset;
        self.header = SegmentHeader::new(&self.layout);

        let bytes = self.header.encode(&self.layout);
        self.sink()?.write_all(&bytes)?;
        self.offset += bytes.len() as u64;
        self.segments_written += 1;

        debug!(
            path = %self.path.display(),
            segment = self.segments_written,
            offset = self.segment_offset,
            "Opened segment"
        );

        Ok(())
    }

    /// Write the current header back in place, linked to the current offset
    fn finalize_segment(&mut self) -> Result<()> {
        self.check_aligned()?;
        self.header.link = self.offset;

        let bytes = self.header.encode(&self.layout);
        let (segment_offset, offset) = (self.segment_offset, self.offset);
        let sink = self.sink()?;
        sink.seek(SeekFrom::Start(segment_offset))?;
        sink.write_all(&bytes)?;
        sink.seek(SeekFrom::Start(offset))?;

        debug!(
            path = %self.path.display(),
            offset = segment_offset,
            records = self.header.record_count,
            link = offset,
            "Finalized segment"
        );

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.poisoned {
            return Err(unusable(true).into());
        }
        if self.sink.is_none() {
            return Ok(());
        }

        self.finalize_segment()?;

        let end = self.offset;
        if let Some(writer) = self.sink.take() {
            let mut sink = writer.into_inner().map_err(|e| e.into_error())?;
            sink.truncate_and_sync(end)?;
        }

        info!(
            path = %self.path.display(),
            records = self.records_written,
            segments = self.segments_written,
            bytes = end,
            "Closed container"
        );

        Ok(())
    }
}

fn unusable(poisoned: bool) -> io::Error {
    let msg = if poisoned {
        "container writer failed on an earlier write"
    } else {
        "container writer is closed"
    };
    io::Error::new(io::ErrorKind::Other, msg)
}

impl<S: ContainerSink> Drop for FileWriter<S> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            warn!(
                path = %self.path.display(),
                "Container writer dropped without close(), finalizing"
            );
            if let Err(e) = self.finish() {
                warn!(path = %self.path.display(), error = %e, "Failed to finalize container");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use labelpack_core::RECORD_HEADER_SIZE;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    /// In-memory sink that accepts `budget` bytes, then fails every write
    struct FailingSink {
        inner: Cursor<Vec<u8>>,
        budget: usize,
        write_calls: Rc<Cell<usize>>,
    }

    impl FailingSink {
        fn new(budget: usize) -> (Self, Rc<Cell<usize>>) {
            let write_calls = Rc::new(Cell::new(0));
            let sink = Self {
                inner: Cursor::new(Vec::new()),
                budget,
                write_calls: Rc::clone(&write_calls),
            };
            (sink, write_calls)
        }
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.write_calls.set(self.write_calls.get() + 1);
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl ContainerSink for FailingSink {
        fn truncate_and_sync(&mut self, len: u64) -> io::Result<()> {
            self.inner.get_mut().truncate(len as usize);
            Ok(())
        }
    }

    fn small_layout() -> SegmentLayout {
        SegmentLayout::new(4, 64).unwrap()
    }

    #[test]
    fn test_create_reserves_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileWriter::create(dir.path().join("a.pack")).unwrap();

        assert_eq!(writer.offset(), SegmentLayout::DEFAULT.header_size());
        assert_eq!(writer.records_written(), 0);
        assert_eq!(writer.segments_written(), 1);
    }

    #[test]
    fn test_create_existing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.pack");
        std::fs::write(&path, b"occupied").unwrap();

        match FileWriter::create(&path) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::AlreadyExists),
            Err(other) => panic!("expected AlreadyExists, got {other:?}"),
            Ok(_) => panic!("expected AlreadyExists, writer was created"),
        }
        // untouched
        assert_eq!(std::fs::read(&path).unwrap(), b"occupied");
    }

    #[test]
    fn test_append_pads_to_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let layout = small_layout();
        let mut writer = FileWriter::create_with_layout(dir.path().join("a.pack"), layout).unwrap();
        let header_size = layout.header_size();

        let first = writer.append(&Record::new(1.0, Bytes::from("x"))).unwrap();
        assert_eq!(first, header_size);
        assert_eq!(writer.offset(), header_size + 64);

        // 24 + 100 bytes rounds up to 128
        let second = writer.append(&Record::new(2.0, Bytes::from(vec![0u8; 100]))).unwrap();
        assert_eq!(second, header_size + 64);
        assert_eq!(writer.offset(), header_size + 64 + 128);
        assert!(layout.is_aligned(writer.offset()));
    }

    #[test]
    fn test_exact_multiple_gets_no_padding() {
        let dir = tempfile::tempdir().unwrap();
        let layout = small_layout();
        let mut writer = FileWriter::create_with_layout(dir.path().join("a.pack"), layout).unwrap();

        let payload = vec![1u8; 64 - RECORD_HEADER_SIZE];
        writer.append(&Record::new(1.0, Bytes::from(payload))).unwrap();
        assert_eq!(writer.offset(), layout.header_size() + 64);
    }

    #[test]
    fn test_rollover_opens_new_segment() {
        let dir = tempfile::tempdir().unwrap();
        let layout = small_layout();
        let mut writer = FileWriter::create_with_layout(dir.path().join("a.pack"), layout).unwrap();

        for i in 0..4 {
            writer.append(&Record::new(i as f32, Bytes::from("r"))).unwrap();
        }
        assert_eq!(writer.segments_written(), 1);

        let offset_before = writer.offset();
        let fifth = writer.append(&Record::new(4.0, Bytes::from("r"))).unwrap();
        assert_eq!(writer.segments_written(), 2);
        assert_eq!(fifth, offset_before + layout.header_size());
    }

    #[test]
    fn test_close_finalizes_header_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pack");
        let layout = small_layout();
        let mut writer = FileWriter::create_with_layout(&path, layout).unwrap();
        writer.append(&Record::new(3.0, Bytes::from("abc"))).unwrap();
        writer.append(&Record::new(5.0, Bytes::from("defg"))).unwrap();
        let end = writer.offset();
        writer.close().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len() as u64, end);

        let header = SegmentHeader::decode(&data, &layout, 0).unwrap();
        assert_eq!(header.record_count, 2);
        assert_eq!(header.link, end);
        let entries: Vec<_> = header.entries().collect();
        assert_eq!(entries, vec![(3.0, 64), (5.0, 64)]);
    }

    #[test]
    fn test_padding_is_zero_filled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pack");
        let layout = small_layout();
        let mut writer = FileWriter::create_with_layout(&path, layout).unwrap();
        let at = writer.append(&Record::new(1.0, Bytes::from(vec![0xFF; 10]))).unwrap() as usize;
        writer.close().unwrap();

        let data = std::fs::read(&path).unwrap();
        let record_end = at + RECORD_HEADER_SIZE + 10;
        assert!(data[at + RECORD_HEADER_SIZE..record_end].iter().all(|&b| b == 0xFF));
        assert!(data[record_end..at + 64].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_drop_without_close_still_finalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pack");
        let layout = small_layout();
        {
            let mut writer = FileWriter::create_with_layout(&path, layout).unwrap();
            writer.append(&Record::new(1.0, Bytes::from("x"))).unwrap();
        }

        let data = std::fs::read(&path).unwrap();
        let header = SegmentHeader::decode(&data, &layout, 0).unwrap();
        assert_eq!(header.record_count, 1);
        assert_eq!(header.link, data.len() as u64);
    }

    #[test]
    fn test_empty_container_is_one_empty_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pack");
        FileWriter::create(&path).unwrap().close().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len() as u64, SegmentLayout::DEFAULT.header_size());
        let header = SegmentHeader::decode(&data, &SegmentLayout::DEFAULT, 0).unwrap();
        assert_eq!(header.record_count, 0);
        assert_eq!(header.link, data.len() as u64);
    }

    #[test]
    fn test_oversized_layout_rejected_before_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pack");
        let layout = SegmentLayout {
            capacity: 4,
            align: 1 << 63,
        };

        let result = FileWriter::create_with_layout(&path, layout);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_write_poisons_writer() {
        let layout = small_layout();
        // header, one small record, then 100 bytes into the big one
        let budget = (layout.header_size() + 64 + 100) as usize;
        let (sink, write_calls) = FailingSink::new(budget);
        let mut writer = FileWriter::with_sink(sink, "memory.pack", layout).unwrap();

        writer.append(&Record::new(1.0, Bytes::from("x"))).unwrap();
        let offset = writer.offset();

        // larger than the BufWriter capacity, so it goes straight to the sink
        let big = Record::new(2.0, Bytes::from(vec![7u8; 9000]));
        assert!(matches!(writer.append(&big), Err(Error::Io(_))));
        assert!(writer.is_poisoned());
        assert_eq!(writer.offset(), offset);
        assert_eq!(writer.records_written(), 1);

        let calls = write_calls.get();
        let retry = writer.append(&Record::new(3.0, Bytes::from("y")));
        assert!(matches!(retry, Err(Error::Io(_))));
        assert_eq!(write_calls.get(), calls);
        assert!(writer.close().is_err());
        assert_eq!(write_calls.get(), calls);
    }

    #[test]
    fn test_in_memory_sink_round_trip() {
        let layout = small_layout();
        let (sink, _) = FailingSink::new(usize::MAX);
        let mut writer = FileWriter::with_sink(sink, "memory.pack", layout).unwrap();
        for i in 0..6 {
            writer.append(&Record::new(i as f32, Bytes::from("r"))).unwrap();
        }
        assert_eq!(writer.segments_written(), 2);
        assert!(!writer.is_poisoned());
        writer.close().unwrap();
    }
}
