//! Segment Layout and Headers
//!
//! This module defines the on-disk segment header - the unit of incremental,
//! append-only extension of a LabelPack container.
//!
//! ## What is a Segment?
//! A segment is a fixed-size header followed by the run of records it
//! describes. A container is a singly linked chain of segments: each header's
//! `link` holds the absolute offset of the next header, or the end of the file
//! for the last one.
//!
//! ```text
//! offset 0
//! ┌──────────────────────────────┐
//! │ SegmentHeader (padded to A)  │──┐ link
//! ├──────────────────────────────┤  │
//! │ record 0 (padded to A)       │  │
//! │ record 1 (padded to A)       │  │
//! │ ...                          │  │
//! ├──────────────────────────────┤◄─┘
//! │ SegmentHeader (padded to A)  │──┐ link
//! ├──────────────────────────────┤  │
//! │ ...                          │  │
//! └──────────────────────────────┘◄─┘ end of file
//! ```
//!
//! ## Header Format (little-endian)
//! - record_count: u32
//! - labels: f32 × capacity
//! - sizes: u32 × capacity (padded on-disk length of each record)
//! - link: u64
//! - zero bytes up to the next multiple of the record alignment
//!
//! The header is fixed-size for a given `SegmentLayout`, so the writer can
//! reserve it up front and write it back in place once the segment is full.
//!
//! ## Why Per-Record Labels in the Header?
//! The indexer only reads segment headers to build its locator list. Labels
//! live next to sizes so stratification never touches payload bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Record alignment in bytes (4KB)
pub const RECORD_ALIGN: u64 = 4096;

/// Maximum number of records per segment
pub const MAX_SEGMENT_RECORDS: usize = 1020;

/// Largest record alignment a layout may use (1MB)
pub const MAX_RECORD_ALIGN: u64 = 1 << 20;

/// Largest segment capacity a layout may use
pub const MAX_LAYOUT_CAPACITY: usize = 1 << 20;

/// Round `n` up to the next multiple of `align` (a power of two).
/// Returns `None` on overflow.
pub fn align_up(n: u64, align: u64) -> Option<u64> {
    n.checked_add(align - 1).map(|v| v & !(align - 1))
}

/// Capacity and alignment shared by the writer and reader of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLayout {
    /// Maximum records per segment
    pub capacity: usize,

    /// Alignment of every record start and end
    pub align: u64,
}

impl SegmentLayout {
    pub const DEFAULT: Self = Self {
        capacity: MAX_SEGMENT_RECORDS,
        align: RECORD_ALIGN,
    };

    pub fn new(capacity: usize, align: u64) -> Result<Self> {
        let layout = Self { capacity, align };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_LAYOUT_CAPACITY {
            return Err(Error::invalid_config(format!(
                "segment capacity {} out of range [1, {}]",
                self.capacity, MAX_LAYOUT_CAPACITY
            )));
        }
        if !self.align.is_power_of_two() {
            return Err(Error::invalid_config(format!(
                "record alignment {} is not a power of two",
                self.align
            )));
        }
        if self.align > MAX_RECORD_ALIGN {
            return Err(Error::invalid_config(format!(
                "record alignment {} exceeds {}",
                self.align, MAX_RECORD_ALIGN
            )));
        }
        Ok(())
    }

    /// Bytes used by the header fields, before padding
    pub fn encoded_header_len(&self) -> usize {
        4 + 4 * self.capacity + 4 * self.capacity + 8
    }

    /// Bytes reserved on disk for one header
    ///
    /// Saturates for layouts that do not pass `validate()`.
    pub fn header_size(&self) -> u64 {
        align_up(self.encoded_header_len() as u64, self.align).unwrap_or(u64::MAX)
    }

    pub fn align_up(&self, n: u64) -> Option<u64> {
        align_up(n, self.align)
    }

    pub fn is_aligned(&self, offset: u64) -> bool {
        offset & (self.align - 1) == 0
    }
}

impl Default for SegmentLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// In-memory copy of one segment header
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentHeader {
    pub record_count: u32,
    pub labels: Vec<f32>,
    pub sizes: Vec<u32>,
    pub link: u64,
}

impl SegmentHeader {
    /// Zeroed header for `layout`
    pub fn new(layout: &SegmentLayout) -> Self {
        Self {
            record_count: 0,
            labels: vec![0.0; layout.capacity],
            sizes: vec![0; layout.capacity],
            link: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.labels.len()
    }

    pub fn is_full(&self) -> bool {
        self.record_count as usize >= self.capacity()
    }

    /// Record one entry. Returns false when the header is already full.
    pub fn push(&mut self, label: f32, size: u32) -> bool {
        let i = self.record_count as usize;
        match (self.labels.get_mut(i), self.sizes.get_mut(i)) {
            (Some(l), Some(s)) => {
                *l = label;
                *s = size;
                self.record_count += 1;
                true
            }
            _ => false,
        }
    }

    /// `(label, padded size)` of each record in the segment
    pub fn entries(&self) -> impl Iterator<Item = (f32, u32)> + '_ {
        let count = (self.record_count as usize).min(self.capacity());
        self.labels[..count]
            .iter()
            .copied()
            .zip(self.sizes[..count].iter().copied())
    }

    /// Total padded bytes of the records in this segment
    pub fn payload_len(&self) -> u64 {
        self.entries().map(|(_, size)| size as u64).sum()
    }

    /// Serialize, zero-padded to the reserved header size
    pub fn encode(&self, layout: &SegmentLayout) -> Bytes {
        let mut buf = BytesMut::with_capacity(layout.header_size() as usize);
        buf.put_u32_le(self.record_count);
        for i in 0..layout.capacity {
            buf.put_f32_le(self.labels.get(i).copied().unwrap_or(0.0));
        }
        for i in 0..layout.capacity {
            buf.put_u32_le(self.sizes.get(i).copied().unwrap_or(0));
        }
        buf.put_u64_le(self.link);
        buf.put_bytes(0, layout.header_size() as usize - layout.encoded_header_len());
        buf.freeze()
    }

    /// Parse a header read from `offset`
    pub fn decode(data: &[u8], layout: &SegmentLayout, offset: u64) -> Result<Self> {
        if data.len() < layout.encoded_header_len() {
            return Err(Error::malformed(
                offset,
                format!(
                    "segment header needs {} bytes, got {}",
                    layout.encoded_header_len(),
                    data.len()
                ),
            ));
        }

        let mut cursor = data;
        let record_count = cursor.get_u32_le();
        if record_count as usize > layout.capacity {
            return Err(Error::malformed(
                offset,
                format!(
                    "segment holds {} records, capacity is {}",
                    record_count, layout.capacity
                ),
            ));
        }

        let labels = (0..layout.capacity).map(|_| cursor.get_f32_le()).collect();
        let sizes = (0..layout.capacity).map(|_| cursor.get_u32_le()).collect();
        let link = cursor.get_u64_le();

        Ok(Self {
            record_count,
            labels,
            sizes,
            link,
        })
    }
}

/// Summary of one segment in a closed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
    /// Offset of the segment header
    pub offset: u64,

    /// Number of records in the segment
    pub record_count: u32,

    /// Offset of the next segment header (or end of file)
    pub link: u64,
}
