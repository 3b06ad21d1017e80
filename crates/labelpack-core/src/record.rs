//! Record Codec
//!
//! This module defines the `Record` type - a single labeled training sample -
//! and its packed binary encoding.
//!
//! ## What is a Record?
//! A record is one sample in a container:
//! - **label**: a scalar `f32` (class id for classification, a target value
//!   for regression)
//! - **field 0**: the primary payload (raw image file bytes, an opaque buffer)
//! - **field 1**: an optional secondary payload (annotation text, auxiliary
//!   bytes)
//!
//! ## Binary Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ RecordHeader (24 bytes)                                  │
//! │ - label: f32                                             │
//! │ - field_count: u8 (1 or 2)                               │
//! │ - padding: 3 bytes                                       │
//! │ - field[0]: size u32, kind u8, padding 3 bytes           │
//! │ - field[1]: size u32, kind u8, padding 3 bytes           │
//! ├──────────────────────────────────────────────────────────┤
//! │ field 0 bytes                                            │
//! ├──────────────────────────────────────────────────────────┤
//! │ field 1 bytes (if field_count == 2)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Unused descriptor slots are zero. The
//! `kind` byte is reserved: it is always written as 0 and never inspected.
//!
//! ## Decoding
//! `RecordView::decode` is zero-copy: field views are `Bytes` slices of the
//! input buffer. The buffer may be longer than the record (the on-disk copy is
//! padded to the record alignment); trailing bytes are ignored.
//!
//! ## Example
//! ```ignore
//! let record = Record::with_extra(3.0, Bytes::from(jpeg), Bytes::from("box 10 20 30 40"));
//! let bytes = record.encode()?;
//! let view = RecordView::decode(bytes)?;
//! assert_eq!(view.label(), 3.0);
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Maximum number of payload fields per record
pub const MAX_FIELDS: usize = 2;

/// On-disk size of one field descriptor
pub const FIELD_DESCRIPTOR_SIZE: usize = 8;

/// On-disk size of the fixed record header (24 bytes)
pub const RECORD_HEADER_SIZE: usize = 8 + MAX_FIELDS * FIELD_DESCRIPTOR_SIZE;

/// Size (and reserved kind tag) of one payload field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub size: u32,
    /// Reserved, always 0
    pub kind: u8,
}

/// Fixed-size header written at the start of every record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordHeader {
    pub label: f32,
    pub field_count: u8,
    pub fields: [FieldDescriptor; MAX_FIELDS],
}

impl RecordHeader {
    /// Descriptors of the fields actually present
    pub fn fields(&self) -> &[FieldDescriptor] {
        let count = (self.field_count as usize).min(MAX_FIELDS);
        &self.fields[..count]
    }

    /// Unpadded length of the record this header describes
    pub fn record_len(&self) -> u64 {
        RECORD_HEADER_SIZE as u64 + self.fields().iter().map(|f| f.size as u64).sum::<u64>()
    }

    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_f32_le(self.label);
        buf.put_u8(self.field_count);
        buf.put_bytes(0, 3);
        for field in &self.fields {
            buf.put_u32_le(field.size);
            buf.put_u8(field.kind);
            buf.put_bytes(0, 3);
        }
    }

    pub fn read_from(data: &[u8]) -> Result<Self> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::DataCorruption(format!(
                "record buffer of {} bytes is shorter than the {} byte header",
                data.len(),
                RECORD_HEADER_SIZE
            )));
        }

        let mut cursor = &data[..RECORD_HEADER_SIZE];
        let label = cursor.get_f32_le();
        let field_count = cursor.get_u8();
        cursor.advance(3);

        if field_count == 0 || field_count as usize > MAX_FIELDS {
            return Err(Error::DataCorruption(format!(
                "invalid field count {}",
                field_count
            )));
        }

        let mut fields = [FieldDescriptor::default(); MAX_FIELDS];
        for field in &mut fields {
            field.size = cursor.get_u32_le();
            field.kind = cursor.get_u8();
            cursor.advance(3);
        }

        Ok(Self {
            label,
            field_count,
            fields,
        })
    }
}

/// A labeled sample ready to be appended to a container
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    label: f32,
    fields: Vec<Bytes>,
}

impl Record {
    /// Single-field record
    pub fn new(label: f32, field0: impl Into<Bytes>) -> Self {
        Self {
            label,
            fields: vec![field0.into()],
        }
    }

    /// Record with a primary and a secondary payload
    pub fn with_extra(label: f32, field0: impl Into<Bytes>, field1: impl Into<Bytes>) -> Self {
        Self {
            label,
            fields: vec![field0.into(), field1.into()],
        }
    }

    /// Unlabeled two-field record (label 0)
    pub fn pair(field0: impl Into<Bytes>, field1: impl Into<Bytes>) -> Self {
        Self::with_extra(0.0, field0, field1)
    }

    /// Build a record whose primary payload is the content of `path`.
    ///
    /// Fails with `BadFile` if the file cannot be sized or read in full.
    pub fn from_file(label: f32, path: impl AsRef<Path>, extra: Option<Bytes>) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)
            .map_err(|e| Error::bad_file(path, format!("cannot determine size: {}", e)))?
            .len();
        let size = u32::try_from(size)
            .map_err(|_| Error::bad_file(path, format!("{} bytes exceeds field limit", size)))?;

        let mut file = File::open(path).map_err(|e| Error::bad_file(path, e.to_string()))?;
        let mut buf = BytesMut::zeroed(size as usize);
        file.read_exact(&mut buf)
            .map_err(|e| Error::bad_file(path, format!("short read: {}", e)))?;

        let field0 = buf.freeze();
        Ok(match extra {
            Some(extra) => Self::with_extra(label, field0, extra),
            None => Self::new(label, field0),
        })
    }

    pub fn label(&self) -> f32 {
        self.label
    }

    pub fn fields(&self) -> &[Bytes] {
        &self.fields
    }

    /// Build the header describing this record
    pub fn header(&self) -> Result<RecordHeader> {
        let mut fields = [FieldDescriptor::default(); MAX_FIELDS];
        for (i, (slot, field)) in fields.iter_mut().zip(&self.fields).enumerate() {
            slot.size = u32::try_from(field.len()).map_err(|_| Error::FieldTooLarge {
                index: i,
                len: field.len() as u64,
            })?;
        }

        Ok(RecordHeader {
            label: self.label,
            field_count: self.fields.len() as u8,
            fields,
        })
    }

    /// Unpadded encoded length
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.fields.iter().map(Bytes::len).sum::<usize>()
    }

    /// Pack header and fields into one buffer
    pub fn encode(&self) -> Result<Bytes> {
        let header = self.header()?;
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        header.write_to(&mut buf);
        for field in &self.fields {
            buf.put_slice(field);
        }
        Ok(buf.freeze())
    }
}

/// Decoded record whose fields alias the buffer they were read from
#[derive(Debug, Clone)]
pub struct RecordView {
    header: RecordHeader,
    fields: Vec<Bytes>,
}

impl RecordView {
    /// Decode a record from `data` without copying the payload.
    ///
    /// Fails with `DataCorruption` if the header is unreadable or a field runs
    /// past the end of the buffer.
    pub fn decode(data: Bytes) -> Result<Self> {
        let header = RecordHeader::read_from(&data)?;

        let mut offset = RECORD_HEADER_SIZE;
        let mut fields = Vec::with_capacity(header.fields().len());
        for (i, field) in header.fields().iter().enumerate() {
            let end = offset + field.size as usize;
            if end > data.len() {
                return Err(Error::DataCorruption(format!(
                    "field {} ends at byte {} but buffer holds {}",
                    i,
                    end,
                    data.len()
                )));
            }
            fields.push(data.slice(offset..end));
            offset = end;
        }

        Ok(Self { header, fields })
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn label(&self) -> f32 {
        self.header.label
    }

    pub fn fields(&self) -> &[Bytes] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Bytes> {
        self.fields.get(index)
    }

    pub fn into_fields(self) -> Vec<Bytes> {
        self.fields
    }

    /// Owned record with the same label and payload
    pub fn to_record(&self) -> Record {
        Record {
            label: self.header.label,
            fields: self.fields.clone(),
        }
    }
}
