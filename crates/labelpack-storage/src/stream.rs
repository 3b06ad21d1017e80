//! Sample Streams
//!
//! `SampleStream` ties a `FileReader` to a `Sampler`: the sampler picks the
//! next locator, the reader fetches and decodes the record behind it.
//!
//! ```ignore
//! let mut stream = SampleStream::open("train.pack", &StreamConfig::default())?;
//! while let Some(batch) = stream.next_batch(32)? {
//!     train_on(&batch.samples);
//!     if batch.padding > 0 {
//!         break;
//!     }
//! }
//! ```

use std::path::Path;

use bytes::Bytes;
use labelpack_core::{Error, Result};

use crate::config::StreamConfig;
use crate::sampler::Sampler;
use crate::segment::FileReader;

/// One decoded record
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: f32,
    pub fields: Vec<Bytes>,
}

/// Up to `batch_size` samples, with `padding` counting the missing ones
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub samples: Vec<Sample>,
    pub padding: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Streams decoded samples out of a container file
pub struct SampleStream {
    reader: FileReader,
    sampler: Sampler,
}

impl SampleStream {
    /// Index `path` and build a sampler over it
    pub fn open(path: impl AsRef<Path>, config: &StreamConfig) -> Result<Self> {
        let mut reader = FileReader::open_with_layout(path, config.layout)?;
        let locators = reader.scan()?;
        let sampler = Sampler::new(locators, config)?;
        Ok(Self { reader, sampler })
    }

    /// Number of usable records
    pub fn size(&self) -> usize {
        self.sampler.size()
    }

    pub fn reset(&mut self) {
        self.sampler.reset();
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Read the next sample, `None` at end of stream
    pub fn next_sample(&mut self) -> Result<Option<Sample>> {
        let Some(locator) = self.sampler.next() else {
            return Ok(None);
        };

        let view = self.reader.read_record(&locator)?;
        if view.label().to_bits() != locator.label.to_bits() {
            return Err(Error::DataCorruption(format!(
                "record at {} has label {}, segment header says {}",
                locator.offset,
                view.label(),
                locator.label
            )));
        }

        Ok(Some(Sample {
            label: view.label(),
            fields: view.into_fields(),
        }))
    }

    /// Read up to `batch_size` samples
    ///
    /// Returns `None` once the stream has nothing left to give.
    pub fn next_batch(&mut self, batch_size: usize) -> Result<Option<Batch>> {
        if batch_size == 0 {
            return Err(Error::invalid_config("batch size must be at least 1"));
        }

        let mut samples = Vec::with_capacity(batch_size);
        while samples.len() < batch_size {
            match self.next_sample()? {
                Some(sample) => samples.push(sample),
                None => break,
            }
        }

        if samples.is_empty() {
            return Ok(None);
        }

        let padding = batch_size - samples.len();
        Ok(Some(Batch { samples, padding }))
    }
}

impl Iterator for SampleStream {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample().transpose()
    }
}
