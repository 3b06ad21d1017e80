//! LabelPack Storage Layer
//!
//! This crate implements the storage layer for LabelPack - the component
//! responsible for packing labeled samples into container files on local disk
//! and streaming them back out in a stratified, fold-aware order.
//!
//! ## What is the Storage Layer?
//!
//! The storage layer sits between raw sample files and a training loop. It handles:
//!
//! 1. **Container Writing**: Appending records into 4KB-aligned, linked segments
//! 2. **Indexing**: Walking segment headers to list every record without reading payloads
//! 3. **Sampling**: Grouping records by label, slicing folds, round-robin selection
//! 4. **Streaming**: Fetching and decoding the selected records, one or a batch at a time
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐
//! │ (label, file)    │
//! │ pairs            │
//! └────────┬─────────┘
//!          │ records
//!          ▼
//! ┌──────────────────┐
//! │ FileWriter       │
//! │ - Pads to 4KB    │
//! │ - Links segments │
//! └────────┬─────────┘
//!          │ container file
//!          ▼
//! ┌──────────────────┐
//! │ FileReader       │
//! │ - Walks chain    │
//! │ - Builds index   │
//! └────────┬─────────┘
//!          │ locators
//!          ▼
//! ┌──────────────────┐
//! │ Sampler          │
//! │ - Stratifies     │
//! │ - Slices folds   │
//! │ - Round-robins   │
//! └────────┬─────────┘
//!          │ locators
//!          ▼
//! ┌──────────────────┐
//! │ SampleStream     │
//! │ - Reads records  │
//! │ - Batches        │
//! └──────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ### Packing a Container
//! ```ignore
//! use labelpack_core::Record;
//! use labelpack_storage::FileWriter;
//!
//! let mut writer = FileWriter::create("train.pack")?;
//! writer.append(&Record::from_file(3.0, "cats/001.jpg", None)?)?;
//! writer.append(&Record::from_file(7.0, "dogs/001.jpg", None)?)?;
//! writer.close()?;
//! ```
//!
//! ### Streaming a Training Split
//! ```ignore
//! use labelpack_storage::{SampleStream, StreamConfig};
//!
//! let mut config = StreamConfig::default();
//! config.kfold(5, 0, true)?;
//!
//! let mut stream = SampleStream::open("train.pack", &config)?;
//! while let Some(batch) = stream.next_batch(64)? {
//!     // ...
//! }
//! ```
//!
//! ## Design Decisions
//!
//! ### Why Synchronous I/O?
//! - **One reader per stream**: every stream owns its own file handle
//! - **Random access**: records are fetched one at a time by offset
//! - **No runtime**: the crate embeds in any training loop
//!
//! ### Why Round-Robin Between Groups?
//! - **Balanced batches**: rare labels show up as often as common ones
//! - **Deterministic**: the order only depends on the seed and the file

pub mod config;
pub mod sampler;
pub mod segment;
pub mod stream;

pub use config::StreamConfig;
pub use labelpack_core::{Error, Result};
pub use sampler::{Group, Sampler};
pub use segment::{ContainerSink, FileReader, FileWriter};
pub use stream::{Batch, Sample, SampleStream};
