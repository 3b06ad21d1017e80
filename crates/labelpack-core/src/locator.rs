//! Record Locators
//!
//! A `Locator` is the index entry the reader builds for every record: enough
//! to find and fetch the record later without holding its bytes. Locators are
//! `Copy` and 16 bytes of payload, so a sampler can shuffle and slice millions
//! of them cheaply while many of them point into the same file.

use serde::{Deserialize, Serialize};

/// Where a record lives inside a container file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    /// Label copied from the segment header
    pub label: f32,

    /// Absolute offset of the record header
    pub offset: u64,

    /// Padded on-disk length to read
    pub size: u32,
}

impl Locator {
    pub fn new(label: f32, offset: u64, size: u32) -> Self {
        Self {
            label,
            offset,
            size,
        }
    }

    /// Offset one past the padded record
    pub fn end(&self) -> u64 {
        self.offset + self.size as u64
    }

    /// Stratification category, if the label is a non-negative integer
    /// below `max_categories`
    pub fn category(&self, max_categories: u32) -> Option<u32> {
        let label = self.label;
        if label.is_finite() && label >= 0.0 && label.fract() == 0.0 && label < max_categories as f32 {
            Some(label as u32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_end() {
        let loc = Locator::new(1.0, 8192, 4096);
        assert_eq!(loc.end(), 12288);
    }

    #[test]
    fn test_category_accepts_integer_labels() {
        assert_eq!(Locator::new(0.0, 0, 0).category(2000), Some(0));
        assert_eq!(Locator::new(1999.0, 0, 0).category(2000), Some(1999));
    }

    #[test]
    fn test_category_rejects_unstratifiable_labels() {
        assert_eq!(Locator::new(0.5, 0, 0).category(2000), None);
        assert_eq!(Locator::new(-1.0, 0, 0).category(2000), None);
        assert_eq!(Locator::new(2000.0, 0, 0).category(2000), None);
        assert_eq!(Locator::new(f32::NAN, 0, 0).category(2000), None);
        assert_eq!(Locator::new(f32::INFINITY, 0, 0).category(2000), None);
    }
}
