//! Info command

use std::path::Path;

use anyhow::{Context, Result};
use labelpack_core::{Locator, SegmentInfo};
use labelpack_storage::FileReader;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LabelCount {
    pub label: f32,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub path: String,
    pub file_size: u64,
    pub segment_count: usize,
    pub record_count: usize,
    pub segments: Vec<SegmentInfo>,
    pub labels: Vec<LabelCount>,
}

/// Count records per label, ascending by label
pub fn label_histogram(locators: &[Locator]) -> Vec<LabelCount> {
    let mut labels: Vec<f32> = locators.iter().map(|l| l.label).collect();
    labels.sort_by(f32::total_cmp);

    let mut histogram: Vec<LabelCount> = Vec::new();
    for label in labels {
        match histogram.last_mut() {
            Some(last) if last.label.to_bits() == label.to_bits() => last.count += 1,
            _ => histogram.push(LabelCount { label, count: 1 }),
        }
    }
    histogram
}

/// Handle `packctl info`
pub fn handle_info(file: &Path, json: bool) -> Result<()> {
    let mut reader =
        FileReader::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let segments = reader.segments()?;
    let locators = reader.scan()?;

    let report = InfoReport {
        path: file.display().to_string(),
        file_size: reader.len(),
        segment_count: segments.len(),
        record_count: locators.len(),
        segments,
        labels: label_histogram(&locators),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Container: {}", report.path);
    println!("  Size: {} bytes", report.file_size);
    println!("  Segments: {}", report.segment_count);
    println!("  Records: {}", report.record_count);
    if report.labels.is_empty() {
        println!("  Labels: none");
    } else {
        println!("  Labels ({}):", report.labels.len());
        for entry in &report.labels {
            println!("    {:>10}  {}", entry.label, entry.count);
        }
    }

    Ok(())
}
