//! Pack command
//!
//! Reads a list file and appends one record per entry. Each non-empty line
//! that does not start with `#` holds a label, a payload path and optional
//! extra text stored as the second field:
//!
//! ```text
//! # label path extra
//! 3 images/cat-001.jpg
//! 7 images/dog-001.jpg bbox=12,40,200,180
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use labelpack_core::{Error, Record};
use labelpack_storage::FileWriter;
use tracing::{info, warn};

/// One parsed list entry
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub label: f32,
    pub path: PathBuf,
    pub extra: Option<String>,
}

/// Parse one list line. Returns `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<ListEntry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let Some((label, rest)) = line.split_once(char::is_whitespace) else {
        bail!("expected `<label> <path>`, got {line:?}");
    };
    let label: f32 = label
        .parse()
        .with_context(|| format!("invalid label {label:?}"))?;

    let rest = rest.trim_start();
    let (path, extra) = match rest.split_once(char::is_whitespace) {
        Some((path, extra)) => (path, Some(extra.trim())),
        None => (rest, None),
    };

    Ok(Some(ListEntry {
        label,
        path: PathBuf::from(path),
        extra: extra.filter(|e| !e.is_empty()).map(str::to_string),
    }))
}

/// Handle `packctl pack`
pub fn handle_pack(output: &Path, list: &Path, skip_bad: bool) -> Result<()> {
    let text = std::fs::read_to_string(list)
        .with_context(|| format!("Failed to read list file {}", list.display()))?;

    // relative payload paths resolve against the list file's directory
    let base = list.parent().unwrap_or_else(|| Path::new("."));

    let mut entries = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let entry = parse_line(line)
            .with_context(|| format!("{}:{}", list.display(), i + 1))?;
        if let Some(entry) = entry {
            entries.push(entry);
        }
    }

    let mut writer = FileWriter::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut skipped = 0usize;

    for entry in &entries {
        let path = base.join(&entry.path);
        let extra = entry.extra.clone().map(Bytes::from);

        let record = match Record::from_file(entry.label, &path, extra) {
            Ok(record) => record,
            Err(err @ Error::BadFile { .. }) if skip_bad => {
                warn!(error = %err, "Skipping entry");
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err).context("Failed to load payload"),
        };

        writer.append(&record)?;
    }

    let written = writer.records_written();
    let segments = writer.segments_written();
    writer.close()?;

    info!(
        output = %output.display(),
        records = written,
        skipped,
        segments,
        "Packed container"
    );
    println!(
        "✅ Packed {} records into {} ({} segments, {} skipped)",
        written,
        output.display(),
        segments,
        skipped
    );

    Ok(())
}
