//! CLI output formatting.
//!
//! # Record Display
//!
//! Every record prints as a header line (positional index, display name,
//! business type) followed by indented detail lines. Empty fields are
//! skipped, so a sparse extraction prints as a short block rather than a
//! column of blanks.
//!
//! ```text
//! Records (2)
//! 001 Acme Traders [Trading]
//!     Phone: 9876543210
//!     Email: sales@acme.example
//!     Captured: 2026-10-18 09:14 UTC
//!     Id: 3f1c9a52-...
//! 002 (unnamed) [Other]
//!     Captured: 2026-10-17 17:02 UTC
//!     Id: 8be0d4e1-...
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::imaging::EnhancedImage;
use crate::orchestrator::CycleResult;
use crate::record::ContactRecord;
use chrono::DateTime;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Milliseconds since the epoch as a UTC minute stamp.
fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => format!("{millis} ms"),
    }
}

/// Labelled detail lines for the non-empty fields of a record.
fn detail_lines(record: &ContactRecord, depth: usize) -> Vec<String> {
    let fields = [
        ("Contact", &record.contact_person),
        ("Phone", &record.contact_number),
        ("WhatsApp", &record.whatsapp_number),
        ("Email", &record.email),
        ("Website", &record.website),
        ("Address", &record.address),
        ("Business", &record.nature_of_business),
        ("Notes", &record.notes),
    ];
    let pad = indent(depth);
    fields
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{pad}{label}: {value}"))
        .collect()
}

fn record_header(index: usize, record: &ContactRecord) -> String {
    format!(
        "{} {} [{}]",
        format_index(index),
        record.display_name(),
        record.business_type
    )
}

// ============================================================================
// Records
// ============================================================================

/// One record: header plus indented details.
pub fn format_record(index: usize, record: &ContactRecord) -> Vec<String> {
    let mut lines = vec![record_header(index, record)];
    lines.extend(detail_lines(record, 1));
    lines.push(format!(
        "{}Captured: {}",
        indent(1),
        format_timestamp(record.captured_at)
    ));
    lines.push(format!("{}Id: {}", indent(1), record.id));
    lines
}

pub fn format_records(records: &[ContactRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No records".to_string()];
    }
    let mut lines = vec![format!("Records ({})", records.len())];
    for (i, record) in records.iter().enumerate() {
        lines.extend(format_record(i + 1, record));
    }
    lines
}

pub fn print_records(records: &[ContactRecord]) {
    for line in format_records(records) {
        println!("{}", line);
    }
}

/// The block shown to the user before asking to save.
pub fn format_review(record: &ContactRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "Review: {} [{}]",
        record.display_name(),
        record.business_type
    )];
    let details = detail_lines(record, 1);
    if details.is_empty() {
        lines.push(format!("{}(no fields extracted)", indent(1)));
    } else {
        lines.extend(details);
    }
    lines
}

// ============================================================================
// Cycle results
// ============================================================================

pub fn format_cycle_result(result: &CycleResult) -> Vec<String> {
    match result {
        CycleResult::Saved { record, records } => vec![
            format!("Saved {}", record.display_name()),
            format!("{}Id: {}", indent(1), record.id),
            format!("{}{} records total", indent(1), records.len()),
        ],
        CycleResult::Discarded => vec!["Discarded, nothing saved".to_string()],
    }
}

pub fn print_cycle_result(result: &CycleResult) {
    for line in format_cycle_result(result) {
        println!("{}", line);
    }
}

/// Summary for the standalone `enhance` command.
pub fn format_enhanced(output: &Path, image: &EnhancedImage) -> Vec<String> {
    vec![
        format!("Enhanced → {}", output.display()),
        format!(
            "{}{}x{}, {} bytes ({})",
            indent(1),
            image.width,
            image.height,
            image.bytes.len(),
            image.mime_type
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BusinessType;
    use crate::test_helpers::sample_record;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn format_timestamp_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13 UTC");
    }

    // =========================================================================
    // Records
    // =========================================================================

    #[test]
    fn format_record_skips_empty_fields() {
        let lines = format_record(1, &sample_record("abc", "Acme Traders"));
        assert_eq!(lines[0], "001 Acme Traders [Other]");
        assert_eq!(lines[1], "    Phone: 0000000000");
        assert!(!lines.iter().any(|l| l.contains("Email")));
        assert_eq!(lines.last().unwrap(), "    Id: abc");
    }

    #[test]
    fn format_record_full() {
        let mut record = sample_record("abc", "Shree Ganesh Works");
        record.business_type = BusinessType::Manufacturing;
        record.email = "info@sg.example".into();
        record.notes = "ISO 9001".into();

        let lines = format_record(3, &record);
        assert_eq!(lines[0], "003 Shree Ganesh Works [Manufacturing]");
        assert!(lines.contains(&"    Email: info@sg.example".to_string()));
        assert!(lines.contains(&"    Notes: ISO 9001".to_string()));
    }

    #[test]
    fn format_record_unnamed() {
        let lines = format_record(1, &sample_record("x", ""));
        assert_eq!(lines[0], "001 (unnamed) [Other]");
    }

    #[test]
    fn format_records_empty() {
        assert_eq!(format_records(&[]), vec!["No records"]);
    }

    #[test]
    fn format_records_numbers_in_order() {
        let records = [sample_record("b", "Beta"), sample_record("a", "Alpha")];
        let lines = format_records(&records);
        assert_eq!(lines[0], "Records (2)");
        let headers: Vec<&String> = lines.iter().filter(|l| !l.starts_with(' ')).collect();
        assert_eq!(headers[1], "001 Beta [Other]");
        assert_eq!(headers[2], "002 Alpha [Other]");
    }

    #[test]
    fn format_review_without_fields() {
        let mut record = sample_record("x", "");
        record.contact_number.clear();
        let lines = format_review(&record);
        assert_eq!(lines, vec!["Review: (unnamed) [Other]", "    (no fields extracted)"]);
    }

    // =========================================================================
    // Cycle results
    // =========================================================================

    #[test]
    fn format_saved_result() {
        let record = sample_record("id-1", "Acme");
        let result = CycleResult::Saved {
            records: vec![record.clone()],
            record,
        };
        assert_eq!(
            format_cycle_result(&result),
            vec!["Saved Acme", "    Id: id-1", "    1 records total"]
        );
    }

    #[test]
    fn format_discarded_result() {
        assert_eq!(
            format_cycle_result(&CycleResult::Discarded),
            vec!["Discarded, nothing saved"]
        );
    }

    #[test]
    fn format_enhanced_summary() {
        let image = EnhancedImage {
            bytes: vec![0; 10],
            mime_type: "image/jpeg",
            width: 4,
            height: 3,
        };
        let lines = format_enhanced(Path::new("out.jpg"), &image);
        assert_eq!(lines[0], "Enhanced → out.jpg");
        assert_eq!(lines[1], "    4x3, 10 bytes (image/jpeg)");
    }
}
