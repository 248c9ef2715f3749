//! Backup slot display formatting
//!
//! Formats a project's slots for terminal output.

use chrono::{DateTime, Utc};

use crate::backup::{newest_of, BackupSlot, TimestampSource};

/// Format a project's slots as a table, ordered by slot number
pub fn format_slot_list(project: &str, slots: &[BackupSlot], now: DateTime<Utc>) -> String {
    if slots.is_empty() {
        return format!("No backups found for '{}'.", project);
    }

    let newest = newest_of(slots).map(|s| s.slot_number);
    let name_width = slots
        .iter()
        .map(|s| format!("{}_{}", project, s.slot_number).len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>4}  {:<name_width$}  {:<20}  {:>6}  {}\n",
        "Slot",
        "Name",
        "Created",
        "Age",
        "Notes",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:->4}  {:-<name_width$}  {:-<20}  {:->6}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for slot in slots {
        let mut notes = Vec::new();
        if newest == Some(slot.slot_number) {
            notes.push("newest");
        }
        match slot.timestamp_source {
            TimestampSource::Sidecar => {}
            TimestampSource::ModifiedTime => notes.push("time from mtime"),
            TimestampSource::Unknown => notes.push("time unknown"),
        }

        output.push_str(&format!(
            "{:>4}  {:<name_width$}  {:<20}  {:>6}  {}\n",
            slot.slot_number,
            format!("{}_{}", project, slot.slot_number),
            slot.created_at.format("%Y-%m-%d %H:%M:%S"),
            format_duration(now.signed_duration_since(slot.created_at)),
            notes.join(", "),
            name_width = name_width,
        ));
    }

    output.push_str(&format!("\nTotal: {} backup(s)", slots.len()));
    output
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();

    if total_seconds < 0 {
        return "future".to_string();
    }

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}
