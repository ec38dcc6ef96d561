//! Flat `key: value` text encoding for version records
//!
//! One field per line in a fixed order. Values are written verbatim, so a
//! value must never contain a line break (see [`crate::sanitize_notes`]).
//! Decoding keeps unknown keys in [`VersionRecord::extra`] and only fails when
//! the record cannot identify itself or its snapshot.

use crate::error::DecodeError;
use crate::hash::Blake3Hash;
use crate::record::{VersionId, VersionRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const KEY_ID: &str = "id";
pub const KEY_CREATED_AT: &str = "createdAt";
pub const KEY_SNAPSHOT_PATH: &str = "snapshotPath";
pub const KEY_SOURCE_PATH: &str = "sourcePath";
pub const KEY_SIZE_BYTES: &str = "sizeBytes";
pub const KEY_CONTENT_HASH: &str = "contentHash";
pub const KEY_NOTES: &str = "notes";
pub const KEY_AUTHOR: &str = "author";
pub const KEY_HOST: &str = "host";

/// Encode a record as `key: value` lines.
pub fn encode(record: &VersionRecord) -> String {
    let mut out = String::new();

    push_line(&mut out, KEY_ID, &record.id.to_string());
    if let Some(created_at) = record.created_at {
        push_line(
            &mut out,
            KEY_CREATED_AT,
            &created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        );
    }
    push_line(&mut out, KEY_SNAPSHOT_PATH, &record.snapshot_path.to_string_lossy());
    push_line(&mut out, KEY_SOURCE_PATH, &record.source_path.to_string_lossy());
    push_line(&mut out, KEY_SIZE_BYTES, &record.size_bytes.to_string());
    if let Some(hash) = &record.content_hash {
        push_line(&mut out, KEY_CONTENT_HASH, &hash.to_hex());
    }
    for (key, value) in [
        (KEY_NOTES, &record.notes),
        (KEY_AUTHOR, &record.author),
        (KEY_HOST, &record.host),
    ] {
        if let Some(value) = value {
            push_line(&mut out, key, value);
        }
    }
    for (key, value) in &record.extra {
        push_line(&mut out, key, value);
    }

    out
}

fn push_line(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{key}: {value}");
}

/// Decode a record from `key: value` lines.
pub fn decode(text: &str) -> Result<VersionRecord, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        // Only the separator space is dropped so values keep their own spacing.
        let value = value.strip_prefix(' ').unwrap_or(value);
        let value = value.strip_suffix('\r').unwrap_or(value);
        fields.insert(key.to_string(), value.to_string());
    }

    let raw_id = take_non_empty(&mut fields, KEY_ID).ok_or(DecodeError::MissingField(KEY_ID))?;
    let id: VersionId = raw_id.trim().parse().map_err(|_| DecodeError::InvalidField {
        field: KEY_ID,
        value: raw_id.clone(),
    })?;

    let snapshot_path = take_non_empty(&mut fields, KEY_SNAPSHOT_PATH)
        .map(PathBuf::from)
        .ok_or(DecodeError::MissingField(KEY_SNAPSHOT_PATH))?;

    let created_at = take_non_empty(&mut fields, KEY_CREATED_AT)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let source_path = take_non_empty(&mut fields, KEY_SOURCE_PATH)
        .map(PathBuf::from)
        .unwrap_or_default();

    let size_bytes = take_non_empty(&mut fields, KEY_SIZE_BYTES)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let content_hash = take_non_empty(&mut fields, KEY_CONTENT_HASH)
        .and_then(|raw| Blake3Hash::from_hex(raw.trim()).ok());

    let notes = take_non_empty(&mut fields, KEY_NOTES);
    let author = take_non_empty(&mut fields, KEY_AUTHOR);
    let host = take_non_empty(&mut fields, KEY_HOST);

    Ok(VersionRecord {
        id,
        created_at,
        snapshot_path,
        source_path,
        size_bytes,
        content_hash,
        notes,
        author,
        host,
        extra: fields,
    })
}

fn take_non_empty(fields: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    fields.remove(key).filter(|value| !value.trim().is_empty())
}

/// Read and decode a record file.
///
/// Missing, unreadable and empty files are typed failures, never panics.
pub fn decode_file(path: &Path) -> Result<VersionRecord, DecodeError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DecodeError::Unreadable(format!("{}: {}", path.display(), e)))?;
    decode(&text)
}
