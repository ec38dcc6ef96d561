//! Version identifiers and records

use crate::hash::Blake3Hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Minimum number of digits in a rendered version id (`v001`).
pub const DEFAULT_ID_WIDTH: usize = 3;

/// Identifier of one snapshot: `v` followed by a zero-padded ordinal.
///
/// Ids compare by ordinal, so `v999 < v1000` even though the strings do not.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId {
    ordinal: u64,
    width: u8,
}

impl VersionId {
    /// Id for an ordinal, rendered with the default width.
    pub const fn new(ordinal: u64) -> Self {
        Self {
            ordinal,
            width: DEFAULT_ID_WIDTH as u8,
        }
    }

    /// Id for an ordinal rendered with at least `width` digits.
    pub fn with_width(ordinal: u64, width: usize) -> Self {
        Self {
            ordinal,
            width: width.clamp(1, 20) as u8,
        }
    }

    /// Numeric ordinal allocated by the sequencer.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }
}

// Width is presentation only: `v07` and `v007` name the same version.
impl PartialEq for VersionId {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl Eq for VersionId {}

impl std::hash::Hash for VersionId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ordinal.hash(state);
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal.cmp(&other.ordinal)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:0width$}", self.ordinal, width = self.width as usize)
    }
}

impl FromStr for VersionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .ok_or_else(|| format!("version id must start with 'v': {s:?}"))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("version id must be 'v' followed by digits: {s:?}"));
        }

        let ordinal = digits
            .parse::<u64>()
            .map_err(|e| format!("version id out of range: {s:?} ({e})"))?;

        Ok(Self::with_width(ordinal, digits.len()))
    }
}

impl TryFrom<String> for VersionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionId> for String {
    fn from(id: VersionId) -> Self {
        id.to_string()
    }
}

/// Structured description of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub id: VersionId,
    /// When the snapshot was taken (absent only for hand-edited records)
    pub created_at: Option<DateTime<Utc>>,
    /// Immutable copy of the document at this version
    pub snapshot_path: PathBuf,
    /// Live document the snapshot was taken from
    pub source_path: PathBuf,
    /// Size of the snapshot file at creation time
    pub size_bytes: u64,
    /// BLAKE3 digest of the snapshot bytes at creation time
    pub content_hash: Option<Blake3Hash>,
    pub notes: Option<String>,
    pub author: Option<String>,
    pub host: Option<String>,
    /// Keys this version of the codec does not know about
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl VersionRecord {
    /// Short human label: `v003 - first draft`
    pub fn label(&self) -> String {
        match self.notes.as_deref() {
            Some(notes) if !notes.is_empty() => format!("{} - {}", self.id, notes),
            _ => self.id.to_string(),
        }
    }
}

/// Fold free text into a single line so it can live in a record.
///
/// Line breaks and tabs become single spaces and the result is trimmed.
/// Blank text yields `None`.
pub fn sanitize_notes(notes: &str) -> Option<String> {
    let folded = notes
        .split(|c: char| c == '\n' || c == '\r' || c == '\t')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if folded.is_empty() {
        None
    } else {
        Some(folded)
    }
}
