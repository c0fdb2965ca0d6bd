use std::borrow::Cow;
use std::path::PathBuf;

use time::PrimitiveDateTime;

use super::constants::MISSING_TIMESTAMP;
use super::error::FileIssue;

/// Combine the two halves of a raw digitizer timestamp
pub fn combine_timestamp(lo: u32, hi: u16) -> u64 {
    ((hi as u64) << super::constants::TIMESTAMP_HI_SHIFT) | (lo as u64)
}

/// FileRecord is everything we learn about one raw data file.
///
/// Records are created once by the header reader and then only moved between
/// the segmentation passes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Size on disk in bytes
    pub file_size: u64,
    pub start_time: PrimitiveDateTime,
    pub run_name: String,
    pub run_number: u32,
    pub sequence_number: u32,
    pub end_time: PrimitiveDateTime,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
    pub issues: Vec<FileIssue>,
}

impl FileRecord {
    /// The final component of the path, which is what exception patterns are matched against
    pub fn file_name(&self) -> Cow<'_, str> {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.path.to_string_lossy(),
        }
    }

    /// The last raw timestamp, with an absent timestamp mapped to -1
    pub fn last_timestamp_or_sentinel(&self) -> i64 {
        self.last_timestamp
            .map_or(MISSING_TIMESTAMP, |ts| ts as i64)
    }
}
