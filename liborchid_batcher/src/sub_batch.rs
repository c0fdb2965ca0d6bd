use std::fmt;

use time::macros::format_description;
use time::PrimitiveDateTime;

use super::array_setup::ArraySetup;
use super::exceptions::ExceptionTables;
use super::file_record::FileRecord;

/// The detector setup attached to a batch by the setup split
#[derive(Debug, Clone, PartialEq)]
pub struct SetupTag {
    pub index: usize,
    pub name: String,
    pub array: ArraySetup,
}

impl SetupTag {
    pub fn from_tables(tables: &ExceptionTables, index: usize) -> Self {
        let entry = tables.setup(index);
        Self {
            index,
            name: entry.name.clone(),
            array: entry.array.clone(),
        }
    }
}

/// The array position attached to a batch by the position split.
///
/// `coordinates` is the X/Y of the array and may be overridden after segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTag {
    pub index: usize,
    pub name: String,
    pub coordinates: [f64; 2],
}

impl PositionTag {
    pub fn from_tables(tables: &ExceptionTables, index: usize) -> Self {
        let entry = tables.position(index);
        Self {
            index,
            name: entry.name.clone(),
            coordinates: entry.position,
        }
    }
}

/// Start of the first file to end of the last file of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: PrimitiveDateTime,
    pub stop: PrimitiveDateTime,
}

impl TimeSpan {
    /// The span of a run of files. None if there are no files
    pub fn covering(files: &[FileRecord]) -> Option<Self> {
        match (files.first(), files.last()) {
            (Some(first), Some(last)) => Some(Self {
                start: first.start_time,
                stop: last.end_time,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", format_time(&self.start), format_time(&self.stop))
    }
}

/// Format a wall clock time as `YYYY-MM-DD HH:MM:SS.ffffff`
pub fn format_time(time: &PrimitiveDateTime) -> String {
    let format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
    time.format(&format)
        .unwrap_or_else(|_| time.to_string())
}

/// Output of the detector setup split
#[derive(Debug, Clone, PartialEq)]
pub struct SetupBatch {
    pub files: Vec<FileRecord>,
    pub setup: SetupTag,
}

/// Output of the time split
#[derive(Debug, Clone, PartialEq)]
pub struct TimedBatch {
    pub files: Vec<FileRecord>,
    pub setup: SetupTag,
    pub span: TimeSpan,
}

/// A final sub-batch: a run of files with one detector setup, one continuous
/// acquisition, and one array position.
#[derive(Debug, Clone, PartialEq)]
pub struct SubBatch {
    pub files: Vec<FileRecord>,
    pub setup: SetupTag,
    pub span: TimeSpan,
    pub position: PositionTag,
}

impl SubBatch {
    pub fn first_file(&self) -> Option<&FileRecord> {
        self.files.first()
    }

    pub fn last_file(&self) -> Option<&FileRecord> {
        self.files.last()
    }

    /// Override the array position, e.g. after a person has reviewed the batch
    pub fn set_coordinates(&mut self, x: f64, y: f64) {
        self.position.coordinates = [x, y];
    }
}
