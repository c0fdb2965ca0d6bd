use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::constants::*;
use super::error::{FileIssue, HeaderError, ScanLocation};
use super::file_record::{combine_timestamp, FileRecord};

/// Where the buffers of a raw file live, given its size.
///
/// A raw file is a 4096 byte header followed by whole 2 MiB buffers. Some files
/// also carry an 8192 byte fragment in front of the buffers, which we detect from
/// the size remainder and the marker word, and then step over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub file_size: u64,
    pub artifact_offset: u64,
    pub n_buffers: u64,
}

impl BufferLayout {
    /// Compute the layout from the file size and the first four bytes of the file
    pub fn new(file_size: u64, leading_word: u32) -> Self {
        let data_size = file_size.saturating_sub(FILE_HEADER_SIZE);
        let artifact_offset =
            if data_size % BUFFER_SIZE >= ARTIFACT_SIZE && leading_word == ARTIFACT_MARKER {
                ARTIFACT_SIZE
            } else {
                0
            };
        Self {
            file_size,
            artifact_offset,
            n_buffers: (data_size - artifact_offset) / BUFFER_SIZE,
        }
    }

    pub fn has_artifact(&self) -> bool {
        self.artifact_offset != 0
    }

    /// Smaller than one header plus one buffer
    pub fn is_undersized(&self) -> bool {
        self.file_size < FILE_HEADER_SIZE + BUFFER_SIZE
    }

    /// Offset of the first buffer, if any buffer data exists at all (it may be partial)
    pub fn first_buffer_offset(&self) -> Option<u64> {
        let offset = FILE_HEADER_SIZE + self.artifact_offset;
        if self.file_size > offset {
            Some(offset)
        } else {
            None
        }
    }

    /// Offset of the last complete buffer. Falls back to the (partial) first
    /// buffer for files without a complete one.
    pub fn last_buffer_offset(&self) -> Option<u64> {
        match self.n_buffers.checked_sub(1) {
            Some(last) => Some(FILE_HEADER_SIZE + self.artifact_offset + BUFFER_SIZE * last),
            None => self.first_buffer_offset(),
        }
    }
}

/// The decoded part of the 4096 byte file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub start_time: PrimitiveDateTime,
    pub run_name: String,
    pub run_number: u32,
    pub sequence_number: u32,
}

impl FileHeader {
    pub fn parse(bytes: &[u8; HEADER_READ_SIZE]) -> Result<Self, HeaderError> {
        let date_str = trim_padding(&bytes[HEADER_DATE_RANGE]);
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
        let start_time = match PrimitiveDateTime::parse(&date_str, &format) {
            Ok(t) => t,
            Err(e) => return Err(HeaderError::BadDate(date_str, e)),
        };

        Ok(Self {
            start_time,
            run_name: trim_padding(&bytes[HEADER_RUN_NAME_RANGE]),
            run_number: LittleEndian::read_u32(&bytes[HEADER_NUMBERS_OFFSET..]),
            sequence_number: LittleEndian::read_u32(&bytes[(HEADER_NUMBERS_OFFSET + 4)..]),
        })
    }
}

/// Strip the NUL padding from a fixed-width header string
fn trim_padding(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches('\0')
        .to_string()
}

/// Walks the records of a buffer window, yielding the timestamp of every event record.
///
/// Records that are not events are skipped using their tag as a length. A zero tag
/// marks the end of the data.
#[derive(Debug)]
pub struct EventTimestamps<'a> {
    window: &'a [u8],
    cursor: usize,
}

impl<'a> EventTimestamps<'a> {
    pub fn new(window: &'a [u8]) -> Self {
        Self { window, cursor: 0 }
    }
}

impl Iterator for EventTimestamps<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.cursor + EVENT_RECORD_MIN_SIZE <= self.window.len() {
            let record = &self.window[self.cursor..];
            let tag = LittleEndian::read_u16(record);
            if tag == 0 {
                self.cursor = self.window.len();
                return None;
            } else if tag == EVENT_TAG {
                let lo = LittleEndian::read_u32(&record[EVENT_LO_OFFSET..]);
                let hi = LittleEndian::read_u16(&record[EVENT_HI_OFFSET..]);
                self.cursor += EVENT_RECORD_SIZE;
                return Some(combine_timestamp(lo, hi));
            }
            self.cursor += tag as usize;
        }
        None
    }
}

/// Read the event scan window of the buffer starting at `buffer_offset`, clamped to the file
fn read_scan_window(
    file: &mut File,
    buffer_offset: u64,
    file_size: u64,
) -> Result<Vec<u8>, std::io::Error> {
    let start = buffer_offset + EVENT_SCAN_OFFSET;
    let stop = (start + EVENT_SCAN_SIZE).min(file_size);
    if start >= stop {
        return Ok(Vec::new());
    }
    let mut window = vec![0u8; (stop - start) as usize];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut window)?;
    Ok(window)
}

/// How the epoch values in a raw file (buffer end time, modification time) are
/// turned into wall clock times comparable with the header start date.
///
/// The header date is wall clock time of the DAQ machine; epoch values are shifted
/// into the same zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockZone {
    /// The local zone of this machine, looked up at each instant (follows DST)
    Local,
    /// A fixed offset from UTC
    Fixed(UtcOffset),
}

impl ClockZone {
    pub const UTC: Self = Self::Fixed(UtcOffset::UTC);

    /// Convert an instant to a zone-less wall clock time
    pub fn wall_clock(&self, time: OffsetDateTime) -> PrimitiveDateTime {
        let offset = match self {
            Self::Local => UtcOffset::local_offset_at(time).unwrap_or(UtcOffset::UTC),
            Self::Fixed(offset) => *offset,
        };
        let shifted = time.to_offset(offset);
        PrimitiveDateTime::new(shifted.date(), shifted.time())
    }
}

/// Read the end-of-write wall clock of the buffer starting at `buffer_offset`.
///
/// Returns None if the buffer is too short or holds no usable time.
fn read_buffer_time(
    file: &mut File,
    buffer_offset: u64,
    file_size: u64,
    zone: ClockZone,
) -> Result<Option<PrimitiveDateTime>, std::io::Error> {
    let start = buffer_offset + BUFFER_TIME_OFFSET;
    if start + BUFFER_TIME_READ_SIZE as u64 > file_size {
        return Ok(None);
    }
    let mut bytes = [0u8; BUFFER_TIME_READ_SIZE];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut bytes)?;

    let micros = LittleEndian::read_i64(&bytes);
    if micros <= 0 {
        return Ok(None);
    }
    Ok(
        OffsetDateTime::from_unix_timestamp_nanos(micros as i128 * 1000)
            .ok()
            .map(|t| zone.wall_clock(t)),
    )
}

fn modification_time(file: &File, zone: ClockZone) -> Result<PrimitiveDateTime, std::io::Error> {
    let modified = file.metadata()?.modified()?;
    Ok(zone.wall_clock(OffsetDateTime::from(modified)))
}

/// Read the header and trailer information of a single raw file.
///
/// Only failures that leave us without a sortable start time are errors. Anything
/// else (undersized file, no event records, no buffer time) is attached to the
/// record as a FileIssue and logged, and sentinel values are used. Epoch values are
/// converted to wall clock times in `zone`.
pub fn read_file_record(path: &Path, zone: ClockZone) -> Result<FileRecord, HeaderError> {
    if !path.exists() {
        return Err(HeaderError::BadFilePath(path.to_path_buf()));
    }
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();
    if file_size < HEADER_READ_SIZE as u64 {
        return Err(HeaderError::TruncatedHeader(file_size));
    }

    let mut header_bytes = [0u8; HEADER_READ_SIZE];
    file.read_exact(&mut header_bytes)?;
    let header = FileHeader::parse(&header_bytes)?;

    let layout = BufferLayout::new(file_size, LittleEndian::read_u32(&header_bytes));
    let mut issues: Vec<FileIssue> = Vec::new();
    if layout.is_undersized() {
        issues.push(FileIssue::Undersized { size: file_size });
    }

    let first_timestamp = match layout.first_buffer_offset() {
        Some(offset) => {
            let window = read_scan_window(&mut file, offset, file_size)?;
            EventTimestamps::new(&window).next()
        }
        None => None,
    };
    if first_timestamp.is_none() {
        issues.push(FileIssue::UnmatchedEventTag {
            location: ScanLocation::FirstBuffer,
        });
    }

    let (last_timestamp, buffer_time) = match layout.last_buffer_offset() {
        Some(offset) => {
            let window = read_scan_window(&mut file, offset, file_size)?;
            (
                EventTimestamps::new(&window).last(),
                read_buffer_time(&mut file, offset, file_size, zone)?,
            )
        }
        None => (None, None),
    };
    if last_timestamp.is_none() {
        issues.push(FileIssue::UnmatchedEventTag {
            location: ScanLocation::LastBuffer,
        });
    }

    let end_time = match buffer_time {
        Some(t) => t,
        None => {
            issues.push(FileIssue::MissingBufferTime);
            modification_time(&file, zone)?
        }
    };

    for issue in issues.iter() {
        log::warn!("{}: {issue}", path.to_string_lossy());
    }

    Ok(FileRecord {
        path: path.to_path_buf(),
        file_size,
        start_time: header.start_time,
        run_name: header.run_name,
        run_number: header.run_number,
        sequence_number: header.sequence_number,
        end_time,
        first_timestamp,
        last_timestamp,
        issues,
    })
}
