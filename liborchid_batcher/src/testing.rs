// Builders for synthetic raw files used by the unit tests
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::PrimitiveDateTime;

use super::constants::*;

/// A 16 byte event record carrying the given raw timestamp
pub fn event_record(timestamp: u64) -> Vec<u8> {
    let mut record = vec![0u8; EVENT_RECORD_SIZE];
    record[0..2].copy_from_slice(&EVENT_TAG.to_le_bytes());
    record[EVENT_LO_OFFSET..EVENT_LO_OFFSET + 4]
        .copy_from_slice(&((timestamp & 0x7FFF_FFFF) as u32).to_le_bytes());
    record[EVENT_HI_OFFSET..EVENT_HI_OFFSET + 2]
        .copy_from_slice(&((timestamp >> TIMESTAMP_HI_SHIFT) as u16).to_le_bytes());
    record
}

fn to_micros(time: PrimitiveDateTime) -> i64 {
    (time.assume_utc().unix_timestamp_nanos() / 1000) as i64
}

pub struct RawFileBuilder {
    start_time: PrimitiveDateTime,
    run_name: String,
    run_number: u32,
    sequence_number: u32,
    artifact: bool,
    buffers: Vec<(PrimitiveDateTime, Vec<u64>)>,
    truncate_at: Option<usize>,
}

impl RawFileBuilder {
    pub fn new(start_time: PrimitiveDateTime) -> Self {
        Self {
            start_time,
            run_name: String::from("test_run"),
            run_number: 0,
            sequence_number: 0,
            artifact: false,
            buffers: vec![],
            truncate_at: None,
        }
    }

    pub fn run(mut self, name: &str, run_number: u32, sequence_number: u32) -> Self {
        self.run_name = name.to_string();
        self.run_number = run_number;
        self.sequence_number = sequence_number;
        self
    }

    pub fn artifact(mut self) -> Self {
        self.artifact = true;
        self
    }

    /// Cut the written file down to `size` bytes, leaving a partial last buffer
    pub fn truncate(mut self, size: u64) -> Self {
        self.truncate_at = Some(size as usize);
        self
    }

    pub fn buffer(mut self, end_time: PrimitiveDateTime, timestamps: &[u64]) -> Self {
        self.buffers.push((end_time, timestamps.to_vec()));
        self
    }

    pub fn write(&self, path: &Path) {
        let mut bytes = vec![0u8; FILE_HEADER_SIZE as usize];
        if self.artifact {
            bytes[0..4].copy_from_slice(&ARTIFACT_MARKER.to_le_bytes());
        }
        let format =
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");
        let date = self.start_time.format(&format).unwrap();
        bytes[HEADER_DATE_RANGE.start..HEADER_DATE_RANGE.start + date.len()]
            .copy_from_slice(date.as_bytes());
        let name = self.run_name.as_bytes();
        bytes[HEADER_RUN_NAME_RANGE.start..HEADER_RUN_NAME_RANGE.start + name.len()]
            .copy_from_slice(name);
        bytes[HEADER_NUMBERS_OFFSET..HEADER_NUMBERS_OFFSET + 4]
            .copy_from_slice(&self.run_number.to_le_bytes());
        bytes[HEADER_NUMBERS_OFFSET + 4..HEADER_NUMBERS_OFFSET + 8]
            .copy_from_slice(&self.sequence_number.to_le_bytes());

        if self.artifact {
            bytes.extend(std::iter::repeat(0xF0u8).take(ARTIFACT_SIZE as usize));
        }

        for (end_time, timestamps) in self.buffers.iter() {
            let mut buffer = vec![0u8; BUFFER_SIZE as usize];
            let time_offset = BUFFER_TIME_OFFSET as usize;
            buffer[time_offset..time_offset + 8].copy_from_slice(&to_micros(*end_time).to_le_bytes());
            let mut cursor = EVENT_SCAN_OFFSET as usize;
            for ts in timestamps {
                buffer[cursor..cursor + EVENT_RECORD_SIZE].copy_from_slice(&event_record(*ts));
                cursor += EVENT_RECORD_SIZE;
            }
            bytes.extend_from_slice(&buffer);
        }

        if let Some(size) = self.truncate_at {
            bytes.truncate(size);
        }
        std::fs::write(path, bytes).unwrap();
    }
}

/// Write a one buffer raw file named `name` into `dir`
pub fn write_simple_file(
    dir: &Path,
    name: &str,
    start_time: PrimitiveDateTime,
    end_time: PrimitiveDateTime,
    timestamps: &[u64],
) -> PathBuf {
    let path = dir.join(name);
    RawFileBuilder::new(start_time)
        .buffer(end_time, timestamps)
        .write(&path);
    path
}
