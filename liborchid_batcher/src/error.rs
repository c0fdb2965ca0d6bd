use std::path::PathBuf;
use thiserror::Error;

use super::constants::HEADER_READ_SIZE;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("Failed to read raw file header: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open raw file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Raw file of size {0} is too small to hold a header; expected at least {min} bytes", min=HEADER_READ_SIZE)]
    TruncatedHeader(u64),
    #[error("Raw file header has an unparsable acquisition date {0:?}: {1}")]
    BadDate(String, time::error::Parse),
}

/// Where in a file an event scan was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLocation {
    FirstBuffer,
    LastBuffer,
}

/// Non-fatal problems found while reading a raw file. The record is still produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileIssue {
    #[error("File of size {size} is smaller than one header plus one buffer")]
    Undersized { size: u64 },
    #[error("No event record found in the {location:?} scan window")]
    UnmatchedEventTag { location: ScanLocation },
    #[error("Could not read the last buffer end time; using the modification time instead")]
    MissingBufferTime,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("FileCatalog failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("FileCatalog could not open directory {0:?} because it does not exist")]
    BadDirectory(PathBuf),
}

#[derive(Debug, Error)]
pub enum ExceptionTableError {
    #[error("ExceptionTables failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ExceptionTables failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("ExceptionTables found invalid glob pattern {0:?} in position exception {1}: {2}")]
    BadPattern(String, String, glob::PatternError),
}

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("The {0} split was given no files; at least one file is required")]
    EmptyInput(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has an input path {0:?} which is not a directory")]
    BadInputPath(PathBuf),
    #[error("Config has an invalid UTC offset of {0} seconds: {1}")]
    BadUtcOffset(i32, time::error::ComponentRange),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to FileCatalog error: {0}")]
    CatalogError(#[from] CatalogError),
    #[error("Processor failed due to ExceptionTables error: {0}")]
    TableError(#[from] ExceptionTableError),
    #[error("Processor failed due to segmentation error: {0}")]
    SegmentationError(#[from] SegmentationError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed because no readable raw files were found in the input directory")]
    NoFilesError,
}
