use std::path::{Path, PathBuf};

use super::error::CatalogError;
use super::file_record::FileRecord;
use super::header::{read_file_record, ClockZone};

/// FileCatalog is the time ordered list of every readable raw file in a batch directory.
///
/// Files whose header cannot be read at all are reported and left out; everything
/// else is kept, even if it is malformed, so that segmentation sees the full batch.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    records: Vec<FileRecord>,
    total_data_size_bytes: u64,
    n_skipped: usize,
}

impl FileCatalog {
    /// Create a new FileCatalog from a directory. Epoch times are read as wall clock times in `zone`.
    ///
    /// `progress` is called after every file with the fraction of files read so far.
    pub fn new(
        dir: &Path,
        zone: ClockZone,
        mut progress: impl FnMut(f32),
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        let file_list = catalog.get_file_stack(dir)?;
        let n_files = file_list.len();

        for (idx, path) in file_list.into_iter().enumerate() {
            catalog.add_file(&path, zone);
            progress((idx + 1) as f32 / n_files as f32);
        }

        // Stable, so files with identical start times keep their listing order
        catalog.records.sort_by_key(|record| record.start_time);
        Ok(catalog)
    }

    /// Read one file into the catalog. A file that cannot be read is reported and counted, never fatal
    fn add_file(&mut self, path: &Path, zone: ClockZone) {
        match read_file_record(path, zone) {
            Ok(record) => {
                self.total_data_size_bytes += record.file_size;
                self.records.push(record);
            }
            Err(e) => {
                log::error!("Skipping {}: {e}", path.to_string_lossy());
                self.n_skipped += 1;
            }
        }
    }

    /// Get all regular files in the directory, ordered by path so the listing is reproducible.
    ///
    /// Only a directory that cannot be listed at all is an error; bad entries are skipped.
    fn get_file_stack(&mut self, dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
        if !dir.is_dir() {
            return Err(CatalogError::BadDirectory(dir.to_path_buf()));
        }
        let mut file_list: Vec<PathBuf> = Vec::new();
        for item in dir.read_dir()? {
            match item {
                Ok(entry) => {
                    let item_path = entry.path();
                    if item_path.is_file() {
                        file_list.push(item_path);
                    }
                }
                Err(e) => {
                    log::error!("Skipping unreadable entry in {}: {e}", dir.to_string_lossy());
                    self.n_skipped += 1;
                }
            }
        }
        file_list.sort();
        Ok(file_list)
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of files (or directory entries) that could not be read
    pub fn n_skipped(&self) -> usize {
        self.n_skipped
    }

    pub fn get_total_data_size(&self) -> u64 {
        self.total_data_size_bytes
    }
}
