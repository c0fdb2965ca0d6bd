use std::fmt;
use std::path::PathBuf;

use super::config::Config;
use super::sub_batch::{format_time, SubBatch};

/// A sub-batch together with the name and output folder it will be processed under.
///
/// Nothing is created on disk; this is what gets handed to whatever builds the
/// processing jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub name: String,
    pub folder: PathBuf,
    pub batch: SubBatch,
}

impl BatchPlan {
    /// Name every sub-batch. A lone sub-batch takes the batch name, otherwise they are numbered
    pub fn name_sub_batches(config: &Config, sub_batches: Vec<SubBatch>) -> Vec<Self> {
        let n_batches = sub_batches.len();
        sub_batches
            .into_iter()
            .enumerate()
            .map(|(idx, batch)| {
                let (name, folder) = config.get_sub_batch_folder(idx, n_batches);
                Self {
                    name,
                    folder,
                    batch,
                }
            })
            .collect()
    }
}

impl fmt::Display for BatchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self
            .batch
            .first_file()
            .map(|r| r.path.to_string_lossy().to_string())
            .unwrap_or_default();
        let last = self
            .batch
            .last_file()
            .map(|r| r.path.to_string_lossy().to_string())
            .unwrap_or_default();
        writeln!(f, "Sub-batch: {} ({})", self.name, self.folder.to_string_lossy())?;
        writeln!(f, "First File: {first}")?;
        writeln!(f, " Last File: {last}")?;
        writeln!(f, "Start Time: {}", format_time(&self.batch.span.start))?;
        writeln!(f, "  End Time: {}", format_time(&self.batch.span.stop))?;
        writeln!(f, "Setup Name: {}", self.batch.setup.name)?;
        writeln!(
            f,
            "  Position: {} X={:4.1}, Y={:4.1}",
            self.batch.position.name,
            self.batch.position.coordinates[0],
            self.batch.position.coordinates[1]
        )?;
        writeln!(f, "Detector Setup:")?;
        write!(f, "{}", self.batch.setup.array)
    }
}
