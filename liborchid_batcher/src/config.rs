use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::UtcOffset;

use super::constants::*;
use super::error::ConfigError;
use super::header::ClockZone;
use super::segmentation::SplitThresholds;

/// Structure representing the application configuration. Contains pathing and split thresholds
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub exception_table_path: Option<PathBuf>,
    pub split_time_threshold: f64,
    pub timestamp_misorder_threshold: i64,
    pub timestamp_wrap_high: i64,
    pub timestamp_wrap_low: i64,
    /// Offset from UTC of the DAQ clock in seconds. None means the local zone of this machine
    #[serde(default)]
    pub utc_offset_seconds: Option<i32>,
}

impl Default for Config {
    /// Generate a new Config object. The input path will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            exception_table_path: None,
            split_time_threshold: DEFAULT_SPLIT_TIME_THRESHOLD,
            timestamp_misorder_threshold: DEFAULT_TS_MISORDER_THRESHOLD,
            timestamp_wrap_high: DEFAULT_TS_WRAP_HIGH,
            timestamp_wrap_low: DEFAULT_TS_WRAP_LOW,
            utc_offset_seconds: None,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// The input directory must exist before anything can be done
    pub fn check_input_path(&self) -> Result<(), ConfigError> {
        if self.input_path.is_dir() {
            Ok(())
        } else {
            Err(ConfigError::BadInputPath(self.input_path.clone()))
        }
    }

    /// The thresholds used by the time split
    pub fn split_thresholds(&self) -> SplitThresholds {
        SplitThresholds {
            max_gap_seconds: self.split_time_threshold,
            misorder_threshold: self.timestamp_misorder_threshold,
            wrap_high: self.timestamp_wrap_high,
            wrap_low: self.timestamp_wrap_low,
        }
    }

    /// The zone used to turn the epoch times in the raw files into wall clock times.
    ///
    /// With no offset configured the local zone is used; if it cannot be determined we
    /// warn and fall back to UTC.
    pub fn clock_zone(&self) -> Result<ClockZone, ConfigError> {
        match self.utc_offset_seconds {
            Some(seconds) => match UtcOffset::from_whole_seconds(seconds) {
                Ok(offset) => Ok(ClockZone::Fixed(offset)),
                Err(e) => Err(ConfigError::BadUtcOffset(seconds, e)),
            },
            None => match UtcOffset::current_local_offset() {
                Ok(_) => Ok(ClockZone::Local),
                Err(e) => {
                    log::warn!("Could not determine the local UTC offset ({e}); using UTC");
                    Ok(ClockZone::UTC)
                }
            },
        }
    }

    /// The batch name is the name of the input directory
    pub fn batch_name(&self) -> String {
        match self.input_path.components().next_back() {
            Some(last) => last.as_os_str().to_string_lossy().to_string(),
            None => String::new(),
        }
    }

    /// Get the name and output folder of sub-batch `index` out of `n_batches`.
    ///
    /// A batch that was not split keeps the plain batch name.
    pub fn get_sub_batch_folder(&self, index: usize, n_batches: usize) -> (String, PathBuf) {
        let name = if n_batches == 1 {
            self.batch_name()
        } else {
            format!("{}_{index}", self.batch_name())
        };
        let folder = self.output_path.join(&name);
        (name, folder)
    }

    pub fn has_exception_table_path(&self) -> bool {
        self.exception_table_path.is_some()
    }
}
