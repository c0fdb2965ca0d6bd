//! # orchid_batcher
//!
//! orchid_batcher prepares batches of ORCHID detector array data for analysis, written
//! in Rust. It takes a directory of raw digitizer files, reads the header and trailer
//! of every file, and splits the directory into sub-batches which each have a single
//! detector setup, one continuous acquisition, and a single array position. Each
//! sub-batch is tagged with the detector setup, time span, and array position the
//! analysis needs but cannot work out from the raw files alone.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see
//! the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! To build and install the CLI use `cargo install --path ./orchid_batcher_cli` from the
//! top level orchid_batcher repository.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! input_path: /data1/prospect/Data/ORCHID_Data/Batch7
//! output_path: /data1/prospect/ProcessedData/OrchidAnalysis/TimeSeries_2017
//! exception_table_path: null
//! split_time_threshold: 120.0
//! timestamp_misorder_threshold: 5000000000
//! timestamp_wrap_high: 140596750866972
//! timestamp_wrap_low: 140737488355
//! utc_offset_seconds: null
//! ```
//!
//! - `input_path`: the batch directory of raw files. Every regular file in it is read.
//! - `output_path`: base directory the sub-batch folders are named under.
//! - `exception_table_path`: YAML file of the known setup and position exceptions. If
//!   set to `null`, the tables bundled with the code base are used.
//! - `split_time_threshold`: a gap (seconds) between the end of one file and the start
//!   of the next larger than this splits the batch.
//! - `timestamp_*`: limits used to tell a digitizer clock reset from the counter
//!   wrapping around.
//! - `utc_offset_seconds`: offset from UTC of the clock the DAQ wrote its header dates
//!   in. Buffer end times are stored as epoch values and are shifted into this zone so
//!   they can be compared with the header dates. If `null`, the local zone of the
//!   machine running the batcher is used.
//!
//! ## Exception Tables
//!
//! ```yml
//! default_setup: { name: Default, array: { 0: <detector>, ... } }
//! setup_exceptions:
//!   - { name: CeBr3, patterns: ["Sept28_0001.dat", ...], array: { ... } }
//! default_position: { name: Default, position: [142.0, 74.0] }
//! position_exceptions:
//!   - { name: PastRxWall, patterns: ["*Jan12_2017_pastRxWall_0000*"], position: [234.0, 279.0] }
//! ```
//!
//! where a detector is
//! `{ digitizer: [board, channel], mpod: [board, channel], offset: [x, y, z], det_type: LS, thresholds: [65532.0, 1.0] }`.
//!
//! Setup patterns match if the file name *contains* them. Position patterns are shell
//! style globs which must match the *whole* file name.
//!
//! ## Raw File Format
//!
//! ```text
//! 0-4095        file header
//! |---- 26-55   acquisition start, NUL padded "YYYY-MM-DDTHH:MM:SS.ffffff"
//! |---- 56-155  run name, NUL padded
//! |---- 156-163 run number, sequence number (u32 LE)
//! 4096+         2097152 byte buffers
//! |---- +24     end of write time, i64 LE microseconds since the epoch
//! |---- +8160   records; event records are tagged 527 and carry lo:u32, hi:u16 at +4
//! ```
//!
//! Some files have an extra 8192 bytes in front of the buffers, marked by `0xF0F0F0F0`
//! in the first word of the file. These are detected and skipped.
pub mod array_setup;
pub mod batch_plan;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod exceptions;
pub mod file_record;
pub mod header;
pub mod process;
pub mod segmentation;
pub mod sub_batch;
#[cfg(test)]
mod testing;
