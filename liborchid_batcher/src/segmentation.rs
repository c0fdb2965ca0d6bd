//! The batch segmentation engine.
//!
//! A time ordered catalog of files is refined by three splits, each a pure function
//! from one list of batches to the next:
//!
//! 1. [`split_by_setup`]: runs of files sharing a detector setup exception
//! 2. [`split_by_time`]: within each of those, runs without an acquisition gap or a
//!    digitizer clock reset
//! 3. [`split_by_position`]: within each of those, runs sharing an array position
//!
//! The later splits never merge files across the boundaries of an earlier split.
use super::constants::{
    DEFAULT_SPLIT_TIME_THRESHOLD, DEFAULT_TS_MISORDER_THRESHOLD, DEFAULT_TS_WRAP_HIGH,
    DEFAULT_TS_WRAP_LOW,
};
use super::error::SegmentationError;
use super::exceptions::ExceptionTables;
use super::file_record::FileRecord;
use super::sub_batch::{PositionTag, SetupBatch, SetupTag, SubBatch, TimeSpan, TimedBatch};

const SETUP_SPLIT: &str = "detector setup";
const TIME_SPLIT: &str = "time";
const POSITION_SPLIT: &str = "position";

/// The numeric limits used by the time split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitThresholds {
    /// Largest allowed gap in seconds between the end of one file and the start of the next
    pub max_gap_seconds: f64,
    /// How far the raw timestamp may step backwards before it counts as a reset
    pub misorder_threshold: i64,
    /// A previous timestamp above this ...
    pub wrap_high: i64,
    /// ... followed by a current timestamp below this is a counter wraparound
    pub wrap_low: i64,
}

impl Default for SplitThresholds {
    fn default() -> Self {
        Self {
            max_gap_seconds: DEFAULT_SPLIT_TIME_THRESHOLD,
            misorder_threshold: DEFAULT_TS_MISORDER_THRESHOLD,
            wrap_high: DEFAULT_TS_WRAP_HIGH,
            wrap_low: DEFAULT_TS_WRAP_LOW,
        }
    }
}

impl SplitThresholds {
    /// The wall clock gap between the two files exceeds the threshold (strictly)
    pub fn is_gap(&self, previous: &FileRecord, current: &FileRecord) -> bool {
        (current.start_time - previous.end_time).as_seconds_f64() > self.max_gap_seconds
    }

    /// The raw timestamp went backwards by more than the guard margin and it was not
    /// the counter wrapping around. Absent timestamps take part as -1.
    pub fn is_clock_reset(&self, previous_ts: i64, current_ts: i64) -> bool {
        let went_backwards = current_ts.saturating_add(self.misorder_threshold) < previous_ts;
        let wrapped = previous_ts > self.wrap_high && current_ts < self.wrap_low;
        went_backwards && !wrapped
    }

    /// Should `current` start a new batch instead of following `previous`?
    pub fn is_break(&self, previous: &FileRecord, current: &FileRecord) -> bool {
        self.is_gap(previous, current)
            || self.is_clock_reset(
                previous.last_timestamp_or_sentinel(),
                current.last_timestamp_or_sentinel(),
            )
    }
}

/// RunBuilder collects consecutive files that share a key.
///
/// Appending a file with a different key than the current run completes that run and
/// starts a new one with the file.
#[derive(Debug)]
struct RunBuilder<K> {
    current_key: Option<K>,
    files: Vec<FileRecord>,
}

impl<K: PartialEq> RunBuilder<K> {
    fn new() -> Self {
        Self {
            current_key: None,
            files: Vec::new(),
        }
    }

    /// Returns the completed run, if the key changed and the run held any files
    fn append(&mut self, key: K, record: FileRecord) -> Option<(K, Vec<FileRecord>)> {
        if self.current_key.as_ref() == Some(&key) {
            self.files.push(record);
            return None;
        }
        let completed = self
            .current_key
            .replace(key)
            .map(|previous| (previous, std::mem::take(&mut self.files)));
        self.files.push(record);
        completed.filter(|(_, files)| !files.is_empty())
    }

    /// Take the final run. Only None if nothing was ever appended
    fn flush(self) -> Option<(K, Vec<FileRecord>)> {
        self.current_key.map(|key| (key, self.files))
    }
}

/// Split the catalog wherever the detector setup exception changes.
pub fn split_by_setup(
    records: Vec<FileRecord>,
    tables: &ExceptionTables,
) -> Result<Vec<SetupBatch>, SegmentationError> {
    if records.is_empty() {
        return Err(SegmentationError::EmptyInput(SETUP_SPLIT));
    }

    let mut batches: Vec<SetupBatch> = Vec::new();
    let mut builder: RunBuilder<usize> = RunBuilder::new();
    for record in records {
        let tag = tables.match_setup(&record.file_name()).index;
        if let Some((index, files)) = builder.append(tag, record) {
            batches.push(SetupBatch {
                files,
                setup: SetupTag::from_tables(tables, index),
            });
        }
    }
    if let Some((index, files)) = builder.flush() {
        batches.push(SetupBatch {
            files,
            setup: SetupTag::from_tables(tables, index),
        });
    }
    Ok(batches)
}

/// Split each setup batch wherever acquisition was interrupted or the digitizer clock was reset.
pub fn split_by_time(
    batches: Vec<SetupBatch>,
    thresholds: &SplitThresholds,
) -> Result<Vec<TimedBatch>, SegmentationError> {
    if batches.is_empty() {
        return Err(SegmentationError::EmptyInput(TIME_SPLIT));
    }

    let mut timed: Vec<TimedBatch> = Vec::new();
    for SetupBatch { files, setup } in batches {
        if files.is_empty() {
            return Err(SegmentationError::EmptyInput(TIME_SPLIT));
        }
        let mut current: Vec<FileRecord> = Vec::new();
        for record in files {
            if let Some(previous) = current.last() {
                if thresholds.is_break(previous, &record) {
                    let completed = std::mem::take(&mut current);
                    timed.push(make_timed_batch(completed, setup.clone())?);
                }
            }
            current.push(record);
        }
        timed.push(make_timed_batch(current, setup)?);
    }
    Ok(timed)
}

fn make_timed_batch(
    files: Vec<FileRecord>,
    setup: SetupTag,
) -> Result<TimedBatch, SegmentationError> {
    let span = TimeSpan::covering(&files).ok_or(SegmentationError::EmptyInput(TIME_SPLIT))?;
    Ok(TimedBatch { files, setup, span })
}

/// Split each timed batch wherever the array position exception changes.
///
/// The setup and time span of the parent batch are carried over unchanged.
pub fn split_by_position(
    batches: Vec<TimedBatch>,
    tables: &ExceptionTables,
) -> Result<Vec<SubBatch>, SegmentationError> {
    if batches.is_empty() {
        return Err(SegmentationError::EmptyInput(POSITION_SPLIT));
    }

    let mut sub_batches: Vec<SubBatch> = Vec::new();
    for TimedBatch { files, setup, span } in batches {
        if files.is_empty() {
            return Err(SegmentationError::EmptyInput(POSITION_SPLIT));
        }
        let mut builder: RunBuilder<usize> = RunBuilder::new();
        for record in files {
            let tag = tables.match_position(&record.file_name()).index;
            if let Some((index, files)) = builder.append(tag, record) {
                sub_batches.push(SubBatch {
                    files,
                    setup: setup.clone(),
                    span,
                    position: PositionTag::from_tables(tables, index),
                });
            }
        }
        if let Some((index, files)) = builder.flush() {
            sub_batches.push(SubBatch {
                files,
                setup,
                span,
                position: PositionTag::from_tables(tables, index),
            });
        }
    }
    Ok(sub_batches)
}

/// Run all three splits over a time ordered catalog
pub fn split_into_sub_batches(
    records: Vec<FileRecord>,
    tables: &ExceptionTables,
    thresholds: &SplitThresholds,
) -> Result<Vec<SubBatch>, SegmentationError> {
    let setup_batches = split_by_setup(records, tables)?;
    log::info!("Detector setup split produced {} batches", setup_batches.len());
    let timed_batches = split_by_time(setup_batches, thresholds)?;
    log::info!("Time split produced {} batches", timed_batches.len());
    let sub_batches = split_by_position(timed_batches, tables)?;
    log::info!("Position split produced {} batches", sub_batches.len());
    Ok(sub_batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use time::macros::datetime;
    use time::{Duration, PrimitiveDateTime};

    const T0: PrimitiveDateTime = datetime!(2016-09-28 00:00:00);

    /// A 10 minute file starting `minute` minutes after T0
    fn record(name: &str, minute: i64, last_ts: Option<u64>) -> FileRecord {
        let start = T0 + Duration::minutes(minute);
        FileRecord {
            path: PathBuf::from("/data/batch").join(name),
            file_size: 4096,
            start_time: start,
            run_name: String::from("run"),
            run_number: 0,
            sequence_number: 0,
            end_time: start + Duration::minutes(10),
            first_timestamp: last_ts,
            last_timestamp: last_ts,
            issues: vec![],
        }
    }

    /// Back to back files with increasing timestamps
    fn contiguous(names: &[&str]) -> Vec<FileRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| record(name, 10 * i as i64, Some(1_000_000 * (i as u64 + 1))))
            .collect()
    }

    fn names(files: &[FileRecord]) -> Vec<String> {
        files.iter().map(|f| f.file_name().to_string()).collect()
    }

    fn tables() -> ExceptionTables {
        ExceptionTables::new(None).unwrap()
    }

    fn one_batch(files: Vec<FileRecord>) -> Vec<SetupBatch> {
        vec![SetupBatch {
            files,
            setup: SetupTag::from_tables(&tables(), 0),
        }]
    }

    #[test]
    fn test_setup_split() {
        let tables = tables();
        let records = contiguous(&[
            "a_Sept27_0000.dat",
            "a_Sept28_0001.dat",
            "a_Sept29_0000.dat",
            "a_Sept14_0000.dat",
            "a_Oct5_0000.dat",
        ]);
        let batches = split_by_setup(records, &tables).unwrap();
        let tags: Vec<&str> = batches.iter().map(|b| b.setup.name.as_str()).collect();
        assert_eq!(tags, vec!["Default", "CeBr3", "No_3He", "Default"]);
        assert_eq!(
            names(&batches[1].files),
            vec!["a_Sept28_0001.dat", "a_Sept29_0000.dat"]
        );
        assert_eq!(batches[1].setup.array, tables.setup(1).array);
        assert_eq!(batches[2].setup.array.len(), 14);
    }

    #[test]
    fn test_setup_split_single_run() {
        let batches =
            split_by_setup(contiguous(&["a_Sept29_0000.dat", "a_Sept29_0001.dat"]), &tables())
                .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].setup.name, "CeBr3");
        assert_eq!(batches[0].files.len(), 2);
    }

    #[test]
    fn test_empty_input_rejected() {
        let tables = tables();
        assert!(matches!(
            split_by_setup(vec![], &tables),
            Err(SegmentationError::EmptyInput(_))
        ));
        assert!(matches!(
            split_by_time(vec![], &SplitThresholds::default()),
            Err(SegmentationError::EmptyInput(_))
        ));
        assert!(matches!(
            split_by_time(one_batch(vec![]), &SplitThresholds::default()),
            Err(SegmentationError::EmptyInput(_))
        ));
        assert!(matches!(
            split_by_position(vec![], &tables),
            Err(SegmentationError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_wraparound_does_not_split() {
        let files = vec![
            record("a.dat", 0, Some(140_600_000_000_000)),
            record("b.dat", 10, Some(100_000_000_000)),
        ];
        let timed = split_by_time(one_batch(files), &SplitThresholds::default()).unwrap();
        assert_eq!(timed.len(), 1);
        assert_eq!(timed[0].files.len(), 2);
    }

    #[test]
    fn test_clock_reset_splits() {
        let files = vec![
            record("a.dat", 0, Some(90_000_000_000)),
            record("b.dat", 10, Some(10_000_000_000)),
        ];
        let timed = split_by_time(one_batch(files), &SplitThresholds::default()).unwrap();
        assert_eq!(timed.len(), 2);
        assert_eq!(names(&timed[0].files), vec!["a.dat"]);
        assert_eq!(names(&timed[1].files), vec!["b.dat"]);
    }

    #[test]
    fn test_small_step_back_is_tolerated() {
        let thresholds = SplitThresholds::default();
        assert!(!thresholds.is_clock_reset(9_000_000_000, 5_000_000_000));
        assert!(thresholds.is_clock_reset(10_000_000_001, 5_000_000_000));
    }

    #[test]
    fn test_huge_misorder_threshold() {
        let thresholds = SplitThresholds {
            misorder_threshold: i64::MAX,
            ..SplitThresholds::default()
        };
        assert!(!thresholds.is_clock_reset(5, 10));
        assert!(!thresholds.is_clock_reset(i64::MAX, 0));
    }

    #[test]
    fn test_missing_timestamps() {
        let thresholds = SplitThresholds::default();
        // Missing current after a high previous looks like a wraparound
        assert!(!thresholds.is_clock_reset(140_600_000_000_000, -1));
        // Missing current after an ordinary previous is a reset
        assert!(thresholds.is_clock_reset(90_000_000_000, -1));
        // Nothing ever goes backwards from a missing previous
        assert!(!thresholds.is_clock_reset(-1, 0));
    }

    #[test]
    fn test_gap_threshold() {
        let thresholds = SplitThresholds::default();
        let a = record("a.dat", 0, Some(1));
        let end = a.end_time;
        let mut b = record("b.dat", 0, Some(2));

        b.start_time = end + Duration::seconds(121);
        assert!(thresholds.is_gap(&a, &b));
        b.start_time = end + Duration::seconds(119);
        assert!(!thresholds.is_gap(&a, &b));
        b.start_time = end + Duration::seconds(120);
        assert!(!thresholds.is_gap(&a, &b));

        b.start_time = end + Duration::seconds(121);
        let timed =
            split_by_time(one_batch(vec![a.clone(), b.clone()]), &thresholds).unwrap();
        assert_eq!(timed.len(), 2);
        b.start_time = end + Duration::seconds(119);
        let timed = split_by_time(one_batch(vec![a, b]), &thresholds).unwrap();
        assert_eq!(timed.len(), 1);
    }

    #[test]
    fn test_time_span() {
        // Files at 0, 10, then a long gap before 60 and 70
        let files = vec![
            record("a.dat", 0, Some(1)),
            record("b.dat", 10, Some(2)),
            record("c.dat", 60, Some(3)),
            record("d.dat", 70, Some(4)),
        ];
        let timed = split_by_time(one_batch(files), &SplitThresholds::default()).unwrap();
        assert_eq!(timed.len(), 2);
        assert_eq!(timed[0].span.start, T0);
        assert_eq!(timed[0].span.stop, T0 + Duration::minutes(20));
        assert_eq!(timed[1].span.start, T0 + Duration::minutes(60));
        assert_eq!(timed[1].span.stop, T0 + Duration::minutes(80));
    }

    #[test]
    fn test_time_split_respects_setup_boundaries() {
        let tables = tables();
        let mut records = contiguous(&["a_Sept28_0001.dat", "a_Sept29_0000.dat", "b.dat"]);
        // The third file would continue the run, but belongs to a different setup
        records[2].last_timestamp = Some(3_000_001);
        let setup = split_by_setup(records, &tables).unwrap();
        let timed = split_by_time(setup, &SplitThresholds::default()).unwrap();
        assert_eq!(timed.len(), 2);
        assert_eq!(timed[0].setup.name, "CeBr3");
        assert_eq!(timed[1].setup.name, "Default");
    }

    #[test]
    fn test_position_split() {
        let tables = tables();
        let files = contiguous(&[
            "o_May09_2017_0000.dat",
            "o_May10_2017_0002.dat",
            "o_May11_2017_0000.dat",
            "o_May12_2017_0001.dat",
        ]);
        let span = TimeSpan::covering(&files).unwrap();
        let timed = vec![TimedBatch {
            files,
            setup: SetupTag::from_tables(&tables, 0),
            span,
        }];
        let mut subs = split_by_position(timed, &tables).unwrap();
        let positions: Vec<&str> = subs.iter().map(|b| b.position.name.as_str()).collect();
        assert_eq!(
            positions,
            vec!["Default", "CloseToColdSrcCtrlRoom", "Default"]
        );
        assert_eq!(subs[1].files.len(), 2);
        assert_eq!(subs[1].position.coordinates, [165.0, -124.0]);
        // The inherited span and setup are carried unchanged
        for sub in subs.iter() {
            assert_eq!(sub.span, span);
            assert_eq!(sub.setup.name, "Default");
        }
        subs[1].set_coordinates(1.5, 2.5);
        assert_eq!(subs[1].position.coordinates, [1.5, 2.5]);
        assert_eq!(tables.position(2).position, [165.0, -124.0]);
    }

    #[test]
    fn test_partition_and_adjacent_tags_differ() {
        let tables = tables();
        let mut records = contiguous(&[
            "x_Sept27_0000.dat",
            "x_Sept28_0001.dat",
            "x_Sept29_0000.dat",
            "x_May10_2017_0002.dat",
            "x_May13_2017_0000.dat",
            "x_May14_2017_0000.dat",
            "x_Sept14_0001.dat",
        ]);
        // A clock reset in the middle of the default run
        records[4].last_timestamp = Some(90_000_000_000);
        records[5].last_timestamp = Some(1);
        let input = names(&records);

        let setup = split_by_setup(records, &tables).unwrap();
        for pair in setup.windows(2) {
            assert_ne!(pair[0].setup.index, pair[1].setup.index);
        }
        for batch in setup.iter() {
            let tags: Vec<usize> = batch
                .files
                .iter()
                .map(|f| tables.match_setup(&f.file_name()).index)
                .collect();
            assert!(tags.iter().all(|t| *t == batch.setup.index));
        }

        let subs = split_into_sub_batches(
            setup.into_iter().flat_map(|b| b.files).collect(),
            &tables,
            &SplitThresholds::default(),
        )
        .unwrap();
        let output: Vec<String> = subs.iter().flat_map(|b| names(&b.files)).collect();
        assert_eq!(output, input);
        assert!(subs.iter().all(|b| !b.files.is_empty()));

        let shape: Vec<(&str, &str, usize)> = subs
            .iter()
            .map(|b| (b.setup.name.as_str(), b.position.name.as_str(), b.files.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Default", "Default", 1),
                ("CeBr3", "Default", 2),
                ("Default", "CloseToColdSrcCtrlRoom", 1),
                ("Default", "Default", 1),
                ("Default", "Default", 1),
                ("No_3He", "Default", 1),
            ]
        );
    }
}
