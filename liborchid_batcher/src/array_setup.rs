use std::fmt;

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

const COLUMN_HEADERS: &str = "Column Headings:
 0 - detector number, not \"slot number\" but instead a unique detector ID
 1 - digitizer board number, 2 - digitizer channel number
 3 - mpod board number,      4 - mpod channel number
 5 - Det X offset,           6 - Det Y offset,             7 - Det Z offset
 8 - Det Type (Options are: NaI, LS, CeBr3, HeMod, HeUnmod)
 9 - Det PSD Projection Energy Threshold (projection will go from 0 to Thres)
10 - Det Energy Projection PSD Threshold (projection will go from 0 to Thres)
 0, 1,  2, 3,  4,   5,    6,    7,       8,       9,   10
----------------------------------------------------------";

/// The wiring, placement, type and projection thresholds of one detector in the array.
///
/// The type string is carried as given; the known values are NaI, LS, CeBr3, HeMod and HeUnmod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSetup {
    /// (board, channel)
    pub digitizer: (u32, u32),
    /// (board, channel) of the MPOD high voltage supply
    pub mpod: (u32, u32),
    /// X, Y, Z offset from the array position in inches
    pub offset: [f64; 3],
    pub det_type: String,
    /// (energy threshold for the PSD projection, PSD threshold for the energy projection)
    pub thresholds: (f64, f64),
}

impl fmt::Display for DetectorSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:1}, {:2}, {:1}, {:2}, {:3.1}, {:4.1}, {:4.1}, {:>7}, {:5.1}, {:4.2}",
            self.digitizer.0,
            self.digitizer.1,
            self.mpod.0,
            self.mpod.1,
            self.offset[0],
            self.offset[1],
            self.offset[2],
            self.det_type,
            self.thresholds.0,
            self.thresholds.1
        )
    }
}

/// ArraySetup maps detector ID to the setup of that detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArraySetup {
    detectors: FxHashMap<u32, DetectorSetup>,
}

impl ArraySetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a detector
    pub fn add_detector(&mut self, det_id: u32, setup: DetectorSetup) {
        self.detectors.insert(det_id, setup);
    }

    pub fn remove_detector(&mut self, det_id: u32) -> Option<DetectorSetup> {
        self.detectors.remove(&det_id)
    }

    pub fn get_detector(&self, det_id: u32) -> Option<&DetectorSetup> {
        self.detectors.get(&det_id)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Detectors ordered by ID
    pub fn iter_sorted(&self) -> impl Iterator<Item = (u32, &DetectorSetup)> {
        let mut entries: Vec<(u32, &DetectorSetup)> =
            self.detectors.iter().map(|(id, det)| (*id, det)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter()
    }
}

impl fmt::Display for ArraySetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COLUMN_HEADERS}")?;
        for (id, det) in self.iter_sorted() {
            write!(f, "\n{id:2}, {det}")?;
        }
        Ok(())
    }
}
