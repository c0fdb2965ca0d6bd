// The known exceptions to the default detector setup and default array position.
//
// Both tables are plain data. Setup exceptions are recognised by a file name
// *containing* one of the patterns, position exceptions by the file name
// *glob-matching* one of the patterns. The two tables were curated against those
// two rules, so they are kept distinct rather than unified.
//
// Index 0 of each table is always the default entry; exception i in the file has
// tag index i + 1.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use super::array_setup::ArraySetup;
use super::error::ExceptionTableError;

/// Load the default tables for windows
#[cfg(target_family = "windows")]
fn load_default_tables() -> String {
    String::from(include_str!("data\\default_exceptions.yml"))
}

/// Load the default tables for macos and linux
#[cfg(target_family = "unix")]
fn load_default_tables() -> String {
    String::from(include_str!("data/default_exceptions.yml"))
}

/// The result of matching a file name against one of the tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTag {
    /// 0 is the default, otherwise 1 + the position of the exception in the table
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupEntry {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub array: ArraySetup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub position: [f64; 2],
}

/// The on-disk layout of the exception tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionTableFile {
    pub default_setup: SetupEntry,
    #[serde(default)]
    pub setup_exceptions: Vec<SetupEntry>,
    pub default_position: PositionEntry,
    #[serde(default)]
    pub position_exceptions: Vec<PositionEntry>,
}

/// ExceptionTables holds both lookup tables, ready for matching.
///
/// The tables are read once and never modified afterwards.
#[derive(Debug, Clone)]
pub struct ExceptionTables {
    setups: Vec<SetupEntry>,
    positions: Vec<PositionEntry>,
    position_globs: Vec<Vec<Pattern>>,
}

impl ExceptionTables {
    /// Create the tables from a YAML file.
    /// If the path is None, we load the default that is bundled with the batcher
    pub fn new(path: Option<&Path>) -> Result<Self, ExceptionTableError> {
        let mut contents = String::new();
        if let Some(p) = path {
            let mut file = File::open(p)?;
            file.read_to_string(&mut contents)?;
        } else {
            contents = load_default_tables();
        }
        Self::from_table_file(serde_yaml::from_str::<ExceptionTableFile>(&contents)?)
    }

    pub fn from_table_file(table_file: ExceptionTableFile) -> Result<Self, ExceptionTableError> {
        let mut setups = vec![table_file.default_setup];
        setups.extend(table_file.setup_exceptions);
        let mut positions = vec![table_file.default_position];
        positions.extend(table_file.position_exceptions);

        let mut position_globs: Vec<Vec<Pattern>> = Vec::with_capacity(positions.len());
        for entry in positions.iter() {
            let mut globs = Vec::with_capacity(entry.patterns.len());
            for pattern in entry.patterns.iter() {
                match Pattern::new(pattern) {
                    Ok(glob) => globs.push(glob),
                    Err(e) => {
                        return Err(ExceptionTableError::BadPattern(
                            pattern.clone(),
                            entry.name.clone(),
                            e,
                        ))
                    }
                }
            }
            position_globs.push(globs);
        }

        Ok(Self {
            setups,
            positions,
            position_globs,
        })
    }

    /// Find the detector setup exception for a file name (substring match).
    ///
    /// The first exception in table order with a matching pattern wins. The default
    /// entry's own patterns are never consulted.
    pub fn match_setup(&self, file_name: &str) -> ExceptionTag {
        let index = self
            .setups
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, entry)| entry.patterns.iter().any(|p| file_name.contains(p.as_str())))
            .map_or(0, |(idx, _)| idx);
        ExceptionTag {
            index,
            name: self.setups[index].name.clone(),
        }
    }

    /// Find the array position exception for a file name (shell-style glob match).
    pub fn match_position(&self, file_name: &str) -> ExceptionTag {
        let index = self
            .position_globs
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, globs)| globs.iter().any(|g| g.matches(file_name)))
            .map_or(0, |(idx, _)| idx);
        ExceptionTag {
            index,
            name: self.positions[index].name.clone(),
        }
    }

    /// The setup entry for a tag index. Panics if the index did not come from these tables
    pub fn setup(&self, index: usize) -> &SetupEntry {
        &self.setups[index]
    }

    /// The position entry for a tag index. Panics if the index did not come from these tables
    pub fn position(&self, index: usize) -> &PositionEntry {
        &self.positions[index]
    }

    /// Number of setup entries including the default
    pub fn n_setups(&self) -> usize {
        self.setups.len()
    }

    /// Number of position entries including the default
    pub fn n_positions(&self) -> usize {
        self.positions.len()
    }
}
