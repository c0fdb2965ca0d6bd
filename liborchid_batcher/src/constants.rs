// Raw file layout
pub const FILE_HEADER_SIZE: u64 = 4096;
pub const BUFFER_SIZE: u64 = 2_097_152;
/// Number of bytes at the front of the header block that we actually decode
pub const HEADER_READ_SIZE: usize = 164;
pub const HEADER_DATE_RANGE: std::ops::Range<usize> = 26..56;
pub const HEADER_RUN_NAME_RANGE: std::ops::Range<usize> = 56..156;
pub const HEADER_NUMBERS_OFFSET: usize = 156;

// Some files carry a spurious leading buffer fragment written by the digitizer
pub const ARTIFACT_SIZE: u64 = 8192;
pub const ARTIFACT_MARKER: u32 = 0xF0F0F0F0;

// Buffer internals
pub const BUFFER_TIME_OFFSET: u64 = 24;
pub const BUFFER_TIME_READ_SIZE: usize = 32;
pub const EVENT_SCAN_OFFSET: u64 = 8160;
pub const EVENT_SCAN_SIZE: u64 = 2_088_960;

// Event records
pub const EVENT_TAG: u16 = 527;
pub const EVENT_RECORD_SIZE: usize = 16;
/// tag(2) + reserved(2) + lo(4) + hi(2)
pub const EVENT_RECORD_MIN_SIZE: usize = 10;
pub const EVENT_LO_OFFSET: usize = 4;
pub const EVENT_HI_OFFSET: usize = 8;
pub const TIMESTAMP_HI_SHIFT: u32 = 31;

// Segmentation defaults
pub const DEFAULT_SPLIT_TIME_THRESHOLD: f64 = 120.0;
pub const DEFAULT_TS_MISORDER_THRESHOLD: i64 = 5_000_000_000;
pub const DEFAULT_TS_WRAP_HIGH: i64 = 140_596_750_866_972;
pub const DEFAULT_TS_WRAP_LOW: i64 = 140_737_488_355;
/// Value an absent raw timestamp takes in comparisons
pub const MISSING_TIMESTAMP: i64 = -1;

pub const DEFAULT_OUTPUT_PATH: &str = "/data1/prospect/ProcessedData/OrchidAnalysis/TimeSeries_2017";
