/// SWAT management operation code for a scheduled irrigation application.
pub const IRRIGATION_OP: u32 = 2;
/// Operation code initializing SWAT's own auto-irrigation routine.
pub const AUTO_IRRIGATION_OP: u32 = 10;
/// End-of-year flag telling SWAT to advance to the next year of operations.
pub const END_OF_YEAR_OP: u32 = 17;

/// Irrigation source code: shallow aquifer (groundwater).
pub const SOURCE_GROUNDWATER: u32 = 3;
/// Irrigation source code: main channel (surface water).
pub const SOURCE_SURFACE: u32 = 1;

/// Fixed irrigation efficiency written with every application.
pub const IRRIGATION_EFFICIENCY: f64 = 0.75;

/// One scheduled management operation line.
///
/// Field presence is meaningful: an absent value renders as a blank column,
/// which SWAT reads differently from an explicit 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationRecord {
    pub month: u32,
    pub day: u32,
    pub op: u32,
    pub fert_id: Option<u32>,
    pub source: Option<u32>,
    pub stress: Option<f64>,
    pub amount: Option<f64>,
    pub efficiency: Option<f64>,
    pub surface_fraction: Option<f64>,
    pub bio_initial: Option<f64>,
    pub hi_target: Option<f64>,
    pub bio_target: Option<f64>,
    pub subbasin: Option<u32>,
}

impl OperationRecord {
    pub fn new(month: u32, day: u32, op: u32) -> Self {
        Self {
            month,
            day,
            op,
            ..Default::default()
        }
    }
}

/// One entry in an assembled schedule: an operation line or the sentinel
/// that advances SWAT's internal year cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleItem {
    Operation(OperationRecord),
    YearBoundary,
}

impl ScheduleItem {
    pub fn is_operation(&self) -> bool {
        matches!(self, ScheduleItem::Operation(_))
    }
}
