//! Fixed-column rendering of operation records.
//!
//! SWAT reads the operation schedule positionally, and the two observed
//! layouts disagree on both column order and width. Each layout lives in
//! one declarative table here so the families can never be cross-applied
//! by ad-hoc concatenation.

use crate::error::{IrrSchedError, Result};
use crate::models::{OperationRecord, ScheduleItem, END_OF_YEAR_OP};

/// Which fixed-width layout a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFamily {
    /// Fixed-date (auto-irrigation) records: stress before amount.
    Calendar,
    /// Threshold/transpiration records: amount in the wide column.
    SoilWater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Month,
    Day,
    Op,
    FertId,
    Source,
    Stress,
    Amount,
    Efficiency,
    SurfaceFraction,
    BioInitial,
    HiTarget,
    BioTarget,
    Subbasin,
}

struct Column {
    field: Field,
    width: usize,
    /// Decimal places for float fields; `None` marks an integer field.
    decimals: Option<usize>,
}

const fn int(field: Field, width: usize) -> Column {
    Column {
        field,
        width,
        decimals: None,
    }
}

const fn float(field: Field, width: usize, decimals: usize) -> Column {
    Column {
        field,
        width,
        decimals: Some(decimals),
    }
}

const CALENDAR_COLUMNS: &[Column] = &[
    int(Field::Month, 3),
    int(Field::Day, 3),
    int(Field::Op, 12),
    int(Field::FertId, 5),
    int(Field::Source, 4),
    float(Field::Stress, 16, 5),
    float(Field::Efficiency, 7, 2),
    float(Field::Amount, 12, 5),
    float(Field::HiTarget, 5, 2),
    float(Field::BioTarget, 7, 2),
    int(Field::Subbasin, 18),
];

const SOIL_WATER_COLUMNS: &[Column] = &[
    int(Field::Month, 3),
    int(Field::Day, 3),
    int(Field::Op, 12),
    int(Field::FertId, 5),
    int(Field::Source, 4),
    float(Field::Amount, 16, 5),
    float(Field::SurfaceFraction, 7, 2),
    float(Field::Efficiency, 12, 5),
    float(Field::BioInitial, 5, 2),
    float(Field::HiTarget, 7, 2),
    float(Field::BioTarget, 6, 2),
    int(Field::Subbasin, 12),
];

/// Width of the lone end-of-year sentinel line.
const YEAR_BOUNDARY_WIDTH: usize = 18;

impl RecordFamily {
    fn columns(&self) -> &'static [Column] {
        match self {
            RecordFamily::Calendar => CALENDAR_COLUMNS,
            RecordFamily::SoilWater => SOIL_WATER_COLUMNS,
        }
    }
}

/// Render one record as a newline-terminated fixed-width line. Absent
/// fields render as blank, width-padded columns.
pub fn format_record(record: &OperationRecord, family: RecordFamily) -> String {
    let mut line = String::new();
    for column in family.columns() {
        let cell = match column.decimals {
            None => format_int(record, column.field),
            Some(decimals) => format_float(record, column.field, decimals),
        };
        line.push_str(&format!("{:>width$}", cell, width = column.width));
    }
    line.push('\n');
    line
}

/// The end-of-year flag on its own right-justified line.
pub fn format_year_boundary() -> String {
    format!(
        "{:>width$}\n",
        END_OF_YEAR_OP,
        width = YEAR_BOUNDARY_WIDTH
    )
}

pub fn format_item(item: &ScheduleItem, family: RecordFamily) -> String {
    match item {
        ScheduleItem::Operation(record) => format_record(record, family),
        ScheduleItem::YearBoundary => format_year_boundary(),
    }
}

/// Render a whole assembled schedule, one line per item.
pub fn format_schedule(items: &[ScheduleItem], family: RecordFamily) -> String {
    items.iter().map(|item| format_item(item, family)).collect()
}

fn format_int(record: &OperationRecord, field: Field) -> String {
    let value = match field {
        Field::Month => Some(record.month),
        Field::Day => Some(record.day),
        Field::Op => Some(record.op),
        Field::FertId => record.fert_id,
        Field::Source => record.source,
        Field::Subbasin => record.subbasin,
        _ => None,
    };
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_float(record: &OperationRecord, field: Field, decimals: usize) -> String {
    let value = match field {
        Field::Stress => record.stress,
        Field::Amount => record.amount,
        Field::Efficiency => record.efficiency,
        Field::SurfaceFraction => record.surface_fraction,
        Field::BioInitial => record.bio_initial,
        Field::HiTarget => record.hi_target,
        Field::BioTarget => record.bio_target,
        _ => None,
    };
    value
        .map(|v| format!("{:.prec$}", v, prec = decimals))
        .unwrap_or_default()
}

/// Parse a formatted line back into a record by walking the family's column
/// widths. Blank columns come back as absent, not zero.
pub fn parse_record(line: &str, family: RecordFamily) -> Result<OperationRecord> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let mut record = OperationRecord::default();
    let mut offset = 0;
    for column in family.columns() {
        let end = (offset + column.width).min(line.len());
        let cell = line[offset.min(end)..end].trim();
        offset = end;
        if cell.is_empty() {
            continue;
        }
        apply_cell(&mut record, column.field, cell)?;
    }
    Ok(record)
}

fn apply_cell(record: &mut OperationRecord, field: Field, cell: &str) -> Result<()> {
    let bad = || IrrSchedError::InvalidData(format!("unparseable cell '{}'", cell));
    match field {
        Field::Month => record.month = cell.parse().map_err(|_| bad())?,
        Field::Day => record.day = cell.parse().map_err(|_| bad())?,
        Field::Op => record.op = cell.parse().map_err(|_| bad())?,
        Field::FertId => record.fert_id = Some(cell.parse().map_err(|_| bad())?),
        Field::Source => record.source = Some(cell.parse().map_err(|_| bad())?),
        Field::Stress => record.stress = Some(cell.parse().map_err(|_| bad())?),
        Field::Amount => record.amount = Some(cell.parse().map_err(|_| bad())?),
        Field::Efficiency => record.efficiency = Some(cell.parse().map_err(|_| bad())?),
        Field::SurfaceFraction => {
            record.surface_fraction = Some(cell.parse().map_err(|_| bad())?)
        }
        Field::BioInitial => record.bio_initial = Some(cell.parse().map_err(|_| bad())?),
        Field::HiTarget => record.hi_target = Some(cell.parse().map_err(|_| bad())?),
        Field::BioTarget => record.bio_target = Some(cell.parse().map_err(|_| bad())?),
        Field::Subbasin => record.subbasin = Some(cell.parse().map_err(|_| bad())?),
    }
    Ok(())
}
