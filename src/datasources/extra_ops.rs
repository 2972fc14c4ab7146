use crate::error::{IrrSchedError, Result};
use crate::models::OperationRecord;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// User-authored, per-crop table of non-irrigation operations (fertilizer,
/// tillage, pesticide, ...) keyed by date, merged verbatim into the
/// assembled schedule.
#[derive(Debug, Default)]
pub struct ExtraOpsTable {
    by_date: HashMap<NaiveDate, Vec<OperationRecord>>,
}

impl ExtraOpsTable {
    /// A feed with no operations; used for crops without a supplementary
    /// schedule.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse a comma-separated table with a header row. A row that fails to
    /// parse is rejected and logged; the rest of the table still applies.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut lines = text.lines().enumerate();
        let (_, header) = lines.next().ok_or_else(|| {
            IrrSchedError::InvalidData(format!("empty operations table {}", path.display()))
        })?;
        let columns = Columns::from_header(header, path)?;

        let mut by_date: HashMap<NaiveDate, Vec<OperationRecord>> = HashMap::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            match columns.parse_row(line) {
                Ok((date, record)) => by_date.entry(date).or_default().push(record),
                Err(reason) => {
                    warn!(
                        file = %path.display(),
                        line = idx + 1,
                        %reason,
                        "rejecting malformed operation record"
                    );
                }
            }
        }
        Ok(Self { by_date })
    }

    pub fn for_date(&self, date: NaiveDate) -> &[OperationRecord] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// Header-resolved column positions. Only month/day/year/ops_no are
/// required; every other field is optional and blank-tolerant.
struct Columns {
    month: usize,
    day: usize,
    year: usize,
    op: usize,
    fert_id: Option<usize>,
    source: Option<usize>,
    stress: Option<usize>,
    amount: Option<usize>,
    efficiency: Option<usize>,
    surface_fraction: Option<usize>,
    bio_initial: Option<usize>,
    hi_target: Option<usize>,
    bio_target: Option<usize>,
    subbasin: Option<usize>,
}

impl Columns {
    fn from_header(header: &str, path: &Path) -> Result<Self> {
        let names: Vec<String> = header
            .split(',')
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                IrrSchedError::InvalidData(format!(
                    "operations table {} lacks required column '{}'",
                    path.display(),
                    name
                ))
            })
        };
        Ok(Self {
            month: require("month")?,
            day: require("day")?,
            year: require("year")?,
            op: require("ops_no")?,
            fert_id: find("fert_id"),
            source: find("irr_sc"),
            stress: find("wtrstrs"),
            amount: find("irr"),
            efficiency: find("irr_efm"),
            surface_fraction: find("fert_surf"),
            bio_initial: find("bio_init"),
            hi_target: find("hi_targ"),
            bio_target: find("bio_targ"),
            subbasin: find("sub"),
        })
    }

    fn parse_row(&self, line: &str) -> std::result::Result<(NaiveDate, OperationRecord), String> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let int = |idx: usize, name: &str| -> std::result::Result<u32, String> {
            fields
                .get(idx)
                .and_then(|f| f.parse().ok())
                .ok_or_else(|| format!("bad {}", name))
        };
        let opt_int = |idx: Option<usize>| -> std::result::Result<Option<u32>, String> {
            opt_field(&fields, idx, "integer")
        };
        let opt_float = |idx: Option<usize>| -> std::result::Result<Option<f64>, String> {
            opt_field(&fields, idx, "number")
        };

        let month = int(self.month, "month")?;
        let day = int(self.day, "day")?;
        let year: i32 = fields
            .get(self.year)
            .and_then(|f| f.parse().ok())
            .ok_or("bad year")?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or("invalid calendar date")?;

        let record = OperationRecord {
            month,
            day,
            op: int(self.op, "ops_no")?,
            fert_id: opt_int(self.fert_id)?,
            source: opt_int(self.source)?,
            stress: opt_float(self.stress)?,
            amount: opt_float(self.amount)?,
            efficiency: opt_float(self.efficiency)?,
            surface_fraction: opt_float(self.surface_fraction)?,
            bio_initial: opt_float(self.bio_initial)?,
            hi_target: opt_float(self.hi_target)?,
            bio_target: opt_float(self.bio_target)?,
            subbasin: opt_int(self.subbasin)?,
        };
        Ok((date, record))
    }
}

/// Blank cells and absent columns are "absent", not zero; a present cell
/// that fails to parse poisons the row.
fn opt_field<T: std::str::FromStr>(
    fields: &[&str],
    idx: Option<usize>,
    kind: &str,
) -> std::result::Result<Option<T>, String> {
    let Some(idx) = idx else { return Ok(None) };
    match fields.get(idx) {
        None | Some(&"") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("'{}' is not a {}", raw, kind)),
    }
}
