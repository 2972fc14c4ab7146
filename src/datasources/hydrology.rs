use crate::error::{IrrSchedError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Simulated daily hydrology for one (field unit, date).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HruDaily {
    /// Potential evapotranspiration (mm).
    pub pet_mm: f64,
    /// Leaf area index (dimensionless).
    pub lai: f64,
    /// Soil water content at the end of the day (mm).
    pub sw_end_mm: f64,
}

/// Source of daily simulated hydrology per field unit.
///
/// Implementations must provide complete daily coverage for every date in
/// the configured range; the decision engine cannot default a physical
/// quantity.
pub trait HydrologyProvider {
    fn daily(&self, hru: u32, date: NaiveDate) -> Result<HruDaily>;
}

// Token positions in the whitespace-split daily output.hru row, per the
// SWAT 2012 output documentation.
const COL_HRU: usize = 1;
const COL_MON: usize = 5;
const COL_DAY: usize = 6;
const COL_YEAR: usize = 7;
const COL_PET: usize = 13;
const COL_SW_END: usize = 16;
const COL_LAI: usize = 73;

/// Lines preceding the data block (titles plus the undelimited header row).
const HEADER_LINES: usize = 9;

/// The SWAT `output.hru` table, loaded once and shared read-only across the
/// whole batch.
#[derive(Debug)]
pub struct HydrologyTable {
    rows: HashMap<(u32, NaiveDate), HruDaily>,
}

impl HydrologyTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut rows = HashMap::new();
        for (idx, line) in text.lines().enumerate().skip(HEADER_LINES) {
            if line.trim().is_empty() {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() <= COL_LAI {
                return Err(malformed(path, idx + 1, "expected at least 74 columns"));
            }
            let month: u32 = parse_token(tokens[COL_MON], path, idx + 1)?;
            // Annual and average-annual summary rows carry the year (or the
            // simulated span) in the MON column; only daily rows apply.
            if !(1..=12).contains(&month) {
                continue;
            }
            let hru: u32 = parse_token(tokens[COL_HRU], path, idx + 1)?;
            let day: u32 = parse_token(tokens[COL_DAY], path, idx + 1)?;
            let year: i32 = parse_token(tokens[COL_YEAR], path, idx + 1)?;
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| malformed(path, idx + 1, "invalid calendar date"))?;
            let daily = HruDaily {
                pet_mm: parse_token(tokens[COL_PET], path, idx + 1)?,
                lai: parse_token(tokens[COL_LAI], path, idx + 1)?,
                sw_end_mm: parse_token(tokens[COL_SW_END], path, idx + 1)?,
            };
            rows.insert((hru, date), daily);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl HydrologyProvider for HydrologyTable {
    fn daily(&self, hru: u32, date: NaiveDate) -> Result<HruDaily> {
        self.rows
            .get(&(hru, date))
            .copied()
            .ok_or(IrrSchedError::MissingSimulationRow { hru, date })
    }
}

fn malformed(path: &Path, line: usize, reason: &str) -> IrrSchedError {
    IrrSchedError::MalformedTable {
        path: PathBuf::from(path),
        line,
        reason: reason.to_string(),
    }
}

fn parse_token<T: std::str::FromStr>(token: &str, path: &Path, line: usize) -> Result<T> {
    token
        .parse()
        .map_err(|_| malformed(path, line, &format!("unparseable value '{}'", token)))
}
