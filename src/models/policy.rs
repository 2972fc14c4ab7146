use crate::error::{IrrSchedError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

/// Trigger rule family deciding whether and how much irrigation fires on a
/// given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyVariant {
    /// One full-depth application on the season-start date of each year.
    FixedDate,
    /// Daily application equal to estimated crop transpiration.
    Transpiration,
    /// Application whenever end-of-day soil water drops to the allowable
    /// depletion threshold.
    Threshold,
    /// Threshold trigger gated by a minimum interval between applications.
    ThresholdInterval,
}

impl PolicyVariant {
    /// Data-driven variants only activate from the calibration start year
    /// forward; the fixed calendar variant fires in every simulated year.
    pub fn uses_calibration_gate(&self) -> bool {
        !matches!(self, PolicyVariant::FixedDate)
    }

    pub fn uses_soil_data(&self) -> bool {
        matches!(
            self,
            PolicyVariant::Threshold | PolicyVariant::ThresholdInterval
        )
    }
}

/// Month/day pair interpreted within a single calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeasonDate {
    pub month: u32,
    pub day: u32,
}

impl SeasonDate {
    pub fn in_year(&self, year: i32) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).ok_or_else(|| {
            IrrSchedError::Config(format!(
                "invalid season date {:02}-{:02} in year {}",
                self.month, self.day, year
            ))
        })
    }
}

/// Fractional division of one application across the two supply sources.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceSplit {
    pub groundwater: f64,
    pub surface: f64,
}

impl Default for SourceSplit {
    /// Observed 2013-2016 partitioning: 73% groundwater, 27% surface water.
    fn default() -> Self {
        Self {
            groundwater: 0.73,
            surface: 0.27,
        }
    }
}

/// Static per-crop irrigation parameters, shared read-only across all field
/// units growing that crop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CropPolicy {
    pub variant: PolicyVariant,
    pub season_start: SeasonDate,
    pub season_end: SeasonDate,

    /// Nominal irrigation depth per application (mm).
    #[serde(default)]
    pub depth_mm: f64,

    /// Minimum days between applications (threshold-interval variant).
    #[serde(default)]
    pub interval_days: u32,

    /// Typical crop rooting depth (mm), used to scale soil water capacity.
    #[serde(default)]
    pub rooting_depth_mm: f64,

    #[serde(default)]
    pub split: SourceSplit,

    /// Fixed per-source depths (mm), fixed-date variant only.
    #[serde(default)]
    pub groundwater_depth_mm: f64,
    #[serde(default)]
    pub surface_depth_mm: f64,

    /// Water stress threshold written into fixed-date records.
    #[serde(default = "default_water_stress")]
    pub water_stress_threshold: f64,

    /// Per-crop CSV of non-irrigation operations to merge into the schedule.
    #[serde(default)]
    pub operations: Option<PathBuf>,
}

fn default_water_stress() -> f64 {
    35.32
}

impl CropPolicy {
    /// Season window `[start, end]` for one calendar year.
    pub fn season_window(&self, year: i32) -> Result<(NaiveDate, NaiveDate)> {
        let start = self.season_start.in_year(year)?;
        let end = self.season_end.in_year(year)?;
        Ok((start, end))
    }

    /// Policies assume a single-year growing window: the end date must be
    /// reachable from the start date without wrapping past year-end.
    pub fn validate(&self, crop: &str) -> Result<()> {
        // Feb 29 would silently vanish in non-leap years.
        for d in [self.season_start, self.season_end] {
            if d.month == 2 && d.day == 29 {
                return Err(IrrSchedError::Config(format!(
                    "crop {}: season dates may not fall on Feb 29",
                    crop
                )));
            }
        }
        let (start, end) = self.season_window(2001)?;
        if end < start {
            return Err(IrrSchedError::Config(format!(
                "crop {}: season end {:02}-{:02} precedes season start {:02}-{:02}",
                crop,
                self.season_end.month,
                self.season_end.day,
                self.season_start.month,
                self.season_start.day
            )));
        }
        match self.variant {
            PolicyVariant::FixedDate => {
                if self.groundwater_depth_mm <= 0.0 && self.surface_depth_mm <= 0.0 {
                    return Err(IrrSchedError::Config(format!(
                        "crop {}: fixed-date policy needs a non-zero per-source depth",
                        crop
                    )));
                }
            }
            PolicyVariant::Transpiration => {}
            PolicyVariant::Threshold | PolicyVariant::ThresholdInterval => {
                if self.rooting_depth_mm <= 0.0 {
                    return Err(IrrSchedError::Config(format!(
                        "crop {}: threshold policies need a rooting depth",
                        crop
                    )));
                }
                if self.depth_mm <= 0.0 {
                    return Err(IrrSchedError::Config(format!(
                        "crop {}: threshold policies need a nominal depth",
                        crop
                    )));
                }
                if self.variant == PolicyVariant::ThresholdInterval && self.interval_days == 0 {
                    return Err(IrrSchedError::Config(format!(
                        "crop {}: threshold-interval policy needs an interval",
                        crop
                    )));
                }
            }
        }
        let split_sum = self.split.groundwater + self.split.surface;
        if !(0.99..=1.01).contains(&split_sum) {
            return Err(IrrSchedError::Config(format!(
                "crop {}: source split fractions sum to {:.2}, expected 1.00",
                crop, split_sum
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hybrid_policy() -> CropPolicy {
        CropPolicy {
            variant: PolicyVariant::ThresholdInterval,
            season_start: SeasonDate { month: 5, day: 7 },
            season_end: SeasonDate { month: 10, day: 25 },
            depth_mm: 50.0,
            interval_days: 14,
            rooting_depth_mm: 600.0,
            split: SourceSplit::default(),
            groundwater_depth_mm: 0.0,
            surface_depth_mm: 0.0,
            water_stress_threshold: 35.32,
            operations: None,
        }
    }

    #[test]
    fn season_window_resolves_per_year() {
        let policy = hybrid_policy();
        let (start, end) = policy.season_window(2012).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2012, 5, 7).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2012, 10, 25).unwrap());
    }

    #[test]
    fn validate_rejects_wrapping_season() {
        let mut policy = hybrid_policy();
        policy.season_start = SeasonDate { month: 11, day: 1 };
        policy.season_end = SeasonDate { month: 3, day: 1 };
        assert!(policy.validate("CORN").is_err());
    }

    #[test]
    fn validate_rejects_leap_day() {
        let mut policy = hybrid_policy();
        policy.season_start = SeasonDate { month: 2, day: 29 };
        assert!(policy.validate("CORN").is_err());
    }

    #[test]
    fn validate_rejects_missing_interval() {
        let mut policy = hybrid_policy();
        policy.interval_days = 0;
        assert!(policy.validate("CORN").is_err());
    }

    #[test]
    fn default_split_is_73_27() {
        let split = SourceSplit::default();
        assert_eq!(split.groundwater, 0.73);
        assert_eq!(split.surface, 0.27);
    }
}
