use super::decision::{decide, decision_records};
use crate::datasources::{ExtraOpsTable, HydrologyProvider};
use crate::error::{IrrSchedError, Result};
use crate::models::{CropPolicy, FieldUnitContext, ScheduleItem, TriggerState};
use chrono::{Datelike, NaiveDate};

/// Walks the simulation date range for one field unit and merges exogenous
/// operations with the decision engine's irrigation records into one
/// chronologically ordered, year-partitioned sequence.
pub struct Assembler<'a> {
    policy: &'a CropPolicy,
    ctx: &'a FieldUnitContext,
    provider: &'a dyn HydrologyProvider,
    extra_ops: &'a ExtraOpsTable,
    calibration_start_year: i32,
}

impl<'a> Assembler<'a> {
    pub fn new(
        policy: &'a CropPolicy,
        ctx: &'a FieldUnitContext,
        provider: &'a dyn HydrologyProvider,
        extra_ops: &'a ExtraOpsTable,
        calibration_start_year: i32,
    ) -> Self {
        Self {
            policy,
            ctx,
            provider,
            extra_ops,
            calibration_start_year,
        }
    }

    /// Walk `[start, end]` one day at a time, no skipping.
    ///
    /// Per day: exogenous records first, then irrigation, in feed order.
    /// The season-window guard here is the only place irrigation is gated;
    /// dates past season-end never reach the decision engine, whatever the
    /// trigger state says.
    pub fn assemble(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        state: &mut TriggerState,
    ) -> Result<Vec<ScheduleItem>> {
        let mut items = Vec::new();
        let mut tracked_year = start.year();
        let mut boundary_emitted = false;

        let mut date = start;
        while date <= end {
            if date.year() != tracked_year {
                if !boundary_emitted {
                    items.push(ScheduleItem::YearBoundary);
                }
                tracked_year = date.year();
                boundary_emitted = false;
            }

            for record in self.extra_ops.for_date(date) {
                items.push(ScheduleItem::Operation(record.clone()));
            }

            if self.engine_active(date)? {
                let (season_start, _) = self.policy.season_window(date.year())?;
                if date == season_start {
                    // Guard against a stale counter from a prior season.
                    state.reset_season();
                }
                let decision = decide(self.policy, state, self.ctx, date, self.provider)?;
                for record in decision_records(&decision, self.policy, self.ctx, date) {
                    items.push(ScheduleItem::Operation(record));
                }
            }

            if date.month() == 12 && date.day() == 31 {
                items.push(ScheduleItem::YearBoundary);
                boundary_emitted = true;
            }

            date = date.succ_opt().ok_or_else(|| {
                IrrSchedError::InvalidData(format!("date range overflow past {}", date))
            })?;
        }
        Ok(items)
    }

    /// The single season-window guard, plus the calibration gate for
    /// data-driven variants.
    fn engine_active(&self, date: NaiveDate) -> Result<bool> {
        if self.policy.variant.uses_calibration_gate() && date.year() < self.calibration_start_year
        {
            return Ok(false);
        }
        let (season_start, season_end) = self.policy.season_window(date.year())?;
        Ok(date >= season_start && date <= season_end)
    }
}
