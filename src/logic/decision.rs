use crate::datasources::HydrologyProvider;
use crate::error::{IrrSchedError, Result};
use crate::models::{
    CropPolicy, FieldUnitContext, IrrigationApplication, IrrigationDecision, OperationRecord,
    PolicyVariant, TriggerState, AUTO_IRRIGATION_OP, IRRIGATION_EFFICIENCY, IRRIGATION_OP,
    SOURCE_GROUNDWATER, SOURCE_SURFACE,
};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Canopy below this leaf area index is treated as bare ground: no
/// transpiration-driven irrigation.
pub const VEGETATIVE_COVER_FLOOR: f64 = 0.1;

/// Decide whether irrigation fires for one (field unit, date).
///
/// Called at most once per day, and only for dates inside the crop's season
/// window; the caller enforces the window so no trigger policy can run past
/// harvest. `state` is mutated in place (interval counter, event counter).
pub fn decide(
    policy: &CropPolicy,
    state: &mut TriggerState,
    ctx: &FieldUnitContext,
    date: NaiveDate,
    provider: &dyn HydrologyProvider,
) -> Result<IrrigationDecision> {
    match policy.variant {
        PolicyVariant::FixedDate => fixed_date(policy, date),
        PolicyVariant::Transpiration => transpiration(policy, ctx, date, provider),
        PolicyVariant::Threshold => threshold(policy, state, ctx, date, provider, false),
        PolicyVariant::ThresholdInterval => threshold(policy, state, ctx, date, provider, true),
    }
}

/// A single full-depth event exactly on season-start; every other day in the
/// season is quiet.
fn fixed_date(policy: &CropPolicy, date: NaiveDate) -> Result<IrrigationDecision> {
    let start = policy.season_start.in_year(date.year())?;
    if date != start {
        return Ok(IrrigationDecision::none());
    }
    let mut applications = Vec::new();
    if policy.groundwater_depth_mm > 0.0 {
        applications.push(IrrigationApplication {
            source: SOURCE_GROUNDWATER,
            amount_mm: policy.groundwater_depth_mm,
        });
    }
    if policy.surface_depth_mm > 0.0 {
        applications.push(IrrigationApplication {
            source: SOURCE_SURFACE,
            amount_mm: policy.surface_depth_mm,
        });
    }
    Ok(IrrigationDecision { applications })
}

/// Ritchie and Burnett (1971): transpiration from potential
/// evapotranspiration and leaf area index.
fn ritchie_burnett(pet_mm: f64, lai: f64) -> f64 {
    pet_mm * (-0.21 + 0.70 * lai.sqrt())
}

/// Daily irrigation equal to that day's estimated crop transpiration.
fn transpiration(
    policy: &CropPolicy,
    ctx: &FieldUnitContext,
    date: NaiveDate,
    provider: &dyn HydrologyProvider,
) -> Result<IrrigationDecision> {
    let daily = provider.daily(ctx.hru, date)?;
    if daily.lai < VEGETATIVE_COVER_FLOOR {
        return Ok(IrrigationDecision::none());
    }
    let amount = ritchie_burnett(daily.pet_mm, daily.lai);
    Ok(split_applications(amount, policy))
}

/// Soil-moisture depletion trigger. With `use_interval` the first event of
/// the season fires on the threshold alone; later events also need the
/// interval counter to have elapsed.
fn threshold(
    policy: &CropPolicy,
    state: &mut TriggerState,
    ctx: &FieldUnitContext,
    date: NaiveDate,
    provider: &dyn HydrologyProvider,
    use_interval: bool,
) -> Result<IrrigationDecision> {
    let (awc, awd) = match (state.awc_mm, state.awd_mm) {
        (Some(awc), Some(awd)) => (awc, awd),
        _ => {
            return Err(IrrSchedError::InvalidData(format!(
                "threshold policy for HRU {} has no soil water capacity",
                ctx.hru
            )))
        }
    };
    state.days_since_event += 1;
    let sw_end = provider.daily(ctx.hru, date)?.sw_end_mm;

    let depleted = sw_end <= awd;
    let due = !use_interval
        || state.events_this_season == 0
        || state.days_since_event >= policy.interval_days;
    if !(depleted && due) {
        // Interval elapsed but soil still wet: skip without resetting the
        // counter, so the check repeats daily.
        return Ok(IrrigationDecision::none());
    }

    // Never overshoot field capacity.
    let amount = policy.depth_mm.min(awc - sw_end);
    state.days_since_event = 0;
    state.events_this_season += 1;
    debug!(
        hru = ctx.hru,
        %date,
        amount_mm = amount,
        event = state.events_this_season,
        "irrigation triggered by soil water depletion"
    );
    Ok(split_applications(amount, policy))
}

/// Split one application across the two supply sources, each side rounded
/// to 2 decimals independently; a side that rounds to zero is absent.
fn split_applications(amount_mm: f64, policy: &CropPolicy) -> IrrigationDecision {
    let gw = round2(amount_mm * policy.split.groundwater);
    let sw = round2(amount_mm * policy.split.surface);
    let mut applications = Vec::new();
    if gw > 0.0 {
        applications.push(IrrigationApplication {
            source: SOURCE_GROUNDWATER,
            amount_mm: gw,
        });
    }
    if sw > 0.0 {
        applications.push(IrrigationApplication {
            source: SOURCE_SURFACE,
            amount_mm: sw,
        });
    }
    IrrigationDecision { applications }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a decision as operation records in the layout of the policy's
/// record family, one record per supply source.
pub fn decision_records(
    decision: &IrrigationDecision,
    policy: &CropPolicy,
    ctx: &FieldUnitContext,
    date: NaiveDate,
) -> Vec<OperationRecord> {
    decision
        .applications
        .iter()
        .map(|app| match policy.variant {
            PolicyVariant::FixedDate => OperationRecord {
                month: date.month(),
                day: date.day(),
                op: AUTO_IRRIGATION_OP,
                fert_id: Some(2),
                source: Some(app.source),
                stress: Some(policy.water_stress_threshold),
                efficiency: Some(IRRIGATION_EFFICIENCY),
                amount: Some(app.amount_mm),
                hi_target: Some(0.0),
                subbasin: Some(ctx.subbasin),
                ..Default::default()
            },
            _ => OperationRecord {
                month: date.month(),
                day: date.day(),
                op: IRRIGATION_OP,
                source: Some(app.source),
                amount: Some(app.amount_mm),
                efficiency: Some(IRRIGATION_EFFICIENCY),
                surface_fraction: Some(0.0),
                bio_initial: Some(0.0),
                subbasin: Some(ctx.subbasin),
                ..Default::default()
            },
        })
        .collect()
}
