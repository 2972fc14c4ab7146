/// Identity of one field unit (hydrologic response unit), extracted from the
/// header tags of its management file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUnitContext {
    /// Watershed-wide HRU number, the key into the simulation output table.
    pub hru: u32,
    pub subbasin: u32,
    pub crop: String,
}

/// Per-field-unit, per-season trigger bookkeeping.
///
/// Owned by exactly one field unit and mutated only by the decision engine;
/// never shared or reused across field units.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerState {
    /// Days elapsed since the last irrigation event.
    pub days_since_event: u32,
    /// Irrigation events fired this season.
    pub events_this_season: u32,
    /// Available water capacity (mm), threshold variants only.
    pub awc_mm: Option<f64>,
    /// Allowable depletion threshold (mm), half of capacity.
    pub awd_mm: Option<f64>,
}

impl TriggerState {
    pub fn new() -> Self {
        Self {
            days_since_event: 0,
            events_this_season: 0,
            awc_mm: None,
            awd_mm: None,
        }
    }

    /// Capacities are computed once per field unit from soil data and reused
    /// all season.
    pub fn with_capacity(awc_mm: f64) -> Self {
        Self {
            awc_mm: Some(awc_mm),
            awd_mm: Some(awc_mm * 0.5),
            ..Self::new()
        }
    }

    /// Reset counters on crossing season-start; capacities persist.
    pub fn reset_season(&mut self) {
        self.days_since_event = 0;
        self.events_this_season = 0;
    }
}

impl Default for TriggerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_sets_depletion_threshold_to_half() {
        let state = TriggerState::with_capacity(60.0);
        assert_eq!(state.awc_mm, Some(60.0));
        assert_eq!(state.awd_mm, Some(30.0));
    }

    #[test]
    fn season_reset_keeps_capacities() {
        let mut state = TriggerState::with_capacity(60.0);
        state.days_since_event = 9;
        state.events_this_season = 3;
        state.reset_season();
        assert_eq!(state.days_since_event, 0);
        assert_eq!(state.events_this_season, 0);
        assert_eq!(state.awc_mm, Some(60.0));
    }
}
