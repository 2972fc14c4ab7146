/// One side of an irrigation application, tagged with its supply source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrrigationApplication {
    pub source: u32,
    pub amount_mm: f64,
}

/// Outcome of consulting the decision engine for one (field unit, date).
///
/// Zero applications means no irrigation that day; a zero-valued side of the
/// source split is never carried as an application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrrigationDecision {
    pub applications: Vec<IrrigationApplication>,
}

impl IrrigationDecision {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn total_mm(&self) -> f64 {
        self.applications.iter().map(|a| a.amount_mm).sum()
    }
}
