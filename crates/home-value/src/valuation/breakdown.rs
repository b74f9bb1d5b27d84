use serde::Serialize;

use super::baseline::RateSource;
use super::domain::{MarketTrend, RenovationKind, ViewType};

/// One step of the valuation and the inputs that drove it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Adjustment {
    BaselineRate {
        postal_code: Option<String>,
        rate: f64,
        source: RateSource,
    },
    ComparableBlend {
        comparable_count: usize,
        median_rate: f64,
        blended_rate: f64,
    },
    BaseValue {
        rate: f64,
        living_area_sqft: Option<u32>,
    },
    RoomCount {
        bedroom_factor: f64,
        bathroom_factor: f64,
    },
    Condition {
        score: u8,
    },
    AgeModernization {
        age_years: u32,
        modernized: bool,
    },
    Renovation {
        kinds: Vec<RenovationKind>,
    },
    View {
        view: ViewType,
    },
    LotSize {
        ratio: f64,
    },
    Garage {
        spots: u8,
    },
    School {
        rating: u8,
    },
    MarketTrend {
        trend: MarketTrend,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    #[serde(flatten)]
    pub adjustment: Adjustment,
    /// Multiplier minus one; rate steps carry no factor.
    pub factor: Option<f64>,
    /// Change in value contributed by this step.
    pub delta: f64,
    pub value_after: f64,
}

/// Append-only trail recorded while the engine runs.
#[derive(Debug, Default)]
pub(crate) struct Trail {
    entries: Vec<BreakdownEntry>,
}

impl Trail {
    pub(crate) fn note_rate(&mut self, adjustment: Adjustment) {
        self.entries.push(BreakdownEntry {
            adjustment,
            factor: None,
            delta: 0.0,
            value_after: 0.0,
        });
    }

    pub(crate) fn note_base_value(&mut self, adjustment: Adjustment, value: f64) {
        self.entries.push(BreakdownEntry {
            adjustment,
            factor: None,
            delta: value,
            value_after: value,
        });
    }

    /// Scales `value` by `1 + factor`; a zero factor leaves no trace.
    pub(crate) fn apply(&mut self, value: &mut f64, factor: f64, adjustment: Adjustment) {
        if factor == 0.0 {
            return;
        }

        let before = *value;
        *value *= 1.0 + factor;
        self.entries.push(BreakdownEntry {
            adjustment,
            factor: Some(factor),
            delta: *value - before,
            value_after: *value,
        });
    }

    pub(crate) fn into_entries(self) -> Vec<BreakdownEntry> {
        self.entries
    }
}
