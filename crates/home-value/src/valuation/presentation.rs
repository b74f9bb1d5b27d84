use std::fmt;

use serde::Serialize;

use super::baseline::RateSource;
use super::breakdown::{Adjustment, BreakdownEntry};
use super::domain::{RenovationKind, SubjectSummary, ViewType};
use super::orchestrator::ValuationResult;

/// Wire shape returned to the valuation form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResponse {
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
    /// Fractional half-width of the low/high range.
    pub band: f64,
    pub price_per_area_used: f64,
    /// Rendered explanation lines, in application order.
    pub breakdown: Vec<String>,
    pub adjustments: Vec<BreakdownEntry>,
    pub subject: SubjectSummary,
}

impl From<ValuationResult> for ValuationResponse {
    fn from(result: ValuationResult) -> Self {
        let ValuationResult { valuation, subject } = result;
        Self {
            estimate: valuation.estimate.round(),
            low: valuation.low.round(),
            high: valuation.high.round(),
            band: valuation.band,
            price_per_area_used: valuation.price_per_area_used,
            breakdown: render_breakdown(&valuation.breakdown),
            adjustments: valuation.breakdown,
            subject,
        }
    }
}

pub fn render_breakdown(entries: &[BreakdownEntry]) -> Vec<String> {
    entries.iter().map(ToString::to_string).collect()
}

/// Whole-dollar USD with thousands separators, e.g. `$1,450,000`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn signed_currency(amount: f64) -> String {
    if amount.round() < 0.0 {
        format_currency(amount)
    } else {
        format!("+{}", format_currency(amount))
    }
}

fn renovation_list(kinds: &[RenovationKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for BreakdownEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.adjustment {
            Adjustment::BaselineRate {
                postal_code,
                rate,
                source,
            } => {
                return match (source, postal_code) {
                    (RateSource::Table, Some(code)) => {
                        write!(f, "Baseline rate for {code}: {}/sqft", format_currency(*rate))
                    }
                    (_, Some(code)) => write!(
                        f,
                        "No baseline rate for {code}; using default {}/sqft",
                        format_currency(*rate)
                    ),
                    (_, None) => write!(
                        f,
                        "Postal code unavailable; using default {}/sqft",
                        format_currency(*rate)
                    ),
                };
            }
            Adjustment::ComparableBlend {
                comparable_count,
                median_rate,
                blended_rate,
            } => {
                let noun = if *comparable_count == 1 { "sale" } else { "sales" };
                return write!(
                    f,
                    "Blended with median of {comparable_count} comparable {noun} ({}/sqft): {}/sqft",
                    format_currency(*median_rate),
                    format_currency(*blended_rate)
                );
            }
            Adjustment::BaseValue {
                rate,
                living_area_sqft,
            } => {
                return match living_area_sqft {
                    Some(sqft) => write!(
                        f,
                        "Base value: {}/sqft x {} sqft = {}",
                        format_currency(*rate),
                        format_currency(f64::from(*sqft)).trim_start_matches('$'),
                        format_currency(self.value_after)
                    ),
                    None => write!(f, "Base value: living area unknown, {}", format_currency(0.0)),
                };
            }
            Adjustment::RoomCount { .. } => write!(f, "Bedrooms/bathrooms")?,
            Adjustment::Condition { score } => write!(f, "Condition {score}/5")?,
            Adjustment::AgeModernization {
                age_years,
                modernized,
            } => {
                write!(f, "Age {age_years} years")?;
                if *modernized {
                    write!(f, " with kitchen/bath update")?;
                }
            }
            Adjustment::Renovation { kinds } => {
                write!(f, "Renovations ({})", renovation_list(kinds))?
            }
            Adjustment::View { view } => match view {
                ViewType::None => write!(f, "View")?,
                other => write!(f, "{} view", other.label())?,
            },
            Adjustment::LotSize { ratio } => write!(f, "Lot-to-living ratio {ratio:.2}")?,
            Adjustment::Garage { spots } => {
                let noun = if *spots == 1 { "spot" } else { "spots" };
                write!(f, "Garage ({spots} {noun})")?
            }
            Adjustment::School { rating } => write!(f, "School rating {rating}/10")?,
            Adjustment::MarketTrend { trend } => write!(f, "{} market", trend.label())?,
        }

        let factor = self.factor.unwrap_or(0.0);
        write!(
            f,
            ": {:+.1}% ({})",
            factor * 100.0,
            signed_currency(self.delta)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::domain::MarketTrend;

    fn entry(adjustment: Adjustment, factor: Option<f64>, delta: f64, value_after: f64) -> String {
        BreakdownEntry {
            adjustment,
            factor,
            delta,
            value_after,
        }
        .to_string()
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(950.0), "$950");
        assert_eq!(format_currency(1_450_000.4), "$1,450,000");
        assert_eq!(format_currency(-38_000.0), "-$38,000");
        assert_eq!(format_currency(123_456.5), "$123,457");
    }

    #[test]
    fn rate_entries_describe_source() {
        let table = entry(
            Adjustment::BaselineRate {
                postal_code: Some("98004".to_string()),
                rate: 950.0,
                source: RateSource::Table,
            },
            None,
            0.0,
            0.0,
        );
        assert_eq!(table, "Baseline rate for 98004: $950/sqft");

        let fallback = entry(
            Adjustment::BaselineRate {
                postal_code: Some("10001".to_string()),
                rate: 250.0,
                source: RateSource::Default,
            },
            None,
            0.0,
            0.0,
        );
        assert_eq!(fallback, "No baseline rate for 10001; using default $250/sqft");
    }

    #[test]
    fn base_value_shows_the_multiplication() {
        let line = entry(
            Adjustment::BaseValue {
                rate: 725.0,
                living_area_sqft: Some(2000),
            },
            None,
            1_450_000.0,
            1_450_000.0,
        );
        assert_eq!(line, "Base value: $725/sqft x 2,000 sqft = $1,450,000");
    }

    #[test]
    fn multiplier_entries_show_percent_and_delta() {
        let condition = entry(
            Adjustment::Condition { score: 4 },
            Some(0.06),
            114_000.0,
            2_014_000.0,
        );
        assert_eq!(condition, "Condition 4/5: +6.0% (+$114,000)");

        let trend = entry(
            Adjustment::MarketTrend {
                trend: MarketTrend::Declining,
            },
            Some(-0.02),
            -38_000.0,
            1_862_000.0,
        );
        assert_eq!(trend, "Declining market: -2.0% (-$38,000)");

        let renovations = entry(
            Adjustment::Renovation {
                kinds: vec![RenovationKind::Kitchen, RenovationKind::Hvac],
            },
            Some(0.065),
            6_500.0,
            106_500.0,
        );
        assert_eq!(renovations, "Renovations (Kitchen, HVAC): +6.5% (+$6,500)");
    }
}
