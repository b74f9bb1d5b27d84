use std::sync::Arc;

use super::baseline::BaselineTable;
use super::breakdown::{Adjustment, BreakdownEntry, Trail};
use super::domain::{PropertyAttributes, RenovationKind, ResolvedRegion};

/// Fields counted when sizing the uncertainty band; the address always counts.
const CORE_FIELD_COUNT: f64 = 7.0;
const MIN_BAND: f64 = 0.03;
const MAX_BAND: f64 = 0.10;
const MAX_AGE_YEARS: i32 = 120;
const MAX_DEPRECIATING_YEARS: u32 = 80;

/// Point estimate with its uncertainty band and the trail that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
    pub band: f64,
    pub price_per_area_used: f64,
    pub breakdown: Vec<BreakdownEntry>,
}

/// Stateless estimator applying the multiplicative adjustment chain.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    baseline: Arc<BaselineTable>,
}

impl ValuationEngine {
    pub fn new(baseline: Arc<BaselineTable>) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> &BaselineTable {
        &self.baseline
    }

    pub fn estimate(
        &self,
        attributes: &PropertyAttributes,
        region: &ResolvedRegion,
        current_year: i32,
    ) -> Valuation {
        let mut trail = Trail::default();

        let lookup = self.baseline.lookup(region.postal_code.as_deref());
        trail.note_rate(Adjustment::BaselineRate {
            postal_code: region.postal_code.clone(),
            rate: lookup.rate,
            source: lookup.source,
        });

        let comparable_rates: Vec<f64> = attributes
            .comparable_sales
            .iter()
            .filter_map(|sale| sale.price_per_sqft())
            .collect();
        let comparable_count = comparable_rates.len();
        let has_comparables = comparable_count > 0;
        let price_per_sqft = match median(comparable_rates) {
            Some(median_rate) => {
                let blended_rate = 0.5 * lookup.rate + 0.5 * median_rate;
                trail.note_rate(Adjustment::ComparableBlend {
                    comparable_count,
                    median_rate,
                    blended_rate,
                });
                blended_rate
            }
            None => lookup.rate,
        };

        let mut value = price_per_sqft * f64::from(attributes.living_area_sqft.unwrap_or(0));
        trail.note_base_value(
            Adjustment::BaseValue {
                rate: price_per_sqft,
                living_area_sqft: attributes.living_area_sqft,
            },
            value,
        );

        let bedroom_factor = attributes
            .bedroom_count
            .map(|beds| ((f64::from(beds) - 2.0) * 0.01).clamp(0.0, 0.03))
            .unwrap_or(0.0);
        let bathroom_factor = attributes
            .bathroom_count
            .map(|baths| ((f64::from(baths) - 1.0) * 0.015).clamp(0.0, 0.045))
            .unwrap_or(0.0);
        trail.apply(
            &mut value,
            bedroom_factor + bathroom_factor,
            Adjustment::RoomCount {
                bedroom_factor,
                bathroom_factor,
            },
        );

        let condition = attributes.condition_score.unwrap_or_default();
        trail.apply(
            &mut value,
            condition.multiplier() - 1.0,
            Adjustment::Condition {
                score: condition.get(),
            },
        );

        if let Some(year_built) = attributes.year_built {
            let age_years = (i64::from(current_year) - i64::from(year_built))
                .clamp(0, i64::from(MAX_AGE_YEARS)) as u32;
            let modernized = attributes.renovations.modernized();
            // Kitchen/bath work is also priced by the renovation premium below.
            let mut factor = -(f64::from(age_years.min(MAX_DEPRECIATING_YEARS)) * 0.001);
            if modernized {
                factor += 0.03;
            }
            trail.apply(
                &mut value,
                factor,
                Adjustment::AgeModernization {
                    age_years,
                    modernized,
                },
            );
        }

        let kinds = attributes.renovations.set_kinds();
        let renovation_premium: f64 = kinds.iter().copied().map(RenovationKind::premium).sum();
        if renovation_premium > 0.0 {
            trail.apply(
                &mut value,
                renovation_premium,
                Adjustment::Renovation { kinds },
            );
        }

        trail.apply(
            &mut value,
            attributes.view.premium(),
            Adjustment::View {
                view: attributes.view,
            },
        );

        if let (Some(lot), Some(living)) = (attributes.lot_area_sqft, attributes.living_area_sqft)
        {
            if living > 0 {
                let ratio = f64::from(lot) / f64::from(living);
                let premium = (ratio / 5.0 - 0.1).clamp(-0.05, 0.10);
                trail.apply(&mut value, premium, Adjustment::LotSize { ratio });
            }
        }

        if attributes.garage_spots > 0 {
            let premium = (f64::from(attributes.garage_spots) * 0.01).clamp(0.0, 0.03);
            trail.apply(
                &mut value,
                premium,
                Adjustment::Garage {
                    spots: attributes.garage_spots,
                },
            );
        }

        if let Some(rating) = attributes.school_rating {
            let premium = ((f64::from(rating.get()) - 5.0) * 0.01).clamp(-0.04, 0.05);
            trail.apply(
                &mut value,
                premium,
                Adjustment::School {
                    rating: rating.get(),
                },
            );
        }

        trail.apply(
            &mut value,
            attributes.market_trend.factor(),
            Adjustment::MarketTrend {
                trend: attributes.market_trend,
            },
        );

        let band = uncertainty_band(attributes, has_comparables);

        Valuation {
            estimate: value,
            low: value * (1.0 - band),
            high: value * (1.0 + band),
            band,
            price_per_area_used: price_per_sqft,
            breakdown: trail.into_entries(),
        }
    }
}

/// Half-width of the estimate range, narrowing as more facts are known.
pub fn uncertainty_band(attributes: &PropertyAttributes, has_comparables: bool) -> f64 {
    let known = 1 + [
        attributes.living_area_sqft.is_some(),
        attributes.bedroom_count.is_some(),
        attributes.bathroom_count.is_some(),
        attributes.condition_score.is_some(),
        attributes.year_built.is_some(),
        attributes.lot_area_sqft.is_some(),
    ]
    .into_iter()
    .filter(|known| *known)
    .count();

    let comparable_credit = if has_comparables { 0.02 } else { 0.0 };
    (0.08 - (known as f64 / CORE_FIELD_COUNT) * 0.03 - comparable_credit).clamp(MIN_BAND, MAX_BAND)
}

/// Midpoint of the sorted values, averaging the middle pair for even counts.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
