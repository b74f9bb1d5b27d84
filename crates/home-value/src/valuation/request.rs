use serde::{Deserialize, Serialize};

use super::domain::{
    ComparableSale, ConditionScore, MarketTrend, PropertyAttributes, RenovationFlags,
    SchoolRating, ViewType, EARLIEST_YEAR_BUILT,
};

const MIN_ADDRESS_LEN: usize = 8;

/// Raw estimate request as submitted by the valuation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub address: String,
    #[serde(default, alias = "livingAreaSqft")]
    pub sqft: Option<i64>,
    #[serde(default, alias = "bedroomCount")]
    pub beds: Option<i64>,
    #[serde(default, alias = "bathroomCount")]
    pub baths: Option<i64>,
    #[serde(default, alias = "lotAreaSqft")]
    pub lot_sqft: Option<i64>,
    #[serde(default)]
    pub year_built: Option<i64>,
    #[serde(default, alias = "conditionScore")]
    pub condition: Option<i64>,
    #[serde(default, alias = "renovationFlags")]
    pub renovations: Option<RenovationRequest>,
    #[serde(default, alias = "viewType")]
    pub view: Option<ViewType>,
    #[serde(default, alias = "garageSpotCount")]
    pub garage_spots: Option<i64>,
    #[serde(default)]
    pub school_rating: Option<i64>,
    #[serde(default)]
    pub market_trend: Option<MarketTrend>,
    #[serde(default, alias = "comparableSales")]
    pub comps: Option<Vec<ComparableRequest>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenovationRequest {
    #[serde(default)]
    pub kitchen: Option<bool>,
    #[serde(default)]
    pub bath: Option<bool>,
    #[serde(default)]
    pub roof: Option<bool>,
    #[serde(default)]
    pub hvac: Option<bool>,
    #[serde(default)]
    pub windows: Option<bool>,
}

impl From<RenovationRequest> for RenovationFlags {
    fn from(value: RenovationRequest) -> Self {
        Self {
            kitchen: value.kitchen.unwrap_or(false),
            bath: value.bath.unwrap_or(false),
            roof: value.roof.unwrap_or(false),
            hvac: value.hvac.unwrap_or(false),
            windows: value.windows.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparableRequest {
    pub price: f64,
    #[serde(alias = "areaSqft")]
    pub sqft: f64,
}

/// Every problem found in a request, reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request: {}", .issues.join("; "))]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl ValidationError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            issues: vec![detail.into()],
        }
    }
}

#[derive(Default)]
struct Issues(Vec<String>);

impl Issues {
    fn in_range(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) -> Option<i64> {
        let value = value?;
        if (min..=max).contains(&value) {
            Some(value)
        } else {
            self.0
                .push(format!("{field} must be between {min} and {max}, got {value}"));
            None
        }
    }

    fn positive(&mut self, field: &str, value: Option<i64>) -> Option<u32> {
        self.in_range(field, value, 1, i64::from(u32::MAX))
            .and_then(|value| u32::try_from(value).ok())
    }

    fn small(&mut self, field: &str, value: Option<i64>, min: u8, max: u8) -> Option<u8> {
        self.in_range(field, value, i64::from(min), i64::from(max))
            .and_then(|value| u8::try_from(value).ok())
    }
}

impl EstimateRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Checks ranges and converts into engine attributes; runs before any provider call.
    pub fn validate(self, current_year: i32) -> Result<PropertyAttributes, ValidationError> {
        let mut issues = Issues::default();

        let address = self.address.trim().to_string();
        if address.chars().count() < MIN_ADDRESS_LEN {
            issues.0.push(format!(
                "address must be at least {MIN_ADDRESS_LEN} characters"
            ));
        }

        let living_area_sqft = issues.positive("sqft", self.sqft);
        let lot_area_sqft = issues.positive("lotSqft", self.lot_sqft);
        let bedroom_count = issues.small("beds", self.beds, 0, 10);
        let bathroom_count = issues.small("baths", self.baths, 0, 10);
        let year_built = issues
            .in_range(
                "yearBuilt",
                self.year_built,
                i64::from(EARLIEST_YEAR_BUILT),
                i64::from(current_year),
            )
            .and_then(|year| i32::try_from(year).ok());
        let condition_score = issues
            .small("condition", self.condition, 1, 5)
            .and_then(ConditionScore::new);
        let garage_spots = issues
            .small("garageSpots", self.garage_spots, 0, 6)
            .unwrap_or(0);
        let school_rating = issues
            .small("schoolRating", self.school_rating, 1, 10)
            .and_then(SchoolRating::new);

        let mut comparable_sales = Vec::new();
        for (index, comp) in self.comps.unwrap_or_default().into_iter().enumerate() {
            let valid_price = comp.price.is_finite() && comp.price > 0.0;
            let valid_area = comp.sqft.is_finite() && comp.sqft > 0.0;
            if !valid_price {
                issues
                    .0
                    .push(format!("comps[{index}].price must be positive"));
            }
            if !valid_area {
                issues.0.push(format!("comps[{index}].sqft must be positive"));
            }
            if valid_price && valid_area {
                comparable_sales.push(ComparableSale {
                    price: comp.price,
                    area_sqft: comp.sqft,
                });
            }
        }

        if !issues.0.is_empty() {
            return Err(ValidationError { issues: issues.0 });
        }

        Ok(PropertyAttributes {
            address,
            living_area_sqft,
            lot_area_sqft,
            year_built,
            bedroom_count,
            bathroom_count,
            condition_score,
            renovations: self.renovations.map(RenovationFlags::from).unwrap_or_default(),
            view: self.view.unwrap_or_default(),
            garage_spots,
            school_rating,
            market_trend: self.market_trend.unwrap_or_default(),
            comparable_sales,
        })
    }
}
