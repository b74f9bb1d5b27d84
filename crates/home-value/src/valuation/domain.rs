use serde::{Deserialize, Serialize};

/// Oldest construction year accepted from a request or a public record.
pub const EARLIEST_YEAR_BUILT: i32 = 1800;

/// True when `year_built` falls between [`EARLIEST_YEAR_BUILT`] and `current_year`.
pub fn plausible_year_built(year_built: i32, current_year: i32) -> bool {
    (EARLIEST_YEAR_BUILT..=current_year).contains(&year_built)
}

/// Renovation categories a homeowner can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenovationKind {
    Kitchen,
    Bath,
    Roof,
    Hvac,
    Windows,
}

impl RenovationKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Kitchen,
            Self::Bath,
            Self::Roof,
            Self::Hvac,
            Self::Windows,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Kitchen => "Kitchen",
            Self::Bath => "Bath",
            Self::Roof => "Roof",
            Self::Hvac => "HVAC",
            Self::Windows => "Windows",
        }
    }

    /// Fractional value premium granted when this renovation is reported.
    pub const fn premium(self) -> f64 {
        match self {
            Self::Kitchen => 0.05,
            Self::Bath => 0.04,
            Self::Roof => 0.02,
            Self::Hvac => 0.015,
            Self::Windows => 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenovationFlags {
    pub kitchen: bool,
    pub bath: bool,
    pub roof: bool,
    pub hvac: bool,
    pub windows: bool,
}

impl RenovationFlags {
    pub const fn is_set(&self, kind: RenovationKind) -> bool {
        match kind {
            RenovationKind::Kitchen => self.kitchen,
            RenovationKind::Bath => self.bath,
            RenovationKind::Roof => self.roof,
            RenovationKind::Hvac => self.hvac,
            RenovationKind::Windows => self.windows,
        }
    }

    pub fn set_kinds(&self) -> Vec<RenovationKind> {
        RenovationKind::ordered()
            .into_iter()
            .filter(|kind| self.is_set(*kind))
            .collect()
    }

    /// Kitchen or bath work offsets age depreciation.
    pub const fn modernized(&self) -> bool {
        self.kitchen || self.bath
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    #[default]
    None,
    City,
    Mountain,
    Water,
}

impl ViewType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::City => "City",
            Self::Mountain => "Mountain",
            Self::Water => "Water",
        }
    }

    pub const fn premium(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::City => 0.03,
            Self::Mountain => 0.04,
            Self::Water => 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTrend {
    Declining,
    #[default]
    Flat,
    Rising,
}

impl MarketTrend {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Declining => "Declining",
            Self::Flat => "Flat",
            Self::Rising => "Rising",
        }
    }

    pub const fn factor(self) -> f64 {
        match self {
            Self::Declining => -0.02,
            Self::Flat => 0.0,
            Self::Rising => 0.02,
        }
    }
}

/// Condition rating on the 1 (poor) to 5 (excellent) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ConditionScore(u8);

impl ConditionScore {
    pub const AVERAGE: Self = Self(3);

    pub const fn new(score: u8) -> Option<Self> {
        if score >= 1 && score <= 5 {
            Some(Self(score))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn multiplier(self) -> f64 {
        match self.0 {
            1 => 0.85,
            2 => 0.93,
            4 => 1.06,
            5 => 1.12,
            _ => 1.00,
        }
    }
}

impl Default for ConditionScore {
    fn default() -> Self {
        Self::AVERAGE
    }
}

/// Neighborhood school rating on the 1 to 10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SchoolRating(u8);

impl SchoolRating {
    pub const fn new(rating: u8) -> Option<Self> {
        if rating >= 1 && rating <= 10 {
            Some(Self(rating))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A closed sale used to calibrate the regional rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableSale {
    pub price: f64,
    pub area_sqft: f64,
}

impl ComparableSale {
    pub fn price_per_sqft(&self) -> Option<f64> {
        let usable = self.price.is_finite()
            && self.area_sqft.is_finite()
            && self.price > 0.0
            && self.area_sqft > 0.0;
        usable.then(|| self.price / self.area_sqft)
    }
}

/// Validated subject attributes; everything except the address may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyAttributes {
    pub address: String,
    pub living_area_sqft: Option<u32>,
    pub lot_area_sqft: Option<u32>,
    pub year_built: Option<i32>,
    pub bedroom_count: Option<u8>,
    pub bathroom_count: Option<u8>,
    pub condition_score: Option<ConditionScore>,
    pub renovations: RenovationFlags,
    pub view: ViewType,
    pub garage_spots: u8,
    pub school_rating: Option<SchoolRating>,
    pub market_trend: MarketTrend,
    pub comparable_sales: Vec<ComparableSale>,
}

impl PropertyAttributes {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// True when public records could fill in a missing size or age field.
    pub fn needs_subject_backfill(&self) -> bool {
        self.living_area_sqft.is_none() || self.lot_area_sqft.is_none() || self.year_built.is_none()
    }
}

/// Output of address normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRegion {
    pub normalized_address: String,
    pub postal_code: Option<String>,
    pub county: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl ResolvedRegion {
    pub fn new(
        normalized_address: impl Into<String>,
        postal_code: Option<&str>,
        county: Option<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            normalized_address: normalized_address.into(),
            postal_code: postal_code.and_then(normalize_postal_code),
            county,
            latitude,
            longitude,
        }
    }
}

/// Reduces `12345` or `12345-6789` to the five-digit key; anything else is rejected.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (zip, plus_four) = match trimmed.split_once('-') {
        Some((zip, extension)) => (zip, Some(extension)),
        None => (trimmed, None),
    };

    let digits = |value: &str, len: usize| {
        value.len() == len && value.bytes().all(|byte| byte.is_ascii_digit())
    };

    if !digits(zip, 5) {
        return None;
    }
    if let Some(extension) = plus_four {
        if !digits(extension, 4) {
            return None;
        }
    }

    Some(zip.to_string())
}

/// Where a resolved attribute value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeSource {
    Input,
    Provider,
    Absent,
}

impl AttributeSource {
    pub(crate) fn of<T>(value: &Option<T>) -> Self {
        if value.is_some() {
            Self::Input
        } else {
            Self::Absent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeProvenance {
    pub living_area_sqft: AttributeSource,
    pub lot_area_sqft: AttributeSource,
    pub year_built: AttributeSource,
    pub school_rating: AttributeSource,
    pub comparable_sales: AttributeSource,
}

impl AttributeProvenance {
    pub fn from_input(attributes: &PropertyAttributes) -> Self {
        Self {
            living_area_sqft: AttributeSource::of(&attributes.living_area_sqft),
            lot_area_sqft: AttributeSource::of(&attributes.lot_area_sqft),
            year_built: AttributeSource::of(&attributes.year_built),
            school_rating: AttributeSource::of(&attributes.school_rating),
            comparable_sales: if attributes.comparable_sales.is_empty() {
                AttributeSource::Absent
            } else {
                AttributeSource::Input
            },
        }
    }
}

/// Region metadata attached to a finished valuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub normalized_address: String,
    pub postal_code: Option<String>,
    pub county: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_living_area_sqft: Option<u32>,
    pub provenance: AttributeProvenance,
}

impl SubjectSummary {
    pub fn new(
        region: ResolvedRegion,
        resolved_living_area_sqft: Option<u32>,
        provenance: AttributeProvenance,
    ) -> Self {
        Self {
            normalized_address: region.normalized_address,
            postal_code: region.postal_code,
            county: region.county,
            latitude: region.latitude,
            longitude: region.longitude,
            resolved_living_area_sqft,
            provenance,
        }
    }
}
