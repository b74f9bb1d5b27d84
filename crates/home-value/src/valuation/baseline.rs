use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::normalize_postal_code;

/// Rate used when the postal code is unknown or missing.
pub const DEFAULT_RATE_PER_SQFT: f64 = 250.0;

/// Reference price per square foot by ZIP code across Washington State.
const WASHINGTON_RATES: &[(&str, f64)] = &[
    ("98004", 950.0),
    ("98005", 780.0),
    ("98006", 700.0),
    ("98007", 620.0),
    ("98008", 650.0),
    ("98033", 800.0),
    ("98034", 620.0),
    ("98039", 1350.0),
    ("98040", 900.0),
    ("98052", 720.0),
    ("98053", 600.0),
    ("98074", 640.0),
    ("98075", 650.0),
    ("98029", 600.0),
    ("98027", 560.0),
    ("98101", 700.0),
    ("98102", 760.0),
    ("98103", 690.0),
    ("98105", 750.0),
    ("98107", 680.0),
    ("98109", 760.0),
    ("98112", 900.0),
    ("98115", 680.0),
    ("98116", 620.0),
    ("98117", 670.0),
    ("98118", 480.0),
    ("98119", 720.0),
    ("98122", 640.0),
    ("98125", 520.0),
    ("98126", 520.0),
    ("98133", 500.0),
    ("98136", 600.0),
    ("98144", 560.0),
    ("98155", 480.0),
    ("98199", 700.0),
    ("98056", 420.0),
    ("98059", 410.0),
    ("98001", 300.0),
    ("98003", 290.0),
    ("98023", 290.0),
    ("98030", 320.0),
    ("98031", 320.0),
    ("98042", 300.0),
    ("98012", 420.0),
    ("98020", 520.0),
    ("98026", 460.0),
    ("98036", 430.0),
    ("98201", 330.0),
    ("98203", 340.0),
    ("98208", 350.0),
    ("98110", 700.0),
    ("98225", 420.0),
    ("98226", 400.0),
    ("98402", 380.0),
    ("98403", 360.0),
    ("98405", 300.0),
    ("98406", 350.0),
    ("98407", 360.0),
    ("98501", 300.0),
    ("98502", 300.0),
    ("98660", 330.0),
    ("98683", 340.0),
    ("98685", 330.0),
    ("99201", 240.0),
    ("99203", 280.0),
    ("99208", 250.0),
    ("99223", 260.0),
    ("99352", 250.0),
    ("98901", 200.0),
    ("98908", 250.0),
];

/// Whether a rate came from the table or the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Table,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLookup {
    pub rate: f64,
    pub source: RateSource,
}

/// Immutable postal-code to price-per-square-foot reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineTable {
    rates: BTreeMap<String, f64>,
    default_rate: f64,
}

impl BaselineTable {
    pub fn washington() -> Self {
        Self::from_entries(
            WASHINGTON_RATES
                .iter()
                .map(|(postal_code, rate)| (postal_code.to_string(), *rate)),
        )
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            rates: entries.into_iter().collect(),
            default_rate: DEFAULT_RATE_PER_SQFT,
        }
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, BaselineLoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Reads `postal_code,rate` rows; every row must be a valid entry.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, BaselineLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = BTreeMap::new();
        for record in csv_reader.deserialize::<BaselineRow>() {
            let row = record?;
            let postal_code = normalize_postal_code(&row.postal_code)
                .filter(|code| *code == row.postal_code)
                .ok_or_else(|| BaselineLoadError::InvalidPostalCode(row.postal_code.clone()))?;
            if !(row.rate.is_finite() && row.rate > 0.0) {
                return Err(BaselineLoadError::InvalidRate {
                    postal_code,
                    rate: row.rate,
                });
            }
            rates.insert(postal_code, row.rate);
        }

        if rates.is_empty() {
            return Err(BaselineLoadError::Empty);
        }

        Ok(Self {
            rates,
            default_rate: DEFAULT_RATE_PER_SQFT,
        })
    }

    pub fn lookup(&self, postal_code: Option<&str>) -> RateLookup {
        match postal_code.and_then(|code| self.rates.get(code)) {
            Some(rate) => RateLookup {
                rate: *rate,
                source: RateSource::Table,
            },
            None => RateLookup {
                rate: self.default_rate,
                source: RateSource::Default,
            },
        }
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.rates
            .iter()
            .map(|(postal_code, rate)| (postal_code.as_str(), *rate))
    }
}

impl Default for BaselineTable {
    fn default() -> Self {
        Self::washington()
    }
}

#[derive(Debug, Deserialize)]
struct BaselineRow {
    postal_code: String,
    rate: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum BaselineLoadError {
    #[error("failed to read baseline table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid baseline CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("baseline postal code '{0}' is not a five-digit ZIP")]
    InvalidPostalCode(String),
    #[error("baseline rate for {postal_code} must be positive, got {rate}")]
    InvalidRate { postal_code: String, rate: f64 },
    #[error("baseline table contains no rates")]
    Empty,
}
