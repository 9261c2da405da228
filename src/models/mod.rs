use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Coarse category of a floor plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    #[default]
    Apartment,
    Townhome,
    Studio,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Apartment => "apartment",
            UnitType::Townhome => "townhome",
            UnitType::Studio => "studio",
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Core floor plan data model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloorPlan {
    pub name: String,
    /// Monthly rent in USD, 0 when the listing showed no usable price
    pub price: f64,
    /// Set when the listing advertised a range; `price` holds its minimum
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    /// 0 means studio (or no bedroom signal)
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_footage: u32,
    pub price_per_sq_ft: f64,
    pub amenities: Vec<String>,
    /// Display form, e.g. "Available Now" or "Contact for Availability"
    pub availability: String,
    /// False when the listing marked the unit as not leasable
    #[serde(default = "default_available")]
    pub available: bool,
    pub property_name: String,
    pub property_url: String,
    #[serde(default)]
    pub unit_type: UnitType,
}

fn default_available() -> bool {
    true
}

impl FloorPlan {
    pub fn is_available(&self) -> bool {
        self.available
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BedroomDistribution {
    pub studio: usize,
    pub one_bed: usize,
    pub two_bed: usize,
    pub three_bed: usize,
    pub four_plus_bed: usize,
}

impl BedroomDistribution {
    pub fn record(&mut self, bedrooms: u32) {
        match bedrooms {
            0 => self.studio += 1,
            1 => self.one_bed += 1,
            2 => self.two_bed += 1,
            3 => self.three_bed += 1,
            _ => self.four_plus_bed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.studio + self.one_bed + self.two_bed + self.three_bed + self.four_plus_bed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertySummary {
    pub property_name: String,
    pub total_floor_plans: usize,
    pub price_range: PriceRange,
    pub avg_price_per_sq_ft: f64,
    pub bedroom_distribution: BedroomDistribution,
    pub available_units: usize,
}

/// Market-wide numbers across every scraped property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MarketSummary {
    pub total_properties: usize,
    pub total_floor_plans: usize,
    pub available_units: usize,
    pub overall_price_range: PriceRange,
    pub average_price: f64,
    pub average_price_per_sq_ft: f64,
    pub cheapest: Option<FloorPlan>,
    pub most_expensive: Option<FloorPlan>,
    pub best_value: Option<FloorPlan>,
}

/// Outcome of scraping one site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapingResult {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub floor_plans: Vec<FloorPlan>,
    pub errors: Vec<String>,
}

impl ScrapingResult {
    pub fn succeeded(source: &str, floor_plans: Vec<FloorPlan>) -> Self {
        Self {
            success: true,
            message: format!("{} scraping completed: {} floor plans", source, floor_plans.len()),
            timestamp: Utc::now(),
            source: source.to_string(),
            floor_plans,
            errors: Vec::new(),
        }
    }

    pub fn failed(source: &str, error: impl std::fmt::Display) -> Self {
        let error = error.to_string();
        Self {
            success: false,
            message: format!("{} scraping failed: {}", source, error),
            timestamp: Utc::now(),
            source: source.to_string(),
            floor_plans: Vec::new(),
            errors: vec![error],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub property_summaries: Vec<PropertySummary>,
    pub floor_plans: Vec<FloorPlan>,
    pub market: MarketSummary,
    #[serde(default)]
    pub scraping_results: Vec<ScrapingResult>,
}

/// One day of a property's pricing, read back from stored snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub property_name: String,
    pub unit_count: usize,
    pub avg_price: f64,
    pub avg_price_per_sq_ft: f64,
    pub min_price: f64,
    pub max_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_type_serializes_lowercase() {
        let json = serde_json::to_string(&UnitType::Townhome).unwrap();
        assert_eq!(json, "\"townhome\"");
        let back: UnitType = serde_json::from_str("\"studio\"").unwrap();
        assert_eq!(back, UnitType::Studio);
    }

    #[test]
    fn bedroom_distribution_buckets_four_plus() {
        let mut dist = BedroomDistribution::default();
        for beds in [0, 1, 1, 2, 3, 4, 7] {
            dist.record(beds);
        }
        assert_eq!(dist.studio, 1);
        assert_eq!(dist.one_bed, 2);
        assert_eq!(dist.four_plus_bed, 2);
        assert_eq!(dist.total(), 7);
    }

    #[test]
    fn failed_result_carries_error_text() {
        let result = ScrapingResult::failed("Drift Dunwoody", "timeout");
        assert!(!result.success);
        assert!(result.floor_plans.is_empty());
        assert_eq!(result.errors, vec!["timeout".to_string()]);
        assert!(result.message.contains("Drift Dunwoody"));
    }
}
