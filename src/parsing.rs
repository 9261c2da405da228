//! Field parsers turning raw listing fragments into typed values.
//!
//! Missing data is represented as 0 (price, square footage, bedrooms,
//! bathrooms) rather than an error; callers decide what a 0 means.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{FloorPlan, PriceRange, UnitType};

/// Plausible monthly rent band; anything outside is treated as a mis-parse
pub const MIN_PLAUSIBLE_RENT: f64 = 500.0;
pub const MAX_PLAUSIBLE_RENT: f64 = 10_000.0;

static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:,\d+)*(?:\.\d+)?").expect("invalid regex: number")
});

static RE_INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").expect("invalid regex: integer")
});

static RE_PRICE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*[-–]\s*\$?\s*(\d[\d,]*(?:\.\d+)?)")
        .expect("invalid regex: price range")
});

static RE_BEDROOMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*-?\s*(?:bedrooms?|beds?|bd|br)\b").expect("invalid regex: bedrooms")
});

// The number must not continue a longer decimal such as the "75" in "1.75"
static RE_BATHS_HALF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\d.])(\d+\.50*)\s*-?\s*(?:bathrooms?|baths?|ba)\b").expect("invalid regex: half baths")
});

static RE_BATHS_WHOLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\d.])(\d+)(?:\.0+)?\s*-?\s*(?:bathrooms?|baths?|ba)\b")
        .expect("invalid regex: whole baths")
});

static RE_MARKETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:starting\s+at|from)\s*\$?\s*\d[\d,]*(?:\.\d+)?(?:\s*[-–]\s*\$?\s*\d[\d,]*(?:\.\d+)?)?(?:\s*/\s*mo(?:nth)?)?",
    )
    .expect("invalid regex: marketing")
});

static RE_VIEW_UNITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bview\s+\d+\s+(?:available\s+)?(?:apartments?|units?|homes?)\b")
        .expect("invalid regex: view units")
});

static RE_PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s*\d[\d,]*(?:\.\d+)?(?:\s*[-–]\s*\$?\s*\d[\d,]*(?:\.\d+)?)?(?:\s*/\s*mo(?:nth)?)?")
        .expect("invalid regex: price token")
});

static RE_BED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+\s*-?\s*(?:bedrooms?|beds?|bd|br)\b").expect("invalid regex: bed token")
});

static RE_BATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*-?\s*(?:bathrooms?|baths?|ba)\b")
        .expect("invalid regex: bath token")
});

static RE_SQFT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d[\d,]*\s*(?:sq\.?\s*ft\.?|sqft|square\s+feet|sf)\b")
        .expect("invalid regex: sqft token")
});

static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/|•·]+").expect("invalid regex: separators")
});

static RE_DATE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("invalid regex: iso date")
});

static RE_DATE_US: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b").expect("invalid regex: us date")
});

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Parse a price, returning the minimum of a range and 0 when no digits exist
pub fn parse_price(text: &str) -> f64 {
    if let Some(range) = parse_price_range(text) {
        return range.min;
    }

    RE_NUMBER
        .find(text)
        .and_then(|m| parse_number(m.as_str()))
        .unwrap_or(0.0)
}

/// Both ends of an advertised price range such as "$1,583 - $1,650"
pub fn parse_price_range(text: &str) -> Option<PriceRange> {
    let caps = RE_PRICE_RANGE.captures(text)?;
    let sides: Vec<f64> = [caps.get(1), caps.get(2)]
        .into_iter()
        .flatten()
        .filter_map(|m| parse_number(m.as_str()))
        .filter(|value| *value > 0.0)
        .collect();

    match sides.as_slice() {
        [a, b] => Some(PriceRange {
            min: a.min(*b),
            max: a.max(*b),
        }),
        [only] => Some(PriceRange {
            min: *only,
            max: *only,
        }),
        _ => None,
    }
}

/// Bedroom count; studios and unmatched input both yield 0
pub fn parse_bedrooms(text: &str) -> u32 {
    if text.to_lowercase().contains("studio") {
        return 0;
    }

    RE_BEDROOMS
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Bathroom count, preferring half baths ("2.5 Bath") over whole numbers
pub fn parse_bathrooms(text: &str) -> f64 {
    RE_BATHS_HALF
        .captures(text)
        .or_else(|| RE_BATHS_WHOLE.captures(text))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0.0)
}

pub fn parse_square_footage(text: &str) -> u32 {
    RE_INTEGER
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}

/// Strip bed/bath/size/price fragments and marketing copy from a plan name
pub fn clean_floor_plan_name(text: &str) -> String {
    let mut cleaned = text.to_string();
    for re in [
        &*RE_MARKETING,
        &*RE_VIEW_UNITS,
        &*RE_PRICE_TOKEN,
        &*RE_BED_TOKEN,
        &*RE_BATH_TOKEN,
        &*RE_SQFT_TOKEN,
        &*RE_SEPARATORS,
    ] {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }

    let name = cleaned
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| matches!(c, '-' | '–' | ',' | ':')))
        .filter(|token| !token.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        "Unknown Plan".to_string()
    } else {
        name
    }
}

// Plan codes like "B2" or "TH3" keep their casing
fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest: String = chars.collect();
    if token.chars().any(|c| c.is_ascii_digit()) {
        format!("{}{}", first.to_uppercase(), rest)
    } else {
        format!("{}{}", first.to_uppercase(), rest.to_lowercase())
    }
}

/// Name-based studio check wins over bathroom-based townhome inference
pub fn determine_unit_type(name: &str, bathrooms: f64) -> UnitType {
    let name = name.to_lowercase();
    if name.contains("studio") {
        UnitType::Studio
    } else if name.contains("townhome") || name.contains("townhouse") || bathrooms > 2.5 {
        UnitType::Townhome
    } else {
        UnitType::Apartment
    }
}

/// Price per square foot, rounded half-up to cents on the exact quotient
pub fn calculate_price_per_sqft(price: f64, square_footage: u32) -> f64 {
    if price <= 0.0 || square_footage == 0 {
        return 0.0;
    }

    // Casts saturate, so absurd prices cannot wrap
    let price_cents = (price * 100.0).round() as u128;
    let sqft = u128::from(square_footage);
    let hundredths = price_cents
        .saturating_mul(2)
        .saturating_add(sqft)
        / (2 * sqft);
    hundredths as f64 / 100.0
}

/// Round half-up to two decimals.
///
/// Values such as 1.005 sit just below the half in binary, so the scaled
/// value is nudged by a few ulps before rounding.
pub fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    (scaled + scaled.abs() * 4.0 * f64::EPSILON).round() / 100.0
}

/// Whether raw availability text says the unit cannot be leased.
///
/// Decided before normalization, which folds "not available" into
/// "Contact for Availability".
pub fn marks_unavailable(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("not available") || lower.contains("unavailable")
}

pub fn standardize_availability(text: &str) -> String {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if lower.is_empty() || lower == "not specified" || lower == "not available" {
        return "Contact for Availability".to_string();
    }
    if lower == "available" || lower.contains("available now") || lower.contains("immediate") {
        return "Available Now".to_string();
    }
    if let Some(date) = find_date(trimmed) {
        return format!("Available {}", date.format("%m/%d/%Y"));
    }

    trimmed.to_string()
}

fn find_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = RE_DATE_ISO.captures(text) {
        let (y, m, d) = (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    let caps = RE_DATE_US.captures(text)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if caps[3].len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Normalize whitespace, drop junk lengths and case-insensitive duplicates
pub fn clean_amenities<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut cleaned = Vec::new();

    for amenity in raw {
        let amenity = amenity.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        let len = amenity.chars().count();
        if !(2..=50).contains(&len) {
            continue;
        }
        if seen.insert(amenity.to_lowercase()) {
            cleaned.push(amenity);
        }
    }

    cleaned
}

pub fn is_plausible_floor_plan(plan: &FloorPlan) -> bool {
    !plan.name.trim().is_empty()
        && !plan.property_name.trim().is_empty()
        && (MIN_PLAUSIBLE_RENT..=MAX_PLAUSIBLE_RENT).contains(&plan.price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_range_returns_minimum() {
        assert_eq!(parse_price("$1,583 - $1,650"), 1583.0);
        assert_eq!(parse_price("1,583-1,650"), 1583.0);
        assert_eq!(
            parse_price_range("$1,650 – $1,583"),
            Some(PriceRange { min: 1583.0, max: 1650.0 })
        );
    }

    #[test]
    fn price_takes_first_number() {
        assert_eq!(parse_price("From $2,100"), 2100.0);
        assert_eq!(parse_price("$1,450.50/mo"), 1450.5);
        assert_eq!(parse_price_range("From $2,100"), None);
    }

    #[test]
    fn missing_price_is_zero() {
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("Contact us"), 0.0);
    }

    #[test]
    fn bedrooms() {
        assert_eq!(parse_bedrooms("Studio Deluxe"), 0);
        assert_eq!(parse_bedrooms("2 Bed / 2 Bath"), 2);
        assert_eq!(parse_bedrooms("3 Bedrooms"), 3);
        assert_eq!(parse_bedrooms("1BR"), 1);
        // A bare number carries no bedroom token
        assert_eq!(parse_bedrooms("2"), 0);
        assert_eq!(parse_bedrooms(""), 0);
    }

    #[test]
    fn bathrooms() {
        assert_eq!(parse_bathrooms("2.5 Bath"), 2.5);
        assert_eq!(parse_bathrooms("3 Bath"), 3.0);
        assert_eq!(parse_bathrooms("no info"), 0.0);
        assert_eq!(parse_bathrooms("2 Bed / 1.5 Baths"), 1.5);
        assert_eq!(parse_bathrooms("2 Bed / 2.0 Bathrooms"), 2.0);
    }

    #[test]
    fn quarter_baths_do_not_split_into_whole_numbers() {
        assert_eq!(parse_bathrooms("1.75 Bath"), 0.0);
        assert_eq!(parse_bathrooms("2 Bed / 2.25 Baths"), 0.0);
        assert_eq!(parse_bathrooms("(1.5 Bath)"), 1.5);
        assert_eq!(determine_unit_type("Plan A3", parse_bathrooms("1.75 Bath")), UnitType::Apartment);
    }

    #[test]
    fn square_footage() {
        assert_eq!(parse_square_footage("850 SqFt"), 850);
        assert_eq!(parse_square_footage("1,050 sq ft"), 1050);
        assert_eq!(parse_square_footage("n/a"), 0);
    }

    #[test]
    fn floor_plan_names_are_cleaned() {
        assert_eq!(clean_floor_plan_name("A2 1 Bed / 1 Bath 850 SqFt $1,450"), "A2");
        assert_eq!(clean_floor_plan_name("the BIRCH from $1,583 view 3 apartments"), "The Birch");
        assert_eq!(clean_floor_plan_name("studio deluxe | 550 sq ft"), "Studio Deluxe");
        assert_eq!(clean_floor_plan_name("  $1,200 - $1,300  "), "Unknown Plan");
        assert_eq!(clean_floor_plan_name(""), "Unknown Plan");
    }

    #[test]
    fn unit_type_inference_order() {
        assert_eq!(determine_unit_type("Studio A", 1.0), UnitType::Studio);
        assert_eq!(determine_unit_type("The Oakwood", 3.0), UnitType::Townhome);
        assert_eq!(determine_unit_type("Plan B2", 2.0), UnitType::Apartment);
        assert_eq!(determine_unit_type("Oak Townhouse", 2.0), UnitType::Townhome);
        assert_eq!(determine_unit_type("Studio Loft", 3.5), UnitType::Studio);
        assert_eq!(determine_unit_type("Plan C", 2.5), UnitType::Apartment);
    }

    #[test]
    fn price_per_sqft() {
        assert_eq!(calculate_price_per_sqft(1500.0, 750), 2.0);
        assert_eq!(calculate_price_per_sqft(1500.0, 0), 0.0);
        assert_eq!(calculate_price_per_sqft(0.0, 750), 0.0);
        assert_eq!(calculate_price_per_sqft(1450.0, 850), 1.71);
        assert_eq!(calculate_price_per_sqft(1000.0, 800), 1.25);
        assert_eq!(calculate_price_per_sqft(2010.0, 2000), 1.01);
        assert_eq!(calculate_price_per_sqft(1015.0, 1000), 1.02);
        assert_eq!(calculate_price_per_sqft(f64::MAX, 1), (u128::MAX / 2) as f64 / 100.0);
    }

    #[test]
    fn cents_round_half_up() {
        assert_eq!(round_cents(1.005), 1.01);
        assert_eq!(round_cents(1.015), 1.02);
        assert_eq!(round_cents(2.004), 2.0);
        assert_eq!(round_cents(1433.333), 1433.33);
    }

    #[test]
    fn availability_is_standardized() {
        assert_eq!(standardize_availability("Available Now!"), "Available Now");
        assert_eq!(standardize_availability("available"), "Available Now");
        assert_eq!(standardize_availability(""), "Contact for Availability");
        assert_eq!(standardize_availability("Not Specified"), "Contact for Availability");
        assert_eq!(standardize_availability("Not available"), "Contact for Availability");
        assert_eq!(standardize_availability("Available 3/5/26"), "Available 03/05/2026");
        assert_eq!(standardize_availability("Move in 2025-11-01"), "Available 11/01/2025");
        assert_eq!(standardize_availability("Waitlist"), "Waitlist");
        assert_eq!(standardize_availability("Available 13/45/2025"), "Available 13/45/2025");
    }

    #[test]
    fn unavailable_is_read_from_raw_text() {
        assert!(marks_unavailable("Not Available"));
        assert!(marks_unavailable("Currently unavailable"));
        assert!(!marks_unavailable("Available Now"));
        assert!(!marks_unavailable(""));
        assert!(!marks_unavailable("Not Specified"));
    }

    #[test]
    fn amenities_are_deduplicated_in_order() {
        let cleaned = clean_amenities(["  Pool ", "pool", "x", "In-unit   Washer/Dryer", "Gym"]);
        assert_eq!(cleaned, vec!["Pool", "In-unit Washer/Dryer", "Gym"]);
    }

    #[test]
    fn zero_is_the_missing_data_marker() {
        // Studios and unparseable input share the same value
        assert_eq!(parse_bedrooms("Studio"), parse_bedrooms("???"));
        assert_eq!(parse_square_footage(""), 0);
        assert_eq!(parse_price("call for pricing"), 0.0);
    }
}
