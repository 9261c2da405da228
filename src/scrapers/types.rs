use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::FloorPlan;
use crate::parsing::{
    calculate_price_per_sqft, clean_amenities, clean_floor_plan_name, determine_unit_type,
    is_plausible_floor_plan, marks_unavailable, parse_bathrooms, parse_bedrooms, parse_price, parse_price_range,
    parse_square_footage, standardize_availability,
};
use crate::scrapers::plan_table::PlanDefaults;

static RE_PRICE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s*\d[\d,]*(?:\.\d+)?(?:\s*[-–]\s*\$?\s*\d[\d,]*(?:\.\d+)?)?")
        .expect("invalid regex: price fragment")
});

static RE_BED_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+\s*-?\s*(?:bedrooms?|beds?|bd|br)\b|\bstudio\b")
        .expect("invalid regex: bed fragment")
});

static RE_BATH_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*-?\s*(?:bathrooms?|baths?|ba)\b")
        .expect("invalid regex: bath fragment")
});

static RE_SQFT_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d[\d,]*\s*(?:sq\.?\s*ft\.?|sqft|square\s+feet|sf)\b")
        .expect("invalid regex: sqft fragment")
});

/// Longest text treated as a plan name when a record comes from free text
const MAX_NAME_LEN: usize = 40;

/// Property a scraper reports floor plans for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    pub url: String,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// File-name friendly form, e.g. "camden-dunwoody"
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Unparsed text fragments for one floor plan, as located on the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub name: String,
    pub price_text: String,
    pub bedroom_text: String,
    pub bathroom_text: String,
    pub sqft_text: String,
    pub availability_text: String,
    pub amenities: Vec<String>,
    /// Plan-code defaults used for fields the page did not show
    pub defaults: Option<PlanDefaults>,
}

impl RawRecord {
    /// Locate every field inside one undifferentiated piece of text
    pub fn from_text(text: &str, fallback_name: &str) -> Self {
        let name = clean_floor_plan_name(text);
        let name = if name == "Unknown Plan" || name.chars().count() > MAX_NAME_LEN {
            fallback_name.to_string()
        } else {
            name
        };

        Self {
            name,
            price_text: first_fragment(&RE_PRICE_FRAGMENT, text),
            bedroom_text: first_fragment(&RE_BED_FRAGMENT, text),
            bathroom_text: first_fragment(&RE_BATH_FRAGMENT, text),
            sqft_text: first_fragment(&RE_SQFT_FRAGMENT, text),
            availability_text: String::new(),
            ..Default::default()
        }
    }

    pub fn has_signal(&self) -> bool {
        !self.price_text.is_empty() || !self.bedroom_text.is_empty() || !self.sqft_text.is_empty()
    }

    /// Parse every field; `None` when neither a price nor a size was found
    pub fn into_floor_plan(self, property: &PropertyInfo, community_amenities: &[String]) -> Option<FloorPlan> {
        let price = parse_price(&self.price_text);
        let price_range = parse_price_range(&self.price_text).filter(|range| range.min < range.max);

        let bedrooms = match self.defaults {
            Some(d) if self.bedroom_text.trim().is_empty() => d.bedrooms,
            _ => parse_bedrooms(&self.bedroom_text),
        };
        let bathrooms = match self.defaults {
            Some(d) if self.bathroom_text.trim().is_empty() => d.bathrooms,
            _ => parse_bathrooms(&self.bathroom_text),
        };
        let square_footage = match self.defaults {
            Some(d) if self.sqft_text.trim().is_empty() => d.square_footage,
            _ => parse_square_footage(&self.sqft_text),
        };

        if price <= 0.0 && square_footage == 0 {
            return None;
        }

        let amenities = clean_amenities(community_amenities.iter().chain(self.amenities.iter()));

        Some(FloorPlan {
            unit_type: determine_unit_type(&self.name, bathrooms),
            name: self.name,
            price,
            price_range,
            bedrooms,
            bathrooms,
            square_footage,
            price_per_sq_ft: calculate_price_per_sqft(price, square_footage),
            amenities,
            available: !marks_unavailable(&self.availability_text),
            availability: standardize_availability(&self.availability_text),
            property_name: property.name.clone(),
            property_url: property.url.clone(),
        })
    }
}

/// Parse raw records and keep the plausible ones
pub fn build_floor_plans(records: Vec<RawRecord>, property: &PropertyInfo, community_amenities: &[String]) -> Vec<FloorPlan> {
    let mut floor_plans = Vec::with_capacity(records.len());

    for record in records {
        let name = record.name.clone();
        match record.into_floor_plan(property, community_amenities) {
            Some(plan) if is_plausible_floor_plan(&plan) => {
                debug!("✅ Added floor plan: {} - ${}", plan.name, plan.price);
                floor_plans.push(plan);
            }
            Some(plan) => debug!("Skipped implausible floor plan: {} (${})", plan.name, plan.price),
            None => debug!("Skipped floor plan without price or size: {}", name),
        }
    }

    info!("Processed {} valid floor plans for {}", floor_plans.len(), property.name);
    floor_plans
}

fn first_fragment(re: &Regex, text: &str) -> String {
    re.find(text).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Field fragment from a probed element, falling back to the card's full text
pub fn fragment_or_fallback(probed: Option<String>, full_text: &str, kind: FieldKind) -> String {
    let re = kind.regex();
    match probed {
        Some(text) if re.is_match(&text) => first_fragment(re, &text),
        Some(text) if kind.accepts_bare_number() && text.trim().parse::<u32>().is_ok() => {
            format!("{} {}", text.trim(), kind.unit())
        }
        probed => {
            let found = first_fragment(re, full_text);
            if found.is_empty() {
                probed.unwrap_or_default()
            } else {
                found
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Price,
    Bedrooms,
    Bathrooms,
    SquareFootage,
}

impl FieldKind {
    fn regex(&self) -> &'static Regex {
        match self {
            FieldKind::Price => &RE_PRICE_FRAGMENT,
            FieldKind::Bedrooms => &RE_BED_FRAGMENT,
            FieldKind::Bathrooms => &RE_BATH_FRAGMENT,
            FieldKind::SquareFootage => &RE_SQFT_FRAGMENT,
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            FieldKind::Price => "",
            FieldKind::Bedrooms => "bed",
            FieldKind::Bathrooms => "bath",
            FieldKind::SquareFootage => "sq ft",
        }
    }

    fn accepts_bare_number(&self) -> bool {
        !matches!(self, FieldKind::Price)
    }
}
