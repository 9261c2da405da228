use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::models::{FloorPlan, ScrapingResult};
use crate::scrapers::browser::{wait_for_any, PageDriver, SessionSettings};
use crate::scrapers::page::{element_text, PageModel};
use crate::scrapers::strategy::{run_strategies, CardLayout, Strategy};
use crate::scrapers::traits::{scrape_with_session, SiteScraper};
use crate::scrapers::types::{build_floor_plans, PropertyInfo};

pub const CAMDEN_NAME: &str = "Camden Dunwoody";
pub const CAMDEN_PROPERTY_URL: &str = "https://www.camdenliving.com/apartments/dunwoody-ga/camden-dunwoody";
pub const CAMDEN_LISTING_URL: &str =
    "https://www.camdenliving.com/apartments/dunwoody-ga/camden-dunwoody/available-apartments";

const AMENITIES_LINK: &str = "#community-navigation-amenities-camden-dunwoody, a[href=\"#amenities\"]";
const COMMUNITY_AMENITIES: &[&str] = &["#amenities li", "[id*=\"amenities\"] li", ".community-amenities li"];

const CARD_LAYOUT: CardLayout = CardLayout {
    containers: &[
        ".floorplan-card",
        "[class*=\"floorplan-card\"]",
        "[class*=\"floorplan\"]",
        ".unit-card",
        ".apartment-card",
    ],
    name: &[".floorplan-name", ".unit-name", ".plan-name", "h3", "h4", ".title", "[class*=\"name\"]"],
    price: &[".price", "[class*=\"price\"]", ".rent", "[class*=\"rent\"]", ".cost"],
    bedrooms: &[".bedrooms", ".bed-count", "[class*=\"bed\"]"],
    bathrooms: &[".bathrooms", ".bath-count", "[class*=\"bath\"]"],
    square_footage: &["[class*=\"sqft\"]", "[class*=\"square\"]", ".size", ".area"],
    availability: &[".availability", "[class*=\"available\"]", ".status", "[class*=\"status\"]"],
    amenities: &[".amenity", "[class*=\"amenity\"]", ".feature", "[class*=\"feature\"]", "li"],
    name_prefix: "Camden Plan",
};

const LOOSE_CONTAINERS: &[&str] = &[
    "div[class*=\"unit\"]",
    "div[class*=\"plan\"]",
    "div[class*=\"apartment\"]",
    ".property-card",
    ".listing-card",
];

/// Camden Dunwoody, structured floor plan cards
pub struct CamdenScraper {
    property: PropertyInfo,
    listing_url: String,
    settings: SessionSettings,
}

impl CamdenScraper {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            property: PropertyInfo::new(CAMDEN_NAME, CAMDEN_PROPERTY_URL),
            listing_url: CAMDEN_LISTING_URL.to_string(),
            settings,
        }
    }
}

#[async_trait]
impl SiteScraper for CamdenScraper {
    fn property(&self) -> &PropertyInfo {
        &self.property
    }

    async fn scrape(&self) -> ScrapingResult {
        let property = self.property.clone();
        let listing_url = self.listing_url.clone();
        let settings = self.settings.clone();

        scrape_with_session(&self.property, &self.settings, move |driver| {
            extract(driver, &property, &listing_url, &settings)
        })
        .await
    }
}

fn strategies() -> Vec<Strategy> {
    vec![
        Strategy::StructuredCards(CARD_LAYOUT),
        Strategy::LooseCards {
            containers: LOOSE_CONTAINERS,
            name_prefix: "Camden Unit",
        },
    ]
}

pub fn extract(
    driver: &dyn PageDriver,
    property: &PropertyInfo,
    listing_url: &str,
    settings: &SessionSettings,
) -> Result<Vec<FloorPlan>, ScrapeError> {
    driver.navigate(listing_url, settings.nav_timeout)?;
    driver.pause(settings.settle_delay);

    if wait_for_any(driver, CARD_LAYOUT.containers, settings.nav_timeout).is_none() {
        debug!("No floor plan cards appeared for {}", property.name);
    }

    // The amenities tab is an in-page anchor; the cards stay in the DOM after clicking it
    if driver.count(AMENITIES_LINK)? > 0 {
        match driver.click(AMENITIES_LINK, 0) {
            Ok(()) => driver.pause(Duration::from_secs(2)),
            Err(e) => warn!("Could not open community amenities: {}", e),
        }
    }

    parse_page(&driver.snapshot()?, property)
}

/// Floor plans from a rendered listing page
pub fn parse_page(page: &PageModel, property: &PropertyInfo) -> Result<Vec<FloorPlan>, ScrapeError> {
    let community = community_amenities(page);
    debug!("Found {} community amenities", community.len());

    let (label, records) = run_strategies(&strategies(), page).ok_or_else(|| ScrapeError::NoStructure {
        site: property.name.clone(),
    })?;
    info!("Extracted {} raw floor plans via {}", records.len(), label);

    Ok(build_floor_plans(records, property, &community))
}

pub fn community_amenities(page: &PageModel) -> Vec<String> {
    COMMUNITY_AMENITIES
        .iter()
        .flat_map(|css| page.query(css))
        .map(element_text)
        .filter(|text| {
            let len = text.chars().count();
            len > 2 && len < 100 && !text.eq_ignore_ascii_case("amenities")
        })
        .collect()
}
