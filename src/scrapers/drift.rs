use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::models::{FloorPlan, ScrapingResult};
use crate::scrapers::browser::{wait_for_any, PageDriver, SessionSettings};
use crate::scrapers::page::PageModel;
use crate::scrapers::plan_table::PlanCodeTable;
use crate::scrapers::strategy::{run_strategies, CardLayout, Strategy};
use crate::scrapers::traits::{scrape_with_session, SiteScraper};
use crate::scrapers::types::{build_floor_plans, PropertyInfo};

pub const DRIFT_NAME: &str = "Drift Dunwoody";
pub const DRIFT_URL: &str = "https://app.getcobblestone.com/complex/2oRUqV2UXteJYr25ds4syVrY5Ap/floorplans";

const CARD_LAYOUT: CardLayout = CardLayout {
    containers: &[
        ".floor-plan-card",
        "[data-testid*=\"floorplan\"]",
        "[class*=\"floorplan\"]",
        ".unit-card",
        "[class*=\"unit\"]",
        ".apartment-card",
        "[class*=\"apartment\"]",
        ".plan-card",
        "[class*=\"plan\"]",
        ".property-card",
    ],
    name: &[
        ".floor-plan-name",
        ".plan-name",
        ".unit-name",
        ".apartment-name",
        "[data-testid*=\"name\"]",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        ".title",
        "[class*=\"title\"]",
        "[class*=\"name\"]",
    ],
    price: &[".price", ".rent", ".cost", "[class*=\"price\"]", "[class*=\"rent\"]", "[class*=\"cost\"]"],
    bedrooms: &[".bedrooms", ".bed-count", "[class*=\"bed\"]", "[data-testid*=\"bed\"]"],
    bathrooms: &[".bathrooms", ".bath-count", "[class*=\"bath\"]", "[data-testid*=\"bath\"]"],
    square_footage: &[
        ".square-footage",
        ".sqft",
        ".size",
        ".area",
        "[class*=\"sqft\"]",
        "[class*=\"square\"]",
        "[data-testid*=\"sqft\"]",
    ],
    availability: &[".availability", ".status", "[class*=\"available\"]", "[class*=\"status\"]"],
    amenities: &[".amenity", "[class*=\"amenity\"]", ".feature", "[class*=\"feature\"]", "li"],
    name_prefix: "Drift Plan",
};

const LOOSE_CONTAINERS: &[&str] = &["div[class*=\"card\"]", "div[class*=\"listing\"]", "article"];

/// Drift Dunwoody on the Cobblestone leasing app.
///
/// The app renders inconsistently, so after the card layouts it falls back to
/// plan-code tokens in the page text and finally to bare listing sequences.
pub struct DriftScraper {
    property: PropertyInfo,
    settings: SessionSettings,
    plan_table: Arc<PlanCodeTable>,
}

impl DriftScraper {
    pub fn new(settings: SessionSettings, plan_table: Arc<PlanCodeTable>) -> Self {
        Self {
            property: PropertyInfo::new(DRIFT_NAME, DRIFT_URL),
            settings,
            plan_table,
        }
    }
}

#[async_trait]
impl SiteScraper for DriftScraper {
    fn property(&self) -> &PropertyInfo {
        &self.property
    }

    async fn scrape(&self) -> ScrapingResult {
        let property = self.property.clone();
        let settings = self.settings.clone();
        let table = Arc::clone(&self.plan_table);

        scrape_with_session(&self.property, &self.settings, move |driver| {
            extract(driver, &property, &settings, table)
        })
        .await
    }
}

fn strategies(table: Arc<PlanCodeTable>) -> Vec<Strategy> {
    vec![
        Strategy::StructuredCards(CARD_LAYOUT),
        Strategy::LooseCards {
            containers: LOOSE_CONTAINERS,
            name_prefix: "Drift Unit",
        },
        Strategy::PlanCodeBlob { table },
        Strategy::ListingBlob {
            name_prefix: "Drift Unit",
        },
    ]
}

pub fn extract(
    driver: &dyn PageDriver,
    property: &PropertyInfo,
    settings: &SessionSettings,
    table: Arc<PlanCodeTable>,
) -> Result<Vec<FloorPlan>, ScrapeError> {
    driver.navigate(&property.url, settings.nav_timeout)?;
    driver.pause(settings.settle_delay);

    if wait_for_any(driver, CARD_LAYOUT.containers, settings.nav_timeout).is_none() {
        warn!("⚠️ No standard floor plan selectors found, trying text fallbacks...");
    }

    parse_page(&driver.snapshot()?, property, table)
}

pub fn parse_page(
    page: &PageModel,
    property: &PropertyInfo,
    table: Arc<PlanCodeTable>,
) -> Result<Vec<FloorPlan>, ScrapeError> {
    let (label, records) = run_strategies(&strategies(table), page).ok_or_else(|| ScrapeError::NoStructure {
        site: property.name.clone(),
    })?;
    info!("📊 Found {} potential {} floor plans via {}", records.len(), property.name, label);

    Ok(build_floor_plans(records, property, &[]))
}
