use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::models::{FloorPlan, ScrapingResult};
use crate::scrapers::browser::{wait_for_any, PageDriver, SessionSettings};
use crate::scrapers::traits::{scrape_with_session, SiteScraper};
use crate::scrapers::types::{build_floor_plans, PropertyInfo, RawRecord};

pub const COLUMNS_NAME: &str = "The Columns at Lake Ridge";
pub const COLUMNS_URL: &str = "https://www.thecolumnsatlakeridge.com/floorplans";

const REGION_SELECTOR: &str = ".map-region, [data-region], .sitemap-building";
const MARKER_SELECTOR: &str = ".unit-marker, .sitemap-unit, [class*=\"unit-pin\"]";
const POPUP_SELECTOR: &str = ".unit-popup, .unit-details, [role=\"dialog\"]";
const CLOSE_SELECTOR: &str = ".unit-popup .close, .unit-details .close, [role=\"dialog\"] [aria-label=\"Close\"]";

const POPUP_DELAY: Duration = Duration::from_millis(750);

static RE_FIELD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(floor\s*plan|plan|unit|price|rent|bedrooms|beds?|bathrooms|baths?|sq\.?\s*ft\.?|square\s+feet|size|availability|available)\s*:",
    )
    .expect("invalid regex: field label")
});

/// The Columns at Lake Ridge, an interactive site map.
///
/// Units are only visible one popup at a time: open a region, open each
/// marker, read the labeled fields, close the popup.
pub struct ColumnsScraper {
    property: PropertyInfo,
    settings: SessionSettings,
}

impl ColumnsScraper {
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_url(settings, COLUMNS_URL)
    }

    pub fn with_url(settings: SessionSettings, url: &str) -> Self {
        Self {
            property: PropertyInfo::new(COLUMNS_NAME, url),
            settings,
        }
    }
}

#[async_trait]
impl SiteScraper for ColumnsScraper {
    fn property(&self) -> &PropertyInfo {
        &self.property
    }

    async fn scrape(&self) -> ScrapingResult {
        let property = self.property.clone();
        let settings = self.settings.clone();

        scrape_with_session(&self.property, &self.settings, move |driver| {
            extract(driver, &property, &settings)
        })
        .await
    }
}

pub fn extract(
    driver: &dyn PageDriver,
    property: &PropertyInfo,
    settings: &SessionSettings,
) -> Result<Vec<FloorPlan>, ScrapeError> {
    driver.navigate(&property.url, settings.nav_timeout)?;
    driver.pause(settings.settle_delay);
    wait_for_any(driver, &[REGION_SELECTOR, MARKER_SELECTOR], settings.nav_timeout);

    let regions = driver.count(REGION_SELECTOR)?;
    debug!("Found {} map regions", regions);

    let mut records = Vec::new();
    let mut markers_seen = 0;
    let mut last_error = None;

    // A map without regions shows its markers directly
    for region in 0..regions.max(1) {
        if regions > 0 {
            if let Err(e) = driver.click(REGION_SELECTOR, region) {
                warn!("⚠️ Could not open map region {}: {}", region + 1, e);
                last_error = Some(e);
                continue;
            }
            driver.pause(POPUP_DELAY);
        }

        let markers = driver.count(MARKER_SELECTOR)?;
        markers_seen += markers;

        for marker in 0..markers {
            let fallback = format!("Columns Unit {}", records.len() + 1);
            match read_marker(driver, marker, &fallback) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!("Marker {} had no unit details", marker + 1),
                Err(e) => {
                    warn!("⚠️ Skipping marker {} in region {}: {}", marker + 1, region + 1, e);
                    last_error = Some(e);
                }
            }
        }
    }

    if records.is_empty() {
        if let Some(e) = last_error {
            return Err(e);
        }
        if markers_seen == 0 {
            return Err(ScrapeError::NoStructure {
                site: property.name.clone(),
            });
        }
    }

    info!("Read {} unit popups from {} markers", records.len(), markers_seen);
    Ok(build_floor_plans(records, property, &[]))
}

fn read_marker(driver: &dyn PageDriver, index: usize, fallback_name: &str) -> Result<Option<RawRecord>, ScrapeError> {
    driver.click(MARKER_SELECTOR, index)?;
    driver.pause(POPUP_DELAY);

    let popup = driver.text(POPUP_SELECTOR)?;
    let record = parse_labeled_fields(&popup, fallback_name);

    if let Err(e) = driver.click(CLOSE_SELECTOR, 0) {
        debug!("Popup close failed: {}", e);
    }

    Ok(record.has_signal().then_some(record))
}

/// Read "Label: value" pairs from popup text, on one line or many
pub fn parse_labeled_fields(text: &str, fallback_name: &str) -> RawRecord {
    let labels: Vec<_> = RE_FIELD_LABEL.captures_iter(text).collect();
    let mut record = RawRecord {
        name: fallback_name.to_string(),
        ..Default::default()
    };

    for (idx, caps) in labels.iter().enumerate() {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = labels
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        let value = text[whole.end()..end].split_whitespace().collect::<Vec<_>>().join(" ");
        if value.is_empty() {
            continue;
        }

        let label = label.as_str().to_lowercase();
        match label.as_str() {
            l if l.starts_with("floor") || l == "plan" || l == "unit" => record.name = value,
            "price" | "rent" => record.price_text = value,
            l if l.starts_with("bed") => record.bedroom_text = with_unit(value, "bed"),
            l if l.starts_with("bath") => record.bathroom_text = with_unit(value, "bath"),
            l if l.starts_with("avail") => record.availability_text = value,
            _ => record.sqft_text = with_unit(value, "sq ft"),
        }
    }

    record
}

fn with_unit(value: String, unit: &str) -> String {
    if value.replace(',', "").parse::<f64>().is_ok() {
        format!("{} {}", value, unit)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[test]
    fn parses_multi_line_popup() {
        let popup = "Unit: 1204\nFloor Plan: B1\nPrice: $1,795\nBeds: 2\nBaths: 2\nSq. Ft.: 1,080\nAvailable: 2024-04-01";
        let record = parse_labeled_fields(popup, "Columns Unit 1");
        // The later label wins for the name
        assert_eq!(record.name, "B1");
        assert_eq!(record.price_text, "$1,795");
        assert_eq!(record.bedroom_text, "2 bed");
        assert_eq!(record.bathroom_text, "2 bath");
        assert_eq!(record.sqft_text, "1,080 sq ft");
        assert_eq!(record.availability_text, "2024-04-01");
    }

    #[test]
    fn parses_single_line_popup_and_keeps_fallback_name() {
        let record = parse_labeled_fields("Rent: $1,350 Bedrooms: Studio Size: 540 sq ft", "Columns Unit 3");
        assert_eq!(record.name, "Columns Unit 3");
        assert_eq!(record.price_text, "$1,350");
        assert_eq!(record.bedroom_text, "Studio");
        assert_eq!(record.sqft_text, "540 sq ft");
    }

    /// Map with `regions` regions of `per_region` markers; popups come from `popups`
    struct FakeMap {
        regions: usize,
        per_region: usize,
        popups: Vec<Option<&'static str>>,
        opened: Cell<Option<usize>>,
        region: Cell<usize>,
        closes: RefCell<usize>,
    }

    impl FakeMap {
        fn new(regions: usize, per_region: usize, popups: Vec<Option<&'static str>>) -> Self {
            Self {
                regions,
                per_region,
                popups,
                opened: Cell::new(None),
                region: Cell::new(0),
                closes: RefCell::new(0),
            }
        }
    }

    impl PageDriver for FakeMap {
        fn navigate(&self, _url: &str, _timeout: Duration) -> Result<(), ScrapeError> {
            Ok(())
        }

        fn content(&self) -> Result<String, ScrapeError> {
            Ok(String::new())
        }

        fn count(&self, selector: &str) -> Result<usize, ScrapeError> {
            Ok(match selector {
                REGION_SELECTOR => self.regions,
                MARKER_SELECTOR => self.per_region,
                _ => 0,
            })
        }

        fn click(&self, selector: &str, index: usize) -> Result<(), ScrapeError> {
            match selector {
                REGION_SELECTOR => self.region.set(index),
                MARKER_SELECTOR => self.opened.set(Some(self.region.get() * self.per_region + index)),
                CLOSE_SELECTOR => *self.closes.borrow_mut() += 1,
                _ => {}
            }
            Ok(())
        }

        fn text(&self, selector: &str) -> Result<String, ScrapeError> {
            let popup = self
                .opened
                .get()
                .and_then(|idx| self.popups.get(idx).copied().flatten());
            popup.map(str::to_string).ok_or_else(|| ScrapeError::Interaction {
                selector: selector.to_string(),
                reason: "popup did not open".to_string(),
            })
        }

        fn pause(&self, _duration: Duration) {}
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            nav_timeout: Duration::ZERO,
            settle_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn walks_every_region_and_skips_broken_markers() {
        let map = FakeMap::new(
            2,
            2,
            vec![
                Some("Plan: A1\nPrice: $1,400\nBeds: 1\nBaths: 1\nSq Ft: 720"),
                None,
                Some("Plan: B2\nPrice: $1,900\nBeds: 2\nBaths: 2\nSq Ft: 1,150"),
                Some("Plan: C1\nPrice: $2,350\nBeds: 3\nBaths: 2\nSq Ft: 1,400"),
            ],
        );
        let property = PropertyInfo::new(COLUMNS_NAME, COLUMNS_URL);

        let plans = extract(&map, &property, &settings()).unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "B2", "C1"]);
        assert_eq!(plans[1].square_footage, 1150);
        assert_eq!(*map.closes.borrow(), 3);
    }

    #[test]
    fn map_without_markers_is_a_structure_error() {
        let map = FakeMap::new(0, 0, vec![]);
        let property = PropertyInfo::new(COLUMNS_NAME, COLUMNS_URL);
        let err = extract(&map, &property, &settings()).unwrap_err();
        assert!(matches!(err, ScrapeError::NoStructure { .. }));
    }

    #[test]
    fn every_marker_failing_surfaces_the_error() {
        let map = FakeMap::new(0, 2, vec![None, None]);
        let property = PropertyInfo::new(COLUMNS_NAME, COLUMNS_URL);
        let err = extract(&map, &property, &settings()).unwrap_err();
        assert!(matches!(err, ScrapeError::Interaction { .. }));
    }
}
