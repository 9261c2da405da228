use async_trait::async_trait;
use tracing::{error, info};

use crate::error::ScrapeError;
use crate::models::{FloorPlan, ScrapingResult};
use crate::scrapers::browser::{open_session, PageDriver, SessionSettings};
use crate::scrapers::types::PropertyInfo;

/// Common trait for all property scrapers.
///
/// `scrape` never fails: errors become an empty `ScrapingResult` carrying the
/// error text.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    fn property(&self) -> &PropertyInfo;

    async fn scrape(&self) -> ScrapingResult;

    fn source_name(&self) -> &str {
        &self.property().name
    }
}

/// Run a blocking extraction inside a session owned by this call.
///
/// The session is opened and dropped on the blocking thread, so it is released
/// on success, on error and on panic.
pub async fn scrape_with_session<F>(property: &PropertyInfo, settings: &SessionSettings, extract: F) -> ScrapingResult
where
    F: FnOnce(&dyn PageDriver) -> Result<Vec<FloorPlan>, ScrapeError> + Send + 'static,
{
    info!("🏢 Starting scrape for {}...", property.name);

    let label = property.name.clone();
    let settings = settings.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let session = open_session(&settings, &label)?;
        extract(session.as_ref())
    })
    .await
    .map_err(ScrapeError::from)
    .and_then(|result| result);

    into_result(property, outcome)
}

pub fn into_result(property: &PropertyInfo, outcome: Result<Vec<FloorPlan>, ScrapeError>) -> ScrapingResult {
    match outcome {
        Ok(floor_plans) => {
            info!("✅ {} scraping completed: {} floor plans found", property.name, floor_plans.len());
            ScrapingResult::succeeded(&property.name, floor_plans)
        }
        Err(e) => {
            error!("❌ {} scraping failed: {}", property.name, e);
            ScrapingResult::failed(&property.name, e)
        }
    }
}

/// Scrape each site in turn, fully awaiting one before starting the next
pub async fn scrape_all(scrapers: &[Box<dyn SiteScraper>]) -> (Vec<FloorPlan>, Vec<ScrapingResult>) {
    let mut floor_plans = Vec::new();
    let mut results = Vec::with_capacity(scrapers.len());

    for scraper in scrapers {
        let result = scraper.scrape().await;
        floor_plans.extend(result.floor_plans.iter().cloned());
        results.push(result);
    }

    (floor_plans, results)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        property: PropertyInfo,
        outcome: fn() -> Result<Vec<FloorPlan>, ScrapeError>,
    }

    #[async_trait]
    impl SiteScraper for Fixed {
        fn property(&self) -> &PropertyInfo {
            &self.property
        }

        async fn scrape(&self) -> ScrapingResult {
            into_result(&self.property, (self.outcome)())
        }
    }

    fn plan(name: &str) -> FloorPlan {
        FloorPlan {
            name: name.to_string(),
            price: 1500.0,
            price_range: None,
            bedrooms: 1,
            bathrooms: 1.0,
            square_footage: 750,
            price_per_sq_ft: 2.0,
            amenities: vec![],
            availability: "Available Now".to_string(),
            available: true,
            property_name: "Good".to_string(),
            property_url: String::new(),
            unit_type: Default::default(),
        }
    }

    #[tokio::test]
    async fn one_failing_site_does_not_stop_the_others() {
        let scrapers: Vec<Box<dyn SiteScraper>> = vec![
            Box::new(Fixed {
                property: PropertyInfo::new("Broken", "https://broken.example"),
                outcome: || {
                    Err(ScrapeError::NoStructure {
                        site: "Broken".into(),
                    })
                },
            }),
            Box::new(Fixed {
                property: PropertyInfo::new("Good", "https://good.example"),
                outcome: || Ok(vec![plan("A1"), plan("B1")]),
            }),
        ];

        let (floor_plans, results) = scrape_all(&scrapers).await;
        assert_eq!(floor_plans.len(), 2);
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].floor_plans.is_empty());
        assert!(results[0].errors[0].contains("no floor plan structure"));
        assert!(results[1].success);
        assert_eq!(scrapers[1].source_name(), "Good");
    }
}
