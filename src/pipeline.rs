use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{DailyReport, FloorPlan};
use crate::parsing::is_plausible_floor_plan;
use crate::report::aggregate::build_daily_report;
use crate::scrapers::types::slugify;
use crate::scrapers::{scrape_all, CamdenScraper, ColumnsScraper, DriftScraper, SiteScraper};
use crate::storage::JsonStore;

/// The monitored sites, in scrape order
pub fn build_scrapers(config: &Config) -> Result<Vec<Box<dyn SiteScraper>>> {
    let plan_table = config.load_plan_table()?;
    info!("Loaded plan-code table with {} entries", plan_table.len());

    Ok(vec![
        Box::new(CamdenScraper::new(config.session.clone())),
        Box::new(ColumnsScraper::with_url(config.session.clone(), &config.columns_url)),
        Box::new(DriftScraper::new(config.session.clone(), plan_table)),
    ])
}

/// Scrape, validate, aggregate and persist one day.
///
/// Site failures end up in the report's scraping results; storage failures
/// abort the cycle.
pub async fn run_cycle(
    scrapers: &[Box<dyn SiteScraper>],
    store: &JsonStore,
    today: NaiveDate,
    retention_days: i64,
) -> Result<DailyReport> {
    info!("🏡 LeaseWatch - Starting apartment pricing tracker for {}", today);

    info!("Phase 1: Data Collection");
    let (floor_plans, results) = scrape_all(scrapers).await;

    for result in &results {
        store
            .save_scraping_result(&slugify(&result.source), today, result)
            .await
            .with_context(|| format!("Failed to save raw result for {}", result.source))?;
    }

    info!("Phase 2: Data Processing & Validation");
    let valid = validate(floor_plans);

    info!("Phase 3: Report Generation");
    let report = build_daily_report(today, valid, results);
    if report.floor_plans.is_empty() {
        error!("❌ No valid floor plans found. Check scraping results.");
    } else {
        store.save_daily(&report).await.context("Failed to save daily report")?;
    }

    info!("Phase 4: Cleanup & Summary");
    if let Err(e) = store.cleanup_old_data(today, retention_days).await {
        warn!("⚠️ Cleanup of old data failed: {}", e);
    }

    let succeeded = report.scraping_results.iter().filter(|r| r.success).count();
    info!("📊 Total Floor Plans Found: {}", report.floor_plans.len());
    info!("✅ Successful Scrapes: {}/{}", succeeded, report.scraping_results.len());
    for summary in &report.property_summaries {
        info!("   • {}: {} units", summary.property_name, summary.total_floor_plans);
    }

    Ok(report)
}

/// One cycle with the configured sites and data directory, dated today
pub async fn run_once(config: &Config) -> Result<DailyReport> {
    let scrapers = build_scrapers(config)?;
    let store = JsonStore::new(&config.data_dir);
    run_cycle(&scrapers, &store, Local::now().date_naive(), config.retention_days).await
}

fn validate(floor_plans: Vec<FloorPlan>) -> Vec<FloorPlan> {
    let total = floor_plans.len();
    let valid: Vec<FloorPlan> = floor_plans
        .into_iter()
        .filter(|plan| {
            let keep = is_plausible_floor_plan(plan);
            if !keep {
                warn!("❌ Removed invalid floor plan: {}", plan.name);
            }
            keep
        })
        .collect();

    info!("✅ Data validation complete: {}/{} floor plans valid", valid.len(), total);
    valid
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{ScrapingResult, UnitType};
    use crate::scrapers::types::PropertyInfo;

    struct Canned {
        property: PropertyInfo,
        plans: Option<Vec<FloorPlan>>,
    }

    #[async_trait]
    impl SiteScraper for Canned {
        fn property(&self) -> &PropertyInfo {
            &self.property
        }

        async fn scrape(&self) -> ScrapingResult {
            match &self.plans {
                Some(plans) => ScrapingResult::succeeded(&self.property.name, plans.clone()),
                None => ScrapingResult::failed(&self.property.name, "navigation timed out"),
            }
        }
    }

    fn plan(property: &str, name: &str, price: f64) -> FloorPlan {
        FloorPlan {
            name: name.to_string(),
            price,
            price_range: None,
            bedrooms: 1,
            bathrooms: 1.0,
            square_footage: 700,
            price_per_sq_ft: crate::parsing::calculate_price_per_sqft(price, 700),
            amenities: vec![],
            availability: "Available Now".to_string(),
            available: true,
            property_name: property.to_string(),
            property_url: String::new(),
            unit_type: UnitType::Apartment,
        }
    }

    fn scratch_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "leasewatch_pipeline_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[tokio::test]
    async fn cycle_persists_valid_plans_and_records_failures() {
        let dir = scratch_dir();
        let store = JsonStore::new(&dir);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let scrapers: Vec<Box<dyn SiteScraper>> = vec![
            Box::new(Canned {
                property: PropertyInfo::new("Camden Dunwoody", "https://camden.example"),
                plans: Some(vec![plan("Camden Dunwoody", "A1", 1600.0), plan("Camden Dunwoody", "Garage", 95.0)]),
            }),
            Box::new(Canned {
                property: PropertyInfo::new("The Columns at Lake Ridge", "https://columns.example"),
                plans: None,
            }),
        ];

        let report = run_cycle(&scrapers, &store, today, 90).await.unwrap();

        assert_eq!(report.floor_plans.len(), 1);
        assert_eq!(report.scraping_results.len(), 2);
        assert!(!report.scraping_results[1].success);
        assert_eq!(store.load_latest().await.unwrap(), Some(report.clone()));
        assert!(dir.join("raw/the-columns-at-lake-ridge-2024-03-01.json").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn empty_cycle_writes_no_report() {
        let dir = scratch_dir();
        let store = JsonStore::new(&dir);
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let scrapers: Vec<Box<dyn SiteScraper>> = vec![Box::new(Canned {
            property: PropertyInfo::new("Drift Dunwoody", "https://drift.example"),
            plans: None,
        })];

        let report = run_cycle(&scrapers, &store, today, 90).await.unwrap();
        assert!(report.floor_plans.is_empty());
        assert_eq!(report.market.cheapest, None);
        assert_eq!(store.load_latest().await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }
}
