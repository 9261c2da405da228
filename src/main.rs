use anyhow::Context;
use leasewatch::config::Config;
use leasewatch::pipeline::run_once;
use leasewatch::report::render::{
    render_availability, render_bedroom_analysis, render_comparison, render_daily_report, render_detailed_listing,
    render_errors, render_executive_summary, render_property_summary, render_value_ranking,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leasewatch::init_tracing();

    info!("🏡 LeaseWatch - Apartment Pricing Tracker");
    info!("==========================================");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Using {:?} driver, data in {}",
        config.session.driver,
        config.data_dir.display()
    );

    let report = run_once(&config).await?;
    let plans = &report.floor_plans;

    println!("{}\n", render_errors(&report.scraping_results));
    if plans.is_empty() {
        println!("❌ No valid floor plans found. Check scraping results.");
        return Ok(());
    }

    println!("{}\n", render_daily_report(&report));
    println!("{}\n", render_executive_summary(report.date, plans, &report.scraping_results));
    for summary in &report.property_summaries {
        println!("{}\n", render_property_summary(summary));
    }
    println!("{}\n", render_comparison(report.date, plans));
    println!("{}\n", render_bedroom_analysis(report.date, plans));
    println!("{}\n", render_availability(report.date, plans));
    println!("{}\n", render_value_ranking(plans, Some(1)));
    println!("{}\n", render_value_ranking(plans, Some(2)));
    println!("{}", render_detailed_listing(plans));

    info!("🏡 LeaseWatch execution completed successfully!");
    Ok(())
}
