use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use warp::reply::Json;
use warp::Rejection;

use crate::pipeline::run_once;
use crate::report::render::{render, ReportKind};
use crate::server::error::ApiError;
use crate::server::AppState;

pub const DEFAULT_HISTORY_DAYS: usize = 30;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub property: Option<String>,
    pub days: Option<usize>,
}

fn reject(e: impl Into<ApiError>) -> Rejection {
    warp::reject::custom(e.into())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn index() -> Result<Json, Rejection> {
    Ok(warp::reply::json(&json!({
        "service": "LeaseWatch",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Automated Apartment Pricing Tracker",
        "endpoints": {
            "GET /health": "Health check",
            "POST /scrape": "Trigger apartment data scraping",
            "GET /data": "Get latest scraped data (optional ?date=YYYY-MM-DD)",
            "GET /report": "Get reports (optional ?type=daily|comparison|bedroom|availability&date=YYYY-MM-DD)",
            "GET /dates": "Get available data dates",
            "GET /history": "Get property history (required ?property=name&days=30)"
        }
    })))
}

pub async fn health() -> Result<Json, Rejection> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "service": "LeaseWatch",
        "timestamp": Utc::now(),
    })))
}

pub async fn get_data(query: DateQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let date = query.date.unwrap_or_else(today);
    let floor_plans = state.store.load_floor_plans(date).await.map_err(reject)?;

    if floor_plans.is_empty() {
        return Err(reject(ApiError::not_found(format!("No data found for date: {}", date))));
    }

    info!("Serving {} floor plans for {}", floor_plans.len(), date);
    Ok(warp::reply::json(&json!({
        "success": true,
        "message": format!("Retrieved {} floor plans", floor_plans.len()),
        "date": date,
        "data": floor_plans,
    })))
}

pub async fn get_report(query: ReportQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let kind = query
        .kind
        .as_deref()
        .unwrap_or("daily")
        .parse::<ReportKind>()
        .map_err(|message| reject(ApiError::bad_request(message)))?;
    let date = query.date.unwrap_or_else(today);

    let floor_plans = state.store.load_floor_plans(date).await.map_err(reject)?;
    if floor_plans.is_empty() {
        return Err(reject(ApiError::not_found(format!("No data found for date: {}", date))));
    }

    let results = state
        .store
        .load_report(date)
        .await
        .map_err(reject)?
        .map(|report| report.scraping_results)
        .unwrap_or_default();

    Ok(warp::reply::json(&json!({
        "success": true,
        "report_type": kind,
        "date": date,
        "content": render(kind, date, &floor_plans, &results),
    })))
}

pub async fn get_dates(state: Arc<AppState>) -> Result<Json, Rejection> {
    let dates = state.store.available_dates().await.map_err(reject)?;
    Ok(warp::reply::json(&json!({
        "success": true,
        "message": format!("Found {} available dates", dates.len()),
        "dates": dates,
    })))
}

pub async fn get_history(query: HistoryQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let property = query
        .property
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| reject(ApiError::bad_request("Property name is required")))?;
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);

    let history = state.store.property_history(&property, days).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({
        "success": true,
        "property": property,
        "days": days,
        "history": history,
    })))
}

pub async fn run_scrape(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("🌐 HTTP request received to start scraping...");

    match run_once(&state.config).await {
        Ok(report) => Ok(warp::reply::json(&json!({
            "success": true,
            "message": "Scraping completed successfully",
            "timestamp": Utc::now(),
            "floor_plans": report.floor_plans.len(),
            "scraping_results": report.scraping_results.len(),
        }))),
        Err(e) => {
            error!("❌ Scraping failed: {:#}", e);
            Err(reject(ApiError::internal(format!("{:#}", e))))
        }
    }
}
