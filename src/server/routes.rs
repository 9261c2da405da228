use std::convert::Infallible;
use std::sync::Arc;

use serde_json::json;
use tracing::info;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::server::error::ApiError;
use crate::server::handlers::{
    get_data, get_dates, get_history, get_report, health, index, run_scrape, DateQuery, HistoryQuery, ReportQuery,
};
use crate::server::AppState;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status, api_error.message.clone())
    } else if let Some(invalid) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, invalid.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({
            "success": false,
            "message": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let index_route = warp::path::end().and(warp::get()).and_then(index);

    let health_route = warp::path!("health").and(warp::get()).and_then(health);

    let data_route = warp::path!("data")
        .and(warp::get())
        .and(warp::query::<DateQuery>())
        .and(state_filter.clone())
        .and_then(get_data);

    let report_route = warp::path!("report")
        .and(warp::get())
        .and(warp::query::<ReportQuery>())
        .and(state_filter.clone())
        .and_then(get_report);

    let dates_route = warp::path!("dates")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_dates);

    let history_route = warp::path!("history")
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(state_filter.clone())
        .and_then(get_history);

    let scrape_route = warp::path!("scrape")
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(run_scrape);

    info!("All routes configured successfully.");

    index_route
        .or(health_route)
        .or(data_route)
        .or(report_route)
        .or(dates_route)
        .or(history_route)
        .or(scrape_route)
        .recover(handle_rejection)
}
