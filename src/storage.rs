//! JSON snapshots on disk.
//!
//! Layout under the data directory:
//! `latest_report.json`, `reports/<date>_report.json`,
//! `daily/<date>_floor_plans.json` and `raw/<site>-<date>.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::StorageError;
use crate::models::{DailyReport, FloorPlan, HistoryPoint, ScrapingResult};
use crate::report::aggregate::history_point;

/// Raw per-site results are kept for a shorter window than reports
pub const RAW_RETENTION_DAYS: i64 = 30;

/// Longest accepted retention window, about a century
pub const MAX_RETENTION_DAYS: i64 = 36_500;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join("daily").join(format!("{}_floor_plans.json", date.format(DATE_FORMAT)))
    }

    fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join("reports").join(format!("{}_report.json", date.format(DATE_FORMAT)))
    }

    fn latest_path(&self) -> PathBuf {
        self.root.join("latest_report.json")
    }

    fn raw_path(&self, site_slug: &str, date: NaiveDate) -> PathBuf {
        self.root.join("raw").join(format!("{}-{}.json", site_slug, date.format(DATE_FORMAT)))
    }

    /// Write the day's floor plans, the dated report and the latest report
    pub async fn save_daily(&self, report: &DailyReport) -> Result<(), StorageError> {
        let daily = self.daily_path(report.date);
        write_json(&daily, &report.floor_plans).await?;
        info!("💾 Saved {} floor plans to {}", report.floor_plans.len(), daily.display());

        let dated = self.report_path(report.date);
        write_json(&dated, report).await?;
        write_json(&self.latest_path(), report).await?;
        info!("💾 Saved daily report to {}", dated.display());

        Ok(())
    }

    pub async fn save_scraping_result(
        &self,
        site_slug: &str,
        date: NaiveDate,
        result: &ScrapingResult,
    ) -> Result<PathBuf, StorageError> {
        let path = self.raw_path(site_slug, date);
        write_json(&path, result).await?;
        debug!("Saved raw result for {} to {}", result.source, path.display());
        Ok(path)
    }

    /// Floor plans stored for `date`; empty when nothing was saved that day
    pub async fn load_floor_plans(&self, date: NaiveDate) -> Result<Vec<FloorPlan>, StorageError> {
        let plans: Option<Vec<FloorPlan>> = read_json(&self.daily_path(date)).await?;
        match plans {
            Some(plans) => {
                debug!("Loaded {} floor plans from {}", plans.len(), date);
                Ok(plans)
            }
            None => {
                warn!("⚠️ No data found for date: {}", date);
                Ok(Vec::new())
            }
        }
    }

    pub async fn load_report(&self, date: NaiveDate) -> Result<Option<DailyReport>, StorageError> {
        read_json(&self.report_path(date)).await
    }

    pub async fn load_latest(&self) -> Result<Option<DailyReport>, StorageError> {
        read_json(&self.latest_path()).await
    }

    /// Dates with stored floor plans, newest first
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>, StorageError> {
        let mut dates: Vec<NaiveDate> = list_json_files(&self.root.join("daily"))
            .await?
            .iter()
            .filter_map(|stem| stem.strip_suffix("_floor_plans"))
            .filter_map(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    /// One point per stored day the property appeared, over the `days` most recent snapshots
    pub async fn property_history(&self, property_name: &str, days: usize) -> Result<Vec<HistoryPoint>, StorageError> {
        let mut history = Vec::new();

        for date in self.available_dates().await?.into_iter().take(days) {
            let plans = self.load_floor_plans(date).await?;
            if let Some(point) = history_point(date, &plans, property_name) {
                history.push(point);
            }
        }

        info!("Retrieved {} historical records for {}", history.len(), property_name);
        Ok(history)
    }

    /// Delete reports and floor plans older than `keep_days`, raw results older than 30 days
    pub async fn cleanup_old_data(&self, today: NaiveDate, keep_days: i64) -> Result<usize, StorageError> {
        let cutoff = retention_cutoff(today, keep_days)?;
        let raw_cutoff = retention_cutoff(today, RAW_RETENTION_DAYS)?;
        let mut deleted = 0;

        for (dir, cutoff) in [("daily", cutoff), ("reports", cutoff), ("raw", raw_cutoff)] {
            let dir = self.root.join(dir);
            for stem in list_json_files(&dir).await? {
                let Some(date) = stem_date(&stem) else {
                    debug!("Skipping undated file {}.json", stem);
                    continue;
                };
                if date >= cutoff {
                    continue;
                }

                let path = dir.join(format!("{}.json", stem));
                tokio::fs::remove_file(&path).await.map_err(|source| {
                    error!("❌ Failed to delete {}: {}", path.display(), source);
                    StorageError::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                deleted += 1;
            }
        }

        info!("🧹 Cleaned up {} old data files", deleted);
        Ok(deleted)
    }
}

/// First date kept by a `keep_days` window ending at `today`
fn retention_cutoff(today: NaiveDate, keep_days: i64) -> Result<NaiveDate, StorageError> {
    if !(1..=MAX_RETENTION_DAYS).contains(&keep_days) {
        return Err(StorageError::Retention { keep_days });
    }
    Duration::try_days(keep_days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or(StorageError::Retention { keep_days })
}

/// Date embedded in a file stem: a leading "<date>_" or a trailing "-<date>"
fn stem_date(stem: &str) -> Option<NaiveDate> {
    let leading = stem.split('_').next().unwrap_or_default();
    NaiveDate::parse_from_str(leading, DATE_FORMAT).ok().or_else(|| {
        let split = stem.len().checked_sub(DATE_FORMAT_LEN)?;
        stem.get(split..)
            .and_then(|tail| NaiveDate::parse_from_str(tail, DATE_FORMAT).ok())
    })
}

const DATE_FORMAT_LEN: usize = "yyyy-mm-dd".len();

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| {
        error!("❌ Failed to serialize {}: {}", path.display(), source);
        StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(path, source))?;
    }
    tokio::fs::write(path, json).await.map_err(|source| io_error(path, source))
}

/// `None` when the file does not exist
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(path, source)),
    };

    serde_json::from_str(&raw).map(Some).map_err(|source| {
        error!("❌ Failed to parse {}: {}", path.display(), source);
        StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Stems of the `.json` files in `dir`; empty when the directory is missing
async fn list_json_files(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(io_error(dir, source)),
    };

    let mut stems = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|source| io_error(dir, source))? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            stems.push(stem.to_string());
        }
    }
    Ok(stems)
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    error!("❌ Storage I/O error on {}: {}", path.display(), source);
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}
