pub mod aggregate;
pub mod render;

pub use aggregate::{build_daily_report, create_daily_report, create_property_summary, history_point, summarize_properties};
pub use render::{render, render_daily_report, ReportKind};
