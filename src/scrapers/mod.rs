pub mod browser;
pub mod camden;
pub mod columns;
pub mod drift;
pub mod page;
pub mod plan_table;
pub mod strategy;
pub mod traits;
pub mod types;

pub use browser::{DriverKind, PageDriver, SessionSettings};
pub use camden::CamdenScraper;
pub use columns::ColumnsScraper;
pub use drift::DriftScraper;
pub use plan_table::PlanCodeTable;
pub use traits::{scrape_all, SiteScraper};
pub use types::PropertyInfo;
