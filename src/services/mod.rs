pub mod cache;
pub mod catalog;
pub mod companies;
pub mod index;
pub mod pacing;
pub mod performance;
pub mod signals;

pub use cache::{Cache, CacheStats, CachedPayload, ResponseCache};
pub use companies::CompanyService;
pub use index::WeightedBasket;
pub use pacing::Paced;
pub use performance::{PerformanceReport, PerformanceService};
pub use signals::{SignalProviders, SignalService, SignalSnapshot};

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
