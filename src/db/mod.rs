// Intelligence store: articles, their entities and derived alerts.
mod alert;
mod article;
pub mod core;
mod entity;
mod report;
mod schema;

// Re-export Database and the record types callers need
pub use self::alert::{alert_description, AlertRecord, RecentAlert, ALERT_TYPE_THREAT_DETECTION};
pub use self::article::{format_timestamp, ArticleRecord, StoredArticle};
pub use self::core::Database;
pub use self::core::DbLockErrorExt;
pub use self::entity::EntityCount;
pub use self::report::{IntelligenceReport, ThreatDistribution, WindowCounts};
