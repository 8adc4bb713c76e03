pub mod classifier;
pub mod config;
pub mod db;
pub mod entity;
pub mod environment;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod ingest;
pub mod logging;
pub mod monitor;
pub mod pipeline;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_MONITOR: &str = "monitor";
pub const TARGET_CLASSIFIER: &str = "classifier";
