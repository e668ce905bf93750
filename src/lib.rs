pub mod adapter;
pub mod catalog;
pub mod comparator;
pub mod config;
pub mod error;
pub mod formatters;
pub mod ledger;
pub mod orchestrator;
pub mod problem;
pub mod queue;
pub mod routes;
pub mod runtime;
pub mod verify;
pub mod web_server;
pub mod worker;

pub fn create_timestamp() -> String {
    use chrono::{SecondsFormat, Utc};
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
