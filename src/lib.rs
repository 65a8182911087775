pub mod api;
pub mod models;
pub mod orchestrator;
pub mod reports;
pub mod sheets;
pub mod utils;
