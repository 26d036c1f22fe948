pub mod briefing;
pub mod config;
pub mod entry;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod portfolio;
pub mod report;
pub mod scoring;
