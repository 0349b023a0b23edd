pub mod config;
pub mod dashboard;
pub mod engine;
pub mod export;
pub mod models;
pub mod poller;
pub mod render;
pub mod session;
pub mod source;
pub mod storage;
pub mod types;

#[cfg(test)]
mod fixtures;
