pub mod config;
pub mod error;
pub mod export;
pub mod league;
pub mod model;
pub mod scoring;
pub mod snapshot;
pub mod state;
pub mod store;
