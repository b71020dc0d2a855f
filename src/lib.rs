pub mod config;
pub mod diff;
pub mod event;
pub mod monitoring;
pub mod record;
pub mod resource;
pub mod shutdown;
pub mod utils;
