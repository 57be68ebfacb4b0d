pub mod config;
pub mod logging;

pub mod batch;
pub mod fetch;
pub mod manifest;
pub mod plan;
pub mod process;
pub mod proxy_pool;
pub mod retry;
pub mod status_log;
