pub mod config;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod relay_client;
pub mod repositories;
