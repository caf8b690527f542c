pub mod auth_api;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod session;
pub mod task_api;
