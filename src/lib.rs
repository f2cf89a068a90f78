// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod geolocation;
pub mod map;
pub mod persistence;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod validator;
pub mod workout;
