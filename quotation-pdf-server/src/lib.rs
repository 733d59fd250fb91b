//! HTTP wrapper around the quotation PDF pipeline.
//!
//! Exposes three routes: `POST /export` (JSON document in, PDF attachment
//! out), `GET /print` (the print host page the headless capture navigates
//! to), and `GET /health`.

pub mod config;
pub mod handlers;

pub use config::ServerConfig;
pub use handlers::{app, AppState};
