//! HTTP API Layer
//!
//! Serves the search form and results pages for Ecommerce Search.

pub mod handler;
pub mod instrumentation;
pub mod server;
pub mod types;
pub mod views;

pub use instrumentation::{attach_instrumentation, InstrumentationError, InstrumentationState};
pub use server::{router, AppState, HttpServer, HttpServerConfig, ServerHandle};
